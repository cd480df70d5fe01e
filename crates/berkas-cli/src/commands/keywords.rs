use std::path::Path;

use berkas_core::error::BerkasError;
use berkas_core::keywords::{self, KeywordSpec};

pub fn list(file: &Path) -> Result<(), BerkasError> {
    let list = keywords::load_keywords(file)?;
    if list.is_empty() {
        println!("No keywords configured. Add one with `berkas keywords add`.");
        return Ok(());
    }

    let width = list
        .iter()
        .map(|kw| kw.search_text.len())
        .max()
        .unwrap_or(10);
    println!("{:<width$}  Display label", "Search text", width = width);
    for kw in &list {
        println!(
            "{:<width$}  {}",
            kw.search_text,
            kw.display_label,
            width = width
        );
    }
    Ok(())
}

pub fn add(file: &Path, search_text: String, display_label: String) -> Result<(), BerkasError> {
    let mut list = keywords::load_keywords(file)?;
    let spec = KeywordSpec::new(search_text, display_label);
    keywords::add_keyword(&mut list, spec.clone())?;
    keywords::save_keywords(file, &list)?;
    println!(
        "Added '{}' under label '{}' ({} total).",
        spec.search_text,
        spec.display_label,
        list.len()
    );
    Ok(())
}

pub fn remove(file: &Path, search_text: &str) -> Result<(), BerkasError> {
    let mut list = keywords::load_keywords(file)?;
    let before = list.len();
    let lowered = search_text.to_lowercase();
    list.retain(|kw| kw.search_text.to_lowercase() != lowered);

    if list.len() == before {
        println!("No keyword with search text '{search_text}'.");
        return Ok(());
    }
    keywords::save_keywords(file, &list)?;
    println!("Removed '{search_text}' ({} remaining).", list.len());
    Ok(())
}
