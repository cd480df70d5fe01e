use std::path::{Path, PathBuf};
use std::sync::Arc;

use berkas_core::batch::{BatchObserver, BatchRunner, BatchSettings};
use berkas_core::boundary::{BoundaryConfig, ScanMode};
use berkas_core::error::BerkasError;
use berkas_core::extraction::ocr::OcrEngine;
use berkas_core::verdict::VerificationVerdict;
use berkas_core::{keywords, rules, VerifyOptions};

use crate::output;
use crate::VerifyArgs;

pub async fn run(args: VerifyArgs) -> Result<(), BerkasError> {
    let documents = collect_documents(&args.inputs)?;
    if documents.is_empty() {
        eprintln!("No PDF files to process.");
        return Ok(());
    }

    let keyword_list = match keywords::load_keywords(&args.keywords) {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(error = %err, "keyword file unusable, continuing with an empty list");
            Vec::new()
        }
    };
    let rule_list = rules::load_rules_or_builtin(&args.rules)?;

    let mode = match args.mode.as_str() {
        "reverse" => ScanMode::ReverseAccumulate {
            from_bottom: args.from_bottom,
        },
        _ => ScanMode::ForwardTrigger,
    };
    let boundary = BoundaryConfig {
        mode,
        stop_keyword: args.stop_keyword.clone(),
        ..BoundaryConfig::default()
    };

    // Resolve the OCR engine once; a missing engine is fatal before any
    // document is touched, unless OCR was disabled outright.
    let ocr = if args.no_ocr {
        None
    } else {
        Some(Arc::new(OcrEngine::resolve(
            args.tesseract.as_deref(),
            &args.lang,
        )?))
    };

    let labels = keywords::display_labels(&keyword_list);
    let options = VerifyOptions {
        keywords: keyword_list,
        rules: rule_list,
        boundary,
    };

    eprintln!("Processing {} document(s)...", documents.len());
    let mut runner = BatchRunner::new(options, Arc::new(ProgressObserver));
    let verdicts = runner
        .run(documents, BatchSettings { dpi: args.dpi, ocr })
        .await?;

    match args.output.as_str() {
        "json" => output::json::print(&verdicts)?,
        _ => output::table::print(&verdicts, &labels),
    }

    if let Some(ref export_path) = args.export {
        output::csv::export(export_path, &verdicts, &labels)?;
        eprintln!("Results appended to {}", export_path.display());
    }

    Ok(())
}

/// Streams per-document progress to stderr while workers run.
struct ProgressObserver;

impl BatchObserver for ProgressObserver {
    fn on_match_found(&self, document: &Path, label: &str, page: usize) {
        tracing::info!(document = %document.display(), label, page, "keyword found");
    }

    fn on_document_finished(&self, verdict: &VerificationVerdict) {
        eprintln!(
            "  {} ... {}",
            verdict.document_path.display(),
            verdict.overall_status
        );
    }
}

/// Files are taken as given; directories are walked recursively for
/// PDF files, in sorted order.
fn collect_documents(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, BerkasError> {
    let mut documents = Vec::new();
    for input in inputs {
        if input.is_dir() {
            walk_dir(input, &mut documents)?;
        } else {
            documents.push(input.clone());
        }
    }
    Ok(documents)
}

fn walk_dir(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), BerkasError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk_dir(&path, out)?;
        } else if is_pdf(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
