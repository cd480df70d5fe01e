mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "berkas",
    version,
    about = "Verification tool for hospital discharge PDF bundles"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify PDF documents against the keyword list and rule table
    Verify(VerifyArgs),
    /// Manage the keyword list
    Keywords {
        #[command(subcommand)]
        action: KeywordsAction,
    },
    /// Manage and inspect the validation rule table
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Args)]
struct VerifyArgs {
    /// PDF files, or directories to walk recursively
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Rendering resolution for the OCR fallback
    #[arg(long, default_value_t = 100)]
    dpi: u32,

    /// Keyword list file (JSON pairs of search text and display label)
    #[arg(short, long, default_value = "keywords.json")]
    keywords: PathBuf,

    /// Rule list file (JSON pairs of code pattern and required keyword);
    /// builtin defaults are used when the file is absent or broken
    #[arg(short, long, default_value = "rules.json")]
    rules: PathBuf,

    /// Scan strategy: forward (trigger phrase) or reverse (stop keyword)
    #[arg(long, default_value = "forward", value_parser = ["forward", "reverse"])]
    mode: String,

    /// In reverse mode, visit pages last to first
    #[arg(long)]
    from_bottom: bool,

    /// Stop keyword for reverse mode
    #[arg(long, default_value = berkas_core::boundary::DEFAULT_STOP_KEYWORD)]
    stop_keyword: String,

    /// Output format: table (default) or json
    #[arg(short, long, default_value = "table")]
    output: String,

    /// Append results to a CSV file (header written only for a new file)
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Tesseract binary (default: found on PATH)
    #[arg(long, value_name = "PATH")]
    tesseract: Option<PathBuf>,

    /// OCR languages
    #[arg(long, default_value = berkas_core::extraction::ocr::DEFAULT_LANGUAGES)]
    lang: String,

    /// Skip OCR entirely; image-only pages read as blank
    #[arg(long)]
    no_ocr: bool,
}

#[derive(Subcommand)]
enum KeywordsAction {
    /// List configured keywords
    List {
        #[arg(short, long, default_value = "keywords.json")]
        file: PathBuf,
    },
    /// Add a keyword (search text + display label)
    Add {
        search_text: String,
        display_label: String,
        #[arg(short, long, default_value = "keywords.json")]
        file: PathBuf,
    },
    /// Remove a keyword by its search text
    Remove {
        search_text: String,
        #[arg(short, long, default_value = "keywords.json")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// List the active rules (builtin defaults when no file exists)
    List {
        #[arg(short, long, default_value = "rules.json")]
        file: PathBuf,
    },
    /// Validate a rule file
    Validate {
        file: PathBuf,
    },
    /// Print the JSON rule format with an example
    Schema,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Verify(args) => commands::verify::run(args).await,
        Commands::Keywords { action } => match action {
            KeywordsAction::List { file } => commands::keywords::list(&file),
            KeywordsAction::Add {
                search_text,
                display_label,
                file,
            } => commands::keywords::add(&file, search_text, display_label),
            KeywordsAction::Remove { search_text, file } => {
                commands::keywords::remove(&file, &search_text)
            }
        },
        Commands::Rules { action } => match action {
            RulesAction::List { file } => commands::rules::list(&file),
            RulesAction::Validate { file } => commands::rules::validate(&file),
            RulesAction::Schema => commands::rules::schema(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
