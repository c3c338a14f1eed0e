//! PDF Anonymizer CLI Application.
//!
//! This binary is the interactive side of a redaction run: it builds the run
//! configuration, starts the pipeline on a worker, renders its status and
//! progress events, and answers its confirmation requests.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use anonymizer::config::DEFAULT_OUTPUT_FILENAME;
use anonymizer::redaction::CancelFlag;
use anonymizer::{
    RedactionJob, RedactionMode, RedactionPipeline, RunConfig, RunEvent, Settings, TermList,
};

/// Clinical PDF Anonymizer
///
/// Finds configured labels such as "Name" or "Date of Birth" in a PDF and
/// irreversibly redacts them. Use the 'terms' subcommand to manage labels.
#[derive(Parser)]
#[command(name = "anonymizer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input PDF file path
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Folder the anonymized PDF is written to (defaults to the current directory)
    #[arg(short = 'd', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// File name of the anonymized PDF
    #[arg(short = 'n', long, value_name = "NAME")]
    output_name: Option<String>,

    /// Redaction mode: standard (labels only) or aggressive (labels and adjacent values)
    #[arg(short, long, value_name = "MODE")]
    mode: Option<RedactionMode>,

    /// Term file (JSON array of labels)
    #[arg(short, long, value_name = "FILE", global = true)]
    terms: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Replace an existing output file without asking
    #[arg(short, long)]
    force: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the words and boxes extracted from a PDF (for debugging term matches)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Only this page (1-based)
        #[arg(short, long)]
        page: Option<usize>,
    },

    /// Manage the redaction term list
    Terms {
        #[command(subcommand)]
        action: TermsAction,
    },
}

#[derive(Subcommand)]
enum TermsAction {
    /// Print the terms in effect
    List,

    /// Write the built-in default terms to the term file
    Init {
        /// Overwrite an existing term file
        #[arg(long)]
        force: bool,
    },

    /// Add a term
    Add { term: String },

    /// Remove a term (case-insensitive)
    Remove { term: String },

    /// Replace a term with new text, keeping its place in the list
    Edit { old: String, new: String },

    /// Print the terms containing QUERY (case-insensitive)
    Search { query: String },
}

/// Command handler holding the resolved settings.
struct AnonymizeHandler {
    settings: Settings,
    verbose: bool,
}

impl AnonymizeHandler {
    fn new(settings: Settings, verbose: bool) -> Self {
        Self { settings, verbose }
    }

    /// Loads the term list. An explicitly requested file must load; the
    /// configured default falls back to the built-in terms.
    fn load_terms(&self, explicit: Option<&Path>) -> Result<TermList> {
        match explicit {
            Some(path) => TermList::load(path)
                .with_context(|| format!("Failed to load terms from {}", path.display())),
            None => Ok(TermList::load_or_default(&self.settings.terms_path())),
        }
    }

    /// Executes a redaction run and renders its events.
    ///
    /// A failed run is reported once through its status line and maps to a
    /// failure exit code rather than an error.
    async fn anonymize(&self, config: RunConfig, terms: TermList, force: bool) -> Result<ExitCode> {
        if terms.is_empty() {
            anyhow::bail!("The term list is empty. Use 'anonymizer terms init' to restore defaults.");
        }

        if self.verbose {
            println!("Input:  {}", config.input.display());
            println!("Output: {}", config.output_path().display());
            println!("Mode:   {}", config.mode);
            println!("Terms:  {} label(s)", terms.len());
        }

        let cancel = CancelFlag::new();
        let pipeline = RedactionPipeline::with_secure_backend()
            .with_overwrite(force || self.settings.overwrite)
            .with_cancel_flag(cancel.clone());

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Cancelling after the current page…");
                cancel.cancel();
            }
        });

        let (worker, mut events) = pipeline.spawn(RedactionJob::new(config, terms.snapshot()));

        let mut percent = 0.0_f32;
        while let Some(event) = events.recv().await {
            match event {
                RunEvent::Status(text) => eprintln!("[{:>3.0}%] {}", percent, text),
                RunEvent::Progress(value) => percent = value,
                RunEvent::Confirm(request) => {
                    let prompt = request.prompt.clone();
                    let answer = tokio::task::spawn_blocking(move || ask_yes_no(&prompt))
                        .await
                        .context("Confirmation prompt failed")?;
                    request.respond(answer);
                }
                RunEvent::Completed(path) => {
                    println!("✓ Anonymized document saved → {}", path.display());
                }
                RunEvent::Failed { kind, .. } => {
                    eprintln!("✗ Anonymization failed [{}]", kind);
                }
            }
        }

        let summary = match worker.await.context("Redaction worker stopped unexpectedly")? {
            Ok(summary) => summary,
            Err(_) => return Ok(ExitCode::FAILURE),
        };

        if self.verbose {
            println!("\nRedaction Summary:");
            println!("  Pages processed: {}", summary.pages_processed);
            println!("  Pages modified:  {}", summary.pages_modified);
            println!("  Labels found:    {}", summary.matches);
            println!("  Marks applied:   {}", summary.marks_applied);
        }
        if !summary.has_redactions() {
            println!("⚠ No configured labels were found in the document");
        }

        Ok(ExitCode::SUCCESS)
    }

    /// Prints the words MuPDF extracts from a PDF.
    async fn extract(&self, input: PathBuf, page: Option<usize>) -> Result<()> {
        let pages = tokio::task::spawn_blocking(move || {
            RedactionPipeline::with_secure_backend().extract_words(&input, page)
        })
        .await
        .context("Extraction worker stopped unexpectedly")?
        .context("Text extraction failed")?;

        for (number, words) in pages {
            println!("--- page {} ({} words)", number, words.len());
            for word in words {
                println!("{}\t{}", word.rect, word.text);
            }
        }
        Ok(())
    }

    fn terms(&self, explicit: Option<&Path>, action: &TermsAction) -> Result<()> {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.terms_path());

        match action {
            TermsAction::List => {
                for term in self.load_terms(explicit)?.terms() {
                    println!("{}", term);
                }
            }
            TermsAction::Init { force } => {
                if path.exists() && !force {
                    anyhow::bail!(
                        "Term file already exists: {} (use --force to reset it)",
                        path.display()
                    );
                }
                TermList::defaults().save(&path)?;
                println!("✓ Wrote {} default terms → {}", TermList::defaults().len(), path.display());
            }
            TermsAction::Add { term } => {
                let mut list = self.load_terms(explicit)?;
                if list.add(term)? {
                    list.save(&path)?;
                    println!("✓ Added '{}'", term.trim());
                } else {
                    println!("⚠ '{}' is already in the list", term.trim());
                }
            }
            TermsAction::Remove { term } => {
                let mut list = self.load_terms(explicit)?;
                if list.remove(term) {
                    list.save(&path)?;
                    println!("✓ Removed '{}'", term.trim());
                } else {
                    println!("⚠ '{}' is not in the list", term.trim());
                }
            }
            TermsAction::Edit { old, new } => {
                let mut list = self.load_terms(explicit)?;
                if list.rename(old, new)? {
                    list.save(&path)?;
                    println!("✓ Renamed '{}' → '{}'", old.trim(), new.trim());
                } else {
                    println!("⚠ '{}' is not in the list", old.trim());
                }
            }
            TermsAction::Search { query } => {
                let list = self.load_terms(explicit)?;
                let found = list.search(query);
                if found.is_empty() {
                    println!("⚠ No terms contain '{}'", query.trim());
                }
                for term in found {
                    println!("{}", term);
                }
            }
        }
        Ok(())
    }
}

/// Builds the run configuration from CLI flags over settings.
fn build_run_config(
    input: &Path,
    output_dir: Option<&Path>,
    output_name: Option<&str>,
    mode: Option<RedactionMode>,
    settings: &Settings,
) -> Result<RunConfig> {
    let output_folder = match output_dir.or(settings.output_folder.as_deref()) {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Cannot determine the current directory")?,
    };
    let output_filename = output_name
        .map(str::to_string)
        .unwrap_or_else(|| settings.output_filename.clone());
    let output_filename = if output_filename.trim().is_empty() {
        DEFAULT_OUTPUT_FILENAME.to_string()
    } else {
        output_filename
    };

    Ok(RunConfig::new(
        input,
        output_folder,
        output_filename,
        mode.unwrap_or(settings.mode),
    ))
}

/// Asks a yes/no question on the terminal. Anything but "y"/"yes" is no.
fn ask_yes_no(prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    let _ = std::io::stderr().flush();

    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "anonymizer=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Settings::config_path);
    let settings = Settings::load(&config_path)
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;
    let handler = AnonymizeHandler::new(settings, cli.verbose);

    match cli.command {
        Some(Commands::Extract { input, page }) => handler.extract(input, page).await?,
        Some(Commands::Terms { ref action }) => handler.terms(cli.terms.as_deref(), action)?,
        None => {
            let input = cli
                .input
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--input is required"))?;
            let config = build_run_config(
                input,
                cli.output_dir.as_deref(),
                cli.output_name.as_deref(),
                cli.mode,
                &handler.settings,
            )?;
            let terms = handler.load_terms(cli.terms.as_deref())?;
            return handler.anonymize(config, terms, cli.force).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}
