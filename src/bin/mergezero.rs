//! CLI binary for mergezero.
//!
//! Reads `mergezero.toml` (if present), applies command-line overrides and
//! runs one mail-merge operation against the local filesystem backend.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mergezero::api::{DocumentFormat, LocatorReset, RunOutcome};
use mergezero::config::{load_settings, load_settings_or_default, SETTINGS_FILE_NAME};
use mergezero::services::local::{LocalDocumentService, LocalStorage, TerminalPrompt};
use mergezero::{MailMerge, Workbook, DEFAULT_TEMPLATE_TITLE};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Initialize the header row of a new workbook
  mergezero init-sheet clients.xlsx

  # One document per client, locators written back to "URL Document"
  mergezero per-client clients.xlsx --tz +02:00

  # Clear previous locators before generating
  mergezero per-client clients.xlsx --reset clear-before-run

  # Try the merge on a single row
  mergezero test-row clients.xlsx --row 5

  # All clients in one PDF
  mergezero single-page clients.xlsx --yes

SETTINGS:
  Values are read from ./mergezero.toml when present (or --config <path>).
  Command-line flags take precedence over the settings file.
"#;

/// Generate client documents and PDFs from an Excel table.
#[derive(Parser, Debug)]
#[command(
    name = "mergezero",
    version,
    about = "Generate client documents and PDFs from an Excel table",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (TOML).
    #[arg(long, global = true, env = "MERGEZERO_CONFIG")]
    config: Option<PathBuf>,

    /// Name of the data sheet.
    #[arg(long, global = true)]
    sheet: Option<String>,

    /// UTC offset used for dates, e.g. +02:00 or UTC.
    #[arg(long, global = true, env = "MERGEZERO_TZ")]
    tz: Option<String>,

    /// How the locator column is reset before a batch.
    #[arg(long, global = true, value_enum)]
    reset: Option<ResetArg>,

    /// Format of generated documents.
    #[arg(long, global = true, value_enum)]
    format: Option<FormatArg>,

    /// Directory where finalized documents are first written.
    #[arg(long, global = true)]
    drafts_dir: Option<PathBuf>,

    /// Parent of the output folder when the workbook has no directory.
    #[arg(long, global = true)]
    storage_root: Option<PathBuf>,

    /// Answer yes to every confirmation.
    #[arg(short, long, global = true)]
    yes: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MERGEZERO_VERBOSE")]
    verbose: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one document per data row and write its locator back.
    PerClient {
        /// Workbook path (defaults to `source.workbook` in the settings file).
        workbook: Option<PathBuf>,
    },

    /// Put every client into one document and export it as PDF.
    SinglePage {
        workbook: Option<PathBuf>,
    },

    /// Merge a single row without moving the document.
    TestRow {
        workbook: Option<PathBuf>,

        /// 1-based row number (the first data row is 2).
        #[arg(long, default_value_t = 2)]
        row: usize,
    },

    /// Write the header row (field names and locator column).
    InitSheet {
        workbook: Option<PathBuf>,
    },

    /// Create the template document with its placeholders.
    Template {
        #[arg(long, default_value = DEFAULT_TEMPLATE_TITLE)]
        title: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ResetArg {
    Overwrite,
    ClearBeforeRun,
}

impl From<ResetArg> for LocatorReset {
    fn from(v: ResetArg) -> Self {
        match v {
            ResetArg::Overwrite => LocatorReset::Overwrite,
            ResetArg::ClearBeforeRun => LocatorReset::ClearBeforeRun,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Text,
    Markdown,
    Json,
}

impl From<FormatArg> for DocumentFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Text => DocumentFormat::PlainText,
            FormatArg::Markdown => DocumentFormat::Markdown,
            FormatArg::Json => DocumentFormat::Json,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

type TerminalIo = TerminalPrompt<io::StdinLock<'static>, io::Stderr>;
type LocalMerge = MailMerge<LocalDocumentService, LocalStorage, TerminalIo>;

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose { "mergezero=debug" } else { "mergezero=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match cli.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn workbook_path(arg: Option<PathBuf>, configured: Option<&Path>) -> Result<PathBuf> {
    match arg.or_else(|| configured.map(Path::to_path_buf)) {
        Some(path) => Ok(path),
        None => bail!(
            "No workbook given (pass a path or set source.workbook in the settings file)"
        ),
    }
}

fn print_outcome<T>(outcome: &RunOutcome<T>) {
    match outcome {
        RunOutcome::Completed(_) => {}
        RunOutcome::Skipped(reason) => eprintln!("Rien à faire : {:?}", reason),
        RunOutcome::Cancelled => eprintln!("Opération annulée."),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut settings = match &cli.config {
        Some(path) => load_settings(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?,
        None => load_settings_or_default(SETTINGS_FILE_NAME)
            .context("Failed to read settings file")?,
    };

    if let Some(sheet) = &cli.sheet {
        settings.source.sheet_name = sheet.clone();
    }
    if let Some(tz) = &cli.tz {
        settings.source.time_zone = tz.clone();
    }
    if let Some(reset) = cli.reset {
        settings.batch.locator_reset = reset.into();
    }
    if let Some(format) = cli.format {
        settings.output.format = format.into();
    }
    if let Some(dir) = &cli.drafts_dir {
        settings.output.drafts_dir = dir.clone();
    }
    if let Some(root) = &cli.storage_root {
        settings.output.storage_root = root.clone();
    }

    let prompt = TerminalPrompt::new(io::stdin().lock(), io::stderr(), cli.yes);
    let mut merge: LocalMerge = settings
        .to_builder()
        .build_with(
            LocalDocumentService::new(&settings.output.drafts_dir, settings.output.format),
            LocalStorage::new(&settings.output.storage_root),
            prompt,
        )
        .context("Invalid configuration")?;
    let time_zone = merge.config().time_zone();
    let configured = settings.source.workbook.as_deref();

    match cli.command {
        Command::PerClient { workbook } => {
            let path = workbook_path(workbook, configured)?;
            let mut workbook = Workbook::open(&path, time_zone)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let outcome = merge.generate_per_client(&mut workbook)?;
            if let RunOutcome::Completed(report) = &outcome {
                for locator in &report.locators {
                    println!("{}", locator);
                }
            }
            print_outcome(&outcome);
        }
        Command::SinglePage { workbook } => {
            let path = workbook_path(workbook, configured)?;
            let workbook = Workbook::open(&path, time_zone)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let outcome = merge.generate_single_page(&workbook)?;
            if let RunOutcome::Completed(report) = &outcome {
                println!("{}", report.pdf);
            }
            print_outcome(&outcome);
        }
        Command::TestRow { workbook, row } => {
            let path = workbook_path(workbook, configured)?;
            let workbook = Workbook::open(&path, time_zone)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let outcome = merge.generate_for_row(&workbook, row)?;
            if let RunOutcome::Completed(report) = &outcome {
                println!("{}", report.document.locator);
            }
            print_outcome(&outcome);
        }
        Command::InitSheet { workbook } => {
            let path = workbook_path(workbook, configured)?;
            let mut workbook = if path.exists() {
                Workbook::open(&path, time_zone)
                    .with_context(|| format!("Failed to open {}", path.display()))?
            } else {
                let mut workbook = Workbook::new();
                workbook.set_time_zone(time_zone);
                workbook.set_path(&path);
                workbook
            };
            let outcome = merge.initialize_sheet(&mut workbook)?;
            print_outcome(&outcome);
        }
        Command::Template { title } => {
            let stored = merge.create_template(&title)?;
            println!("{}", stored.locator);
        }
    }

    Ok(())
}
