//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use paperdesk_core::{
    ScoreBucket, SearchOverrides, UploadMilestone, UploadProgressReporter, Workspace,
    format_file_size, format_score, render_highlight,
};
use paperdesk_shared::{
    AppConfig, Document, UploadFile, init_config, load_config, load_config_from, resolve_token,
};
use tracing::info;

const HIGHLIGHT_OPEN: &str = "\x1b[1;33m";
const HIGHLIGHT_CLOSE: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Paperdesk: upload study documents and search them semantically.
#[derive(Parser)]
#[command(
    name = "paperdesk",
    version,
    about = "Upload PDF documents and run semantic search over them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.paperdesk/paperdesk.toml.
    #[arg(long, global = true, env = "PAPERDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List uploaded documents.
    List,

    /// Upload a PDF and register it as a document.
    Upload {
        /// File to upload.
        path: PathBuf,

        /// Document title (defaults to the file name without extension).
        #[arg(short, long)]
        title: Option<String>,

        /// Declared media type (defaults from the file extension).
        #[arg(long)]
        media_type: Option<String>,
    },

    /// Delete a document by id.
    Delete {
        /// Document id.
        id: String,
    },

    /// Search across uploaded documents.
    Search {
        /// Free-text query.
        query: String,

        /// Restrict to one document id.
        #[arg(short, long)]
        document: Option<String>,

        /// Number of results (1-20).
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "paperdesk=info",
        1 => "paperdesk=debug",
        _ => "paperdesk=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    let command = match cli.command {
        Command::Config { action } => {
            return match action {
                ConfigAction::Init => cmd_config_init(),
                ConfigAction::Show => cmd_config_show(config_path.as_deref()),
            };
        }
        command => command,
    };

    let config = load(config_path.as_deref())?;
    let token = resolve_token(&config.api.token_env)?;
    let workspace = Workspace::from_config(config, &token)?;

    let outcome = match command {
        Command::List => cmd_list(&workspace).await,
        Command::Upload {
            path,
            title,
            media_type,
        } => cmd_upload(&workspace, &path, title.as_deref(), media_type.as_deref()).await,
        Command::Delete { id } => cmd_delete(&workspace, &id).await,
        Command::Search {
            query,
            document,
            limit,
        } => cmd_search(&workspace, query, document, limit).await,
        Command::Config { .. } => Ok(()),
    };

    workspace.shutdown();
    outcome
}

fn load(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_list(workspace: &Workspace) -> Result<()> {
    info!("listing documents");
    let registry = workspace.registry();
    registry.fetch().await;

    let state = registry.snapshot();
    if let Some(err) = state.error {
        return Err(eyre!(err));
    }
    if state.documents.is_empty() {
        println!("No documents yet. Upload one with `paperdesk upload <PATH>`.");
        return Ok(());
    }

    println!();
    for doc in &state.documents {
        print_document(doc);
    }
    println!("  {} document(s)", state.documents.len());
    println!();
    Ok(())
}

async fn cmd_upload(
    workspace: &Workspace,
    path: &Path,
    title: Option<&str>,
    media_type: Option<&str>,
) -> Result<()> {
    let file = UploadFile::from_path(path, media_type)?;
    info!(
        path = %path.display(),
        media_type = %file.media_type,
        size = file.size(),
        "uploading document"
    );

    let reporter = CliProgress::new();
    let doc = workspace.upload(&file, title, &reporter).await?;

    println!();
    println!("  Document uploaded successfully!");
    println!("  ID:    {}", doc.id);
    println!("  Title: {}", doc.title);
    println!("  File:  {}", doc.file_name);
    println!("  Size:  {}", format_file_size(doc.file_size));
    println!("  URL:   {}", doc.file_url);
    println!();
    Ok(())
}

async fn cmd_delete(workspace: &Workspace, id: &str) -> Result<()> {
    info!(id, "deleting document");
    workspace.registry().delete(id).await?;
    println!("Deleted document {id}");
    Ok(())
}

async fn cmd_search(
    workspace: &Workspace,
    query: String,
    document: Option<String>,
    limit: Option<u32>,
) -> Result<()> {
    let mut overrides = SearchOverrides::new().query(query);
    if let Some(document) = document {
        overrides = overrides.document(document);
    }
    if let Some(limit) = limit {
        overrides = overrides.limit(limit);
    }

    // A failed title listing falls back to ids.
    let state = workspace.search_with_titles(overrides).await;
    if let Some(err) = state.error {
        return Err(eyre!(err));
    }
    if state.results.is_empty() {
        println!("No results for \"{}\".", state.query);
        return Ok(());
    }

    println!();
    for (i, result) in state.results.iter().enumerate() {
        let title = workspace
            .registry()
            .get(&result.document_id)
            .map(|d| d.title)
            .unwrap_or_else(|| result.document_id.clone());
        let bucket = ScoreBucket::from_score(result.score);
        println!(
            "  {}. {title}  [{} match, {}%]",
            i + 1,
            bucket.label(),
            format_score(result.score)
        );
        println!(
            "     {}",
            render_highlight(&result.content, &state.query, HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE)
        );
        println!();
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = load(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_document(doc: &Document) {
    let status = doc
        .processing_status
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("  {}", doc.title);
    println!("    id:       {}", doc.id);
    println!("    size:     {}", format_file_size(doc.file_size));
    println!("    uploaded: {}", doc.created_at.format("%Y-%m-%d %H:%M"));
    println!("    status:   {status}");
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Upload progress rendered as an indicatif bar driven by milestones.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl UploadProgressReporter for CliProgress {
    fn milestone(&self, milestone: UploadMilestone) {
        self.bar.set_position(u64::from(milestone.percent()));
        self.bar.set_message(milestone.label());
    }

    fn failed(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }

    fn done(&self, _document: &Document) {
        self.bar.finish_and_clear();
    }
}
