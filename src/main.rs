//! # govwatch CLI
//!
//! The `govwatch` binary files, lists, imports and exports governance
//! reports, runs a terminal slideshow, and serves the report API.
//!
//! ## Usage
//!
//! ```bash
//! govwatch --config ./config/govwatch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `govwatch list` | Print reports matching the filters |
//! | `govwatch submit` | File a new report |
//! | `govwatch import <file>` | Append reports from a JSON export |
//! | `govwatch export` | Write all reports as JSON |
//! | `govwatch officials` | List officials named in reports |
//! | `govwatch counties` | List known county codes |
//! | `govwatch slideshow` | Rotate through reports in the terminal |
//! | `govwatch serve` | Start the HTTP report service |
//!
//! ## Examples
//!
//! ```bash
//! # Anonymous report with a photo
//! govwatch submit --type corruption --title "Tender awarded twice" \
//!     --official-name "J. Doe" --official-position MCA --county 047 \
//!     --anonymous --media ./gate.jpg
//!
//! # Newest Nairobi reports mentioning water
//! govwatch list --query water --county 047 --order newest
//!
//! # Back up to a timestamped file
//! govwatch export --output ./backups/
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use govwatch::backend::open_store;
use govwatch::config::{self, Config};
use govwatch::export::{notice_error, run_export, run_import};
use govwatch::list::{run_counties, run_list, run_officials, run_slideshow};
use govwatch::submit::{Attachment, FileSource, ReportDraft};
use govwatch::tracker::{Notice, Tracker};
use govwatch::{logging, server};
use govwatch_core::filter::{Criteria, DateOrder};
use govwatch_core::Official;

/// govwatch: citizen governance report tracker.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/govwatch.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "govwatch",
    about = "govwatch: file, search and share governance accountability reports",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/govwatch.toml`. When the file does not exist,
    /// built-in defaults are used (local store under `./data`).
    #[arg(long, global = true, default_value = "./config/govwatch.toml")]
    config: PathBuf,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Text search over title, description and official. Needs at least
    /// three characters to take effect.
    #[arg(long, short)]
    query: Option<String>,

    /// Official name (case-insensitive substring).
    #[arg(long)]
    official: Option<String>,

    /// County code, e.g. `047`.
    #[arg(long)]
    county: Option<String>,

    /// Sort by date: `newest` or `oldest`. Stored order otherwise.
    #[arg(long)]
    order: Option<DateOrder>,
}

impl From<FilterArgs> for Criteria {
    fn from(args: FilterArgs) -> Self {
        Criteria {
            text_query: args.query,
            official_name: args.official,
            county: args.county,
            date_order: args.order,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List reports.
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// File a new report.
    ///
    /// Attachments are read and encoded before anything is stored; if any
    /// attachment cannot be read, nothing is submitted.
    Submit {
        /// Issue category, e.g. `corruption` or `service_delivery`.
        #[arg(long = "type")]
        issue_type: String,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        official_name: String,

        #[arg(long, default_value = "")]
        official_position: String,

        /// County code, see `govwatch counties`.
        #[arg(long, default_value = "")]
        county: String,

        /// Description text or HTML.
        #[arg(long, default_value = "", conflicts_with = "description_file")]
        description: String,

        /// Read the description from a file.
        #[arg(long)]
        description_file: Option<PathBuf>,

        /// Your name. Omit, or pass `--anonymous`, to report anonymously.
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        /// Record the report as anonymous, dropping name and email.
        #[arg(long)]
        anonymous: bool,

        /// Image or video files to attach. Repeatable.
        #[arg(long = "media")]
        media: Vec<PathBuf>,
    },

    /// Append reports from a JSON export file.
    Import {
        file: PathBuf,
    },

    /// Export all reports as a JSON array.
    Export {
        /// File or directory to write to. Prints to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List officials named in stored reports.
    Officials,

    /// List county codes and names.
    Counties,

    /// Rotate through reports in the terminal.
    ///
    /// Advances automatically every `[slideshow].interval_ms`. Type `n` or
    /// `p` and Enter to navigate, `q` to quit.
    Slideshow {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Start the HTTP report service on `[server].bind`.
    Serve,
}

fn load_or_default(path: &std::path::Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::minimal())
    }
}

async fn open_tracker(cfg: &Config) -> anyhow::Result<Tracker> {
    let store = open_store(cfg).map_err(notice_error)?;
    let counties = cfg.load_counties()?;
    let tracker = Tracker::start(
        store,
        Arc::new(FileSource),
        counties,
        cfg.slideshow.interval(),
    )
    .await;
    if tracker.is_degraded().await {
        eprintln!("{}", Notice::load_failed());
    }
    Ok(tracker)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = load_or_default(&cli.config)?;

    match cli.command {
        Commands::Counties => {
            run_counties(&cfg.load_counties()?)?;
        }
        Commands::Serve => {
            let store = open_store(&cfg).map_err(notice_error)?;
            let counties = cfg.load_counties()?;
            info!(backend = store.name(), "starting report service");
            server::run_server(&cfg, store, counties).await?;
        }
        Commands::List { filters } => {
            let tracker = open_tracker(&cfg).await?;
            run_list(&tracker, filters.into()).await?;
            tracker.shutdown();
        }
        Commands::Slideshow { filters } => {
            let tracker = open_tracker(&cfg).await?;
            run_slideshow(&tracker, filters.into()).await?;
        }
        Commands::Officials => {
            let tracker = open_tracker(&cfg).await?;
            run_officials(&tracker).await?;
            tracker.shutdown();
        }
        Commands::Import { file } => {
            let tracker = open_tracker(&cfg).await?;
            run_import(&tracker, &file).await?;
            tracker.shutdown();
        }
        Commands::Export { output } => {
            let tracker = open_tracker(&cfg).await?;
            run_export(&tracker, output.as_deref()).await?;
            tracker.shutdown();
        }
        Commands::Submit {
            issue_type,
            title,
            official_name,
            official_position,
            county,
            description,
            description_file,
            name,
            email,
            anonymous,
            media,
        } => {
            let description = match description_file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => description,
            };
            let draft = ReportDraft {
                issue_type,
                title,
                official: Official {
                    name: official_name,
                    position: official_position,
                },
                county,
                description,
                reporter_name: name,
                reporter_email: email,
                anonymous,
                attachments: media.into_iter().map(Attachment::from_path).collect(),
            };
            let tracker = open_tracker(&cfg).await?;
            let stored = tracker.submit(draft).await.map_err(notice_error)?;
            println!("{}", Notice::submitted());
            if let Some(id) = stored.id {
                println!("id: {}", id);
            }
            tracker.shutdown();
        }
    }

    Ok(())
}
