mod cmd_commit;
mod cmd_draft;
mod cmd_log;
mod cmd_plan;
mod cmd_serve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lifeos_ledger::{open_backend, PersistenceBackend, StorageConfig};

#[derive(Parser)]
#[command(name = "lifeos", version, about = "Turn meeting drafts into committed to-dos")]
struct Cli {
    /// Storage backend: file or sqlite
    #[arg(long, global = true, env = "LIFE_OS_PERSISTENCE")]
    persistence: Option<String>,
    /// Explicit store file (overrides --data-dir)
    #[arg(long, global = true, env = "LIFE_OS_DB_FILE")]
    db_file: Option<PathBuf>,
    /// Directory holding the store file
    #[arg(long, global = true, env = "LIFE_OS_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Workspace to act on
    #[arg(
        long,
        global = true,
        env = "LIFE_OS_DEFAULT_WORKSPACE_ID",
        default_value = "ws-demo"
    )]
    workspace: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a draft and report sections, to-dos and issues (no storage)
    Parse {
        /// Draft file, or - for stdin
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store a draft as a transcript
    Create {
        /// Draft file, or - for stdin
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Commit the to-dos of a draft against an existing transcript
    Commit {
        /// Transcript id the to-dos derive from
        #[arg(long)]
        transcript: String,
        /// Draft file, or - for stdin
        file: PathBuf,
        /// Explicit idempotency key (default: derived from content)
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Create a transcript, parse it and commit its to-dos unless blocked
    Ingest {
        /// Draft file, or - for stdin
        file: PathBuf,
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List recent transcripts
    Transcripts {
        #[arg(long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// List recent to-dos
    Todos {
        #[arg(long, default_value = "100")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Show one transcript with its to-dos
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// List commit audit events
    Audit {
        #[arg(long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// To-dos due in one week (Monday start)
    Week {
        /// YYYY-MM-DD, must be a Monday (default: this week)
        #[arg(long)]
        start: Option<String>,
        #[arg(long, default_value = "500")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Counts of open, due and recent to-dos
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Start HTTP API server
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port number
        #[arg(long, default_value = "7433")]
        port: u16,
    },
}

/// Opened storage plus the workspace every command acts on.
pub struct Ctx {
    pub backend: Arc<dyn PersistenceBackend>,
    pub workspace: String,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if let Command::Parse { file, json } = &cli.cmd {
        return cmd_draft::parse(file, *json);
    }

    let config = StorageConfig::resolve(
        cli.persistence.as_deref(),
        cli.db_file.clone(),
        cli.data_dir.clone(),
    )?;
    let ctx = Ctx {
        backend: open_backend(&config)?,
        workspace: cli.workspace.clone(),
    };

    match cli.cmd {
        Command::Parse { .. } => Ok(()),
        Command::Create { file, json } => cmd_commit::create(&ctx, &file, json),
        Command::Commit {
            transcript,
            file,
            key,
            json,
        } => cmd_commit::commit(&ctx, &transcript, &file, key, json),
        Command::Ingest { file, key, json } => cmd_commit::ingest(&ctx, &file, key, json),
        Command::Transcripts { limit, json } => cmd_log::transcripts(&ctx, limit, json),
        Command::Todos { limit, json } => cmd_log::todos(&ctx, limit, json),
        Command::Show { id, json } => cmd_log::show(&ctx, &id, json),
        Command::Audit { limit, json } => cmd_log::audit(&ctx, limit, json),
        Command::Week { start, limit, json } => {
            cmd_plan::week(&ctx, start.as_deref(), limit, json)
        }
        Command::Summary { json } => cmd_plan::summary(&ctx, json),
        Command::Serve { bind, port } => cmd_serve::execute(ctx, &bind, port),
    }
}
