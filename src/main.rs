// ABOUTME: CLI entry point for dynamo-dump
// ABOUTME: Parses commands, builds the DynamoDB client, and runs a backup or restore

use clap::{Args, Parser, Subcommand};
use dynamo_dump::commands::{self, Mode, RunConfig};
use dynamo_dump::config::{self, ConnectionConfig, ConnectionOverrides, Settings};
use dynamo_dump::dynamo::{self, DynamoStore};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dynamo-dump")]
#[command(about = "Backup and restore DynamoDB tables to/from JSON files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct CommonArgs {
    /// The DynamoDB table to back up or restore
    #[arg(short = 't', long)]
    table: String,
    /// The JSON file used to back up or restore data (default: DynamoDBData.json)
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,
    /// AWS profile from the credentials file (default: "default")
    #[arg(short = 'p', long)]
    profile: Option<String>,
    /// AWS region (default: eu-west-2)
    #[arg(short = 'r', long)]
    region: Option<String>,
    /// Use a DynamoDB Local instance; pass a URL or nothing for http://localhost:8000
    #[arg(
        short = 'l',
        long,
        num_args = 0..=1,
        default_missing_value = config::DEFAULT_LOCAL_ENDPOINT
    )]
    local: Option<String>,
    /// Path to a TOML settings file with [connection] and [transfer] defaults
    #[arg(long = "config")]
    config_path: Option<PathBuf>,
    /// Log progress every N records
    #[arg(long)]
    progress_interval: Option<u64>,
    /// Disable the terminal progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up all items of a table to a JSON file
    Backup {
        #[command(flatten)]
        common: CommonArgs,
        /// Overwrite the destination file if it already exists
        #[arg(short = 'o', long)]
        overwrite: bool,
    },
    /// Restore items from a JSON file into an empty table
    Restore {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let (mode, common, overwrite) = match cli.command {
        Commands::Backup { common, overwrite } => (Mode::Backup, common, overwrite),
        Commands::Restore { common } => (Mode::Restore, common, false),
    };

    dynamo_dump::utils::validate_table_name(&common.table)?;

    let settings = match &common.config_path {
        Some(path) => config::load_settings_from_file(path)?,
        None => Settings::default(),
    };

    let file = common.file.unwrap_or_else(|| {
        tracing::warn!(
            "File option not supplied. Using {} for the file name",
            config::DEFAULT_FILE_NAME
        );
        PathBuf::from(config::DEFAULT_FILE_NAME)
    });

    let connection = ConnectionConfig::resolve(
        ConnectionOverrides {
            profile: common.profile,
            region: common.region,
            local: common.local,
        },
        &settings.connection,
    );

    let run_config = RunConfig::new(mode, common.table, file)
        .with_overwrite(overwrite)
        .with_progress_interval(config::resolve_progress_interval(
            common.progress_interval,
            &settings.transfer,
        ))
        .with_progress_bar(!common.no_progress && std::io::stderr().is_terminal());

    let client = dynamo::connect(&connection).await?;
    let store = DynamoStore::new(client);

    let outcome = commands::run(&store, run_config).await;
    let transferred = outcome.records_transferred();
    outcome.into_result().map(|_| ()).map_err(|error| {
        anyhow::anyhow!(
            "{}: {} ({} records transferred)",
            error.kind(),
            error,
            transferred
        )
    })
}
