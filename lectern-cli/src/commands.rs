//! CLI command implementations

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use lectern_core::config::LecternConfig;
use lectern_core::streaming::OpenRangePolicy;
use lectern_core::tracing_setup::{init_console_tracing, init_tracing};
use lectern_core::{LibraryIndex, Result as CoreResult};
use tracing::{Level, info};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the streaming server
    Serve(ServeArgs),
    /// Print the videos found in the library tree
    Scan {
        /// Library root to scan (defaults to the configured root)
        #[arg(long)]
        library_root: Option<PathBuf>,
        /// Print the index as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Server options. Each flag overrides the matching `LECTERN_*` variable.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,
    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Root of the course library tree
    #[arg(long)]
    pub library_root: Option<PathBuf>,
    /// Directory holding uploaded videos
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,
    /// Bytes served for open-ended ranges (`0` serves to the end of file)
    #[arg(long)]
    pub open_range_chunk: Option<u64>,
    /// Directory for the per-run trace log
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// Applies flags on top of an environment-derived configuration.
    pub fn apply(&self, config: &mut LecternConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(root) = &self.library_root {
            config.library.library_root = root.clone();
        }
        if let Some(dir) = &self.upload_dir {
            config.library.upload_dir = dir.clone();
        }
        if let Some(chunk) = self.open_range_chunk {
            config.streaming.open_range_policy = OpenRangePolicy::from_chunk(chunk);
        }
    }
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands, log_level: Level) -> anyhow::Result<()> {
    match command {
        Commands::Serve(args) => serve(args, log_level).await,
        Commands::Scan { library_root, json } => {
            init_console_tracing(log_level)?;
            scan(library_root, json).await?;
            Ok(())
        }
    }
}

/// Start the streaming server
///
/// # Errors
/// - Tracing could not be installed
/// - The configuration is invalid or the address cannot be bound
pub async fn serve(args: ServeArgs, log_level: Level) -> anyhow::Result<()> {
    let log_file = init_tracing(log_level, args.logs_dir.as_deref())
        .context("failed to initialize logging")?;

    let mut config = LecternConfig::from_env();
    args.apply(&mut config);
    info!(
        "Starting server (trace log at {}) with {:?}",
        log_file.display(),
        config
    );

    lectern_web::run_server(config)
        .await
        .context("server terminated")
}

/// Print the library index
///
/// # Errors
/// - `LecternError::Io` - The library root could not be read
pub async fn scan(library_root: Option<PathBuf>, json: bool) -> CoreResult<()> {
    let root = library_root.unwrap_or_else(|| LecternConfig::from_env().library.library_root);
    let index = LibraryIndex::scan(&root).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&index).map_err(std::io::Error::other)?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Library: {}", root.display());
    for entry in index.entries() {
        println!("  {:>12}  {}  ({})", entry.size, entry.relative_path, entry.title);
    }
    println!("{} videos, {} bytes", index.len(), index.total_size());

    Ok(())
}
