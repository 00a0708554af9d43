//! Lectern CLI - Command-line interface
//!
//! Runs the streaming server or prints the library index.

mod commands;

use clap::Parser;
use lectern_core::tracing_setup::CliLogLevel;

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Range-aware streaming server for course video")]
#[command(version)]
struct Cli {
    /// Console log level (`RUST_LOG` takes precedence when set)
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info, global = true)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::handle_command(cli.command, cli.log_level.into()).await
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_is_global() {
        let cli = Cli::try_parse_from(["lectern", "scan", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, CliLogLevel::Debug);
    }
}
