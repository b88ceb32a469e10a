//! Terminal front end for the market dashboard.
//!
//! # Responsibility
//! - Resolve configuration and storage, then hand one subcommand to the
//!   screen flows in `commands`.
//! - Keep storage wiring (SQLite file vs in-memory) out of the flows.

mod commands;
mod screens;

use anyhow::{Context, Result};
use clap::Parser;
use climarisk_core::db::open_db;
use climarisk_core::{
    flush_logging, init_logging, Anonymous, AppConfig, IdentityProvider, KvMarketRepository,
    MarketRepository, MarketService, MemoryKvStore, SqliteKvStore, StaticIdentity,
};
use commands::{run, Command, Console};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "climarisk.toml";

#[derive(Debug, Parser)]
#[command(name = "climarisk")]
#[command(about = "Register real-estate markets for climate-aware investment analysis")]
#[command(version)]
struct Cli {
    /// Config file; `climarisk.toml` in the working directory is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the market database.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Keep markets in memory for this invocation only.
    #[arg(long, global = true)]
    in_memory: bool,
    /// Skip the pause after writes.
    #[arg(long, global = true)]
    no_delay: bool,
    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let result = run_cli(Cli::parse());
    if let Err(err) = &result {
        log::error!("event=cli_exit module=cli status=error error={err}");
    }
    flush_logging();
    result
}

fn run_cli(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    start_logging(&config);

    let identity: Box<dyn IdentityProvider> = match config.current_user() {
        Some(user) => Box::new(StaticIdentity::new(user)),
        None => Box::new(Anonymous),
    };
    let write_delay = if cli.no_delay {
        Duration::ZERO
    } else {
        config.write_delay()
    };

    if cli.in_memory {
        let repo = KvMarketRepository::new(MemoryKvStore::new());
        return run_screen(cli.command, repo, identity, write_delay);
    }

    let db_path = config.database_path();
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open market database `{}`", db_path.display()))?;
    let store = SqliteKvStore::try_new(&conn)?;
    run_screen(cli.command, KvMarketRepository::new(store), identity, write_delay)
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(DEFAULT_CONFIG_FILE)?,
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    Ok(config)
}

fn start_logging(config: &AppConfig) {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("warning: logging disabled, cannot resolve working directory: {err}");
            return;
        }
    };
    if let Err(err) = init_logging(config.log_level(), config.resolved_log_dir(&cwd)) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn run_screen<R: MarketRepository>(
    command: Command,
    repo: R,
    identity: Box<dyn IdentityProvider>,
    write_delay: Duration,
) -> Result<()> {
    let service = MarketService::with_identity(repo, identity);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout().lock();
    let mut console = Console {
        input: &mut input,
        output: &mut output,
        write_delay,
    };
    run(command, &service, &mut console)
}

#[cfg(test)]
mod tests {
    use super::{load_config, Cli};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn data_dir_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("climarisk.toml");
        std::fs::write(&config_path, "data_dir = \"/from/config\"\nwrite_delay_ms = 0\n").unwrap();

        let cli = Cli::try_parse_from([
            "climarisk",
            "--config",
            config_path.to_str().unwrap(),
            "--data-dir",
            "/from/flag",
            "list",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/from/flag"));
        assert_eq!(config.write_delay_ms, 0);
    }

    #[test]
    fn asset_class_flag_rejects_unknown_values() {
        let parsed = Cli::try_parse_from([
            "climarisk",
            "add",
            "--name",
            "n",
            "--location",
            "l",
            "--asset-class",
            "retail",
        ]);
        assert!(parsed.is_err());
    }
}
