//! TruStory daemon: replays blocks into an LMDB-backed claim ledger and
//! answers queries against it.

mod config;
mod replay;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use tru_game::{Ledger, Services};
use tru_store_lmdb::{LmdbEnvironment, Migrator};
use tru_utils::{init_tracing, LogFormat};

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "tru-daemon", about = "TruStory claim ledger daemon")]
struct Cli {
    /// Data directory for ledger storage (defaults to the config file's value).
    #[arg(long, env = "TRU_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TRU_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "text" or "json".
    #[arg(long, env = "TRU_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. CLI flags and env vars override it.
    #[arg(long, env = "TRU_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Apply genesis, then replay newline-delimited JSON blocks.
    Replay {
        /// Block file; reads stdin when omitted or "-".
        #[arg(long)]
        blocks: Option<PathBuf>,
    },
    /// Run a read-only query and print the JSON result.
    Query {
        /// Query path, e.g. "claim" or "game_challenges".
        path: String,
        /// JSON-encoded query parameters.
        #[arg(default_value = "{}")]
        data: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    let format: LogFormat = config
        .log_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    init_tracing(&config.log_level, format);
    if let Some(ref path) = cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    let env = LmdbEnvironment::open(&config.data_dir, config.map_size)
        .with_context(|| format!("opening data dir {}", config.data_dir.display()))?;
    Migrator::run(&env)?;
    let ledger = Ledger::new(
        Arc::new(env.kv_store()),
        config.params.clone(),
        Services::store_backed(),
    )?;

    match cli.command {
        Command::Replay { blocks } => {
            replay::seed_genesis(&ledger, &config)?;
            match blocks {
                Some(path) if path.as_os_str() != "-" => {
                    let file = File::open(&path)
                        .with_context(|| format!("opening block file {}", path.display()))?;
                    replay::replay(&ledger, BufReader::new(file))?;
                }
                _ => {
                    replay::replay(&ledger, io::stdin().lock())?;
                }
            }
        }
        Command::Query { path, data } => {
            let bytes = ledger.query(&path, data.as_bytes())?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
