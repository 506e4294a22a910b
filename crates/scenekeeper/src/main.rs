//! sk: scenekeeper command-line interface
//!
//! Inspect configuration and the transaction table, and replay window
//! scenarios against an in-process session manager.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use scenekeeper_core::Config;
use scenekeeper_core::logging::{LogConfig, LogFormat, init_logging};
use scenekeeper_core::opcode::SceneSessionManagerMessage;

mod replay;

#[derive(Parser)]
#[command(name = "sk")]
#[command(version, about = "scenekeeper - window session lifecycle and focus core", long_about = None)]
struct Cli {
    /// Path to scenekeeper.toml
    #[arg(long, global = true, env = "SK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, env = "SK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (pretty or json)
    #[arg(long, global = true, env = "SK_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and print the effective configuration
    CheckConfig {
        /// Config file (defaults to --config, then built-in defaults)
        path: Option<PathBuf>,
    },

    /// List the transaction codes of the session manager interface
    Opcodes {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run a scenario script end to end through the request boundary
    Replay {
        /// TOML script with [[step]] entries
        script: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::default()),
    }
}

fn init_tracing(cli: &Cli, config: &Config) {
    let mut log: LogConfig = config.logging.clone();
    if let Some(level) = &cli.log_level {
        log.level.clone_from(level);
    }
    if let Some(format) = cli.log_format {
        log.format = format;
    }
    if let Err(err) = init_logging(&log) {
        eprintln!("warning: logging disabled: {err}");
    }
}

#[derive(Serialize)]
struct OpcodeRow {
    code: u32,
    name: SceneSessionManagerMessage,
    label: &'static str,
    reply: &'static str,
    query: bool,
    fire_and_forget: bool,
    scene_board: bool,
}

impl From<SceneSessionManagerMessage> for OpcodeRow {
    fn from(message: SceneSessionManagerMessage) -> Self {
        Self {
            code: message.code(),
            name: message,
            label: message.label(),
            reply: if message.replies_wm_error() { "wm" } else { "ws" },
            query: message.is_query(),
            fire_and_forget: message.is_fire_and_forget(),
            scene_board: message.is_scene_board(),
        }
    }
}

fn cmd_opcodes(json: bool) -> Result<()> {
    let rows: Vec<OpcodeRow> = SceneSessionManagerMessage::ALL
        .iter()
        .copied()
        .map(OpcodeRow::from)
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    println!("{:>4}  {:<70} {:<5} flags", "code", "transaction", "reply");
    for row in rows {
        let mut flags = Vec::new();
        if row.query {
            flags.push("query");
        }
        if row.fire_and_forget {
            flags.push("async");
        }
        if row.scene_board {
            flags.push("scb");
        }
        println!(
            "{:>4}  {:<70} {:<5} {}",
            row.code,
            row.label,
            row.reply,
            flags.join(",")
        );
    }
    Ok(())
}

fn cmd_check_config(config: &Config, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => eprintln!("{}: ok", path.display()),
        None => eprintln!("no config file given; showing defaults"),
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}

async fn cmd_replay(config: Config, script: &Path, json: bool) -> Result<()> {
    let script = replay::Script::load(script)?;
    let report = replay::run(config, &script)
        .await
        .context("replay aborted")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_plain());
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Opcodes { json } => {
            init_tracing(&cli, &Config::default());
            cmd_opcodes(*json)
        }
        Commands::CheckConfig { path } => {
            let path = path.as_deref().or(cli.config.as_deref());
            let config = load_config(path)?;
            init_tracing(&cli, &config);
            cmd_check_config(&config, path)
        }
        Commands::Replay { script, json } => {
            let config = load_config(cli.config.as_deref())?;
            init_tracing(&cli, &config);
            cmd_replay(config, script, *json).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if let Some(remediation) = err
                .downcast_ref::<scenekeeper_core::Error>()
                .and_then(scenekeeper_core::Error::remediation)
            {
                eprint!("{}", remediation.render_plain());
            }
            ExitCode::FAILURE
        }
    }
}
