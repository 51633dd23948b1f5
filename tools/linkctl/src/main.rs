//! Linkchain message tool
//!
//! Usage:
//!   linkctl decode "10+12+11|data 1||data 3"
//!   linkctl decode "-7001+5|ping" --listen --json
//!   linkctl encode --state 10 --state 12 --arg "data 1"
//!   linkctl check config/linkchain.toml --env prod
//!   linkctl trace config/linkchain.toml --slot 10 --message "12+11|x"

mod render;
mod trace;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linkchain_codec::{MessageBuilder, StateId, WorkingState};
use linkchain_config::{defaults, ChainConfig};
use render::{assignments_text, DecodedView};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use trace::{run_trace, TraceEnd};

#[derive(Parser, Debug)]
#[command(name = "linkctl")]
#[command(about = "Inspect, build and trace linkchain messages")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a raw message and show the working state
    Decode {
        /// Raw `CONTROL|DATA` text
        #[arg(allow_hyphen_values = true)]
        raw: String,

        /// Decode on the listener path (head is the channel)
        #[arg(long)]
        listen: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Build a message, rejecting reserved characters and zero ids
    Encode {
        /// Control sequence, in order
        #[arg(short, long = "state", allow_hyphen_values = true)]
        states: Vec<i32>,

        /// Data stack, top first
        #[arg(short, long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Load and validate a configuration
    Check {
        config: PathBuf,

        /// Environment overlay name
        #[arg(short, long)]
        env: Option<String>,
    },
    /// Run a message through tracing actors built from a configuration
    Trace {
        config: PathBuf,

        /// Environment overlay name
        #[arg(short, long)]
        env: Option<String>,

        /// State id the message is delivered to
        #[arg(long, allow_hyphen_values = true)]
        slot: i32,

        /// Payload the slot's owner decodes
        #[arg(short, long, allow_hyphen_values = true)]
        message: String,

        /// Give up after this many milliseconds
        #[arg(long, default_value_t = defaults::runtime::TRACE_TIMEOUT_MS)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;
    debug!(command = ?args.command, "Starting linkctl");

    match args.command {
        Command::Decode { raw, listen, json } => {
            let state = if listen {
                WorkingState::decode_listen(&raw)
            } else {
                WorkingState::decode(&raw)
            };
            let view = DecodedView::from(&state);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", view.to_text());
            }
        }
        Command::Encode { states, args } => {
            let wire = MessageBuilder::new()
                .then_all(states)
                .args(args)
                .build()
                .context("Cannot encode message")?;
            println!("{}", wire);
        }
        Command::Check { config, env } => {
            let config = ChainConfig::load(Some(&config), env.as_deref())?;
            let assignments = config.validate()?;
            info!(states = assignments.states.len(), "Configuration is valid");
            print!("{}", assignments_text(&assignments));
        }
        Command::Trace {
            config,
            env,
            slot,
            message,
            timeout_ms,
        } => {
            let config = ChainConfig::load(Some(&config), env.as_deref())?;
            let slot = StateId::try_from(slot).context("Slot must be a non-zero state id")?;
            let report = run_trace(&config, slot, &message, Duration::from_millis(timeout_ms)).await?;
            for hop in &report.hops {
                println!("{:<12} {:<16} next={:<6} data={}", hop.actor, hop.entry.to_string(), hop.next, hop.data);
            }
            match report.end {
                TraceEnd::Terminal => println!("pipeline stopped at terminal hop"),
                TraceEnd::Dropped => println!("pipeline dropped: a hop named a slot no actor owns"),
            }
        }
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encode_with_repeated_flags() {
        let args = Args::try_parse_from([
            "linkctl", "encode", "--state", "10", "--state", "-3", "--arg", "a", "--arg", "",
        ])
        .unwrap();
        match args.command {
            Command::Encode { states, args } => {
                assert_eq!(states, vec![10, -3]);
                assert_eq!(args, vec!["a".to_string(), String::new()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_decode_negative_head() {
        let args = Args::try_parse_from(["linkctl", "decode", "-7001+5|ping", "--listen"]).unwrap();
        assert!(matches!(args.command, Command::Decode { listen: true, json: false, .. }));
    }

    #[test]
    fn test_parse_trace_defaults() {
        let args = Args::try_parse_from([
            "linkctl", "trace", "chain.toml", "--slot", "10", "--message", "12|x",
        ])
        .unwrap();
        match args.command {
            Command::Trace { slot, timeout_ms, env, .. } => {
                assert_eq!(slot, 10);
                assert_eq!(timeout_ms, defaults::runtime::TRACE_TIMEOUT_MS);
                assert!(env.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(args.log_level, "warn");
    }
}
