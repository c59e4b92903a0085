//! Hopscotch command line
//!
//! Replays recorded browser event scripts through the history engine and
//! prints the resulting tree.

mod replay;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use hopscotch_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("hopscotch")
        .version(hopscotch_core::VERSION)
        .about("Browsing-history tree engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("replay")
                .about("Replay a JSON event script and print the resulting tree")
                .arg(
                    Arg::new("script")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to the script (JSON array of steps)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Engine configuration (JSON)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("replay", args)) => {
            let script = args
                .get_one::<PathBuf>("script")
                .context("missing script path")?;
            let config = args
                .get_one::<PathBuf>("config")
                .map_or_else(Config::default, |path| Config::load_or_default(path));

            let steps = replay::load_script(script)?;
            tracing::info!("Replaying {} steps from {}", steps.len(), script.display());
            let outcome = replay::run(&steps, config).await;

            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&outcome.summary())?);
            } else {
                print!("{}", outcome.render_text());
            }

            if outcome.failures > 0 {
                tracing::warn!("{} steps could not be applied", outcome.failures);
            }
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}
