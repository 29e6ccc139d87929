use std::path::PathBuf;
use std::{env, fs, process};

use clap::{Parser, Subcommand};
use ossuary::config::{self, LOG_DIRECTIVES};
use ossuary::{ClientList, Engine, Error, FrameContext, HeadlessHost, Result, Trigger, UserAction};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command line arguments.
#[derive(Parser, Debug)]
#[clap(author, about, version, max_term_width = 80)]
struct Options {
    #[clap(subcommand)]
    pub subcommands: Subcommands,
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Validate an action list file.
    Check {
        /// Action list file, defaults to the configuration directory.
        path: Option<PathBuf>,
    },
    /// Print an action list file as JSON.
    Dump {
        /// Action list file, defaults to the configuration directory.
        path: Option<PathBuf>,
    },
    /// Run an action list against simulated clients.
    ///
    /// The resulting client states are printed as JSON.
    Run {
        /// JSON file with all managed clients.
        #[clap(long)]
        clients: PathBuf,
        /// Window the event is targeted at.
        #[clap(long)]
        target: Option<u32>,
        /// Part of the window the event happened on.
        #[clap(long, default_value = "none")]
        context: FrameContext,
        /// Action list source.
        program: String,
    },
}

pub fn main() {
    // Setup logging.
    let directives = env::var("RUST_LOG").unwrap_or(LOG_DIRECTIVES.into());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    FmtSubscriber::builder().with_env_filter(env_filter).with_line_number(true).init();

    if let Err(err) = run(Options::parse().subcommands) {
        eprintln!("\x1b[31merror\x1b[0m: {err}");
        process::exit(1);
    }
}

/// Execute a CLI subcommand.
fn run(subcommand: Subcommands) -> Result<()> {
    let mut engine = Engine::with_builtins();

    match subcommand {
        Subcommands::Check { path } => {
            let path = path.unwrap_or_else(config::action_file_path);
            let list = engine.parse_file(&path)?;
            println!("{}: {} entries", path.display(), list.len());
        },
        Subcommands::Dump { path } => {
            let path = path.unwrap_or_else(config::action_file_path);
            let list = engine.parse_file(&path)?;
            println!("{}", serde_json::to_string_pretty(&list)?);
        },
        Subcommands::Run { clients, target, context, program } => {
            let json = fs::read_to_string(&clients)
                .map_err(|source| Error::Io { path: clients.clone(), source })?;
            let mut host = HeadlessHost::new(ClientList::from_json(&json)?);
            let list = engine.parse_string(&program)?;

            let client = target.and_then(|window| {
                let client = host.clients.find(window);
                if client.is_none() {
                    warn!("ignoring unknown target window {window}");
                }
                client
            });

            let trigger = Trigger { context, client, ..Trigger::new(UserAction::None) };
            if engine.run_list(&mut host, &list, trigger) {
                // Simulated runs never receive any input.
                info!("cancelling interactive action");
                engine.interactive_cancel(&mut host);
            }

            println!("{}", serde_json::to_string_pretty(&host.clients.specs())?);

            engine.shutdown(&mut host);
        },
    }

    Ok(())
}
