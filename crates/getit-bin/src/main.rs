//! getit - a single-host persistent key/value store served over TCP.

mod app;
mod client;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use getit_config_and_utils::{init_logging, Config, Paths};

/// getit command-line interface.
#[derive(Parser)]
#[command(name = "getit")]
#[command(about = "Persistent key/value store over TCP")]
#[command(version)]
struct Cli {
    /// Runtime mode to execute
    #[arg(long, value_enum, default_value_t = RuntimeMode::Client)]
    runtime: RuntimeMode,

    /// TCP port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Name of the store file
    #[arg(long, default_value = "store")]
    store: String,

    /// Run in debug mode (verbose logs, mirrored to stderr)
    #[arg(long)]
    debug: bool,

    /// Disable the log file
    #[arg(long)]
    no_log: bool,

    /// Command verb and arguments (client mode)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RuntimeMode {
    Server,
    Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Paths::new(&cli.store).context("failed to resolve store paths")?;
    let config = Config::load(&paths).context("failed to load configuration")?;

    let level = if cli.debug {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let port = cli.port.unwrap_or(config.port);

    match cli.runtime {
        RuntimeMode::Server => {
            let _log_guard = init_logging(level, &paths, cli.debug, cli.no_log)
                .context("failed to initialize logging")?;
            app::run_server(paths, port).await
        }
        RuntimeMode::Client => {
            // the client logs to stderr in debug mode, never to the store log
            let _log_guard = init_logging(level, &paths, cli.debug, true)
                .context("failed to initialize logging")?;
            client::run_client(port, &cli.command).await
        }
    }
}
