//! Development HTTP echo server.
//!
//! Mirrors request bodies back to the caller, for testing webhooks and API
//! clients.
//!
//! # Request Flow
//!
//! ```text
//!     Client Request
//!     ──────────────▶ ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌────────────┐
//!                     │ Recover  │──▶│ Security │──▶│ Access log │──▶│    Echo    │
//!     ◀────────────── │ (panic → │◀──│ headers  │◀──│ (id, body, │◀──│  handler   │
//!     Client Response │   500)   │   │          │   │  timing)   │   │            │
//!                     └──────────┘   └──────────┘   └─────┬──────┘   └────────────┘
//!                                                         │
//!                                                         ▼
//!                                                log/access-YYYY-MM-DD.log
//! ```
//!
//! # Configuration
//! - `PORT`: listen port (default 3000)
//! - `NODE_ENV`: `development` adds a console line per request
//! - `LOG_DIR`: access log directory (default `log`)
//!
//! A `.env` file in the working directory supplies any of these that the
//! environment leaves unset.

use std::path::PathBuf;

use clap::Parser;

use dev_echo_server::config::{load_config, load_dotenv, Overrides};
use dev_echo_server::lifecycle::{signals, startup};
use dev_echo_server::observability::logging;
use dev_echo_server::Shutdown;

#[derive(Parser)]
#[command(name = "dev-echo-server")]
#[command(about = "HTTP echo server for testing webhooks and API clients", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port (overrides PORT and the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Access log directory (overrides LOG_DIR and the config file)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let dotenv = load_dotenv();

    let overrides = Overrides {
        port: cli.port,
        log_dir: cli.log_dir,
    };
    let config = load_config(cli.config.as_deref(), &overrides)?;

    logging::init(&config.logging);
    dotenv.log();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.listener.port,
        mode = %config.logging.mode,
        log_dir = %config.logging.dir.display(),
        "dev-echo-server starting"
    );

    let shutdown = Shutdown::new();
    signals::forward_signals(shutdown.clone());

    startup::start(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
