mod boot;
mod cli;
mod render;
mod repl;
mod server;

use std::path::Path;

use dizan_common::DizanError;
use dizan_config::DizanConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Command;

/// Filter directive from the CLI, else the configured level for our crates.
fn log_directive(cli_level: Option<&str>, config: Option<&DizanConfig>) -> String {
    match cli_level {
        Some(level) if level.contains('=') => level.to_string(),
        Some(level) => format!("dizan={level},dizan_ai={level},dizan_config={level}"),
        None => {
            let level = config.map(|c| c.logging.level.as_str()).unwrap_or("info");
            format!("dizan={level},dizan_ai={level},dizan_config={level}")
        }
    }
}

fn init_logging(directive: &str) {
    let mut filter = EnvFilter::from_default_env();
    for part in directive.split(',') {
        match part.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("ignoring log directive {part:?}: {e}"),
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: cli::Args, dotenv_vars: usize) -> Result<(), DizanError> {
    let config = dizan_config::load_config(args.config.as_deref());
    init_logging(&log_directive(
        args.log_level.as_deref(),
        config.as_ref().ok(),
    ));

    tracing::info!("Dizan v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::debug!(dotenv_vars, "Environment loaded");
    let mut config = config?;
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }

    let api_key = dizan_config::api_key_from_env()?;
    let runtime = boot::boot(&config, api_key).await?;

    match args.command() {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(&config.server, runtime).await
        }
        Command::Chat => repl::run(runtime).await,
    }
}

fn main() {
    // .env goes first, before any threads exist, so RUST_LOG and the API key
    // can come from it
    let dotenv_vars = dizan_config::credentials::load_dotenv(Path::new(".env"));

    let args = cli::parse();

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(DizanError::from)
        .and_then(|rt| rt.block_on(run(args, dotenv_vars)));

    if let Err(e) = result {
        tracing::error!(error = %e, "Fatal error");
        eprintln!("dizan: {e}");
        std::process::exit(1);
    }
}
