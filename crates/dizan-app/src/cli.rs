use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Dizan: a therapist-persona chat service backed by Gemini.
#[derive(Parser, Debug)]
#[command(name = "dizan", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error) or a full
    /// filter directive.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the chat page over HTTP (default).
    Serve {
        /// Interface to bind, overriding `server.host`.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overriding `server.port`.
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
    },
    /// Chat in the terminal, one question per line.
    Chat,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            host: None,
            port: None,
        })
    }
}

pub fn parse() -> Args {
    Args::parse()
}
