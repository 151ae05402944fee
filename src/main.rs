//! emotion-net - command-line entry point
//!
//! Logs go to stderr; stdout carries only the prediction lines.

use clap::Parser;
use emotion_net::cli::{cmd_run, Cli};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emotion_net=info".into()),
        )
        .init();

    let cli = Cli::parse();
    cmd_run(&cli)
}
