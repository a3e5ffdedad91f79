//! `viewport-query`: run a viewport feature query over a JSON scene from the command line

mod error;
mod metadata;
mod run;
mod scene;
mod settings;

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    metadata::log_version_info();
    let settings = settings::Settings::from_cli();

    let stdout = std::io::stdout();
    match run::run(&settings, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
