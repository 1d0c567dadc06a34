use berth::cli::{parse_args, run_command, version_line, CliCommand, USAGE};
use berth::config::EngineConfig;
use berth::engine::EngineClient;

use color_eyre::Result;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BERTH_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let command = parse_args(std::env::args());
    match &command {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            print!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Invalid(message) => {
            eprintln!("berth: {}\n\n{}", message, USAGE);
            std::process::exit(2);
        }
        CliCommand::Pull { .. } | CliCommand::Build(_) => {}
    }

    let engine = EngineClient::from_config(EngineConfig::from_env())?;
    tracing::debug!(base_url = %engine.config().base_url, "Engine client ready");

    if let Err(err) = run_command(command, &engine).await {
        tracing::debug!(code = err.error_code(), error = %err, "Command failed");
        eprintln!("berth: {}", err.status_message());
        if !err.is_cancelled() {
            eprintln!("hint: {}", err.recovery_hint());
        }
        std::process::exit(1);
    }

    Ok(())
}
