//! Command-line front end.
//!
//! `main` parses arguments with [`parse_args`], then hands pull and build
//! commands to [`run_command`], which streams progress to stdout until the
//! operation ends or the user presses Ctrl-C.
//!
//! ```ignore
//! use berth::cli::{parse_args, run_command, CliCommand};
//!
//! let command = parse_args(std::env::args());
//! let engine = EngineClient::from_config(EngineConfig::from_env())?;
//! run_command(command, &engine).await?;
//! ```

pub mod args;
pub mod output;
pub mod version;

pub use args::{parse_args, BuildOptions, CliCommand, USAGE};
pub use output::{format_bytes, BuildPrinter, PullPrinter};
pub use version::{version_line, VERSION};

use std::future::Future;

use crate::engine::{BuildRequest, EngineClient, OperationHandle};
use crate::error::{BerthError, BerthResult, ErrorContext, ResultExt};
use crate::progress::{BuildStatus, PullStatus};
use crate::traits::HttpClient;

/// Execute a pull or build command against `engine`.
///
/// Version, help and invalid commands are handled by the caller and
/// return a configuration error here.
pub async fn run_command<C>(command: CliCommand, engine: &EngineClient<C>) -> BerthResult<()>
where
    C: HttpClient + 'static,
{
    match command {
        CliCommand::Pull { image } => {
            let handle = engine.start_pull(&image, PullPrinter::new())?;
            let status = wait_or_cancel(&handle, ctrl_c(), || engine.cancel_pull(&handle.token()))
                .await?;
            println!("{}", pull_summary(&image, &status));
            Ok(())
        }
        CliCommand::Build(options) => {
            let recipe = tokio::fs::read_to_string(&options.recipe_path)
                .await
                .map_err(|err| BerthError::System {
                    message: format!("cannot read {}: {}", options.recipe_path.display(), err),
                })
                .with_context(|| ErrorContext::new("read_recipe"))?;
            let handle = engine.build_image(build_request(recipe, options), BuildPrinter::new());
            let status =
                wait_or_cancel(&handle, ctrl_c(), || engine.cancel_build(&handle.token())).await?;
            println!("{}", build_summary(&status));
            Ok(())
        }
        other => Err(BerthError::config(format!("not an engine command: {:?}", other))),
    }
}

fn build_request(recipe: String, options: BuildOptions) -> BuildRequest {
    let mut request = BuildRequest::new(recipe)
        .with_tag(options.tag)
        .with_no_cache(options.no_cache)
        .with_pull_latest(options.pull_latest);
    request.build_args = options.build_args;
    request
}

/// Wait for `handle`, cancelling the operation once if `interrupt` fires
/// first. After cancelling, the terminal outcome is still awaited.
pub async fn wait_or_cancel<S, I, F>(
    handle: &OperationHandle<S>,
    interrupt: I,
    cancel: F,
) -> BerthResult<S>
where
    S: Clone + Send + Sync + 'static,
    I: Future<Output = ()>,
    F: FnOnce() -> bool,
{
    tokio::select! {
        result = handle.wait() => return result,
        _ = interrupt => {}
    }

    eprintln!("Cancelling...");
    if !cancel() {
        tracing::debug!(token = %handle.token(), "Operation ended before cancel");
    }
    handle.wait().await
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

fn pull_summary(image: &str, status: &PullStatus) -> String {
    format!(
        "Pulled {} ({} layers, {})",
        image,
        status.overall.layer_count,
        format_bytes(status.overall.total_bytes)
    )
}

fn build_summary(status: &BuildStatus) -> String {
    match &status.image_id {
        Some(id) => format!("Built {}", id),
        None => "Build finished".to_string(),
    }
}
