use std::process::ExitCode;

use hemmer_provider_resend::{init_logging, serve, ResendProvider};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Resend provider");

    match serve(ResendProvider::new()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Provider exited with an error");
            ExitCode::FAILURE
        },
    }
}
