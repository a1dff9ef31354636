use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    rxguard::init_tracing();

    match rxguard::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("RxGuard failed to start: {e}");
            ExitCode::FAILURE
        }
    }
}
