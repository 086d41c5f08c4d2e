use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match listings_backend::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("listings-backend failed to start: {}", e);
            ExitCode::FAILURE
        }
    }
}
