use clap::Parser;
use credbroker::cli::{self, Cli};

#[tokio::main]
async fn main() {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    if let Err(e) = cli::run(Cli::parse()).await {
        tracing::error!(error = %e, "credbroker failed");
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
