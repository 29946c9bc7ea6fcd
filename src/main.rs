use clap::Parser;
use std::process::ExitCode;

use folio::{cli, logging};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let cli = cli::Cli::parse();
    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}
