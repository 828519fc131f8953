mod cli;
mod infra;
mod report;
mod routes;
mod server;

use civic_pulse::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
