mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use bid_portal::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
