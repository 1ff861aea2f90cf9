mod cli;
mod infra;
mod render;
mod routes;
mod server;

use ctf_standings::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
