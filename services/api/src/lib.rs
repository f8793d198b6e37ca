mod cli;
mod infra;
mod pipeline;
mod routes;
mod server;

use iv_housing::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
