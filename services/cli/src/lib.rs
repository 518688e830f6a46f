mod cli;
mod commands;
mod infra;

use career_compass::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
