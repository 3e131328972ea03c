use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use sudoku_client::{load_env_file, Config, StartupArgs};

fn main() -> Result<()> {
    // Env files first so a RUST_LOG they set reaches the logger
    let env_file_path = std::env::var("ENV_FILE_PATH").ok();
    let env_file = load_env_file(env_file_path.as_deref());

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    match &env_file {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => error!("Could not load environment file: {}", e),
    }

    let args = StartupArgs::parse();

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e).context("solver environment configuration is invalid");
        }
    };

    let report = config
        .report(args.format)
        .context("failed to render configuration report")?;
    println!("{}", report);

    Ok(())
}
