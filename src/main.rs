mod ai;
mod app;
mod cli;
mod config;
mod document;
mod domain;
mod infrastructure;
mod mail;
mod render;
mod resume;
mod server;
mod tasks;
#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use infrastructure::{directories, logging};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::Cli::parse();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let app = app::JobMailApp::new(config, paths)?;
    app.run(cli.command).await
}
