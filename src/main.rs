use crate::config::{Cli, Settings};
use crate::server::{bootstrap, create_server, run_server, server_config};
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod agents;
pub mod chat;
pub mod config;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod result_format;
pub mod search;
pub mod server;
pub mod tool;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = server_config(rocket::Config::figment().merge(("port", cli.port)))?;
    let context = bootstrap(Settings::from_env()).await;

    run_server(create_server(context).configure(config)).await?;
    Ok(())
}
