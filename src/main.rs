use std::process::ExitCode;

use clap::Parser;
use meeting_console::{
    api::routes::create_router,
    cli::{self, Cli, Command},
    config::Config,
    error::Result,
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match start(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", cli::error_line(err.as_ref()));
            ExitCode::FAILURE
        }
    }
}

async fn start(cli: Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(url) = &cli.backend_url {
        config = config.with_backend_url(url)?;
    }
    let state = AppState::new(config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        command => {
            let output: Result<String> = cli::run(&state.controller, command).await;
            println!("{}", output?);
            Ok(())
        }
    }
}

async fn serve(state: AppState) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let server_addr = state.config.server_addr;
    info!(%server_addr, backend = %state.config.backend_url, "starting console");

    let app = create_router(state);
    let listener = TcpListener::bind(server_addr).await?;

    info!(%server_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
