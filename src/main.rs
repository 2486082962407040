//! Runs the relay HTTP server configured from the environment.

// crates.io
use color_eyre::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
// self
use oauth2_relay::{
	config::RelayConfig,
	flows::ReqwestRelay,
	server::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	dotenvy::dotenv().ok();

	init_tracing();

	tracing::info!(version = env!("CARGO_PKG_VERSION"), "oauth2-relay starting");

	let config = RelayConfig::from_env()?;
	let relay = ReqwestRelay::from_config(&config)?;
	let listener = TcpListener::bind(config.bind).await?;

	server::serve(listener, server::router(AppState::new(relay))).await?;

	Ok(())
}

fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).init();
}
