//! Minimal resource server gating `/protected` behind an x402 payment.
//!
//! Reads its configuration from the environment (optionally via a `.env`
//! file), matching the variables the protocol spec documents for a
//! reference server: `PORT`, `ADDRESS`, `NETWORK`, `FACILITATOR_URL`,
//! `ENDPOINT_PATH`.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum::http::StatusCode;
use clap::Parser;
use dotenvy::dotenv;
use x402_axum::facilitator_client::FacilitatorClient;
use x402_axum::layer::X402Middleware;
use x402_core::price::Price;

#[derive(Parser, Debug)]
struct Args {
    /// Address that receives settled payments.
    #[arg(long, env = "ADDRESS")]
    address: String,

    /// Network to price and settle on.
    #[arg(long, env = "NETWORK", default_value = "bsc-mainnet")]
    network: String,

    /// Remote facilitator base URL.
    #[arg(long, env = "FACILITATOR_URL", default_value = "https://facilitator.x402.rs")]
    facilitator_url: String,

    /// Path to gate behind payment.
    #[arg(long, env = "ENDPOINT_PATH", default_value = "/protected")]
    endpoint_path: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let network = x402_types::network::parse_network(&args.network)?;
    let facilitator = FacilitatorClient::new(&args.facilitator_url)?;

    let x402 = X402Middleware::try_new(
        facilitator,
        Price::Usd("$0.01".to_string()),
        args.address.clone(),
        network,
    )?
    .with_path(&args.endpoint_path)?
    .with_description("Access to protected content");

    let app = Router::new().route(&args.endpoint_path, get(protected_handler).layer(x402));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!(port = args.port, path = %args.endpoint_path, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn protected_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "message": "paid content unlocked" })))
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();
}
