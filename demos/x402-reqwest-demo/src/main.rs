//! Minimal client that pays for a protected resource automatically.
//!
//! Reads `PRIVATE_KEY` and `RESOURCE_SERVER_URL`/`ENDPOINT_PATH` from the
//! environment (optionally via a `.env` file), signs whatever `exact`
//! payment the server requests, and prints the response body.

use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use dotenvy::dotenv;
use reqwest::Client;
use x402_reqwest::{ReqwestWithPayments, ReqwestWithPaymentsBuild, X402Payments};

#[derive(Parser, Debug)]
struct Args {
    /// Hex-encoded private key of the paying wallet.
    #[arg(long, env = "PRIVATE_KEY")]
    private_key: String,

    /// Base URL of the resource server.
    #[arg(long, env = "RESOURCE_SERVER_URL", default_value = "http://localhost:3000")]
    resource_server_url: String,

    /// Path of the protected resource.
    #[arg(long, env = "ENDPOINT_PATH", default_value = "/protected")]
    endpoint_path: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let signer: PrivateKeySigner = args.private_key.parse()?;

    let payments = X402Payments::with_signer(signer);
    let client = Client::new().with_payments(payments).build();

    let url = format!("{}{}", args.resource_server_url, args.endpoint_path);
    let response = client.get(&url).send().await?;
    tracing::info!(status = %response.status(), "received response");
    let body = response.text().await?;
    println!("{body}");
    Ok(())
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
