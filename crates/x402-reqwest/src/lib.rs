#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `reqwest` middleware for automatic [x402](https://www.x402.org) payment
//! handling.
//!
//! [`X402Payments`] is a [`reqwest_middleware::Middleware`] that pays a
//! `402 Payment Required` challenge transparently: it signs an EIP-3009
//! authorization for a server-selected requirement and retries the
//! request exactly once with the resulting `X-PAYMENT` header.
//!
//! ```rust,no_run
//! use alloy_signer_local::PrivateKeySigner;
//! use reqwest::Client;
//! use x402_reqwest::{ReqwestWithPayments, ReqwestWithPaymentsBuild, X402Payments};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let signer: PrivateKeySigner = std::env::var("PRIVATE_KEY")?.parse()?;
//! let payments = X402Payments::with_signer(signer).with_max_value(1_000_000);
//!
//! let client = Client::new().with_payments(payments).build();
//! let response = client.get("https://api.example.com/protected").send().await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```
//!
//! By default any network and any amount the server proposes is accepted;
//! call [`X402Payments::with_max_value`], [`X402Payments::with_network_filter`]
//! or [`X402Payments::with_scheme_filter`] to narrow that before pointing
//! this at an untrusted server.

mod builder;
mod middleware;

pub use builder::{ReqwestWithPayments, ReqwestWithPaymentsBuild, ReqwestWithPaymentsBuilder};
pub use middleware::{X402Payments, X402PaymentsError, default_payment_requirements_selector};
