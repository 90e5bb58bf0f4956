#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Axum middleware for enforcing [x402](https://www.x402.org) payments on
//! protected routes.
//!
//! [`layer::X402Middleware`] verifies incoming `X-PAYMENT` headers against a
//! configured facilitator, runs the protected handler, and settles the
//! payment afterward — returning a `402 Payment Required` (JSON for API
//! clients, an HTML paywall for browsers) whenever a step fails.
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use axum::response::IntoResponse;
//! use http::StatusCode;
//! use x402_axum::facilitator_client::FacilitatorClient;
//! use x402_axum::layer::X402Middleware;
//! use x402_core::price::Price;
//! use x402_types::Network;
//!
//! # async fn build() -> Result<(), Box<dyn std::error::Error>> {
//! let facilitator = FacilitatorClient::new("https://facilitator.x402.rs")?;
//! let x402 = X402Middleware::try_new(
//!     facilitator,
//!     Price::Usd("$0.01".to_string()),
//!     "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA9604",
//!     Network::Base,
//! )?;
//!
//! let app: Router = Router::new().route(
//!     "/protected",
//!     get(my_handler).layer(x402.with_description("Access to /protected")),
//! );
//! # Ok(())
//! # }
//!
//! async fn my_handler() -> impl IntoResponse {
//!     (StatusCode::OK, "This is VIP content!")
//! }
//! ```
//!
//! See [`layer::X402Middleware`] for the full builder API and
//! [`facilitator_client::FacilitatorClient`] for direct facilitator access
//! (e.g. to implement discovery listings).

pub mod facilitator_client;
pub mod layer;
pub mod paywall;

pub use facilitator_client::{Facilitator, FacilitatorClient, FacilitatorClientError};
pub use layer::{X402Middleware, X402MiddlewareError, X402MiddlewareService};
pub use paywall::PaywallConfig;
