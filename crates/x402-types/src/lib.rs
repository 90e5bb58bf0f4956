//! Wire types, chain registry, codec, and timestamp handling for the x402
//! payment protocol.
//!
//! This crate is the shared vocabulary between the server middleware
//! ([`x402-axum`](https://docs.rs/x402-axum)), the client interceptor
//! ([`x402-reqwest`](https://docs.rs/x402-reqwest)), and the authorization
//! signer ([`x402-eip155`](https://docs.rs/x402-eip155)): none of those
//! crates define their own copy of `PaymentRequirements` or the chain table.
//!
//! # Modules
//!
//! - [`payment`] — wire types: `PaymentRequirements`, `PaymentPayload`,
//!   `VerifyResponse`, `SettleResponse`, discovery types.
//! - [`network`] — the closed network/chain-id/token registry.
//! - [`codec`] — base64-framed JSON encode/decode and hex normalization.
//! - [`timestamp`] — `UnixTimestamp`, serialized as a stringified integer.

pub mod codec;
pub mod network;
pub mod payment;
pub mod timestamp;

pub use network::{ChainRegistryError, Network, TokenInfo};
pub use payment::{
    AtomicAmount, DiscoveredResource, DiscoveryResourcesPagination, Eip3009Authorization,
    Eip712Domain, ExactPaymentPayload, HttpInputSchema, HttpMethod, HttpRequestStructure,
    ListDiscoveryResourcesRequest, ListDiscoveryResourcesResponse, OutputSchema, PaymentPayload,
    PaymentRequiredResponse, PaymentRequirements, SettleResponse, VerifyResponse, X402_VERSION,
};
pub use timestamp::UnixTimestamp;
