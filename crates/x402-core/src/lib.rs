//! Price resolution and path matching shared by the x402 middleware and
//! client crates.
//!
//! This crate exists as a placeholder in the upstream workspace layout; it
//! is filled in here with the two leaf components that don't belong in
//! either the axum server crate or the reqwest client crate: converting a
//! human price into an atomic amount ([`price`]), and matching a request
//! path against a configured pattern ([`path`]).

pub mod path;
pub mod price;

pub use path::{InvalidPathPattern, PathPattern};
pub use price::{Price, PriceError, ResolvedPrice, TokenAmount};
