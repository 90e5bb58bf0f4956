#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Umbrella crate for the x402 HTTP 402 payment protocol: wire types, price
//! and path resolution, EIP-3009 signing, and the Axum server / reqwest
//! client integrations.
//!
//! Most applications only need one of the sub-crates directly
//! ([`x402-axum`](https://docs.rs/x402-axum) for a resource server,
//! [`x402-reqwest`](https://docs.rs/x402-reqwest) for a paying client).
//! This crate re-exports the pieces that come up regardless of which side
//! of the protocol you're implementing.

pub use x402_core::{InvalidPathPattern, PathPattern, Price, PriceError, ResolvedPrice};
pub use x402_eip155::{SignerLike, SigningError, sign_payment_header};
pub use x402_types::{
    AtomicAmount, Network, PaymentPayload, PaymentRequirements, UnixTimestamp, X402_VERSION,
    codec,
};

pub mod axum {
    //! Re-export of [`x402_axum`], the Axum server middleware.
    pub use x402_axum::*;
}

pub mod reqwest {
    //! Re-export of [`x402_reqwest`], the reqwest client middleware.
    pub use x402_reqwest::*;
}
