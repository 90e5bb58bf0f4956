//! Resolves a human-facing [`Price`] into the atomic-unit amount, asset
//! address, and EIP-712 domain a [`PaymentRequirements`](x402_types::PaymentRequirements)
//! needs.
//!
//! The USD path is decimal-exact: a [`Decimal`] multiplication, never an
//! `f64`, so `"$0.001"` on a 6-decimal token always resolves to exactly
//! `1000`, not `999` or `1000.0000000001`.

use rust_decimal::Decimal;
use std::str::FromStr;
use x402_types::{Eip712Domain, Network};

/// A token amount already expressed in atomic units, alongside the asset it
/// denominates.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAmount {
    pub amount: String,
    pub asset_address: String,
    pub eip712: Eip712Domain,
}

/// A human-facing price: either a USD money value or an explicit token
/// amount.
#[derive(Debug, Clone, PartialEq)]
pub enum Price {
    /// `"$0.001"`, `"0.001"`, or a bare decimal value.
    Usd(String),
    Token(TokenAmount),
}

impl Price {
    pub fn usd(value: impl Into<String>) -> Self {
        Price::Usd(value.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("invalid price format: {price}")]
    InvalidPrice { price: String },
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(#[from] x402_types::ChainRegistryError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrice {
    pub atomic_amount: String,
    pub asset_address: String,
    pub eip712: Eip712Domain,
}

/// Converts `price` into `(atomicAmountString, assetAddress, eip712Domain)`
/// for `network`.
pub fn resolve(price: &Price, network: Network) -> Result<ResolvedPrice, PriceError> {
    match price {
        Price::Usd(raw) => resolve_usd(raw, network),
        Price::Token(token) => Ok(ResolvedPrice {
            atomic_amount: token.amount.clone(),
            asset_address: token.asset_address.clone(),
            eip712: token.eip712.clone(),
        }),
    }
}

fn resolve_usd(raw: &str, network: Network) -> Result<ResolvedPrice, PriceError> {
    let stripped = raw.strip_prefix('$').unwrap_or(raw);
    let amount = Decimal::from_str(stripped).map_err(|_| PriceError::InvalidPrice {
        price: raw.to_string(),
    })?;
    if amount.is_sign_negative() {
        return Err(PriceError::InvalidPrice {
            price: raw.to_string(),
        });
    }
    let token = x402_types::network::default_usdc(network);
    let scale = Decimal::from(10u64.pow(token.decimals as u32));
    let atomic = amount
        .checked_mul(scale)
        .ok_or_else(|| PriceError::InvalidPrice {
            price: raw.to_string(),
        })?;
    if atomic.fract() != Decimal::ZERO {
        return Err(PriceError::InvalidPrice {
            price: raw.to_string(),
        });
    }
    let atomic_amount = atomic
        .trunc()
        .to_string();
    Ok(ResolvedPrice {
        atomic_amount,
        asset_address: token.address.to_string(),
        eip712: Eip712Domain {
            name: token.name.to_string(),
            version: token.version.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_path_is_decimal_exact() {
        let resolved = resolve(&Price::usd("$0.001"), Network::BscMainnet).unwrap();
        assert_eq!(resolved.atomic_amount, "1000");
        assert_eq!(resolved.eip712.name, "USDC");
        assert_eq!(resolved.eip712.version, "2");
    }

    #[test]
    fn usd_path_accepts_bare_decimal_without_dollar_sign() {
        let resolved = resolve(&Price::usd("0.01"), Network::Base).unwrap();
        assert_eq!(resolved.atomic_amount, "10000");
    }

    #[test]
    fn usd_path_rejects_negative_amounts() {
        assert!(matches!(
            resolve(&Price::usd("-0.01"), Network::Base),
            Err(PriceError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn usd_path_rejects_garbage() {
        assert!(matches!(
            resolve(&Price::usd("not a price"), Network::Base),
            Err(PriceError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn token_path_is_a_passthrough() {
        let token = TokenAmount {
            amount: "500".into(),
            asset_address: "0xasset".into(),
            eip712: Eip712Domain {
                name: "Custom".into(),
                version: "1".into(),
            },
        };
        let resolved = resolve(&Price::Token(token.clone()), Network::Base).unwrap();
        assert_eq!(resolved.atomic_amount, token.amount);
        assert_eq!(resolved.asset_address, token.asset_address);
        assert_eq!(resolved.eip712, token.eip712);
    }
}
