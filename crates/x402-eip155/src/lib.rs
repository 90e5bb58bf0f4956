//! Builds and signs the EIP-3009 `TransferWithAuthorization` authorization
//! that backs the x402 `exact` scheme, and frames it into an `X-PAYMENT`
//! header value.
//!
//! The underlying EIP-712 signing primitive (turning a private key and a
//! digest into a signature) is treated as a black box here, supplied
//! through [`SignerLike`] — this crate only builds the typed-data structure,
//! manages the nonce and time window, and hands the digest to the signer.

use alloy_primitives::{Address, FixedBytes, Signature, U256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolStruct, sol, eip712_domain};
use async_trait::async_trait;
use rand::{Rng, rng};
use std::str::FromStr;
use std::sync::Arc;
use x402_types::{
    Eip3009Authorization, ExactPaymentPayload, PaymentPayload, PaymentRequirements,
    UnixTimestamp, X402_VERSION, codec,
};

sol! {
    #[derive(Debug)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

/// Absorbs clock skew between the signer and the verifier: the
/// authorization's `validAfter` is backdated by this much relative to the
/// moment of signing.
pub const VALID_AFTER_BACKDATE_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("unsupported scheme: {0} (only \"exact\" is supported)")]
    UnsupportedScheme(String),
    #[error("invalid address {address:?} in payment requirements")]
    InvalidAddress {
        address: String,
        #[source]
        source: alloy_primitives::AddressError,
    },
    #[error("the key-holder refused to sign")]
    SignerRefused(#[source] alloy_signer::Error),
}

/// Abstracts over an owned [`PrivateKeySigner`] and an `Arc`-wrapped signer,
/// since alloy's `Signer` trait is not implemented for `Arc<T>` but callers
/// sharing one signer across concurrent requests need to clone a handle to
/// it.
#[async_trait]
pub trait SignerLike {
    fn address(&self) -> Address;
    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error>;
}

#[async_trait]
impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

#[async_trait]
impl<T: SignerLike + Send + Sync> SignerLike for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_hash(hash).await
    }
}

/// Builds and signs an `X-PAYMENT` header value for `requirements`, using
/// `signer` as the key-holder.
///
/// Algorithm (matches the protocol's authorization-signer component
/// exactly):
/// 1. Draw a fresh 32-byte nonce from the process CSPRNG.
/// 2. `validAfter = now - 60s`, `validBefore = now + maxTimeoutSeconds`.
/// 3. Build the EIP-712 domain from `requirements.extra` (name/version) and
///    the requirement's network/asset.
/// 4. Sign the `TransferWithAuthorization` digest.
/// 5. Frame the signed envelope via [`x402_types::codec`].
pub async fn sign_payment_header<S: SignerLike + Sync + ?Sized>(
    signer: &S,
    requirements: &PaymentRequirements,
) -> Result<String, SigningError> {
    if requirements.scheme != "exact" {
        return Err(SigningError::UnsupportedScheme(requirements.scheme.clone()));
    }

    let asset_address =
        Address::from_str(&requirements.asset).map_err(|source| SigningError::InvalidAddress {
            address: requirements.asset.clone(),
            source: alloy_primitives::AddressError::Hex(source),
        })?;
    let pay_to =
        Address::from_str(&requirements.pay_to).map_err(|source| SigningError::InvalidAddress {
            address: requirements.pay_to.clone(),
            source: alloy_primitives::AddressError::Hex(source),
        })?;
    let amount = U256::from(requirements.max_amount_required.value());

    let (name, version) = match &requirements.extra {
        Some(domain) => (domain.name.clone(), domain.version.clone()),
        None => (String::new(), String::new()),
    };
    let chain_id = requirements.network.chain_id();

    let domain = eip712_domain! {
        name: name,
        version: version,
        chain_id: chain_id,
        verifying_contract: asset_address,
    };

    let now = UnixTimestamp::now();
    let valid_after = now.saturating_sub(VALID_AFTER_BACKDATE_SECS);
    let valid_before = now + requirements.max_timeout_seconds;
    let nonce: [u8; 32] = rng().random();
    let nonce_fixed = FixedBytes(nonce);

    let typed = TransferWithAuthorization {
        from: signer.address(),
        to: pay_to,
        value: amount,
        validAfter: U256::from(valid_after.as_secs()),
        validBefore: U256::from(valid_before.as_secs()),
        nonce: nonce_fixed,
    };

    let digest = typed.eip712_signing_hash(&domain);
    let signature = signer
        .sign_hash(&digest)
        .await
        .map_err(SigningError::SignerRefused)?;

    let authorization = Eip3009Authorization {
        from: signer.address().to_string(),
        to: pay_to.to_string(),
        value: requirements.max_amount_required.clone(),
        valid_after,
        valid_before,
        nonce: codec::to_hex_0x(&nonce),
    };

    let payload = PaymentPayload {
        x402_version: X402_VERSION,
        scheme: requirements.scheme.clone(),
        network: requirements.network,
        payload: ExactPaymentPayload {
            signature: codec::to_hex_0x(signature.as_bytes().as_slice()),
            authorization,
        },
    };

    Ok(codec::encode(&payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use x402_types::{
        AtomicAmount, Eip712Domain, HttpMethod, HttpRequestStructure, Network, OutputSchema,
    };

    fn sample_requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: Network::BscMainnet,
            max_amount_required: AtomicAmount::new(1000),
            resource: "https://example.com/protected".into(),
            description: "".into(),
            mime_type: "".into(),
            output_schema: Some(OutputSchema {
                input: HttpRequestStructure::new(HttpMethod::GET, true),
                output: None,
            }),
            pay_to: "0x0000000000000000000000000000000000000001".into(),
            max_timeout_seconds: 60,
            asset: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".into(),
            extra: Some(Eip712Domain {
                name: "USDC".into(),
                version: "2".into(),
            }),
        }
    }

    #[tokio::test]
    async fn signs_and_frames_a_payment_header() {
        let signer = PrivateKeySigner::random();
        let requirements = sample_requirements();
        let header = sign_payment_header(&signer, &requirements).await.unwrap();

        let decoded: PaymentPayload = codec::decode(&header).unwrap();
        assert_eq!(decoded.x402_version, X402_VERSION);
        assert_eq!(decoded.scheme, "exact");
        assert_eq!(decoded.network, Network::BscMainnet);
        assert!(decoded.payload.signature.starts_with("0x"));
        assert!(decoded.payload.authorization.nonce.starts_with("0x"));
        assert_eq!(decoded.payload.authorization.nonce.len(), 2 + 64);
    }

    #[tokio::test]
    async fn time_window_absorbs_clock_skew() {
        let signer = PrivateKeySigner::random();
        let requirements = sample_requirements();
        let before = UnixTimestamp::now();
        let header = sign_payment_header(&signer, &requirements).await.unwrap();
        let decoded: PaymentPayload = codec::decode(&header).unwrap();

        assert!(decoded.payload.authorization.valid_after.as_secs() <= before.as_secs());
        assert!(
            decoded.payload.authorization.valid_before.as_secs()
                >= before.as_secs() + requirements.max_timeout_seconds
        );
    }

    #[tokio::test]
    async fn two_successive_nonces_differ() {
        let signer = PrivateKeySigner::random();
        let requirements = sample_requirements();
        let header_a = sign_payment_header(&signer, &requirements).await.unwrap();
        let header_b = sign_payment_header(&signer, &requirements).await.unwrap();
        let a: PaymentPayload = codec::decode(&header_a).unwrap();
        let b: PaymentPayload = codec::decode(&header_b).unwrap();
        assert_ne!(a.payload.authorization.nonce, b.payload.authorization.nonce);
    }

    #[tokio::test]
    async fn rejects_non_exact_scheme() {
        let signer = PrivateKeySigner::random();
        let mut requirements = sample_requirements();
        requirements.scheme = "upto".into();
        let err = sign_payment_header(&signer, &requirements).await.unwrap_err();
        assert!(matches!(err, SigningError::UnsupportedScheme(_)));
    }
}
