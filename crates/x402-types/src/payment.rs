//! Wire-level payment types.
//!
//! Every struct here mirrors the camelCase JSON shape described in the
//! protocol: `#[serde(rename_all = "camelCase")]` everywhere, `Network`
//! serializing as its bare wire name, and integer-bearing fields that are
//! nonetheless transported as decimal strings carried as validated newtypes
//! rather than bare `String`.

use crate::network::Network;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// An unsigned 256-bit-range integer amount, transported as a decimal
/// string. Used for `maxAmountRequired` and `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicAmount(u128);

#[derive(Debug, thiserror::Error)]
#[error("amount must be an integer encoded as a string, got {0:?}")]
pub struct InvalidAtomicAmount(String);

impl AtomicAmount {
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u128 {
        self.0
    }
}

impl FromStr for AtomicAmount {
    type Err = InvalidAtomicAmount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>()
            .map(AtomicAmount)
            .map_err(|_| InvalidAtomicAmount(s.to_string()))
    }
}

impl std::fmt::Display for AtomicAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AtomicAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for AtomicAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::network::parse_network(&raw).map_err(serde::de::Error::custom)
    }
}

/// `decimals ∈ [0, 255]`, so a bare `u8` already enforces the validator; kept
/// as an alias for readability at call sites.
pub type Decimals = u8;

/// EIP-712 domain fields recorded under `extra` on a [`PaymentRequirements`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
}

/// HTTP method recorded under `outputSchema.input.method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    OPTIONS,
    HEAD,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
        };
        f.write_str(s)
    }
}

/// The request-shape description nested under `outputSchema.input`.
///
/// Only `type`, `method`, and `discoverable` are populated by the
/// middleware itself (§4.H); the remaining fields exist so a caller building
/// `PaymentRequirements` directly (or a future middleware extension) can
/// describe richer discovery metadata, per the Python reference's
/// `HTTPInputSchema`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpInputSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<std::collections::HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fields: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequestStructure {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub method: HttpMethod,
    pub discoverable: bool,
    #[serde(flatten)]
    pub input: HttpInputSchema,
}

impl HttpRequestStructure {
    pub fn new(method: HttpMethod, discoverable: bool) -> Self {
        Self {
            kind: "http",
            method,
            discoverable,
            input: HttpInputSchema::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpRequestStructureWire {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    kind: String,
    method: HttpMethod,
    discoverable: bool,
    #[serde(flatten)]
    input: HttpInputSchema,
}

impl<'de> Deserialize<'de> for HttpRequestStructure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = HttpRequestStructureWire::deserialize(deserializer)?;
        Ok(HttpRequestStructure {
            kind: "http",
            method: wire.method,
            discoverable: wire.discoverable,
            input: wire.input,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSchema {
    pub input: HttpRequestStructure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

/// One payment option the server will accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: Network,
    pub max_amount_required: AtomicAmount,
    pub resource: String,
    pub description: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<OutputSchema>,
    pub pay_to: String,
    pub max_timeout_seconds: u64,
    pub asset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Eip712Domain>,
}

/// The body of a 402 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredResponse {
    pub x402_version: u8,
    pub accepts: Vec<PaymentRequirements>,
    pub error: String,
}

/// The signed token-transfer authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip3009Authorization {
    pub from: String,
    pub to: String,
    pub value: AtomicAmount,
    pub valid_after: crate::timestamp::UnixTimestamp,
    pub valid_before: crate::timestamp::UnixTimestamp,
    /// `0x`-prefixed 32-byte nonce. Always rendered with the prefix; see
    /// [`crate::codec`] for the byte <-> hex boundary.
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactPaymentPayload {
    pub signature: String,
    pub authorization: Eip3009Authorization,
}

/// The framed envelope carried in the `X-PAYMENT` request header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u8,
    pub scheme: String,
    pub network: Network,
    pub payload: ExactPaymentPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyResponse {
    pub is_valid: bool,
    pub invalid_reason: Option<String>,
    pub payer: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponseWire {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
}

impl Serialize for VerifyResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        VerifyResponseWire {
            is_valid: self.is_valid,
            invalid_reason: self.invalid_reason.clone(),
            payer: self.payer.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerifyResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = VerifyResponseWire::deserialize(deserializer)?;
        Ok(VerifyResponse {
            is_valid: wire.is_valid,
            invalid_reason: wire.invalid_reason,
            payer: wire.payer,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettleResponse {
    pub success: bool,
    pub error_reason: Option<String>,
    pub transaction: Option<String>,
    pub network: Option<String>,
    pub payer: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponseWire {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
}

impl Serialize for SettleResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SettleResponseWire {
            success: self.success,
            error_reason: self.error_reason.clone(),
            transaction: self.transaction.clone(),
            network: self.network.clone(),
            payer: self.payer.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SettleResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = SettleResponseWire::deserialize(deserializer)?;
        Ok(SettleResponse {
            success: wire.success,
            error_reason: wire.error_reason,
            transaction: wire.transaction,
            network: wire.network,
            payer: wire.payer,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredResource {
    pub resource: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x402_version: u8,
    pub accepts: Vec<PaymentRequirements>,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDiscoveryResourcesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResourcesPagination {
    pub limit: u64,
    pub offset: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDiscoveryResourcesResponse {
    pub x402_version: u8,
    pub items: Vec<DiscoveredResource>,
    pub pagination: DiscoveryResourcesPagination,
}

pub const X402_VERSION: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;

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
            pay_to: "0xabc".into(),
            max_timeout_seconds: 60,
            asset: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".into(),
            extra: Some(Eip712Domain {
                name: "USDC".into(),
                version: "2".into(),
            }),
        }
    }

    #[test]
    fn payment_requirements_round_trip_camel_case() {
        let req = sample_requirements();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["maxAmountRequired"], "1000");
        assert_eq!(json["payTo"], "0xabc");
        assert_eq!(json["network"], "bsc-mainnet");
        let back: PaymentRequirements = serde_json::from_value(json).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn verify_response_wire_shape() {
        let resp = VerifyResponse {
            is_valid: false,
            invalid_reason: Some("expired".into()),
            payer: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["invalidReason"], "expired");
        assert!(json.get("payer").is_none());
    }

    #[test]
    fn settle_response_success_omits_error_reason() {
        let resp = SettleResponse {
            success: true,
            error_reason: None,
            transaction: Some("0xdead".into()),
            network: Some("bsc-mainnet".into()),
            payer: Some("0xabc".into()),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("errorReason").is_none());
        assert_eq!(json["transaction"], "0xdead");
    }

    #[test]
    fn atomic_amount_rejects_non_integer() {
        assert!("abc".parse::<AtomicAmount>().is_err());
        assert!("-5".parse::<AtomicAmount>().is_err());
        assert_eq!("1000".parse::<AtomicAmount>().unwrap().value(), 1000);
    }

    #[test]
    fn unsupported_network_fails_to_deserialize() {
        let json = serde_json::json!({
            "scheme": "exact",
            "network": "ethereum-mainnet",
            "maxAmountRequired": "1000",
            "resource": "https://example.com",
            "description": "",
            "mimeType": "",
            "payTo": "0xabc",
            "maxTimeoutSeconds": 60,
            "asset": "0xabc"
        });
        let result: Result<PaymentRequirements, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }
}
