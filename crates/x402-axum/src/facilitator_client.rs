//! A client for a remote x402 facilitator: the trusted third party that
//! verifies signed payment authorizations and settles them on-chain on the
//! resource server's behalf.
//!
//! This crate never talks to a chain directly — everything here is a typed
//! JSON RPC call over HTTPS. The facilitator *service* is out of scope; this
//! is purely the consumer side described by `verify`, `settle`, and `list`.

use async_trait::async_trait;
use http::HeaderMap;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;
use x402_types::{
    ListDiscoveryResourcesRequest, ListDiscoveryResourcesResponse, PaymentPayload,
    PaymentRequirements, SettleResponse, VerifyResponse, X402_VERSION,
};

/// Errors a [`FacilitatorClient`] can raise.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorClientError {
    #[error("invalid facilitator url {url:?}: must start with http:// or https://")]
    InvalidUrl { url: String },
    #[error("http transport error calling {context}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("facilitator returned invalid JSON for {context}")]
    Json {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("facilitator list failed with status {status}: {body}")]
    FacilitatorListFailed {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Headers a [`CreateHeaders`] hook contributes to one outbound call.
#[derive(Debug, Clone, Default)]
pub struct CreateHeadersOutput {
    pub verify: HeaderMap,
    pub settle: HeaderMap,
    pub list: HeaderMap,
}

/// A caller-supplied asynchronous capability for attaching auth headers
/// (e.g. a CDP API key pair) to facilitator calls. Invoked once per request;
/// the relevant subset of the returned headers is merged into that request.
#[async_trait]
pub trait CreateHeaders: Send + Sync {
    async fn create_headers(&self) -> CreateHeadersOutput;
}

/// Abstracts over "something that can verify and settle an x402 payment",
/// so the middleware in [`crate::layer`] is not hard-wired to one transport.
/// [`FacilitatorClient`] is the only implementation this crate ships.
#[async_trait]
pub trait Facilitator: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn verify(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse, Self::Error>;

    async fn settle(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, Self::Error>;

    async fn list(
        &self,
        request: Option<ListDiscoveryResourcesRequest>,
    ) -> Result<ListDiscoveryResourcesResponse, Self::Error>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOrSettleBody<'a> {
    x402_version: u8,
    payment_payload: &'a PaymentPayload,
    payment_requirements: &'a PaymentRequirements,
}

/// An HTTP client for a remote x402 facilitator.
///
/// Cheap to clone: the underlying `reqwest::Client` shares a connection
/// pool, so reusing one instance across routes or tasks is the intended
/// usage, not an optimization a caller needs to opt into.
#[derive(Clone)]
pub struct FacilitatorClient {
    base_url: String,
    client: Client,
    create_headers: Option<Arc<dyn CreateHeaders>>,
}

impl std::fmt::Debug for FacilitatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilitatorClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FacilitatorClient {
    /// Builds a client for the facilitator at `url`.
    ///
    /// The trailing slash, if any, is stripped; a URL not starting with
    /// `http://` or `https://` is rejected immediately (this is a wiring-
    /// time **InvalidConfig**, never a per-request failure).
    pub fn new(url: impl AsRef<str>) -> Result<Self, FacilitatorClientError> {
        let raw = url.as_ref();
        if !(raw.starts_with("http://") || raw.starts_with("https://")) {
            return Err(FacilitatorClientError::InvalidUrl {
                url: raw.to_string(),
            });
        }
        let trimmed = raw.trim_end_matches('/');
        Url::parse(trimmed).map_err(|_| FacilitatorClientError::InvalidUrl {
            url: raw.to_string(),
        })?;
        Ok(Self {
            base_url: trimmed.to_string(),
            client: Client::new(),
            create_headers: None,
        })
    }

    /// Attaches a `createHeaders` auth hook, invoked once per call.
    pub fn with_create_headers(mut self, hook: Arc<dyn CreateHeaders>) -> Self {
        self.create_headers = Some(hook);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn headers_for(&self, pick: impl Fn(&CreateHeadersOutput) -> &HeaderMap) -> HeaderMap {
        match &self.create_headers {
            Some(hook) => pick(&hook.create_headers().await).clone(),
            None => HeaderMap::new(),
        }
    }

    async fn post_json<B: Serialize + Sync, R: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        context: &'static str,
        body: &B,
        headers: HeaderMap,
    ) -> Result<R, FacilitatorClientError> {
        let mut req = self.client.post(url).json(body);
        for (key, value) in headers.iter() {
            req = req.header(key, value);
        }
        let response = req
            .send()
            .await
            .map_err(|source| FacilitatorClientError::Http { context, source })?;
        response
            .json::<R>()
            .await
            .map_err(|source| FacilitatorClientError::Json { context, source })
    }

    /// `POST {url}/verify`.
    pub async fn verify(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse, FacilitatorClientError> {
        let headers = self.headers_for(|h| &h.verify).await;
        let body = VerifyOrSettleBody {
            x402_version: X402_VERSION,
            payment_payload: payment,
            payment_requirements: requirements,
        };
        self.post_json(&self.endpoint("/verify"), "POST /verify", &body, headers)
            .await
    }

    /// `POST {url}/settle`.
    pub async fn settle(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, FacilitatorClientError> {
        let headers = self.headers_for(|h| &h.settle).await;
        let body = VerifyOrSettleBody {
            x402_version: X402_VERSION,
            payment_payload: payment,
            payment_requirements: requirements,
        };
        self.post_json(&self.endpoint("/settle"), "POST /settle", &body, headers)
            .await
    }

    /// `GET {url}/discovery/resources`, with non-null fields of `request`
    /// flattened into query parameters.
    pub async fn list(
        &self,
        request: Option<ListDiscoveryResourcesRequest>,
    ) -> Result<ListDiscoveryResourcesResponse, FacilitatorClientError> {
        let headers = self.headers_for(|h| &h.list).await;
        let request = request.unwrap_or_default();
        let mut params: HashMap<&'static str, String> = HashMap::new();
        if let Some(t) = request.r#type {
            params.insert("type", t);
        }
        if let Some(limit) = request.limit {
            params.insert("limit", limit.to_string());
        }
        if let Some(offset) = request.offset {
            params.insert("offset", offset.to_string());
        }

        let mut req = self
            .client
            .get(self.endpoint("/discovery/resources"))
            .query(&params);
        for (key, value) in headers.iter() {
            req = req.header(key, value);
        }
        let response = req.send().await.map_err(|source| FacilitatorClientError::Http {
            context: "GET /discovery/resources",
            source,
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FacilitatorClientError::FacilitatorListFailed { status, body });
        }
        response
            .json::<ListDiscoveryResourcesResponse>()
            .await
            .map_err(|source| FacilitatorClientError::Json {
                context: "GET /discovery/resources",
                source,
            })
    }
}

#[async_trait]
impl Facilitator for FacilitatorClient {
    type Error = FacilitatorClientError;

    async fn verify(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse, Self::Error> {
        FacilitatorClient::verify(self, payment, requirements).await
    }

    async fn settle(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, Self::Error> {
        FacilitatorClient::settle(self, payment, requirements).await
    }

    async fn list(
        &self,
        request: Option<ListDiscoveryResourcesRequest>,
    ) -> Result<ListDiscoveryResourcesResponse, Self::Error> {
        FacilitatorClient::list(self, request).await
    }
}

impl TryFrom<&str> for FacilitatorClient {
    type Error = FacilitatorClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        FacilitatorClient::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        let err = FacilitatorClient::new("ftp://facilitator.example").unwrap_err();
        assert!(matches!(err, FacilitatorClientError::InvalidUrl { .. }));
    }

    #[test]
    fn strips_trailing_slash() {
        let client = FacilitatorClient::new("https://facilitator.example/").unwrap();
        assert_eq!(
            client.endpoint("/verify"),
            "https://facilitator.example/verify"
        );
    }
}
