//! Client-side interceptor that pays an x402 `402 Payment Required`
//! challenge transparently and retries the request exactly once.
//!
//! Ported from the reference `httpx` hook: a single request gets at most
//! one retry. If the retried request also comes back 402 (bad signature,
//! expired deadline, facilitator outage), that response is returned as-is
//! rather than looping.

use http::{Extensions, HeaderValue, StatusCode};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
use std::sync::Arc;
use x402_eip155::{SignerLike, SigningError};
use x402_types::{Network, PaymentRequiredResponse, PaymentRequirements};

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

/// Errors raised while selecting a payment option or building the header.
#[derive(Debug, thiserror::Error)]
pub enum X402PaymentsError {
    #[error(
        "no accepted payment requirement matched the configured filters (network={network_filter:?}, scheme={scheme_filter:?})"
    )]
    UnsupportedScheme {
        network_filter: Option<Vec<Network>>,
        scheme_filter: Option<String>,
    },
    #[error("payment amount {requested} exceeds configured maximum {max}")]
    PaymentAmountExceeded { requested: u128, max: u128 },
    #[error("failed to sign payment payload")]
    Signing(#[from] SigningError),
    #[error("the request body could not be cloned for a retry (streaming body?)")]
    RequestNotCloneable,
    #[error("the 402 response body was not a valid PaymentRequiredResponse")]
    InvalidChallenge(#[source] reqwest::Error),
    #[error("failed to encode payment payload into a header value")]
    HeaderValueEncode(#[source] http::header::InvalidHeaderValue),
}

impl From<X402PaymentsError> for rqm::Error {
    fn from(error: X402PaymentsError) -> Self {
        rqm::Error::Middleware(error.into())
    }
}

/// Picks the first accepted requirement using the `exact` scheme that
/// satisfies an optional network allowlist, scheme override, and per-call
/// spending cap. Mirrors the reference client's default selector: a linear
/// scan in server-supplied order, not a "best price" search.
pub fn default_payment_requirements_selector(
    accepts: &[PaymentRequirements],
    network_filter: Option<&[Network]>,
    scheme_filter: Option<&str>,
    max_value: Option<u128>,
) -> Result<PaymentRequirements, X402PaymentsError> {
    let scheme = scheme_filter.unwrap_or("exact");
    for requirement in accepts {
        if requirement.scheme != scheme {
            continue;
        }
        if let Some(networks) = network_filter {
            if !networks.contains(&requirement.network) {
                continue;
            }
        }
        if let Some(max) = max_value {
            let requested = requirement.max_amount_required.value();
            if requested > max {
                return Err(X402PaymentsError::PaymentAmountExceeded { requested, max });
            }
        }
        return Ok(requirement.clone());
    }
    Err(X402PaymentsError::UnsupportedScheme {
        network_filter: network_filter.map(|n| n.to_vec()),
        scheme_filter: scheme_filter.map(str::to_string),
    })
}

/// `reqwest_middleware::Middleware` that retries a `402` response with a
/// signed `X-PAYMENT` header.
#[derive(Clone)]
pub struct X402Payments {
    signer: Arc<dyn SignerLike + Send + Sync>,
    max_value: Option<u128>,
    network_filter: Option<Vec<Network>>,
    scheme_filter: Option<String>,
}

impl X402Payments {
    /// Builds a middleware that signs payments with `signer`. By default
    /// any network or amount the server proposes is accepted — callers
    /// should set [`Self::with_max_value`] before using this against an
    /// untrusted server.
    pub fn with_signer<S: SignerLike + Send + Sync + 'static>(signer: S) -> Self {
        Self {
            signer: Arc::new(signer),
            max_value: None,
            network_filter: None,
            scheme_filter: None,
        }
    }

    /// Rejects any accepted requirement whose `maxAmountRequired` exceeds
    /// `max_value` atomic units, rather than silently paying it.
    pub fn with_max_value(&self, max_value: u128) -> Self {
        let mut this = self.clone();
        this.max_value = Some(max_value);
        this
    }

    /// Restricts acceptance to the given networks.
    pub fn with_network_filter(&self, networks: impl Into<Vec<Network>>) -> Self {
        let mut this = self.clone();
        this.network_filter = Some(networks.into());
        this
    }

    /// Overrides the accepted scheme. Defaults to `"exact"`, the only
    /// scheme this crate knows how to sign for.
    pub fn with_scheme_filter(&self, scheme: impl Into<String>) -> Self {
        let mut this = self.clone();
        this.scheme_filter = Some(scheme.into());
        this
    }

    fn select(
        &self,
        accepts: &[PaymentRequirements],
    ) -> Result<PaymentRequirements, X402PaymentsError> {
        default_payment_requirements_selector(
            accepts,
            self.network_filter.as_deref(),
            self.scheme_filter.as_deref(),
            self.max_value,
        )
    }

    async fn build_payment_header(
        &self,
        accepts: &[PaymentRequirements],
    ) -> Result<HeaderValue, X402PaymentsError> {
        let selected = self.select(accepts)?;
        let encoded = x402_eip155::sign_payment_header(&*self.signer, &selected).await?;
        HeaderValue::from_str(&encoded).map_err(X402PaymentsError::HeaderValueEncode)
    }
}

#[async_trait::async_trait]
impl rqm::Middleware for X402Payments {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.handle", skip(self, req, extensions, next), fields(method = %req.method(), url = %req.url()))
    )]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let retry_req = req.try_clone();

        let response = next.clone().run(req, extensions).await?;

        if response.status() != StatusCode::PAYMENT_REQUIRED {
            return Ok(response);
        }

        #[cfg(feature = "telemetry")]
        debug!("received 402 Payment Required, attempting one retry with payment");

        let challenge: PaymentRequiredResponse = response
            .json()
            .await
            .map_err(X402PaymentsError::InvalidChallenge)
            .map_err(Into::<rqm::Error>::into)?;

        let retry_req = async {
            let payment_header = self.build_payment_header(&challenge.accepts).await?;
            let mut req = retry_req.ok_or(X402PaymentsError::RequestNotCloneable)?;
            let headers = req.headers_mut();
            headers.insert("X-PAYMENT", payment_header);
            headers.insert(
                "Access-Control-Expose-Headers",
                HeaderValue::from_static("X-PAYMENT-RESPONSE"),
            );
            Ok::<Request, X402PaymentsError>(req)
        }
        .await
        .map_err(Into::<rqm::Error>::into)?;

        next.run(retry_req, extensions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x402_types::{AtomicAmount, Eip712Domain, HttpMethod, HttpRequestStructure, OutputSchema};

    fn requirement(scheme: &str, network: Network, amount: u128) -> PaymentRequirements {
        PaymentRequirements {
            scheme: scheme.to_string(),
            network,
            max_amount_required: AtomicAmount::new(amount),
            resource: "https://example.com/protected".to_string(),
            description: String::new(),
            mime_type: String::new(),
            output_schema: Some(OutputSchema {
                input: HttpRequestStructure::new(HttpMethod::GET, true),
                output: None,
            }),
            pay_to: "0x0000000000000000000000000000000000000001".to_string(),
            max_timeout_seconds: 60,
            asset: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".to_string(),
            extra: Some(Eip712Domain {
                name: "USDC".to_string(),
                version: "2".to_string(),
            }),
        }
    }

    #[test]
    fn selects_first_matching_exact_requirement() {
        let accepts = vec![
            requirement("upto", Network::Base, 1000),
            requirement("exact", Network::BscMainnet, 2000),
        ];
        let selected = default_payment_requirements_selector(&accepts, None, None, None).unwrap();
        assert_eq!(selected.network, Network::BscMainnet);
    }

    #[test]
    fn rejects_when_no_scheme_matches() {
        let accepts = vec![requirement("upto", Network::Base, 1000)];
        let err = default_payment_requirements_selector(&accepts, None, None, None).unwrap_err();
        assert!(matches!(err, X402PaymentsError::UnsupportedScheme { .. }));
    }

    #[test]
    fn enforces_network_filter() {
        let accepts = vec![requirement("exact", Network::Base, 1000)];
        let err = default_payment_requirements_selector(
            &accepts,
            Some(&[Network::BscMainnet]),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, X402PaymentsError::UnsupportedScheme { .. }));
    }

    #[test]
    fn enforces_max_value_guard() {
        let accepts = vec![requirement("exact", Network::Base, 5_000_000)];
        let err =
            default_payment_requirements_selector(&accepts, None, None, Some(1_000)).unwrap_err();
        assert!(matches!(
            err,
            X402PaymentsError::PaymentAmountExceeded { requested: 5_000_000, max: 1_000 }
        ));
    }
}
