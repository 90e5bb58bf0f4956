//! Axum middleware that enforces x402 payment on protected routes.
//!
//! Wraps an inner [`tower::Service`], challenges unpaid requests with a
//! `402 Payment Required`, verifies the signed payment against a
//! facilitator, runs the inner handler, and settles on a successful
//! response. Ported from the reference FastAPI `require_payment`
//! middleware.

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, Request, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Instrument, Level, warn};

use x402_core::price::{self, Price};
use x402_core::{InvalidPathPattern, PathPattern};
use x402_types::{
    HttpInputSchema, HttpMethod, HttpRequestStructure, Network, OutputSchema, PaymentPayload,
    PaymentRequiredResponse, PaymentRequirements, X402_VERSION, codec,
};

use crate::facilitator_client::{Facilitator, FacilitatorClientError};
use crate::paywall::{self, PaywallConfig};

/// Errors raised while *building* an [`X402Middleware`], never at request
/// time.
#[derive(Debug, thiserror::Error)]
pub enum X402MiddlewareError {
    #[error("invalid price: {0}")]
    InvalidPrice(#[from] price::PriceError),
    #[error("invalid path pattern: {0}")]
    InvalidPath(#[from] InvalidPathPattern),
    #[error(transparent)]
    Facilitator(#[from] FacilitatorClientError),
}

/// Configuration captured once when the middleware is built, shared by
/// every request handled through it.
struct X402MiddlewareConfig<F> {
    facilitator: F,
    pay_to_address: String,
    network: Network,
    path: PathPattern,
    description: String,
    mime_type: String,
    max_deadline_seconds: u64,
    input_schema: HttpInputSchema,
    output_schema: Option<serde_json::Value>,
    discoverable: bool,
    resource: Option<Url>,
    paywall_config: PaywallConfig,
    custom_paywall_html: Option<String>,
    resolved_price: price::ResolvedPrice,
}

/// Gates a route (or set of routes) behind an x402 payment.
///
/// Construct with [`X402Middleware::try_new`], customize with the builder
/// methods, then apply via [`tower::ServiceBuilder::layer`] or
/// `axum::routing::Router::layer`.
#[derive(Clone)]
pub struct X402Middleware<F> {
    config: Arc<X402MiddlewareConfig<F>>,
}

impl<F> X402Middleware<F>
where
    F: Facilitator + Clone + 'static,
{
    /// Builds a middleware charging `price` on `network`, paid to
    /// `pay_to_address`, gating every path by default.
    pub fn try_new(
        facilitator: F,
        price: Price,
        pay_to_address: impl Into<String>,
        network: Network,
    ) -> Result<Self, X402MiddlewareError> {
        let resolved_price = price::resolve(&price, network)?;
        Ok(Self {
            config: Arc::new(X402MiddlewareConfig {
                facilitator,
                pay_to_address: pay_to_address.into(),
                network,
                path: PathPattern::default(),
                description: String::new(),
                mime_type: String::new(),
                max_deadline_seconds: 60,
                input_schema: HttpInputSchema::default(),
                output_schema: None,
                discoverable: true,
                resource: None,
                paywall_config: PaywallConfig::default(),
                custom_paywall_html: None,
                resolved_price,
            }),
        })
    }

    fn map_config(&self, f: impl FnOnce(&mut X402MiddlewareConfig<F>)) -> Self
    where
        F: Clone,
    {
        let mut config = (*self.config).clone();
        f(&mut config);
        Self {
            config: Arc::new(config),
        }
    }

    /// Restricts the middleware to requests matching `pattern` (glob,
    /// `regex:`-prefixed, or exact). Defaults to `"*"`.
    pub fn with_path(&self, pattern: &str) -> Result<Self, InvalidPathPattern> {
        let parsed = PathPattern::parse(pattern)?;
        Ok(self.map_config(|c| c.path = parsed))
    }

    /// Sets the human-readable description shown on the paywall and in
    /// `PaymentRequirements::description`.
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        self.map_config(|c| c.description = description.into())
    }

    /// Sets the MIME type of the protected resource.
    pub fn with_mime_type(&self, mime_type: impl Into<String>) -> Self {
        self.map_config(|c| c.mime_type = mime_type.into())
    }

    /// Sets the maximum number of seconds a client has to submit a valid
    /// payment after the authorization window opens. Defaults to 60.
    pub fn with_max_deadline_seconds(&self, seconds: u64) -> Self {
        self.map_config(|c| c.max_deadline_seconds = seconds)
    }

    /// Sets the `outputSchema.input` extras (query params, body shape,
    /// headers) advertised to discovery clients.
    pub fn with_input_schema(&self, input_schema: HttpInputSchema) -> Self {
        self.map_config(|c| c.input_schema = input_schema)
    }

    /// Sets the `outputSchema.output` shape advertised to discovery
    /// clients.
    pub fn with_output_schema(&self, output_schema: serde_json::Value) -> Self {
        self.map_config(|c| c.output_schema = Some(output_schema))
    }

    /// Controls whether the route is listed by facilitator discovery.
    /// Defaults to `true`.
    pub fn with_discoverable(&self, discoverable: bool) -> Self {
        self.map_config(|c| c.discoverable = discoverable)
    }

    /// Sets the resource URL advertised in `PaymentRequirements::resource`.
    /// When unset, the request's own URI is used.
    pub fn with_resource(&self, resource: Url) -> Self {
        self.map_config(|c| c.resource = Some(resource))
    }

    /// Sets paywall branding (app name, logo, CDP session-token endpoint).
    pub fn with_paywall_config(&self, paywall_config: PaywallConfig) -> Self {
        self.map_config(|c| c.paywall_config = paywall_config)
    }

    /// Overrides the default paywall page entirely.
    pub fn with_custom_paywall_html(&self, html: impl Into<String>) -> Self {
        self.map_config(|c| c.custom_paywall_html = Some(html.into()))
    }
}

impl<F: Clone> Clone for X402MiddlewareConfig<F> {
    fn clone(&self) -> Self {
        Self {
            facilitator: self.facilitator.clone(),
            pay_to_address: self.pay_to_address.clone(),
            network: self.network,
            path: self.path.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            max_deadline_seconds: self.max_deadline_seconds,
            input_schema: self.input_schema.clone(),
            output_schema: self.output_schema.clone(),
            discoverable: self.discoverable,
            resource: self.resource.clone(),
            paywall_config: self.paywall_config.clone(),
            custom_paywall_html: self.custom_paywall_html.clone(),
            resolved_price: self.resolved_price.clone(),
        }
    }
}

fn http_method_of(method: &http::Method) -> HttpMethod {
    match method.as_str() {
        "GET" => HttpMethod::GET,
        "POST" => HttpMethod::POST,
        "PUT" => HttpMethod::PUT,
        "DELETE" => HttpMethod::DELETE,
        "PATCH" => HttpMethod::PATCH,
        "OPTIONS" => HttpMethod::OPTIONS,
        "HEAD" => HttpMethod::HEAD,
        // Discovery metadata only; a method outside the closed set still
        // gets handled, it just advertises as GET.
        _ => HttpMethod::GET,
    }
}

/// Reconstructs the resource URL a reverse proxy saw, from the
/// `X-Original-URI` header it forwards alongside the rewritten request.
/// Ported from the reference `require_payment`'s `resource_url`
/// computation: when a proxy is in front of the app, the request's own
/// URI no longer reflects what the client actually requested.
fn reconstruct_resource_from_proxy(req: &Request<Body>) -> Option<String> {
    let original_uri = req
        .headers()
        .get("X-Original-URI")
        .and_then(|v| v.to_str().ok())?;
    let host = req
        .headers()
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())?;
    let scheme = req
        .headers()
        .get("X-Forwarded-Proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    Some(format!("{scheme}://{host}{original_uri}"))
}

impl<F> X402MiddlewareConfig<F>
where
    F: Facilitator,
{
    fn payment_requirements(&self, req: &Request<Body>) -> PaymentRequirements {
        let resource = reconstruct_resource_from_proxy(req)
            .or_else(|| self.resource.as_ref().map(|u| u.to_string()))
            .unwrap_or_else(|| req.uri().to_string());

        let mut output_schema_input =
            HttpRequestStructure::new(http_method_of(req.method()), self.discoverable);
        output_schema_input.input = self.input_schema.clone();

        PaymentRequirements {
            scheme: "exact".to_string(),
            network: self.network,
            max_amount_required: self
                .resolved_price
                .atomic_amount
                .parse()
                .unwrap_or_else(|_| x402_types::AtomicAmount::new(0)),
            resource,
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            output_schema: Some(OutputSchema {
                input: output_schema_input,
                output: self.output_schema.clone(),
            }),
            pay_to: self.pay_to_address.clone(),
            max_timeout_seconds: self.max_deadline_seconds,
            asset: self.resolved_price.asset_address.clone(),
            extra: Some(self.resolved_price.eip712.clone()),
        }
    }
}

fn x402_response(
    accepts: Vec<PaymentRequirements>,
    error: &str,
    is_browser: bool,
    paywall_config: &PaywallConfig,
    custom_paywall_html: Option<&str>,
) -> Response {
    if is_browser {
        let html = match custom_paywall_html {
            Some(custom) => paywall::inject_payment_data(custom, error, &accepts, paywall_config),
            None => paywall::render_paywall_html(error, &accepts, paywall_config),
        };
        let mut response = Response::new(Body::from(html));
        *response.status_mut() = StatusCode::PAYMENT_REQUIRED;
        response
            .headers_mut()
            .insert(http::header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        response
    } else {
        let body = PaymentRequiredResponse {
            x402_version: X402_VERSION,
            accepts,
            error: error.to_string(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = StatusCode::PAYMENT_REQUIRED;
        response
    }
}

impl<S, F> Layer<S> for X402Middleware<F>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    F: Facilitator + Clone + 'static,
{
    type Service = X402MiddlewareService<F>;

    fn layer(&self, inner: S) -> Self::Service {
        X402MiddlewareService {
            config: self.config.clone(),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

pub struct X402MiddlewareService<F> {
    config: Arc<X402MiddlewareConfig<F>>,
    inner: BoxCloneSyncService<Request<Body>, Response, Infallible>,
}

impl<F> Clone for X402MiddlewareService<F> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<F> Service<Request<Body>> for X402MiddlewareService<F>
where
    F: Facilitator + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let config = self.config.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !config.path.matches(req.uri().path()) {
                return inner.call(req).await;
            }

            let is_browser = paywall::is_browser_request(req.headers());

            let requirements = vec![config.payment_requirements(&req)];

            let payment_header = req
                .headers()
                .get("X-PAYMENT")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let payment_header = match payment_header {
                Some(h) if !h.is_empty() => h,
                _ => {
                    return Ok(x402_response(
                        requirements,
                        "No X-PAYMENT header provided",
                        is_browser,
                        &config.paywall_config,
                        config.custom_paywall_html.as_deref(),
                    ));
                }
            };

            let payment: PaymentPayload = match codec::decode(&payment_header) {
                Ok(payment) => payment,
                Err(_) => {
                    #[cfg(feature = "telemetry")]
                    warn!("invalid X-PAYMENT header format");
                    return Ok(x402_response(
                        requirements,
                        "Invalid payment header format",
                        is_browser,
                        &config.paywall_config,
                        config.custom_paywall_html.as_deref(),
                    ));
                }
            };

            let selected = requirements.iter().find(|r| {
                r.scheme == payment.scheme && r.network == payment.network
            });
            let selected = match selected {
                Some(r) => r.clone(),
                None => {
                    return Ok(x402_response(
                        requirements,
                        "No matching payment requirements found",
                        is_browser,
                        &config.paywall_config,
                        config.custom_paywall_html.as_deref(),
                    ));
                }
            };

            #[cfg(feature = "telemetry")]
            let verify_span = tracing::span!(Level::DEBUG, "x402.verify", network = %selected.network);
            #[cfg(feature = "telemetry")]
            let verify_result = config
                .facilitator
                .verify(&payment, &selected)
                .instrument(verify_span)
                .await;
            #[cfg(not(feature = "telemetry"))]
            let verify_result = config.facilitator.verify(&payment, &selected).await;

            let verify_response = match verify_result {
                Ok(response) => response,
                Err(_) => {
                    return Ok(x402_response(
                        requirements,
                        "Invalid payment: facilitator verification request failed",
                        is_browser,
                        &config.paywall_config,
                        config.custom_paywall_html.as_deref(),
                    ));
                }
            };

            if !verify_response.is_valid {
                let reason = verify_response
                    .invalid_reason
                    .unwrap_or_else(|| "Unknown error".to_string());
                return Ok(x402_response(
                    requirements,
                    &format!("Invalid payment: {reason}"),
                    is_browser,
                    &config.paywall_config,
                    config.custom_paywall_html.as_deref(),
                ));
            }

            let response = inner.call(req).await?;

            if !response.status().is_success() {
                return Ok(response);
            }

            let settle_result = config.facilitator.settle(&payment, &selected).await;
            match settle_result {
                Ok(settle_response) if settle_response.success => {
                    let mut response = response;
                    let encoded = codec::encode(&settle_response);
                    if let Ok(value) = HeaderValue::from_str(&encoded) {
                        response.headers_mut().insert("X-PAYMENT-RESPONSE", value);
                    }
                    Ok(response)
                }
                Ok(settle_response) => {
                    let reason = settle_response
                        .error_reason
                        .unwrap_or_else(|| "Unknown error".to_string());
                    Ok(x402_response(
                        requirements,
                        &format!("Settle failed: {reason}"),
                        is_browser,
                        &config.paywall_config,
                        config.custom_paywall_html.as_deref(),
                    ))
                }
                Err(_) => Ok(x402_response(
                    requirements,
                    "Settle failed",
                    is_browser,
                    &config.paywall_config,
                    config.custom_paywall_html.as_deref(),
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::Router;
    use axum::routing::get;
    use std::convert::Infallible as StdInfallible;
    use tower::ServiceExt;
    use x402_types::{ListDiscoveryResourcesRequest, ListDiscoveryResourcesResponse, SettleResponse, VerifyResponse};

    #[derive(Clone)]
    struct AlwaysValid;

    #[async_trait]
    impl Facilitator for AlwaysValid {
        type Error = StdInfallible;

        async fn verify(
            &self,
            _payment: &PaymentPayload,
            _requirements: &PaymentRequirements,
        ) -> Result<VerifyResponse, Self::Error> {
            Ok(VerifyResponse {
                is_valid: true,
                invalid_reason: None,
                payer: None,
            })
        }

        async fn settle(
            &self,
            _payment: &PaymentPayload,
            requirements: &PaymentRequirements,
        ) -> Result<SettleResponse, Self::Error> {
            Ok(SettleResponse {
                success: true,
                error_reason: None,
                payer: None,
                transaction: Some("0xabc".to_string()),
                network: Some(requirements.network.as_str().to_string()),
            })
        }

        async fn list(
            &self,
            _request: Option<ListDiscoveryResourcesRequest>,
        ) -> Result<ListDiscoveryResourcesResponse, Self::Error> {
            Ok(ListDiscoveryResourcesResponse {
                x402_version: x402_types::X402_VERSION,
                items: Vec::new(),
                pagination: x402_types::DiscoveryResourcesPagination {
                    limit: 0,
                    offset: 0,
                    total: 0,
                },
            })
        }
    }

    fn app(middleware: X402Middleware<AlwaysValid>) -> Router {
        Router::new()
            .route("/protected", get(|| async { "secret" }))
            .layer(middleware)
    }

    #[tokio::test]
    async fn challenges_requests_without_payment_header() {
        let middleware =
            X402Middleware::try_new(AlwaysValid, Price::Usd("$0.01".into()), "0xabc", Network::Base)
                .unwrap();
        let response = app(middleware)
            .oneshot(Request::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn ignores_unmatched_paths() {
        let middleware =
            X402Middleware::try_new(AlwaysValid, Price::Usd("$0.01".into()), "0xabc", Network::Base)
                .unwrap()
                .with_path("/other")
                .unwrap();
        let response = app(middleware)
            .oneshot(Request::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
