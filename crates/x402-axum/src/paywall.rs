//! Renders the HTML paywall shown to browser clients that hit a 402 without
//! a wallet extension driving the flow for them.
//!
//! Ported from the reference `paywall.py`: a static page with a
//! `window.x402 = {...}` blob injected before `</head>`, read by the
//! paywall's client-side script to drive wallet connection and signing.

use http::HeaderMap;
use serde::Serialize;
use x402_types::PaymentRequirements;

/// Branding and session-wallet options threaded into the paywall page.
/// All fields are optional; an unset field renders as an empty string.
#[derive(Debug, Clone, Default)]
pub struct PaywallConfig {
    pub cdp_client_key: Option<String>,
    pub app_name: Option<String>,
    pub app_logo: Option<String>,
    pub session_token_endpoint: Option<String>,
}

#[derive(Serialize)]
struct X402Config<'a> {
    amount: f64,
    #[serde(rename = "paymentRequirements")]
    payment_requirements: &'a [PaymentRequirements],
    testnet: bool,
    #[serde(rename = "currentUrl")]
    current_url: String,
    error: String,
    x402_version: u8,
    #[serde(rename = "cdpClientKey")]
    cdp_client_key: String,
    #[serde(rename = "appName")]
    app_name: String,
    #[serde(rename = "appLogo")]
    app_logo: String,
    #[serde(rename = "sessionTokenEndpoint")]
    session_token_endpoint: String,
}

/// USDC's decimal exponent, used only to redisplay the atomic amount back
/// to a human-readable dollar figure on the paywall page. Purely cosmetic —
/// the authoritative amount stays in `paymentRequirements`.
const DISPLAY_DECIMALS: u32 = 6;

fn build_config<'a>(
    error: &str,
    payment_requirements: &'a [PaymentRequirements],
    paywall_config: &PaywallConfig,
) -> X402Config<'a> {
    let requirements = payment_requirements.first();

    let amount = requirements
        .and_then(|r| r.max_amount_required.to_string().parse::<f64>().ok())
        .map(|atomic| atomic / 10f64.powi(DISPLAY_DECIMALS as i32))
        .unwrap_or(0.0);

    let current_url = requirements
        .map(|r| r.resource.clone())
        .unwrap_or_default();

    let testnet = requirements.is_some_and(|r| r.network.is_testnet());

    X402Config {
        amount,
        payment_requirements,
        testnet,
        current_url,
        error: error.to_string(),
        x402_version: x402_types::X402_VERSION,
        cdp_client_key: paywall_config.cdp_client_key.clone().unwrap_or_default(),
        app_name: paywall_config.app_name.clone().unwrap_or_default(),
        app_logo: paywall_config.app_logo.clone().unwrap_or_default(),
        session_token_endpoint: paywall_config
            .session_token_endpoint
            .clone()
            .unwrap_or_default(),
    }
}

/// Returns `true` if the request's `Accept`/`User-Agent` pair looks like a
/// browser navigating directly, rather than an API client or agent.
///
/// Mirrors the reference check exactly: the `Accept` header must contain
/// `text/html` (case-insensitive) and `User-Agent` must contain `Mozilla`
/// (case-sensitive, matching the substring browsers actually send). Exposed
/// as a free function over `HeaderMap` rather than baked into the
/// middleware, so a caller who wants a different content-negotiation
/// policy can call their own predicate instead.
pub fn is_browser_request(headers: &HeaderMap) -> bool {
    let accept = headers.get(http::header::ACCEPT).and_then(|v| v.to_str().ok());
    let user_agent = headers.get(http::header::USER_AGENT).and_then(|v| v.to_str().ok());
    let accept_has_html = accept
        .map(|v| v.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false);
    let user_agent_is_browser = user_agent.map(|v| v.contains("Mozilla")).unwrap_or(false);
    accept_has_html && user_agent_is_browser
}

/// Injects `window.x402 = {...}` into `html_content` just before `</head>`.
/// On testnets the injected script also logs the config to the console, a
/// convenience for developers wiring up the paywall for the first time.
pub fn inject_payment_data(
    html_content: &str,
    error: &str,
    payment_requirements: &[PaymentRequirements],
    paywall_config: &PaywallConfig,
) -> String {
    let config = build_config(error, payment_requirements, paywall_config);
    let config_json = serde_json::to_string(&config).unwrap_or_else(|_| "{}".to_string());
    let log_on_testnet = if config.testnet {
        "console.log('Payment requirements initialized:', window.x402);"
    } else {
        ""
    };
    let script = format!(
        "\n  <script>\n    window.x402 = {config_json};\n    {log_on_testnet}\n  </script>"
    );
    html_content.replacen("</head>", &format!("{script}\n</head>"), 1)
}

/// Renders the full paywall page for the given error and requirements.
pub fn render_paywall_html(
    error: &str,
    payment_requirements: &[PaymentRequirements],
    paywall_config: &PaywallConfig,
) -> String {
    inject_payment_data(
        DEFAULT_PAYWALL_TEMPLATE,
        error,
        payment_requirements,
        paywall_config,
    )
}

/// A minimal paywall page. Resource servers that want a branded experience
/// pass their own HTML to the middleware instead of relying on this one.
pub const DEFAULT_PAYWALL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Payment Required</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 32rem; margin: 4rem auto; padding: 0 1rem; color: #1a1a1a; }
    h1 { font-size: 1.25rem; }
    .amount { font-size: 2rem; font-weight: 600; }
    .error { color: #b91c1c; }
  </style>
</head>
<body>
  <h1>This resource requires payment</h1>
  <p class="amount" id="x402-amount"></p>
  <p class="error" id="x402-error"></p>
  <div id="x402-connect"></div>
  <script>
    document.addEventListener('DOMContentLoaded', function () {
      if (window.x402) {
        document.getElementById('x402-amount').textContent = '$' + window.x402.amount;
        document.getElementById('x402-error').textContent = window.x402.error || '';
      }
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(accept: Option<&str>, user_agent: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(accept) = accept {
            headers.insert(http::header::ACCEPT, accept.parse().unwrap());
        }
        if let Some(user_agent) = user_agent {
            headers.insert(http::header::USER_AGENT, user_agent.parse().unwrap());
        }
        headers
    }

    #[test]
    fn detects_browser_requests() {
        assert!(is_browser_request(&headers(
            Some("text/html,application/xhtml+xml"),
            Some("Mozilla/5.0 (Macintosh)")
        )));
        assert!(!is_browser_request(&headers(Some("application/json"), Some("Mozilla/5.0"))));
        assert!(!is_browser_request(&headers(Some("text/html"), Some("curl/8.0"))));
        assert!(!is_browser_request(&headers(None, None)));
    }

    #[test]
    fn injects_script_before_closing_head() {
        let html = "<html><head><title>t</title></head><body></body></html>";
        let rendered = inject_payment_data(html, "boom", &[], &PaywallConfig::default());
        assert!(rendered.contains("window.x402"));
        assert!(rendered.contains("\"error\":\"boom\""));
        assert!(rendered.find("window.x402").unwrap() < rendered.find("</head>").unwrap());
    }

    #[test]
    fn default_template_renders() {
        let rendered = render_paywall_html("no payment", &[], &PaywallConfig::default());
        assert!(rendered.contains("Payment Required"));
        assert!(rendered.contains("window.x402"));
    }
}
