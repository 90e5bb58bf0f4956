//! Builder sugar for attaching [`X402Payments`] to a `reqwest` client.

use reqwest::{Client, ClientBuilder};
use reqwest_middleware as rqm;

use crate::middleware::X402Payments;

/// Adds x402 payment middleware to a [`Client`] or [`ClientBuilder`].
///
/// ```rust,no_run
/// use alloy_signer_local::PrivateKeySigner;
/// use reqwest::Client;
/// use x402_reqwest::{ReqwestWithPayments, ReqwestWithPaymentsBuild, X402Payments};
///
/// let signer: PrivateKeySigner = "0x0000000000000000000000000000000000000000000000000000000000000001"
///     .parse()
///     .unwrap();
/// let payments = X402Payments::with_signer(signer).with_max_value(1_000_000);
///
/// let http_client = Client::new().with_payments(payments).build();
/// ```
pub trait ReqwestWithPayments<A> {
    fn with_payments(self, payments: X402Payments) -> ReqwestWithPaymentsBuilder<A>;
}

impl ReqwestWithPayments<Client> for Client {
    fn with_payments(self, payments: X402Payments) -> ReqwestWithPaymentsBuilder<Client> {
        ReqwestWithPaymentsBuilder {
            inner: self,
            payments,
        }
    }
}

impl ReqwestWithPayments<ClientBuilder> for ClientBuilder {
    fn with_payments(self, payments: X402Payments) -> ReqwestWithPaymentsBuilder<ClientBuilder> {
        ReqwestWithPaymentsBuilder {
            inner: self,
            payments,
        }
    }
}

/// Builder produced by [`ReqwestWithPayments::with_payments`].
pub struct ReqwestWithPaymentsBuilder<A> {
    inner: A,
    payments: X402Payments,
}

/// Finalizes a [`ReqwestWithPaymentsBuilder`] into a usable client.
pub trait ReqwestWithPaymentsBuild {
    type BuildResult;
    type BuilderResult;

    fn build(self) -> Self::BuildResult;
    fn builder(self) -> Self::BuilderResult;
}

impl ReqwestWithPaymentsBuild for ReqwestWithPaymentsBuilder<Client> {
    type BuildResult = rqm::ClientWithMiddleware;
    type BuilderResult = rqm::ClientBuilder;

    fn build(self) -> Self::BuildResult {
        self.builder().build()
    }

    fn builder(self) -> Self::BuilderResult {
        rqm::ClientBuilder::new(self.inner).with(self.payments)
    }
}

impl ReqwestWithPaymentsBuild for ReqwestWithPaymentsBuilder<ClientBuilder> {
    type BuildResult = Result<rqm::ClientWithMiddleware, reqwest::Error>;
    type BuilderResult = Result<rqm::ClientBuilder, reqwest::Error>;

    fn build(self) -> Self::BuildResult {
        let builder = self.builder()?;
        Ok(builder.build())
    }

    fn builder(self) -> Self::BuilderResult {
        let client = self.inner.build()?;
        Ok(rqm::ClientBuilder::new(client).with(self.payments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn builds_a_client_with_payments_attached() {
        let signer = PrivateKeySigner::random();
        let payments = X402Payments::with_signer(signer);
        let _client: rqm::ClientWithMiddleware = Client::new().with_payments(payments).build();
    }
}
