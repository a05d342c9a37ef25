//! Call orchestration: resolve, connect, send, receive.
//!
//! Each stage runs to completion on the calling thread before the next one
//! starts, and nothing is retried. A fresh stream and parser are created
//! per invocation, so one [`HttpsCall`] can be reused for many requests.

use crate::config::HttpsCallConfig;
use crate::dns::DnsResolver;
use crate::errors::{HttpsCallError, HttpsCallResult};
use crate::parser::ResponseParser;
use crate::request::HttpsRequest;
use crate::response::HttpsResponse;
use crate::tls::TlsTransport;
use crate::transport::Transport;
use std::io::Write;

/// A reusable call target: fixed settings plus the transport that opens
/// one connection per request.
///
/// Defaults to [`TlsTransport`] with the operating system resolver. Tests
/// and embedders substitute any [`Transport`] through
/// [`HttpsCall::with_transport`].
#[derive(Debug, Clone)]
pub struct HttpsCall<T: Transport = TlsTransport> {
    config: HttpsCallConfig,
    transport: T,
}

impl HttpsCall<TlsTransport> {
    /// Call against `host` over the default TLS transport with verified
    /// certificates.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS client configuration cannot be built.
    pub fn new<S: Into<String>>(
        host: S,
        port: Option<u16>,
        response_size_limit: usize,
    ) -> HttpsCallResult<Self> {
        let mut config = HttpsCallConfig::new(host).with_response_size_limit(response_size_limit);
        config.port = port;
        Self::from_config(config)
    }

    /// Builds the TLS transport described by `config`.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS client configuration cannot be built.
    pub fn from_config(config: HttpsCallConfig) -> HttpsCallResult<Self> {
        let transport = TlsTransport::new(config.verification)?
            .with_timeouts(config.connect_timeout(), config.io_timeout());
        Ok(Self::with_transport(config, transport))
    }
}

impl<R: DnsResolver> HttpsCall<TlsTransport<R>> {
    /// Like [`HttpsCall::from_config`] with a custom resolver.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS client configuration cannot be built.
    pub fn with_resolver(config: HttpsCallConfig, resolver: R) -> HttpsCallResult<Self> {
        let transport = TlsTransport::with_resolver(resolver, config.verification)?
            .with_timeouts(config.connect_timeout(), config.io_timeout());
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> HttpsCall<T> {
    /// Wraps an already-built transport. `config.verification` and the
    /// timeouts are ignored here since the transport owns them.
    pub fn with_transport(config: HttpsCallConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Settings every request through this call uses.
    #[must_use]
    pub fn config(&self) -> &HttpsCallConfig {
        &self.config
    }

    /// Transport that resolves and connects for each request.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Performs one request/response exchange.
    ///
    /// # Errors
    ///
    /// The first failing stage's error. Shutdown errors are never returned.
    pub fn call(&self, request: &HttpsRequest) -> HttpsCallResult<HttpsResponse> {
        let endpoint = self.transport.resolve(&self.config.host, self.config.port)?;
        let wire = request.render(&endpoint.authority())?;

        let mut stream = self.transport.connect(&endpoint)?;
        stream
            .write_all(&wire)
            .and_then(|()| stream.flush())
            .map_err(HttpsCallError::WriteFailed)?;
        tracing::debug!(
            "Sent {} {} ({} byte(s)) to {}",
            request.method,
            request.path,
            wire.len(),
            endpoint.authority()
        );

        let response = ResponseParser::new(self.config.response_size_limit).parse(&mut stream)?;
        tracing::info!(
            "{} {} on {} returned {} with {} body byte(s)",
            request.method,
            request.path,
            endpoint.authority(),
            response.status_code,
            response.body.len()
        );
        Ok(response)
    }

    /// Performs one exchange and reports only success or failure.
    ///
    /// `response` is reset before the call and populated only on success,
    /// so a failed call always leaves it empty. The error itself is
    /// logged; use [`HttpsCall::call`] to inspect it.
    pub fn exec(&self, request: &HttpsRequest, response: &mut HttpsResponse) -> bool {
        response.clear();
        match self.call(request) {
            Ok(received) => {
                *response = received;
                true
            }
            Err(err) => {
                tracing::warn!("HTTPS call to {} failed: {err}", self.config.host);
                false
            }
        }
    }
}
