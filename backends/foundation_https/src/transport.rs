use crate::endpoint::Endpoint;
use crate::errors::HttpsCallResult;
use crate::stream::CallStream;

/// Resolves hosts and opens secure byte streams for calls.
///
/// Implementations own name resolution, TCP connect and TLS negotiation;
/// the call orchestrator only sequences them. One stream is opened per
/// call and never shared.
pub trait Transport {
    type Stream: CallStream;

    /// Resolves `host`, applying `port_override` to every address when set.
    ///
    /// # Errors
    ///
    /// Returns `HttpsCallError::Resolution` on lookup failure.
    fn resolve(&self, host: &str, port_override: Option<u16>) -> HttpsCallResult<Endpoint>;

    /// Connects to `endpoint` and completes the secure session handshake.
    ///
    /// # Errors
    ///
    /// Returns `HttpsCallError::ConnectionFailed` or
    /// `HttpsCallError::HandshakeFailed`.
    fn connect(&self, endpoint: &Endpoint) -> HttpsCallResult<Self::Stream>;
}
