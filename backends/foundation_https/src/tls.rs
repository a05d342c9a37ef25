//! rustls-backed [`Transport`]: TCP connect followed by a client handshake.
//!
//! TLS 1.2 is the minimum protocol version; TLS 1.3 is offered as well.
//! Certificate verification is an explicit [`TlsVerification`] choice.

use crate::dns::{DnsResolver, SystemDnsResolver};
use crate::endpoint::Endpoint;
use crate::errors::{HttpsCallError, HttpsCallResult};
use crate::stream::CallStream;
use crate::transport::Transport;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore, SignatureScheme,
    StreamOwned,
};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

/// Server certificate policy for a transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsVerification {
    /// Verify the server chain against the Mozilla root set.
    #[default]
    Verified,

    /// Accept any server certificate. Handshake signatures are still
    /// checked, but the peer's identity is not.
    Disabled,
}

/// Verifier installed by [`TlsVerification::Disabled`].
#[derive(Debug)]
pub struct NoCertificateVerification(Arc<CryptoProvider>);

impl NoCertificateVerification {
    #[must_use]
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self(provider)
    }
}

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Builds the client configuration for `verification`.
///
/// # Errors
///
/// Returns `HttpsCallError::HandshakeFailed` if the crypto provider cannot
/// serve the required protocol versions.
pub fn client_config(verification: TlsVerification) -> HttpsCallResult<Arc<ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|err| HttpsCallError::HandshakeFailed(err.to_string()))?;

    let config = match verification {
        TlsVerification::Verified => {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        TlsVerification::Disabled => {
            tracing::warn!("TLS certificate verification is disabled; server identity unchecked");
            let verifier = Arc::new(NoCertificateVerification::new(provider));
            builder
                .dangerous()
                .with_custom_certificate_verifier(verifier)
                .with_no_client_auth()
        }
    };

    Ok(Arc::new(config))
}

/// A client TLS session over TCP.
pub struct TlsStream(StreamOwned<ClientConnection, TcpStream>);

impl std::fmt::Debug for TlsStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsStream")
            .field("peer", &self.0.sock.peer_addr().ok())
            .field("protocol", &self.0.conn.protocol_version())
            .finish()
    }
}

impl Read for TlsStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for TlsStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl CallStream for TlsStream {
    fn shutdown(&mut self) -> io::Result<()> {
        self.0.conn.send_close_notify();
        let flushed = self.0.conn.complete_io(&mut self.0.sock).map(|_| ());
        let closed = self.0.sock.shutdown(Shutdown::Both);
        flushed.and(closed)
    }
}

/// Connects over TCP and negotiates TLS with rustls.
#[derive(Clone)]
pub struct TlsTransport<R: DnsResolver = SystemDnsResolver> {
    resolver: R,
    tls_config: Arc<ClientConfig>,
    connect_timeout: Option<Duration>,
    io_timeout: Option<Duration>,
}

impl<R: DnsResolver> std::fmt::Debug for TlsTransport<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsTransport")
            .field("tls_config", &"<ClientConfig>")
            .field("connect_timeout", &self.connect_timeout)
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

impl TlsTransport<SystemDnsResolver> {
    /// Transport using the operating system resolver.
    ///
    /// # Errors
    ///
    /// See [`client_config`].
    pub fn new(verification: TlsVerification) -> HttpsCallResult<Self> {
        Self::with_resolver(SystemDnsResolver::new(), verification)
    }
}

impl<R: DnsResolver> TlsTransport<R> {
    /// Transport using a custom resolver.
    ///
    /// # Errors
    ///
    /// See [`client_config`].
    pub fn with_resolver(resolver: R, verification: TlsVerification) -> HttpsCallResult<Self> {
        Ok(Self::with_client_config(resolver, client_config(verification)?))
    }

    /// Transport using a caller-built rustls configuration, e.g. one
    /// trusting a private root.
    pub fn with_client_config(resolver: R, tls_config: Arc<ClientConfig>) -> Self {
        Self {
            resolver,
            tls_config,
            connect_timeout: None,
            io_timeout: None,
        }
    }

    /// Sets the TCP connect timeout and the socket read/write timeout.
    /// `None` blocks indefinitely.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Option<Duration>, io: Option<Duration>) -> Self {
        self.connect_timeout = connect;
        self.io_timeout = io;
        self
    }

    fn connect_tcp(&self, endpoint: &Endpoint) -> HttpsCallResult<TcpStream> {
        let mut last_error = None;

        for addr in endpoint.addrs() {
            let attempt = match self.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(addr, timeout),
                None => TcpStream::connect(addr),
            };

            match attempt {
                Ok(stream) => {
                    tracing::debug!("Connected to {} via {addr}", endpoint.host());
                    return Ok(stream);
                }
                Err(err) => {
                    tracing::debug!("Connection attempt to {addr} failed: {err}");
                    last_error = Some(err);
                }
            }
        }

        Err(HttpsCallError::ConnectionFailed(match last_error {
            Some(err) => format!("{}: {err}", endpoint.authority()),
            None => format!("no address to connect to for {}", endpoint.authority()),
        }))
    }
}

impl<R: DnsResolver> Transport for TlsTransport<R> {
    type Stream = TlsStream;

    fn resolve(&self, host: &str, port_override: Option<u16>) -> HttpsCallResult<Endpoint> {
        Endpoint::resolve(&self.resolver, host, port_override)
    }

    fn connect(&self, endpoint: &Endpoint) -> HttpsCallResult<Self::Stream> {
        let tcp = self.connect_tcp(endpoint)?;
        tcp.set_read_timeout(self.io_timeout)
            .and_then(|()| tcp.set_write_timeout(self.io_timeout))
            .map_err(|err| HttpsCallError::ConnectionFailed(err.to_string()))?;

        let server_name = ServerName::try_from(endpoint.host().to_string())
            .map_err(|err| HttpsCallError::HandshakeFailed(err.to_string()))?;
        let conn = ClientConnection::new(self.tls_config.clone(), server_name)
            .map_err(|err| HttpsCallError::HandshakeFailed(err.to_string()))?;

        let mut stream = StreamOwned::new(conn, tcp);
        while stream.conn.is_handshaking() {
            stream
                .conn
                .complete_io(&mut stream.sock)
                .map_err(|err| HttpsCallError::HandshakeFailed(err.to_string()))?;
        }

        tracing::debug!(
            "TLS session with {} established ({:?})",
            endpoint.authority(),
            stream.conn.protocol_version()
        );
        Ok(TlsStream(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// WHY: Both policies must produce a usable client configuration
    /// WHAT: Tests that client_config builds for verified and disabled modes
    #[test]
    fn test_client_config_builds_for_both_policies() {
        assert!(client_config(TlsVerification::Verified).is_ok());
        assert!(client_config(TlsVerification::Disabled).is_ok());
    }

    /// WHY: Verification must be opt-out, never silently off
    /// WHAT: Tests that the default policy verifies certificates
    #[test]
    fn test_verification_defaults_to_verified() {
        assert_eq!(TlsVerification::default(), TlsVerification::Verified);
    }

    /// WHY: The no-verify policy must still check handshake signatures
    /// WHAT: Tests that it advertises the provider's signature schemes
    #[test]
    fn test_no_verification_keeps_signature_schemes() {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = NoCertificateVerification::new(provider.clone());

        assert_eq!(
            verifier.supported_verify_schemes(),
            provider.signature_verification_algorithms.supported_schemes()
        );
    }
}
