//! Resolved connection target.
//!
//! Ports are kept in host byte order everywhere in this crate. The only
//! conversion to network order happens inside `std::net` when a socket is
//! opened, so the `Host:` header and the connection destination always agree.

use crate::dns::DnsResolver;
use crate::errors::{DnsError, HttpsCallResult};
use std::net::SocketAddr;

/// Standard secure-HTTP port used when the caller gives no override.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// A host name with its resolved addresses, all sharing one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    addrs: Vec<SocketAddr>,
}

impl Endpoint {
    /// Resolves `host` through `resolver` and applies the caller's port
    /// override to every returned address.
    ///
    /// Without an override the resolver's port is kept as-is.
    ///
    /// # Errors
    ///
    /// Returns `HttpsCallError::Resolution` if the resolver fails or
    /// returns no address.
    pub fn resolve<R: DnsResolver + ?Sized>(
        resolver: &R,
        host: &str,
        port_override: Option<u16>,
    ) -> HttpsCallResult<Self> {
        let mut addrs = resolver.resolve(host, DEFAULT_HTTPS_PORT)?;
        if addrs.is_empty() {
            return Err(DnsError::NoAddressesFound(host.to_string()).into());
        }

        if let Some(port) = port_override {
            for addr in &mut addrs {
                addr.set_port(port);
            }
        }

        let port = addrs[0].port();
        tracing::debug!("Resolved {host} to {} address(es) on port {port}", addrs.len());

        Ok(Self {
            host: host.to_string(),
            port,
            addrs,
        })
    }

    /// Host name as given by the caller, used for SNI and the `Host:` header.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port every connection attempt targets, in host byte order.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolved addresses in resolver order, all carrying [`Endpoint::port`].
    #[must_use]
    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// `host:port` as rendered into the `Host:` request header.
    #[must_use]
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
