//! Single-shot HTTPS calls with HTTP/1.0 framing.
//!
//! A call resolves a host, opens one TLS connection, writes a
//! `Connection: close` request and reads exactly `Content-Length` body
//! bytes back. There is no pooling, redirect handling, chunked decoding
//! or retrying.
//!
//! ```no_run
//! use foundation_https::{HttpsCall, HttpsRequest, HttpsResponse};
//!
//! let call = HttpsCall::new("rpc.example.com", None, 1_048_576)?;
//! let request = HttpsRequest::post("/").with_body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
//!
//! let mut response = HttpsResponse::default();
//! if call.exec(&request, &mut response) {
//!     println!("{} {:?}", response.status_code, response.body_text());
//! }
//! # Ok::<(), foundation_https::HttpsCallError>(())
//! ```

pub mod call;
pub mod config;
pub mod dns;
pub mod endpoint;
pub mod errors;
pub mod parser;
pub mod request;
pub mod response;
pub mod stream;
pub mod tls;
pub mod transport;

pub use call::HttpsCall;
pub use config::{ConfigError, ConfigResult, HttpsCallConfig, DEFAULT_RESPONSE_SIZE_LIMIT};
pub use dns::{DnsResolver, MockDnsResolver, StaticSocketAddr, SystemDnsResolver};
pub use endpoint::{Endpoint, DEFAULT_HTTPS_PORT};
pub use errors::{DnsError, HttpsCallError, HttpsCallResult};
pub use parser::{ParserState, ResponseParser};
pub use request::{HttpsRequest, DEFAULT_CONTENT_TYPE};
pub use response::HttpsResponse;
pub use stream::CallStream;
pub use tls::{TlsStream, TlsTransport, TlsVerification};
pub use transport::Transport;
