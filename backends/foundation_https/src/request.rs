//! Request data and its HTTP/1.0 wire rendering.

use crate::errors::{HttpsCallError, HttpsCallResult};

const CRLF: &str = "\r\n";

/// Content type sent with a non-empty body unless the caller overrides it.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// An abstract request for a single call.
///
/// `headers` is a raw, already CRLF-formatted header block appended
/// verbatim to the request head. The caller owns its correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpsRequest {
    pub method: String,
    pub path: String,
    pub headers: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

impl Default for HttpsRequest {
    fn default() -> Self {
        Self {
            method: String::new(),
            path: String::new(),
            headers: String::new(),
            body: Vec::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl HttpsRequest {
    /// Request with no headers and no body, using [`DEFAULT_CONTENT_TYPE`].
    pub fn new<M: Into<String>, P: Into<String>>(method: M, path: P) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// `GET` request for `path`.
    pub fn get<P: Into<String>>(path: P) -> Self {
        Self::new("GET", path)
    }

    /// `POST` request for `path`.
    pub fn post<P: Into<String>>(path: P) -> Self {
        Self::new("POST", path)
    }

    /// Sets the raw header block. Lines must be CRLF-separated; a missing
    /// final CRLF is added when rendering.
    #[must_use]
    pub fn with_headers<S: Into<String>>(mut self, headers: S) -> Self {
        self.headers = headers.into();
        self
    }

    /// Sets the body. A non-empty body adds `Content-Type` and
    /// `Content-Length` headers.
    #[must_use]
    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Overrides the `Content-Type` sent with a non-empty body.
    #[must_use]
    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Renders the exact bytes to write to the transport.
    ///
    /// `authority` is the endpoint's `host:port`, as rendered into the
    /// `Host:` header.
    ///
    /// # Errors
    ///
    /// Returns `HttpsCallError::MalformedRequestHeaders` when `headers` is
    /// non-empty but shorter than two bytes.
    pub fn render(&self, authority: &str) -> HttpsCallResult<Vec<u8>> {
        let mut head = String::with_capacity(128 + self.headers.len());

        head.push_str(&format!("{} {} HTTP/1.0{CRLF}", self.method, self.path));
        head.push_str(&format!("Host: {authority}{CRLF}"));

        if !self.body.is_empty() {
            head.push_str(&format!("Content-Type: {}{CRLF}", self.content_type));
            head.push_str(&format!("Content-Length: {}{CRLF}", self.body.len()));
        }

        if !self.headers.is_empty() {
            if self.headers.len() < CRLF.len() {
                return Err(HttpsCallError::MalformedRequestHeaders(self.headers.len()));
            }
            head.push_str(&self.headers);
            if !self.headers.ends_with(CRLF) {
                head.push_str(CRLF);
            }
        }

        head.push_str(&format!("Accept: */*{CRLF}"));
        head.push_str(&format!("Connection: close{CRLF}"));
        head.push_str(CRLF);

        let mut wire = head.into_bytes();
        wire.extend_from_slice(&self.body);
        Ok(wire)
    }
}
