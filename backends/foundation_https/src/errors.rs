use derive_more::From;
use std::io;

/// DNS resolution errors.
///
/// These errors occur while turning the configured host name into
/// socket addresses.
#[derive(From, Debug)]
pub enum DnsError {
    /// DNS resolution failed for the given hostname.
    #[from(ignore)]
    ResolutionFailed(String),

    /// Invalid hostname provided.
    #[from(ignore)]
    InvalidHost(String),

    /// No addresses found for the given hostname.
    #[from(ignore)]
    NoAddressesFound(String),

    /// I/O error during DNS resolution.
    #[from(ignore)]
    IoError(String),
}

impl From<io::Error> for DnsError {
    fn from(err: io::Error) -> Self {
        DnsError::IoError(err.to_string())
    }
}

// IoError is carried as a String so the error stays cloneable for mock resolvers.
impl Clone for DnsError {
    fn clone(&self) -> Self {
        match self {
            Self::ResolutionFailed(s) => Self::ResolutionFailed(s.clone()),
            Self::InvalidHost(s) => Self::InvalidHost(s.clone()),
            Self::NoAddressesFound(s) => Self::NoAddressesFound(s.clone()),
            Self::IoError(s) => Self::IoError(s.clone()),
        }
    }
}

impl std::error::Error for DnsError {}

impl core::fmt::Display for DnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResolutionFailed(host) => {
                write!(f, "DNS resolution failed for host: {host}")
            }
            Self::InvalidHost(host) => {
                write!(f, "Invalid hostname: {host}")
            }
            Self::NoAddressesFound(host) => {
                write!(f, "No addresses found for host: {host}")
            }
            Self::IoError(err) => {
                write!(f, "I/O error during DNS resolution: {err}")
            }
        }
    }
}

/// Result of a call stage.
pub type HttpsCallResult<T> = std::result::Result<T, HttpsCallError>;

/// Errors produced by a single HTTPS call.
///
/// Every stage of a call (resolve, connect, handshake, send, receive)
/// reports its failure through one of these variants.
#[derive(From, Debug)]
pub enum HttpsCallError {
    /// Host name could not be resolved.
    #[from]
    Resolution(DnsError),

    /// TCP connection could not be established to any resolved address.
    #[from(ignore)]
    ConnectionFailed(String),

    /// TLS session negotiation failed.
    #[from(ignore)]
    HandshakeFailed(String),

    /// Caller supplied a non-empty header block shorter than a CRLF.
    #[from(ignore)]
    MalformedRequestHeaders(usize),

    /// Response status line did not start with `HTTP/` or carried no
    /// numeric status code.
    #[from(ignore)]
    MalformedStatusLine(String),

    /// Declared content length is below the minimum viable body.
    #[from(ignore)]
    ContentLengthTooSmall(usize),

    /// Declared content length exceeds the configured response limit.
    #[from(ignore)]
    ContentLengthTooLarge { length: usize, limit: usize },

    /// More body bytes arrived with the header block than were declared.
    #[from(ignore)]
    ContentLengthMismatch { buffered: usize, declared: usize },

    /// Stream closed before the declared body was fully received.
    #[from(ignore)]
    ShortRead { expected: usize, received: usize },

    /// Header block grew past the response size limit without a terminator.
    #[from(ignore)]
    HeaderBlockTooLarge(usize),

    /// Stream closed before the header block terminator was seen.
    #[from(ignore)]
    HeaderBlockIncomplete,

    /// Writing the request to the stream failed.
    #[from(ignore)]
    WriteFailed(io::Error),

    /// Reading the response from the stream failed.
    #[from(ignore)]
    ReadFailed(io::Error),

    /// Closing the stream failed. Never surfaced by a call.
    #[from(ignore)]
    ShutdownFailed(io::Error),
}

impl std::error::Error for HttpsCallError {}

impl core::fmt::Display for HttpsCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolution(err) => write!(f, "DNS error: {err}"),
            Self::ConnectionFailed(msg) => write!(f, "Connection failed: {msg}"),
            Self::HandshakeFailed(msg) => write!(f, "TLS handshake failed: {msg}"),
            Self::MalformedRequestHeaders(len) => write!(
                f,
                "Malformed request headers: {len} byte(s) is too short for a header line"
            ),
            Self::MalformedStatusLine(line) => {
                write!(f, "Invalid response status line: {line:?}")
            }
            Self::ContentLengthTooSmall(length) => {
                write!(f, "Invalid response body (too short): content length {length}")
            }
            Self::ContentLengthTooLarge { length, limit } => write!(
                f,
                "Response body size limit exceeded: content length {length} > limit {limit}"
            ),
            Self::ContentLengthMismatch { buffered, declared } => write!(
                f,
                "Invalid response body (content length mismatch): {buffered} byte(s) buffered but {declared} declared"
            ),
            Self::ShortRead { expected, received } => write!(
                f,
                "Stream ended early: expected {expected} body byte(s), received {received}"
            ),
            Self::HeaderBlockTooLarge(limit) => {
                write!(f, "Response header block exceeds {limit} byte(s)")
            }
            Self::HeaderBlockIncomplete => {
                write!(f, "Stream ended before the response header block was complete")
            }
            Self::WriteFailed(err) => write!(f, "Failed to send request: {err}"),
            Self::ReadFailed(err) => write!(f, "Failed to read response: {err}"),
            Self::ShutdownFailed(err) => write!(f, "Failed to shut down stream: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// WHY: Verify DnsError::ResolutionFailed creates correct error message
    /// WHAT: Tests that the error message includes the hostname
    #[test]
    fn test_dns_error_resolution_failed_display() {
        let error = DnsError::ResolutionFailed("example.com".to_string());
        let display = format!("{error}");
        assert!(display.contains("DNS resolution failed"));
        assert!(display.contains("example.com"));
    }

    /// WHY: Verify I/O errors convert into DnsError
    /// WHAT: Tests the manual From<io::Error> implementation
    #[test]
    fn test_dns_error_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::TimedOut, "timeout");
        let dns_error = DnsError::from(io_error);
        assert!(matches!(dns_error, DnsError::IoError(_)));
        assert!(format!("{dns_error}").contains("I/O error"));
    }

    /// WHY: DNS failures must surface as the resolution stage of a call
    /// WHAT: Tests the derived From<DnsError> for HttpsCallError
    #[test]
    fn test_call_error_from_dns_error() {
        let err = HttpsCallError::from(DnsError::NoAddressesFound("test.com".to_string()));
        assert!(matches!(err, HttpsCallError::Resolution(_)));
        let display = format!("{err}");
        assert!(display.contains("DNS error"));
        assert!(display.contains("test.com"));
    }

    /// WHY: Size violations should report both the offending and allowed values
    /// WHAT: Tests ContentLengthTooLarge and ContentLengthMismatch messages
    #[test]
    fn test_content_length_errors_display_values() {
        let too_large = HttpsCallError::ContentLengthTooLarge {
            length: 2048,
            limit: 1024,
        };
        let display = format!("{too_large}");
        assert!(display.contains("2048"));
        assert!(display.contains("1024"));

        let mismatch = HttpsCallError::ContentLengthMismatch {
            buffered: 9,
            declared: 7,
        };
        let display = format!("{mismatch}");
        assert!(display.contains("mismatch"));
        assert!(display.contains('9'));
    }

    /// WHY: Errors have to plug into std error handling
    /// WHAT: Tests that both error types coerce to `dyn std::error::Error`
    #[test]
    fn test_errors_implement_std_error() {
        let dns_error: &dyn std::error::Error = &DnsError::InvalidHost(String::new());
        let call_error: &dyn std::error::Error = &HttpsCallError::HeaderBlockIncomplete;

        assert!(!dns_error.to_string().is_empty());
        assert!(!call_error.to_string().is_empty());
    }
}
