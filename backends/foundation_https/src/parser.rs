//! Response parsing with strict content-length framing.
//!
//! The parser walks a fixed sequence of states and never backtracks:
//!
//! ```text
//! AwaitHeaderBlock -> ParseStatusLine -> ParseHeaders -> ValidateContentLength
//!     -> ReconcileBuffered -> ReadRemainder -> Shutdown -> Done
//! ```
//!
//! All size checks run before the body buffer is allocated, so a hostile
//! peer cannot make the parser reserve more than the configured limit.

use crate::errors::{HttpsCallError, HttpsCallResult};
use crate::response::HttpsResponse;
use crate::stream::{read_full, CallStream, DelimitedReader};

/// Marks the end of the status line and header block.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Smallest body accepted, e.g. `{}`.
pub const MIN_CONTENT_LENGTH: usize = 2;

const HTTP_VERSION_PREFIX: &str = "HTTP/";
const CONTENT_LENGTH: &str = "content-length";

/// Stage a [`ResponseParser`] is in, or failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Buffering until `\r\n\r\n` is seen.
    AwaitHeaderBlock,
    /// Checking the `HTTP/` prefix and reading the status code.
    ParseStatusLine,
    /// Scanning header lines for `Content-Length`.
    ParseHeaders,
    /// Checking the declared length against the minimum and the limit.
    ValidateContentLength,
    /// Copying body bytes that arrived with the header block.
    ReconcileBuffered,
    /// Reading the rest of the body straight from the stream.
    ReadRemainder,
    /// Closing the stream; failures here are logged only.
    Shutdown,
    /// A complete response was produced.
    Done,
}

/// Single-use parser for one response.
///
/// A fresh parser is created for every call; after a failure
/// [`ResponseParser::state`] reports the stage that failed.
#[derive(Debug)]
pub struct ResponseParser {
    size_limit: usize,
    state: ParserState,
}

impl ResponseParser {
    /// Parser accepting bodies, and header blocks, of at most
    /// `size_limit` bytes.
    #[must_use]
    pub fn new(size_limit: usize) -> Self {
        Self {
            size_limit,
            state: ParserState::AwaitHeaderBlock,
        }
    }

    /// Current stage; after a failed parse, the stage that failed.
    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Reads one complete response from `stream` and shuts the stream down.
    ///
    /// Shutdown errors are logged and ignored since the body is already
    /// complete by then.
    ///
    /// # Errors
    ///
    /// Any framing or I/O failure before the body is complete.
    pub fn parse<S: CallStream + ?Sized>(
        &mut self,
        stream: &mut S,
    ) -> HttpsCallResult<HttpsResponse> {
        self.state = ParserState::AwaitHeaderBlock;
        let mut reader = DelimitedReader::new(stream);
        let header_len = reader.read_until(HEADER_TERMINATOR, self.size_limit)?;
        let (head, buffered) = reader.into_parts(header_len);
        tracing::debug!(
            "Received header block of {} byte(s) with {} body byte(s) buffered",
            head.len(),
            buffered.len()
        );

        let head = String::from_utf8_lossy(&head);

        self.state = ParserState::ParseStatusLine;
        let (status_code, header_lines) = parse_status_line(&head)?;

        self.state = ParserState::ParseHeaders;
        let content_length = scan_content_length(header_lines);
        tracing::debug!("Status {status_code}, declared content length {content_length}");

        self.state = ParserState::ValidateContentLength;
        validate_content_length(content_length, self.size_limit)?;

        self.state = ParserState::ReconcileBuffered;
        let avail = buffered.len();
        if avail > content_length {
            return Err(HttpsCallError::ContentLengthMismatch {
                buffered: avail,
                declared: content_length,
            });
        }
        let mut body = vec![0u8; content_length];
        body[..avail].copy_from_slice(&buffered);

        self.state = ParserState::ReadRemainder;
        let received = read_full(stream, &mut body[avail..]).map_err(HttpsCallError::ReadFailed)?;
        if avail + received < content_length {
            return Err(HttpsCallError::ShortRead {
                expected: content_length,
                received: avail + received,
            });
        }

        self.state = ParserState::Shutdown;
        if let Err(err) = stream.shutdown() {
            tracing::warn!("{}", HttpsCallError::ShutdownFailed(err));
        }

        self.state = ParserState::Done;
        Ok(HttpsResponse::new(status_code, body))
    }
}

/// Parses the version and status code tokens of `head`.
///
/// Returns the status code and the header lines that follow the status line.
///
/// # Errors
///
/// `MalformedStatusLine` if the first token lacks the `HTTP/` prefix or the
/// second is not a 16-bit number.
pub fn parse_status_line(head: &str) -> HttpsCallResult<(u16, std::str::Split<'_, char>)> {
    let head = head.trim_start();
    let (status_line, rest) = head.split_once('\n').unwrap_or((head, ""));

    let mut tokens = status_line.split_whitespace();
    let version = tokens.next().unwrap_or_default();
    if !version.starts_with(HTTP_VERSION_PREFIX) {
        return Err(HttpsCallError::MalformedStatusLine(status_line.trim_end().to_string()));
    }

    let status_code = tokens
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| HttpsCallError::MalformedStatusLine(status_line.trim_end().to_string()))?;

    Ok((status_code, rest.split('\n')))
}

/// Finds the first `Content-Length` among `lines`, stopping at the blank
/// line that ends the header block.
///
/// The first occurrence wins; later duplicates are consumed but not
/// inspected. A missing or non-numeric value yields zero.
pub fn scan_content_length<'a, I>(lines: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    let mut content_length: Option<usize> = None;

    for line in lines {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            break;
        }
        if content_length.is_some() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            content_length = Some(value.trim().parse().unwrap_or(0));
        }
    }

    content_length.unwrap_or(0)
}

/// Checks a declared content length against the accepted range.
///
/// # Errors
///
/// `ContentLengthTooSmall` below [`MIN_CONTENT_LENGTH`], `ContentLengthTooLarge`
/// above `limit`.
pub fn validate_content_length(content_length: usize, limit: usize) -> HttpsCallResult<()> {
    if content_length < MIN_CONTENT_LENGTH {
        return Err(HttpsCallError::ContentLengthTooSmall(content_length));
    }
    if content_length > limit {
        return Err(HttpsCallError::ContentLengthTooLarge {
            length: content_length,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read, Write};

    /// In-memory stream serving a canned response.
    struct CannedStream {
        input: Cursor<Vec<u8>>,
        shutdown_calls: usize,
    }

    impl CannedStream {
        fn new(raw: &[u8]) -> Self {
            Self {
                input: Cursor::new(raw.to_vec()),
                shutdown_calls: 0,
            }
        }
    }

    impl Read for CannedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for CannedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CallStream for CannedStream {
        fn shutdown(&mut self) -> io::Result<()> {
            self.shutdown_calls += 1;
            Ok(())
        }
    }

    fn parse(raw: &[u8], limit: usize) -> (ResponseParser, HttpsCallResult<HttpsResponse>) {
        let mut stream = CannedStream::new(raw);
        let mut parser = ResponseParser::new(limit);
        let result = parser.parse(&mut stream);
        (parser, result)
    }

    /// WHY: The common case must produce status and exact body
    /// WHAT: Tests a well-formed response end to end
    #[test]
    fn test_parse_well_formed_response() {
        let mut stream =
            CannedStream::new(b"HTTP/1.1 200 OK\r\nContent-Length: 7\r\n\r\n{\"a\":1}");
        let mut parser = ResponseParser::new(1024);

        let response = parser.parse(&mut stream).unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, br#"{"a":1}"#);
        assert_eq!(parser.state(), ParserState::Done);
        assert_eq!(stream.shutdown_calls, 1);
    }

    /// WHY: Anything not speaking HTTP must be rejected before reading a body
    /// WHAT: Tests the HTTP/ prefix check on the first token
    #[test]
    fn test_parse_rejects_non_http_status_line() {
        let (parser, result) = parse(b"HTTX/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}", 1024);

        assert!(matches!(result, Err(HttpsCallError::MalformedStatusLine(_))));
        assert_eq!(parser.state(), ParserState::ParseStatusLine);
    }

    /// WHY: A status code must be a 16-bit number
    /// WHAT: Tests non-numeric and out-of-range status codes
    #[test]
    fn test_parse_status_line_rejects_bad_codes() {
        assert!(matches!(
            parse_status_line("HTTP/1.1 abc OK\r\n\r\n"),
            Err(HttpsCallError::MalformedStatusLine(_))
        ));
        assert!(matches!(
            parse_status_line("HTTP/1.1 70000 OK\r\n\r\n"),
            Err(HttpsCallError::MalformedStatusLine(_))
        ));
        assert!(matches!(
            parse_status_line("HTTP/1.0\r\n\r\n"),
            Err(HttpsCallError::MalformedStatusLine(_))
        ));
    }

    /// WHY: The reason phrase is free text and must not affect parsing
    /// WHAT: Tests a status line with a multi-word reason phrase
    #[test]
    fn test_parse_status_line_with_reason_phrase() {
        let (code, lines) =
            parse_status_line("HTTP/1.0 404 Not Found Here\r\nContent-Length: 9\r\n\r\n").unwrap();
        assert_eq!(code, 404);
        assert_eq!(scan_content_length(lines), 9);
    }

    /// WHY: Header names are case-insensitive and padded with whitespace
    /// WHAT: Tests case and whitespace variations of Content-Length
    #[test]
    fn test_scan_content_length_case_and_whitespace() {
        assert_eq!(scan_content_length(["CONTENT-LENGTH: 12\r"]), 12);
        assert_eq!(scan_content_length(["  content-length  :   5  \r"]), 5);
        assert_eq!(scan_content_length(["Content-Type: x\r", "Content-length:3"]), 3);
    }

    /// WHY: Duplicate Content-Length headers must resolve deterministically
    /// WHAT: Tests that the first occurrence wins
    #[test]
    fn test_scan_content_length_first_wins() {
        let lines = ["Content-Length: 4\r", "Content-Length: 400\r", "\r"];
        assert_eq!(scan_content_length(lines), 4);
    }

    /// WHY: Missing or garbage values must not be trusted
    /// WHAT: Tests that both collapse to zero
    #[test]
    fn test_scan_content_length_missing_or_invalid() {
        assert_eq!(scan_content_length(["Server: x\r", "\r"]), 0);
        assert_eq!(scan_content_length(["Content-Length: ten\r"]), 0);
        assert_eq!(scan_content_length(["Content-Length: -5\r"]), 0);
    }

    /// WHY: Headers after the blank line are body, not headers
    /// WHAT: Tests that scanning stops at the end of the header block
    #[test]
    fn test_scan_content_length_stops_at_blank_line() {
        assert_eq!(scan_content_length(["X: y\r", "\r", "Content-Length: 9\r"]), 0);
    }

    /// WHY: Bodies shorter than `{}` are not viable
    /// WHAT: Tests declared lengths 0 and 1, and an absent header
    #[test]
    fn test_parse_rejects_tiny_content_length() {
        let (_, result) = parse(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n", 1024);
        assert!(matches!(result, Err(HttpsCallError::ContentLengthTooSmall(0))));

        let (_, result) = parse(b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\nX", 1024);
        assert!(matches!(result, Err(HttpsCallError::ContentLengthTooSmall(1))));

        let (parser, result) = parse(b"HTTP/1.1 204 No Content\r\n\r\n", 1024);
        assert!(matches!(result, Err(HttpsCallError::ContentLengthTooSmall(0))));
        assert_eq!(parser.state(), ParserState::ValidateContentLength);
    }

    /// WHY: The declared size is attacker-controlled
    /// WHAT: Tests that lengths over the limit fail before any allocation
    #[test]
    fn test_parse_rejects_oversized_content_length() {
        let (_, result) = parse(b"HTTP/1.1 200 OK\r\nContent-Length: 65\r\n\r\n{}", 64);
        assert!(matches!(
            result,
            Err(HttpsCallError::ContentLengthTooLarge { length: 65, limit: 64 })
        ));
    }

    /// WHY: The limit itself is an accepted size
    /// WHAT: Tests a body exactly at the limit
    #[test]
    fn test_parse_accepts_body_at_limit() {
        let mut raw = b"HTTP/1.1 200 OK\r\nContent-Length: 8\r\n\r\n".to_vec();
        raw.extend_from_slice(b"12345678");

        let (_, result) = parse(&raw, raw.len());
        assert_eq!(result.unwrap().body, b"12345678");
    }

    /// WHY: More buffered bytes than declared means the framing is inconsistent
    /// WHAT: Tests ContentLengthMismatch when extra bytes arrive with the head
    #[test]
    fn test_parse_rejects_excess_buffered_bytes() {
        let response = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}trailing";
        let (parser, result) = parse(response, 1024);

        assert!(matches!(
            result,
            Err(HttpsCallError::ContentLengthMismatch { buffered: 10, declared: 2 })
        ));
        assert_eq!(parser.state(), ParserState::ReconcileBuffered);
    }

    /// WHY: A body cut short by the peer must never be returned
    /// WHAT: Tests ShortRead with the expected and received byte counts
    #[test]
    fn test_parse_rejects_truncated_body() {
        let (parser, result) = parse(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n{\"a\"", 1024);

        assert!(matches!(
            result,
            Err(HttpsCallError::ShortRead { expected: 10, received: 4 })
        ));
        assert_eq!(parser.state(), ParserState::ReadRemainder);
    }

    /// WHY: Bare LF line endings still delimit header lines
    /// WHAT: Tests a header block mixing LF and CRLF endings
    #[test]
    fn test_parse_tolerates_bare_lf_headers() {
        let (_, result) = parse(
            b"HTTP/1.0 201 Created\nServer: t\nContent-Length: 2\r\n\r\n{}",
            1024,
        );

        let response = result.unwrap();
        assert_eq!(response.status_code, 201);
        assert_eq!(response.body, b"{}");
    }
}
