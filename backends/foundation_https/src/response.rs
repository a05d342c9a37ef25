/// Outcome of a successful call.
///
/// Empty (status 0, no body) before a call and after any failed call;
/// fully populated only on success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpsResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
}

impl HttpsResponse {
    #[must_use]
    pub fn new(status_code: u16, body: Vec<u8>) -> Self {
        Self { status_code, body }
    }

    /// Resets to the empty state and releases the body allocation.
    pub fn clear(&mut self) {
        self.status_code = 0;
        self.body = Vec::new();
    }

    /// True for the state before a call and after any failed call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status_code == 0 && self.body.is_empty()
    }

    /// Body as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}
