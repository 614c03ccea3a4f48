//! Buffered HTTP response writer.
//!
//! Handlers write a response in three phases: headers, then the status line,
//! then the body. Once the status is written the headers are frozen and later
//! header or status writes are ignored. Writing body bytes before a status
//! commits an implicit `200 OK`.

use std::io;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

use crate::body::PantryResponseBody;

/// A response under construction.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    headers: HeaderMap,
    status: Option<StatusCode>,
    body: Vec<u8>,
}

impl ResponseWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Response headers written so far.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set a header, replacing any previous value. Ignored once the status is written.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.status.is_some() {
            tracing::warn!(header = %name, "header set after status was written, ignoring");
            return;
        }
        self.headers.insert(name, value);
    }

    /// Write the status line. Only the first call has an effect.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.status {
            Some(written) => {
                tracing::warn!(%written, attempted = %status, "superfluous status write, ignoring");
            }
            None => self.status = Some(status),
        }
    }

    /// Whether the status line has been written.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// The status that will be sent, `200 OK` unless written otherwise.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Body bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Finish the writer into an HTTP response.
    #[must_use]
    pub fn into_response(self) -> http::Response<PantryResponseBody> {
        let mut response = http::Response::new(PantryResponseBody::from_bytes(Bytes::from(self.body)));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
