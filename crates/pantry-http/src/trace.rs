//! Request spans and trace IDs.
//!
//! Every request runs inside one [`RequestSpan`]. The span's [`TraceId`]
//! continues an incoming W3C `traceparent` header when present and is freshly
//! minted otherwise. With tracing disabled every trace ID is all zeroes.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::Empty;

use pantry_model::SessionContext;

/// W3C trace context header.
pub const TRACEPARENT: &str = "traceparent";

/// A 128-bit trace identifier, rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TraceId(u128);

impl TraceId {
    /// The trace ID used when tracing is inactive.
    pub const ZERO: Self = Self(0);

    /// A fresh random trace ID.
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().as_u128())
    }

    /// Parse 32 hex characters. The all-zero ID is rejected as invalid.
    #[must_use]
    pub fn from_hex(value: &str) -> Option<Self> {
        if value.len() != 32 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u128::from_str_radix(value, 16)
            .ok()
            .filter(|v| *v != 0)
            .map(Self)
    }

    /// Extract the trace ID from a `traceparent` header value
    /// (`version-traceid-parentid-flags`).
    #[must_use]
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let _version = parts.next()?;
        let trace_id = parts.next()?;
        Self::from_hex(trace_id)
    }

    /// Whether this is the all-zero ID.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Opens request spans.
#[derive(Debug, Clone)]
pub struct Tracer {
    enabled: bool,
    service_name: Arc<str>,
    recorder: Option<Arc<Mutex<Vec<RequestSpan>>>>,
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(true, "pantry")
    }
}

impl Tracer {
    /// Create a tracer for `service_name`.
    #[must_use]
    pub fn new(enabled: bool, service_name: impl Into<Arc<str>>) -> Self {
        Self {
            enabled,
            service_name: service_name.into(),
            recorder: None,
        }
    }

    /// Keep every span this tracer opens, for later inspection.
    #[must_use]
    pub fn with_recorder(mut self) -> Self {
        self.recorder = Some(Arc::default());
        self
    }

    /// Spans opened so far, when recording.
    #[must_use]
    pub fn recorded_spans(&self) -> Vec<RequestSpan> {
        self.recorder
            .as_ref()
            .map(|r| r.lock().clone())
            .unwrap_or_default()
    }

    /// Whether real trace IDs are minted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Open the span for one request.
    #[must_use]
    pub fn start_request_span(&self, parts: &http::request::Parts, operation: &'static str) -> RequestSpan {
        let trace_id = if self.enabled {
            parts
                .headers
                .get(TRACEPARENT)
                .and_then(|v| v.to_str().ok())
                .and_then(TraceId::from_traceparent)
                .unwrap_or_else(TraceId::random)
        } else {
            TraceId::ZERO
        };

        let span = tracing::info_span!(
            "request",
            service = %self.service_name,
            operation,
            method = %parts.method,
            path = %parts.uri.path(),
            trace_id = %trace_id,
            user_id = Empty,
            household_id = Empty,
        );

        let request_span = RequestSpan {
            span,
            trace_id,
            record: Arc::default(),
        };
        if let Some(recorder) = &self.recorder {
            recorder.lock().push(request_span.clone());
        }
        request_span
    }
}

/// What has been attached to a span, kept for inspection.
#[derive(Debug, Default)]
struct SpanRecord {
    attributes: Vec<(String, String)>,
    errors: Vec<String>,
}

/// The span of one request.
#[derive(Debug, Clone)]
pub struct RequestSpan {
    span: tracing::Span,
    trace_id: TraceId,
    record: Arc<Mutex<SpanRecord>>,
}

impl RequestSpan {
    /// The request's trace ID.
    #[must_use]
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The underlying tracing span, for instrumenting futures.
    #[must_use]
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Attach a key/value attribute.
    pub fn attach(&self, key: &str, value: impl fmt::Display) {
        let value = value.to_string();
        tracing::debug!(parent: &self.span, key, value = %value, "span attribute");
        self.record.lock().attributes.push((key.to_owned(), value));
    }

    /// Record the session's user and household on the span.
    pub fn attach_session(&self, session: &SessionContext) {
        self.span.record("user_id", session.user_id());
        self.span
            .record("household_id", session.active_household_id.as_str());
        self.attach("user_id", session.user_id());
        self.attach("household_id", &session.active_household_id);
    }

    /// Record an error on the span and log it.
    pub fn acknowledge_error(&self, error: &(dyn std::error::Error + 'static), description: &str) {
        tracing::error!(parent: &self.span, error = %error, "{description}");
        self.record
            .lock()
            .errors
            .push(format!("{description}: {error}"));
    }

    /// Value of the last attribute attached under `key`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.record
            .lock()
            .attributes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Errors acknowledged on this span, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.record.lock().errors.clone()
    }
}
