//! The request pipeline every handler follows.
//!
//! A handler opens a [`PipelineCall`] with [`Pipeline::begin`] and walks it
//! through the steps that apply to its operation:
//!
//! 1. [`fetch_session`](PipelineCall::fetch_session) (401 on failure)
//! 2. [`decode`](PipelineCall::decode) (400 `invalid_request_input`)
//! 3. [`validate`](PipelineCall::validate) (400 `validation_error`)
//! 4. [`id`](PipelineCall::id)
//! 5. [`authorize`](PipelineCall::authorize) (403)
//! 6. [`database`](PipelineCall::database) (404 or 500 `database_error`)
//! 7. [`publish_data_change`](PipelineCall::publish_data_change), best effort
//! 8. [`respond`](PipelineCall::respond) and friends
//!
//! Steps return `Result<_, ServiceError>` so a handler body reads as a
//! straight line of `?`s; [`PipelineCall::finish`] renders whatever error
//! stopped it.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::HeaderName;
use http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::Instrument;

use pantry_core::new_identifier;
use pantry_model::{
    DataChangeMessage, DataError, QueryFilteredResult, QueueName, ResponseDetails,
    ServiceError, SessionContext, Validate, ValidationContext,
};

use crate::params::IdFetcher;
use crate::publisher::{PublishError, Publisher, PublisherProvider};
use crate::server_io::ServerEncoderDecoder;
use crate::session::SessionContextFetcher;
use crate::timing::{SERVER_TIMING, ServerTiming};
use crate::trace::{RequestSpan, Tracer};
use crate::writer::ResponseWriter;

/// How long a detached data-change publish may take.
pub const DATA_CHANGE_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared collaborators of all handlers.
#[derive(Clone)]
pub struct Pipeline {
    io: ServerEncoderDecoder,
    tracer: Tracer,
    sessions: Arc<dyn SessionContextFetcher>,
    publishers: Arc<dyn PublisherProvider>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("io", &self.io)
            .field("tracer", &self.tracer)
            .field("sessions", &"...")
            .field("publishers", &"...")
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline.
    pub fn new(
        io: ServerEncoderDecoder,
        tracer: Tracer,
        sessions: Arc<dyn SessionContextFetcher>,
        publishers: Arc<dyn PublisherProvider>,
    ) -> Self {
        Self {
            io,
            tracer,
            sessions,
            publishers,
        }
    }

    /// The shared encoder/decoder.
    #[must_use]
    pub fn io(&self) -> &ServerEncoderDecoder {
        &self.io
    }

    /// The tracer opening request spans.
    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Open the span for `req` and start walking the pipeline.
    #[must_use]
    pub fn begin(&self, operation: &'static str, req: http::Request<Bytes>, w: ResponseWriter) -> PipelineCall {
        let (parts, body) = req.into_parts();
        let span = self.tracer.start_request_span(&parts, operation);
        tracing::debug!(parent: span.span(), "handling request");
        let details = ResponseDetails::new(span.trace_id().to_string());

        PipelineCall {
            pipeline: self.clone(),
            span,
            timing: ServerTiming::new(),
            details,
            session: None,
            parts,
            body,
            writer: w,
        }
    }
}

/// One request walking the pipeline.
#[derive(Debug)]
pub struct PipelineCall {
    pipeline: Pipeline,
    span: RequestSpan,
    timing: ServerTiming,
    details: ResponseDetails,
    session: Option<SessionContext>,
    parts: http::request::Parts,
    body: Bytes,
    writer: ResponseWriter,
}

impl PipelineCall {
    /// The request span.
    #[must_use]
    pub fn span(&self) -> &RequestSpan {
        &self.span
    }

    /// A handle to the tracing span, for instrumenting the handler body.
    #[must_use]
    pub fn tracing_span(&self) -> tracing::Span {
        self.span.span().clone()
    }

    /// Details the response envelope will carry.
    #[must_use]
    pub fn details(&self) -> &ResponseDetails {
        &self.details
    }

    /// The request head.
    #[must_use]
    pub fn parts(&self) -> &http::request::Parts {
        &self.parts
    }

    /// The shared encoder/decoder.
    #[must_use]
    pub fn io(&self) -> &ServerEncoderDecoder {
        &self.pipeline.io
    }

    /// Step durations recorded so far.
    #[must_use]
    pub fn timing(&self) -> &ServerTiming {
        &self.timing
    }

    /// Resolve the caller's session and bind it to the span and envelope.
    pub fn fetch_session(&mut self) -> Result<SessionContext, ServiceError> {
        let started = Instant::now();
        let result = self.pipeline.sessions.fetch_session(&self.parts);
        self.timing.record("session", None, started.elapsed());

        match result {
            Ok(session) => {
                self.span.attach_session(&session);
                self.details
                    .current_household_id
                    .clone_from(&session.active_household_id);
                self.session = Some(session.clone());
                Ok(session)
            }
            Err(err) => {
                self.span
                    .acknowledge_error(&err, "retrieving session context data");
                Err(ServiceError::unauthenticated().with_source(err))
            }
        }
    }

    /// Decode the request body in the format its `Content-Type` names.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T, ServiceError> {
        let started = Instant::now();
        let result = self.pipeline.io.decode_body(&self.parts.headers, &self.body);
        self.timing.record("decoding", None, started.elapsed());

        result.map_err(|err| {
            self.span.acknowledge_error(&err, "decoding request body");
            ServiceError::invalid_input("invalid input attached to request").with_source(err)
        })
    }

    /// The raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Check `input` with its own validator, given the resolved session.
    pub fn validate<T: Validate>(&mut self, input: &T) -> Result<(), ServiceError> {
        let started = Instant::now();
        let result = input.validate(&ValidationContext::new(self.session.as_ref()));
        self.timing.record("validation", None, started.elapsed());

        result.map_err(|err| {
            tracing::debug!(parent: self.span.span(), error = %err, "provided input was invalid");
            ServiceError::validation(err.to_string())
        })
    }

    /// Extract a resource ID and attach it to the span under `key`.
    pub fn id(&mut self, fetcher: &dyn IdFetcher, key: &str) -> String {
        let id = fetcher.fetch_id(&self.parts);
        self.span.attach(key, &id);
        id
    }

    /// Require `permission` service-wide or in the active household.
    pub fn authorize(&self, permission: &str) -> Result<(), ServiceError> {
        self.authorize_with(permission, |session| session.has_permission(permission))
    }

    /// Require `predicate` to hold for the session; `name` is logged on denial.
    pub fn authorize_with(
        &self,
        name: &str,
        predicate: impl FnOnce(&SessionContext) -> bool,
    ) -> Result<(), ServiceError> {
        if self.session.as_ref().is_some_and(predicate) {
            return Ok(());
        }
        tracing::info!(parent: self.span.span(), permission = name, "insufficient permissions");
        Err(ServiceError::forbidden())
    }

    /// Run a data-layer operation, mapping `not_found` to 404 and anything else to 500.
    pub async fn database<T, F>(&mut self, description: &str, operation: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, DataError>>,
    {
        let started = Instant::now();
        let result = operation.await;
        self.timing
            .record("database", Some(description), started.elapsed());

        result.map_err(|err| {
            if matches!(err, DataError::NotFound) {
                tracing::debug!(parent: self.span.span(), "{description}: not found");
            } else {
                self.span.acknowledge_error(&err, description);
            }
            ServiceError::from(err)
        })
    }

    /// Obtain a publisher for `queue`.
    pub fn provide_publisher(&self, queue: QueueName) -> Result<Arc<dyn Publisher>, PublishError> {
        self.pipeline.publishers.provide_publisher(queue)
    }

    /// Publish a data-change event for the session's user and household.
    ///
    /// Failures are logged and recorded on the span; they never change the
    /// response. The publish runs on its own task and completes even if this
    /// handler is dropped.
    pub async fn publish_data_change(
        &mut self,
        event_type: impl Into<String>,
        context: BTreeMap<String, serde_json::Value>,
    ) {
        let (user_id, household_id) = self
            .session
            .as_ref()
            .map(|s| (s.user_id().to_owned(), s.active_household_id.clone()))
            .unwrap_or_default();
        let message = DataChangeMessage {
            event_type: event_type.into(),
            user_id,
            household_id,
            context,
            request_id: new_identifier(),
        };

        let started = Instant::now();
        let result = self.publish_detached(QueueName::DataChanges, &message).await;
        self.timing.record("publisher", None, started.elapsed());

        match result {
            Ok(()) => {
                tracing::debug!(parent: self.span.span(), event_type = %message.event_type, "published data change message");
            }
            Err(err) => {
                self.span
                    .acknowledge_error(&err, "publishing data change message");
            }
        }
    }

    async fn publish_detached<M: Serialize>(&self, queue: QueueName, message: &M) -> Result<(), PublishError> {
        let publisher = self.provide_publisher(queue)?;
        let payload = Bytes::from(serde_json::to_vec(message)?);

        let task = tokio::spawn(
            async move {
                match tokio::time::timeout(DATA_CHANGE_PUBLISH_TIMEOUT, publisher.publish(payload)).await {
                    Ok(result) => result,
                    Err(_elapsed) => Err(PublishError::Timeout(queue)),
                }
            }
            .instrument(self.tracing_span()),
        );

        match task.await {
            Ok(result) => result,
            Err(join_err) => Err(PublishError::Transport {
                queue,
                reason: join_err.to_string(),
            }),
        }
    }

    fn write_timing_header(&mut self) {
        if let Some(value) = self.timing.header_value() {
            self.writer
                .set_header(HeaderName::from_static(SERVER_TIMING), value);
        }
    }

    /// Respond with `data` in a success envelope.
    pub fn respond<T: Serialize>(&mut self, status: StatusCode, data: T) {
        self.write_timing_header();
        self.pipeline
            .io
            .encode_response_with_status(&self.details, &mut self.writer, &data, status);
    }

    /// Respond `200 OK` with one page of a list and its pagination.
    pub fn respond_list<T: Serialize>(&mut self, page: QueryFilteredResult<T>) {
        self.write_timing_header();
        self.pipeline
            .io
            .encode_list_response(&self.details, &mut self.writer, page);
    }

    /// Respond `204 No Content`.
    pub fn respond_no_content(&mut self) {
        self.write_timing_header();
        self.writer.write_header(StatusCode::NO_CONTENT);
    }

    /// Render `result`'s error, if any, and hand back the writer.
    pub fn finish(mut self, result: Result<(), ServiceError>) -> ResponseWriter {
        if let Err(err) = result {
            if err.status_code.is_server_error() {
                tracing::error!(parent: self.span.span(), code = %err.code, error = %err, "request failed");
            } else {
                tracing::info!(parent: self.span.span(), code = %err.code, error = %err, "request rejected");
            }

            if self.writer.is_committed() {
                tracing::warn!(parent: self.span.span(), "response already written, dropping error");
            } else {
                self.write_timing_header();
                self.pipeline.io.encode_error_response(
                    &self.details,
                    &mut self.writer,
                    &err.message,
                    err.code,
                    err.status_code,
                );
            }
        }
        self.writer
    }
}
