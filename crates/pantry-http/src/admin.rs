//! Admin passthrough: publish an operator-supplied message to a named queue.
//!
//! The body is decoded into the message shape of the named queue, stamped
//! with a fresh `requestId` and republished as JSON, whatever the default
//! content type, so downstream consumers see the format they parse.

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::Instrument;

use pantry_core::new_identifier;
use pantry_model::messages::{ArbitraryQueueMessageRequest, ArbitraryQueueMessageResponse};
use pantry_model::{QueueMessage, QueueName, ServiceError};

use crate::pipeline::{Pipeline, PipelineCall};
use crate::server_io::ServerEncoderDecoder;
use crate::writer::ResponseWriter;

/// Handler for `POST /api/v1/admin/queues/test`.
#[derive(Debug, Clone)]
pub struct AdminPassthrough {
    pipeline: Pipeline,
}

fn decode_as<T: DeserializeOwned>(
    io: &ServerEncoderDecoder,
    body: &str,
    wrap: fn(T) -> QueueMessage,
) -> Result<QueueMessage, ServiceError> {
    io.decode_bytes::<T>(body.as_bytes())
        .map(wrap)
        .map_err(|err| ServiceError::invalid_input("invalid message body").with_source(err))
}

/// Decode `body` into the message shape `queue` carries.
pub fn decode_queue_message(
    io: &ServerEncoderDecoder,
    queue: QueueName,
    body: &str,
) -> Result<QueueMessage, ServiceError> {
    match queue {
        QueueName::DataChanges => decode_as(io, body, QueueMessage::DataChange),
        QueueName::OutboundEmails => decode_as(io, body, QueueMessage::OutboundEmail),
        QueueName::SearchIndexRequests => decode_as(io, body, QueueMessage::SearchIndex),
        QueueName::UserDataAggregator => decode_as(io, body, QueueMessage::UserDataAggregation),
        QueueName::WebhookExecutionRequests => decode_as(io, body, QueueMessage::WebhookExecution),
    }
}

impl AdminPassthrough {
    /// Create the handler.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Publish the request's message and respond `{success: true}`.
    pub async fn publish_arbitrary_queue_message(
        &self,
        req: http::Request<Bytes>,
        w: ResponseWriter,
    ) -> ResponseWriter {
        let mut call = self.pipeline.begin("publish_arbitrary_queue_message", req, w);
        let span = call.tracing_span();
        let result = self.run(&mut call).instrument(span).await;
        call.finish(result)
    }

    async fn run(&self, call: &mut PipelineCall) -> Result<(), ServiceError> {
        call.fetch_session()?;
        let input: ArbitraryQueueMessageRequest = call.decode()?;
        call.validate(&input)?;

        let Some(queue) = QueueName::from_name(&input.queue_name) else {
            tracing::info!(queue_name = %input.queue_name, "unknown queue");
            return Err(ServiceError::invalid_input("invalid queue name"));
        };
        call.span().attach("queue_name", queue);

        let mut message = decode_queue_message(call.io(), queue, &input.body)?;
        let request_id = new_identifier();
        call.span().attach("request_id", &request_id);
        message.stamp_request_id(request_id);

        let publisher = call.provide_publisher(queue).map_err(|err| {
            call.span()
                .acknowledge_error(&err, "obtaining publisher");
            ServiceError::publish_failure(err)
        })?;

        let payload = serde_json::to_vec(&message).map_err(|err| {
            call.span()
                .acknowledge_error(&err, "encoding queue message");
            ServiceError::publish_failure(err)
        })?;

        publisher.publish(Bytes::from(payload)).await.map_err(|err| {
            call.span()
                .acknowledge_error(&err, "publishing queue message");
            ServiceError::publish_failure(err)
        })?;

        tracing::info!(%queue, "published arbitrary queue message");
        call.respond(StatusCode::OK, ArbitraryQueueMessageResponse { success: true });
        Ok(())
    }
}
