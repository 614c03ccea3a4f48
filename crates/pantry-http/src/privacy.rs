//! User data export requests.

use bytes::Bytes;
use http::StatusCode;
use tracing::Instrument;

use pantry_core::new_identifier;
use pantry_model::messages::{UserDataAggregationRequest, UserDataAggregationResponse};
use pantry_model::{QueueName, ServiceError};

use crate::pipeline::{Pipeline, PipelineCall};
use crate::writer::ResponseWriter;

/// Handler for `POST /api/v1/data_privacy/disclose`.
///
/// Queues an aggregation job for the caller and answers `202 Accepted` with
/// the ID of the report that will be produced.
#[derive(Debug, Clone)]
pub struct DataPrivacyHandler {
    pipeline: Pipeline,
}

impl DataPrivacyHandler {
    /// Create the handler.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Queue a user data report.
    pub async fn aggregate_user_data(&self, req: http::Request<Bytes>, w: ResponseWriter) -> ResponseWriter {
        let mut call = self.pipeline.begin("aggregate_user_data", req, w);
        let span = call.tracing_span();
        let result = Self::run(&mut call).instrument(span).await;
        call.finish(result)
    }

    async fn run(call: &mut PipelineCall) -> Result<(), ServiceError> {
        let session = call.fetch_session()?;

        let report_id = new_identifier();
        call.span().attach("report_id", &report_id);
        let message = UserDataAggregationRequest {
            user_id: session.user_id().to_owned(),
            report_id: report_id.clone(),
            request_id: new_identifier(),
        };

        let publisher = call
            .provide_publisher(QueueName::UserDataAggregator)
            .map_err(|err| {
                call.span().acknowledge_error(&err, "obtaining publisher");
                ServiceError::internal(err)
            })?;
        let payload = serde_json::to_vec(&message).map_err(ServiceError::internal)?;
        publisher.publish(Bytes::from(payload)).await.map_err(|err| {
            call.span()
                .acknowledge_error(&err, "publishing user data aggregation request");
            ServiceError::internal(err)
        })?;

        call.respond(StatusCode::ACCEPTED, UserDataAggregationResponse { report_id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingProvider, USER_ID, envelope, harness, json_request, session_with};

    #[tokio::test]
    async fn test_should_accept_report_request() {
        let h = harness(Some(session_with(&[])), RecordingProvider::default());
        let handler = DataPrivacyHandler::new(h.pipeline.clone());

        let w = handler
            .aggregate_user_data(json_request("POST", "/api/v1/data_privacy/disclose", ""), ResponseWriter::new())
            .await;

        assert_eq!(w.status(), StatusCode::ACCEPTED);
        let report_id = envelope(&w)["data"]["reportID"].as_str().unwrap().to_owned();
        assert!(!report_id.is_empty());

        let published = h.provider.published_json();
        assert_eq!(published[0].0, QueueName::UserDataAggregator);
        assert_eq!(published[0].1["userId"], USER_ID);
        assert_eq!(published[0].1["reportId"], report_id);
    }

    #[tokio::test]
    async fn test_should_fail_when_queue_is_unavailable() {
        let provider = RecordingProvider {
            fail_publish: true,
            ..RecordingProvider::default()
        };
        let h = harness(Some(session_with(&[])), provider);
        let handler = DataPrivacyHandler::new(h.pipeline.clone());

        let w = handler
            .aggregate_user_data(json_request("POST", "/api/v1/data_privacy/disclose", ""), ResponseWriter::new())
            .await;

        assert_eq!(w.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope(&w)["error"]["code"], "internal");
    }
}
