//! Permission check endpoint.

use bytes::Bytes;
use http::StatusCode;
use tracing::Instrument;

use pantry_model::ServiceError;
use pantry_model::session::{UserPermissionsRequest, UserPermissionsResponse};

use crate::pipeline::{Pipeline, PipelineCall};
use crate::writer::ResponseWriter;

/// Handler for `POST /api/v1/users/permissions/check`.
#[derive(Debug, Clone)]
pub struct PermissionCheckHandler {
    pipeline: Pipeline,
}

impl PermissionCheckHandler {
    /// Create the handler.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Report which of the requested permissions the caller holds.
    pub async fn check(&self, req: http::Request<Bytes>, w: ResponseWriter) -> ResponseWriter {
        let mut call = self.pipeline.begin("check_permissions", req, w);
        let span = call.tracing_span();
        let result = Self::run(&mut call).instrument(span).await;
        call.finish(result)
    }

    async fn run(call: &mut PipelineCall) -> Result<(), ServiceError> {
        let session = call.fetch_session()?;
        let input: UserPermissionsRequest = call.decode()?;
        call.validate(&input)?;

        let response = UserPermissionsResponse::check(&session, &input);
        call.respond(StatusCode::OK, response);
        Ok(())
    }
}
