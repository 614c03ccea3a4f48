//! Route table of the Pantry API.

use std::io::Write;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Method, StatusCode};

use pantry_http::{
    AdminPassthrough, DataPrivacyHandler, PermissionCheckHandler, Pipeline, ResourceHandler,
    ResourceStore, ResponseWriter, Router, handler_fn,
};

use crate::webhooks::WebhookResource;

/// Readiness check path.
pub const READY_PATH: &str = "/_meta_/ready";

async fn ready(_req: http::Request<Bytes>, mut w: ResponseWriter) -> ResponseWriter {
    w.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    w.write_header(StatusCode::OK);
    if let Err(err) = w.write_all(b"ok") {
        tracing::warn!(error = %err, "writing readiness response");
    }
    w
}

/// Build the router serving every Pantry endpoint.
pub fn build_router(
    pipeline: &Pipeline,
    webhooks: Arc<dyn ResourceStore<WebhookResource>>,
) -> Router {
    let mut router = Router::new();
    router.route(Method::GET, READY_PATH, handler_fn(ready));

    let admin = Arc::new(AdminPassthrough::new(pipeline.clone()));
    router.route(
        Method::POST,
        "/api/v1/admin/queues/test",
        handler_fn(move |req, w| {
            let admin = Arc::clone(&admin);
            async move { admin.publish_arbitrary_queue_message(req, w).await }
        }),
    );

    let permissions = Arc::new(PermissionCheckHandler::new(pipeline.clone()));
    router.route(
        Method::POST,
        "/api/v1/users/permissions/check",
        handler_fn(move |req, w| {
            let permissions = Arc::clone(&permissions);
            async move { permissions.check(req, w).await }
        }),
    );

    let privacy = Arc::new(DataPrivacyHandler::new(pipeline.clone()));
    router.route(
        Method::POST,
        "/api/v1/data_privacy/disclose",
        handler_fn(move |req, w| {
            let privacy = Arc::clone(&privacy);
            async move { privacy.aggregate_user_data(req, w).await }
        }),
    );

    Arc::new(ResourceHandler::new(pipeline.clone(), webhooks)).mount(&mut router, "/api/v1/webhooks");

    router
}
