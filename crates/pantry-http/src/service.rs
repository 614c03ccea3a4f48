//! Pantry HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ACCEPT, ALLOW, CONTENT_TYPE, HeaderValue};
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;

use pantry_encoding::ContentType;
use pantry_model::ResponseDetails;

use crate::body::PantryResponseBody;
use crate::router::{RouteMatch, Router};
use crate::server_io::ServerEncoderDecoder;
use crate::trace::Tracer;
use crate::writer::ResponseWriter;

/// Hyper `Service` routing requests to Pantry handlers.
#[derive(Debug, Clone)]
pub struct PantryHttpService {
    router: Arc<Router>,
    io: ServerEncoderDecoder,
    tracer: Tracer,
}

impl PantryHttpService {
    /// Create a new `PantryHttpService`.
    pub fn new(router: Router, io: ServerEncoderDecoder, tracer: Tracer) -> Self {
        Self {
            router: Arc::new(router),
            io,
            tracer,
        }
    }

    /// Handle a request whose body has been collected.
    pub async fn handle(&self, req: http::Request<Bytes>) -> http::Response<PantryResponseBody> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut w = ResponseWriter::new();
        negotiate_content_type(req.headers(), &mut w);

        let w = match self.router.resolve(req.method(), req.uri().path()) {
            RouteMatch::Found(handler, params) => {
                let mut req = req;
                req.extensions_mut().insert(params);
                handler.handle(req, w).await
            }
            RouteMatch::MethodNotAllowed(allowed) => {
                self.unrouted_details(&req);
                method_not_allowed(&allowed)
            }
            RouteMatch::NotFound => {
                let details = self.unrouted_details(&req);
                let mut w = w;
                self.io.encode_not_found_response(&details, &mut w);
                w
            }
        };

        add_common_headers(w.into_response(), &request_id)
    }

    fn unrouted_details(&self, req: &http::Request<Bytes>) -> ResponseDetails {
        let (parts, ()) = clone_head(req).into_parts();
        let span = self.tracer.start_request_span(&parts, "route");
        tracing::debug!(parent: span.span(), "no route matched");
        ResponseDetails::new(span.trace_id().to_string())
    }
}

/// `405` with an empty body and the path's methods in `Allow`.
fn method_not_allowed(allowed: &[http::Method]) -> ResponseWriter {
    let allow = allowed
        .iter()
        .map(http::Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut w = ResponseWriter::new();
    if let Ok(value) = HeaderValue::from_str(&allow) {
        w.set_header(ALLOW, value);
    }
    w.write_header(StatusCode::METHOD_NOT_ALLOWED);
    w
}

fn clone_head(req: &http::Request<Bytes>) -> http::Request<()> {
    let mut head = http::Request::new(());
    *head.method_mut() = req.method().clone();
    *head.uri_mut() = req.uri().clone();
    *head.headers_mut() = req.headers().clone();
    head
}

/// Preset the response `Content-Type` from the request's `Accept` header.
///
/// Unknown or wildcard preferences leave the writer untouched, so the
/// configured default applies.
pub fn negotiate_content_type(headers: &http::HeaderMap, w: &mut ResponseWriter) {
    let negotiated = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .and_then(ContentType::from_accept);

    if let Some(content_type) = negotiated {
        w.set_header(CONTENT_TYPE, HeaderValue::from_static(content_type.as_mime()));
    }
}

impl hyper::service::Service<http::Request<Incoming>> for PantryHttpService {
    type Response = http::Response<PantryResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let body = match collect_body(incoming).await {
                Ok(body) => body,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read request body");
                    let mut w = ResponseWriter::new();
                    let span = service.tracer.start_request_span(&parts, "read_body");
                    let details = ResponseDetails::new(span.trace_id().to_string());
                    service.io.encode_invalid_input_response(&details, &mut w);
                    return Ok(add_common_headers(w.into_response(), &uuid::Uuid::new_v4().to_string()));
                }
            };
            Ok(service.handle(http::Request::from_parts(parts, body)).await)
        })
    }
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body(incoming: Incoming) -> Result<Bytes, hyper::Error> {
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
}

/// Add common response headers to every Pantry response.
fn add_common_headers(
    mut response: http::Response<PantryResponseBody>,
    request_id: &str,
) -> http::Response<PantryResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.entry("x-request-id").or_insert(hv);
    }

    headers.insert("server", HeaderValue::from_static("Pantry"));
    headers.insert(
        "access-control-allow-origin",
        HeaderValue::from_static("*"),
    );

    response
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http_body_util::BodyExt;

    use super::*;
    use crate::admin::AdminPassthrough;
    use crate::handler::handler_fn;
    use crate::testing::{RecordingProvider, harness, json_request, session_with};

    fn service() -> PantryHttpService {
        let h = harness(Some(session_with(&[])), RecordingProvider::default());
        let admin = Arc::new(AdminPassthrough::new(h.pipeline.clone()));
        let mut router = Router::new();
        router.route(
            http::Method::POST,
            "/api/v1/admin/queues/test",
            handler_fn(move |req, w| {
                let admin = Arc::clone(&admin);
                async move { admin.publish_arbitrary_queue_message(req, w).await }
            }),
        );
        PantryHttpService::new(router, *h.pipeline.io(), h.tracer.clone())
    }

    async fn body_of(response: http::Response<PantryResponseBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_should_negotiate_response_content_type() {
        let mut req = json_request(
            "POST",
            "/api/v1/admin/queues/test",
            r#"{"queueName":"data_changes","body":"{\"eventType\":\"x\"}"}"#,
        );
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/yaml"));

        let response = service().handle(req).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/yaml");
        assert_eq!(response.headers()["server"], "Pantry");
        assert!(response.headers().contains_key("x-request-id"));

        let body: serde_json::Value = serde_yaml::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body["data"]["success"], true);
    }

    #[tokio::test]
    async fn test_should_answer_unknown_routes_with_envelope() {
        let response = service()
            .handle(json_request("GET", "/api/v1/nothing", ""))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["details"]["traceID"].as_str().unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_should_reject_wrong_method() {
        let response = service()
            .handle(json_request("GET", "/api/v1/admin/queues/test", ""))
            .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
        assert!(!response.headers().contains_key(CONTENT_TYPE));
        assert!(body_of(response).await.is_empty());
    }

    #[test]
    fn test_should_leave_wildcard_accept_to_default() {
        let mut headers = http::HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        let mut w = ResponseWriter::new();
        negotiate_content_type(&headers, &mut w);
        assert!(w.header(&CONTENT_TYPE).is_none());
    }
}
