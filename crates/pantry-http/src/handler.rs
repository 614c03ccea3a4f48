//! Handler trait: the boundary between routing and request handling.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::writer::ResponseWriter;

/// Future returned by [`PantryHandler::handle`].
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = ResponseWriter> + Send + 'a>>;

/// Something that turns a request into a response.
///
/// The handler receives the collected request and a writer that may already
/// carry negotiated headers, and hands the writer back once the response is
/// written. Handlers never fail: errors are rendered into the writer.
pub trait PantryHandler: Send + Sync + 'static {
    /// Handle one request.
    fn handle(&self, req: http::Request<Bytes>, w: ResponseWriter) -> HandlerFuture<'_>;
}

/// A [`PantryHandler`] backed by a function.
pub struct HandlerFn<F>(F);

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerFn")
    }
}

/// Wrap an async function as a handler.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(http::Request<Bytes>, ResponseWriter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResponseWriter> + Send + 'static,
{
    HandlerFn(f)
}

impl<F, Fut> PantryHandler for HandlerFn<F>
where
    F: Fn(http::Request<Bytes>, ResponseWriter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResponseWriter> + Send + 'static,
{
    fn handle(&self, req: http::Request<Bytes>, w: ResponseWriter) -> HandlerFuture<'_> {
        Box::pin((self.0)(req, w))
    }
}
