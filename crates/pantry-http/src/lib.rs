//! HTTP transport for Pantry services.
//!
//! This crate binds the [`pantry_encoding::Codec`] to HTTP: it owns the
//! buffered [`ResponseWriter`], the [`ServerEncoderDecoder`] every handler
//! writes through, request spans and server timing, and the [`Pipeline`]
//! that handlers walk from session lookup to response. On top of that sit
//! the generic [`ResourceHandler`], the [`AdminPassthrough`] and a small
//! router and hyper service.

pub mod admin;
pub mod body;
pub mod config;
pub mod handler;
pub mod params;
pub mod permission_check;
pub mod pipeline;
pub mod privacy;
pub mod publisher;
pub mod resource;
pub mod router;
pub mod server_io;
pub mod service;
pub mod session;
pub mod timing;
pub mod trace;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::AdminPassthrough;
pub use body::PantryResponseBody;
pub use config::PantryHttpConfig;
pub use handler::{PantryHandler, handler_fn};
pub use params::{IdFetcher, RouteParamFetcher, RouteParams};
pub use permission_check::PermissionCheckHandler;
pub use pipeline::{Pipeline, PipelineCall};
pub use privacy::DataPrivacyHandler;
pub use publisher::{PublishError, Publisher, PublisherProvider};
pub use resource::{Resource, ResourceHandler, ResourceStore};
pub use router::Router;
pub use server_io::ServerEncoderDecoder;
pub use service::PantryHttpService;
pub use session::{SessionContextFetcher, SessionError};
pub use trace::{RequestSpan, TraceId, Tracer};
pub use writer::ResponseWriter;
