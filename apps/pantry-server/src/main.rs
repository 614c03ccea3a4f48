//! Pantry Server - the Pantry household API over HTTP.
//!
//! Serves the admin queue passthrough, the permission check, data privacy
//! requests and webhook management, with in-memory storage and queues.
//!
//! # Usage
//!
//! ```text
//! GATEWAY_LISTEN=0.0.0.0:8000 pantry-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8000` | Bind address |
//! | `CONTENT_TYPE` | `application/json` | Default response encoding |
//! | `TRACING_ENABLED` | `true` | Mint trace IDs and log JSON lines with span fields |
//! | `SERVICE_NAME` | `pantry` | Service name on request spans and the root log span |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod publisher;
mod routes;
mod session;
mod telemetry;
mod webhooks;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{Instrument, error, info, warn};

use pantry_core::PantryConfig;
use pantry_http::{PantryHttpConfig, PantryHttpService, Pipeline, ServerEncoderDecoder, Tracer};

use crate::publisher::InMemoryPublisherProvider;
use crate::session::HeaderSessionFetcher;
use crate::webhooks::InMemoryWebhookStore;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wire the handlers and their in-memory collaborators into a service.
fn build_service(config: &PantryHttpConfig) -> PantryHttpService {
    let io = ServerEncoderDecoder::new(config.default_content_type);
    let tracer = Tracer::new(config.tracing_enabled, config.service_name.as_str());
    let pipeline = Pipeline::new(
        io,
        tracer.clone(),
        Arc::new(HeaderSessionFetcher),
        Arc::new(InMemoryPublisherProvider::new()),
    );
    let router = routes::build_router(&pipeline, Arc::new(InMemoryWebhookStore::new()));
    PantryHttpService::new(router, io, tracer)
}

/// Resolve once the process is asked to stop.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for ctrl-c, serving until killed");
        std::future::pending::<()>().await;
    }
}

/// Accept connections until [`shutdown_signal`], then drain them.
///
/// Each connection task runs in its own span under `service_span`, so request
/// spans and their logs carry the service name.
async fn serve(listener: TcpListener, service: PantryHttpService, service_span: tracing::Span) -> Result<()> {
    let graceful = GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let (stream, peer_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(err) => {
                    warn!(parent: &service_span, error = %err, "accepting connection");
                    continue;
                }
            },
            () = &mut shutdown => break,
        };

        let conn = http.serve_connection(TokioIo::new(stream), service.clone());
        let conn = graceful.watch(conn.into_owned());
        let span = tracing::info_span!(parent: &service_span, "connection", %peer_addr);

        tokio::spawn(
            async move {
                if let Err(err) = conn.await {
                    error!(error = %err, "connection closed with error");
                }
            }
            .instrument(span),
        );
    }

    info!(parent: &service_span, "shutdown requested, draining connections");
    graceful.shutdown().await;
    info!(parent: &service_span, "connections drained");
    Ok(())
}

/// Check the readiness endpoint of a running server.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n",
        routes::READY_PATH
    );
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_ready_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

fn is_ready_response(response: &str) -> bool {
    response.starts_with("HTTP/1.1 200") && response.trim_end().ends_with("ok")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = PantryConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let service_span = telemetry::init(&config)?;
    config.validate().context("invalid configuration")?;

    let http_config = PantryHttpConfig::from(&config);
    let service = build_service(&http_config);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        parent: &service_span,
        %addr,
        content_type = %http_config.default_content_type,
        tracing_enabled = http_config.tracing_enabled,
        version = VERSION,
        "listening",
    );

    serve(listener, service, service_span).await
}
