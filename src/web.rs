use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

use crate::api::{self, AppState};
use crate::cache::TtlCache;
use crate::config::{MausamConfig, ServerConfig};
use crate::service::{CacheTtls, WeatherService};
use crate::weather::OpenWeatherClient;

/// Wire config into the shared handler state
pub fn build_state(config: &MausamConfig) -> Result<AppState> {
    let cache = Arc::new(TtlCache::with_default_ttl(Duration::from_secs(
        config.cache.default_ttl_seconds,
    )));
    let provider =
        Arc::new(OpenWeatherClient::new(&config.weather).context("Failed to create weather client")?);
    let service = WeatherService::new(provider, cache, CacheTtls::from(&config.cache));
    Ok(AppState::new(Arc::new(service)))
}

/// API routes plus the static frontend, logging and panic recovery
pub fn app(state: AppState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    api::router(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(trace)
        .layer(cors)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Request handler panicked: {}", message);

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

pub async fn run(config: MausamConfig) -> Result<()> {
    let state = build_state(&config)?;
    let app = app(state, &config.server.static_dir);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| "Invalid server host/port")?;

    serve(&config.server, app, addr).await
}

async fn serve_plain(app: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://localhost:{}", addr.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

#[cfg(feature = "tls")]
async fn serve(config: &ServerConfig, app: Router, addr: SocketAddr) -> Result<()> {
    let (Some(cert), Some(key)) = (&config.tls_cert, &config.tls_key) else {
        return serve_plain(app, addr).await;
    };

    let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| "Failed to load TLS certificate or key")?;

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    info!("Server running at https://localhost:{}", addr.port());
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("Server error")
}

#[cfg(not(feature = "tls"))]
async fn serve(config: &ServerConfig, app: Router, addr: SocketAddr) -> Result<()> {
    if config.tls_cert.is_some() {
        tracing::warn!("TLS configured but the binary was built without the `tls` feature");
    }
    serve_plain(app, addr).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
