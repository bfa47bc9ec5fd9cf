/* src/server.rs */

use axum::{
    Json, Router,
    http::{Request, StatusCode},
    routing::get,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{Level, info};

use crate::config::Config;
use crate::error::{PubIpError, Result};
use crate::middleware::{PublicIp, PublicIpLayer};

/// `GET /`: the caller's public IP as a JSON string, `""` when unknown.
pub async fn report_public_ip(public_ip: PublicIp) -> Json<String> {
    Json(public_ip.0)
}

/// Build the application router with its full middleware stack.
pub fn router(config: &Config) -> Router {
    with_middleware(Router::new().route("/", get(report_public_ip)), config)
}

/// Wrap `routes` in the service's middleware stack.
pub fn with_middleware(routes: Router, config: &Config) -> Router {
    routes.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("");
                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = request_id
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CatchPanicLayer::new())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.request_timeout,
            ))
            .layer(PublicIpLayer::with_resolver(config.resolver())),
    )
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: Config) -> Result<()> {
    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|source| PubIpError::Bind {
            addr: config.listen,
            source,
        })?;
    let local_addr = listener.local_addr()?;

    info!(
        addr = %local_addr,
        timeout_secs = config.request_timeout.as_secs(),
        proxy_headers = ?config.proxy_headers,
        "starting server"
    );

    let app = router(&config);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
