// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP ingress.
//
// One resource, `/print`:
//
//   POST     raw document bytes -> 200 "Print job <path> sent successfully."
//                                  500 <error text> on directory/write/dispatch failure
//   OPTIONS  200, empty body (CORS preflight)
//   other    405 "Only POST method is accepted"
//
// Every response carries permissive CORS headers.  Served over plain TCP or
// TLS (rustls) depending on configuration.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE,
};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use spoolgate_core::Config;
use spoolgate_core::config::{TLS_CERT_PATH, TLS_KEY_PATH};
use spoolgate_core::error::{Result, SpoolgateError};
use spoolgate_core::types::TransportMode;

use crate::lifecycle::LifecycleManager;

/// Path of the job submission endpoint.
pub const PRINT_ROUTE: &str = "/print";

/// Largest accepted job payload.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024; // 64 MiB

/// How long in-flight requests get to finish once shutdown starts (TLS listener).
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// A failed request, rendered as a plain-text body with the underlying error text.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<SpoolgateError> for ApiError {
    fn from(e: SpoolgateError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl From<axum::Error> for ApiError {
    fn from(e: axum::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Build the ingress router around a shared lifecycle manager.
pub fn router(manager: Arc<LifecycleManager>) -> Router {
    Router::new()
        .route(
            PRINT_ROUTE,
            post(submit_job).options(preflight).fallback(method_not_allowed),
        )
        .with_state(manager)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Accept"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static("3600"),
        ))
}

async fn submit_job(
    State(manager): State<Arc<LifecycleManager>>,
    body: Body,
) -> std::result::Result<String, ApiError> {
    let payload = axum::body::to_bytes(body, MAX_PAYLOAD_BYTES).await?;
    let job = manager.handle_submission(payload).await?;
    Ok(format!("Print job {} sent successfully.", job.path.display()))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Only POST method is accepted")
}

/// Serve `app` on the configured port and transport until `shutdown` resolves.
pub async fn serve<F>(config: &Config, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_addr();
    match config.transport() {
        TransportMode::Http => serve_plain(addr, app, shutdown).await,
        TransportMode::Https => {
            serve_tls(addr, app, Path::new(TLS_CERT_PATH), Path::new(TLS_KEY_PATH), shutdown).await
        }
    }
}

/// Serve over plain HTTP.
pub async fn serve_plain<F>(addr: SocketAddr, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| SpoolgateError::Server(format!("bind {addr}: {e}")))?;

    info!(%addr, transport = %TransportMode::Http, "print server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SpoolgateError::Server(format!("serve {addr}: {e}")))?;

    info!(%addr, "print server stopped");
    Ok(())
}

/// Serve over HTTPS with the PEM certificate chain and key at the given paths.
pub async fn serve_tls<F>(addr: SocketAddr, app: Router, cert: &Path, key: &Path, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let tls = RustlsConfig::from_pem_file(cert, key).await.map_err(|e| {
        error!(cert = %cert.display(), key = %key.display(), error = %e, "failed to load TLS material");
        SpoolgateError::Server(format!(
            "load TLS material {} / {}: {e}",
            cert.display(),
            key.display()
        ))
    })?;

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!(%addr, transport = %TransportMode::Https, "print server listening");

    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|e| SpoolgateError::Server(format!("serve {addr}: {e}")))?;

    info!(%addr, "print server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::dispatch::PrintSink;
    use crate::spool::SpoolStore;
    use crate::testing::RecordingSink;

    struct Harness {
        _tmp: tempfile::TempDir,
        sink: Arc<RecordingSink>,
        manager: Arc<LifecycleManager>,
    }

    impl Harness {
        fn new(sink: RecordingSink) -> Self {
            let tmp = tempfile::tempdir().expect("temp dir");
            let sink = Arc::new(sink);
            let manager = Arc::new(LifecycleManager::new(
                SpoolStore::new(tmp.path().join("temp-files")),
                Arc::clone(&sink) as Arc<dyn PrintSink>,
                Duration::from_secs(3600),
            ));
            Self { _tmp: tmp, sink, manager }
        }

        async fn send(&self, method: Method, body: &'static [u8]) -> (StatusCode, Response<Body>) {
            let request = Request::builder()
                .method(method)
                .uri(PRINT_ROUTE)
                .header("content-type", "application/pdf")
                .body(Body::from(body))
                .expect("request");
            let response = router(Arc::clone(&self.manager))
                .oneshot(request)
                .await
                .expect("infallible");
            (response.status(), response)
        }

        fn spool_files(&self) -> usize {
            std::fs::read_dir(self.manager.store().dir())
                .map(|entries| entries.flatten().count())
                .unwrap_or(0)
        }
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }

    fn assert_cors(response: &Response<Body>) {
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Accept");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "3600");
    }

    #[tokio::test]
    async fn post_spools_and_dispatches() {
        let harness = Harness::new(RecordingSink::default());

        let (status, response) = harness.send(Method::POST, b"%PDF-1.4 test").await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);

        let seen = harness.sink.seen();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].existed);
        assert_eq!(seen[0].contents, b"%PDF-1.4 test");

        let name = seen[0].path.file_name().and_then(|n| n.to_str()).expect("name").to_owned();
        assert!(name.starts_with("printjob_") && name.ends_with(".prn"), "{name}");

        let text = body_text(response).await;
        assert_eq!(text, format!("Print job {} sent successfully.", seen[0].path.display()));
    }

    #[tokio::test]
    async fn dispatch_failure_is_500_with_detail() {
        let harness = Harness::new(RecordingSink::failing("lp: exit status: 1"));

        let (status, response) = harness.send(Method::POST, b"data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        assert!(body_text(response).await.contains("lp: exit status: 1"));

        // Spool file stays until the retention window elapses.
        assert_eq!(harness.spool_files(), 1);
        assert!(harness.sink.seen()[0].path.exists());
    }

    #[tokio::test]
    async fn options_has_no_side_effects() {
        let harness = Harness::new(RecordingSink::default());

        let (status, response) = harness.send(Method::OPTIONS, b"").await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);
        assert!(body_text(response).await.is_empty());

        assert!(harness.sink.seen().is_empty());
        assert_eq!(harness.spool_files(), 0);
        assert_eq!(harness.manager.retention().scheduled(), 0);
    }

    #[tokio::test]
    async fn other_methods_are_rejected() {
        let harness = Harness::new(RecordingSink::default());

        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
            let (status, response) = harness.send(method.clone(), b"data").await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_cors(&response);
            assert_eq!(body_text(response).await, "Only POST method is accepted");
        }

        assert!(harness.sink.seen().is_empty());
        assert_eq!(harness.spool_files(), 0);
        assert_eq!(harness.manager.dispatcher().dispatched(), 0);
    }

    #[tokio::test]
    async fn unusable_spool_directory_is_500() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let blocked = tmp.path().join("blocked");
        std::fs::write(&blocked, b"x").expect("write");

        let sink = Arc::new(RecordingSink::default());
        let manager = Arc::new(LifecycleManager::new(
            SpoolStore::new(&blocked),
            Arc::clone(&sink) as Arc<dyn PrintSink>,
            Duration::from_secs(3600),
        ));

        let request = Request::builder()
            .method(Method::POST)
            .uri(PRINT_ROUTE)
            .body(Body::from("data"))
            .expect("request");
        let response = router(manager).oneshot(request).await.expect("infallible");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("blocked"));
        assert!(sink.seen().is_empty());
    }
}
