//! Admin endpoint
//!
//! Plain HTTP/1 on the admin bind address:
//! - `/healthz`: process is up (always 200)
//! - `/readyz`: pipeline is running (503 until then)
//! - `/metrics`: Prometheus text (controller registry plus cache counters)

use crate::apis::gateway::ObjectStore;
use crate::apis::metrics::gather_controller_metrics;
use crate::error::ControllerError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Readiness flag flipped by the manager once every task is spawned
#[derive(Debug, Clone, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn set_ready(&self, ready: bool) {
        self.0.store(ready, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What the handlers can see
#[derive(Debug, Clone)]
pub struct AdminState {
    pub readiness: Readiness,
    pub store: ObjectStore,
}

pub struct AdminServer {
    listener: TcpListener,
    state: AdminState,
}

impl AdminServer {
    /// Bind now so a port conflict fails startup instead of a background task
    pub async fn bind(bind_addr: &str, state: AdminState) -> Result<Self, ControllerError> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ControllerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` fires
    pub async fn run(self, shutdown: CancellationToken) {
        let bind_addr = self
            .listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_default();
        info!("Admin endpoint listening on {}", bind_addr);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            debug!("Admin connection from {}", peer_addr);
                            let state = self.state.clone();

                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                                    let state = state.clone();
                                    async move {
                                        Ok::<_, Infallible>(handle(req.method(), req.uri().path(), &state))
                                    }
                                });

                                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                    debug!("Admin connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => error!("Admin accept error on {}: {}", bind_addr, e),
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }

        info!("Admin endpoint on {} stopped", bind_addr);
    }
}

/// Route one request
pub fn handle(method: &Method, path: &str, state: &AdminState) -> Response<Full<Bytes>> {
    if method != Method::GET {
        return text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    match path {
        "/healthz" => text(StatusCode::OK, "ok"),
        "/readyz" if state.readiness.is_ready() => text(StatusCode::OK, "ok"),
        "/readyz" => text(StatusCode::SERVICE_UNAVAILABLE, "not ready"),
        "/metrics" => match gather_controller_metrics() {
            Ok(mut body) => {
                body.push_str(&state.store.prometheus_metrics());
                let mut response = text(StatusCode::OK, body);
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
                );
                response
            }
            Err(e) => {
                error!("Metrics gathering failed: {}", e);
                text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        },
        _ => text(StatusCode::NOT_FOUND, "Not Found"),
    }
}

fn text(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}
