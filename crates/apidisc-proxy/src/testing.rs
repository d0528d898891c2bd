//! Discovery servers on a local port, for tests
//!
//! [`DiscoveryServer`] runs an axum router on `127.0.0.1:0` and hands out one
//! [`HttpDiscoveryHandler`] pointed at it. It counts the requests it answers
//! and the `304 Not Modified` answers among them, which is how tests tell a
//! conditional refetch from a full one.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use apidisc_core::{ApiService, ServiceReference};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{HttpDiscoveryHandler, ProxyResult};

const TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Default)]
struct Counters {
    requests: AtomicUsize,
    not_modified: AtomicUsize,
}

async fn count(State(counters): State<Arc<Counters>>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    counters.requests.fetch_add(1, Ordering::SeqCst);
    if response.status() == StatusCode::NOT_MODIFIED {
        counters.not_modified.fetch_add(1, Ordering::SeqCst);
    }
    response
}

/// A discovery server on a free local port. Stops when dropped.
pub struct DiscoveryServer {
    addr: SocketAddr,
    handler: Arc<HttpDiscoveryHandler>,
    counters: Arc<Counters>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl DiscoveryServer {
    pub async fn start(router: Router) -> ProxyResult<Self> {
        Self::start_with_timeouts(router, TIMEOUT, CONNECT_TIMEOUT).await
    }

    /// Start with custom deadlines on the handed-out handler
    pub async fn start_with_timeouts(
        router: Router,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> ProxyResult<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;

        let counters = Arc::new(Counters::default());
        let router = router.layer(middleware::from_fn_with_state(counters.clone(), count));

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    stopped.await.ok();
                })
                .await;
            if let Err(e) = served {
                debug!(%addr, error = %e, "Discovery server exited");
            }
        });

        let handler =
            HttpDiscoveryHandler::with_config(&format!("http://{}", addr), timeout, connect_timeout)?;

        Ok(Self {
            addr,
            handler: Arc::new(handler),
            counters,
            stop: Some(stop),
            task: Some(task),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The same handler on every call, so re-registering it keeps the
    /// aggregator's cached token
    pub fn handler(&self) -> Arc<HttpDiscoveryHandler> {
        self.handler.clone()
    }

    /// Remote registration of `group`/`version` naming this server's port
    pub fn api_service(&self, group: &str, version: &str) -> ApiService {
        let port = self.addr.port();
        ApiService::new(group, version).with_service(ServiceReference {
            namespace: "default".to_string(),
            name: format!("discovery-{}", port),
            port: Some(port),
        })
    }

    pub fn requests(&self) -> usize {
        self.counters.requests.load(Ordering::SeqCst)
    }

    pub fn not_modified(&self) -> usize {
        self.counters.not_modified.load(Ordering::SeqCst)
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            stop.send(()).ok();
        }
        if let Some(task) = self.task.take() {
            task.await.ok();
        }
    }
}

impl Drop for DiscoveryServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.send(()).ok();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
