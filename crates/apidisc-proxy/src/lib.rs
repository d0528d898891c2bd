//! apidisc-proxy - Remote discovery backends
//!
//! [`HttpDiscoveryHandler`] is the [`DiscoveryHandler`] for a backend that
//! runs in another process. It speaks the aggregated discovery format when
//! the server does and reports `Unsupported` otherwise, so the aggregator
//! can fall back to the legacy per-version endpoints.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use apidisc_proxy::HttpDiscoveryHandler;
//!
//! # fn main() -> apidisc_proxy::ProxyResult<()> {
//! let handler = Arc::new(HttpDiscoveryHandler::new("http://127.0.0.1:9000")?);
//! // manager.add_api_service(service, handler);
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! The `testing` module runs an axum router on a free local port and hands
//! out a handler and a registration for it:
//!
//! ```rust,ignore
//! use apidisc_proxy::testing::DiscoveryServer;
//!
//! let server = DiscoveryServer::start(router).await?;
//! manager.add_api_service(server.api_service("stable.example.com", "v1"), server.handler());
//! ```
//!
//! [`DiscoveryHandler`]: apidisc_core::DiscoveryHandler

mod error;
mod handler;
pub mod testing;

pub use error::{ProxyError, ProxyResult};
pub use handler::{HttpDiscoveryHandler, AGGREGATED_ACCEPT};
