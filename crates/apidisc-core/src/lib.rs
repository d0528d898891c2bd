//! apidisc-core - Core traits and types for API discovery aggregation
//!
//! This crate provides the fundamental abstractions shared by the
//! aggregator, the in-process resource manager and the remote proxy:
//! the discovery document model, the [`DiscoveryHandler`] capability every
//! backend is reached through, and the [`AggregatePublisher`] the merged
//! document is pushed into.

pub mod error;
pub mod handler;
pub mod legacy;
pub mod models;
pub mod version;

pub use error::{ConversionError, HandlerError, HandlerResult};
pub use handler::{AggregatePublisher, DiscoveryHandler, DiscoveryRequest, DiscoveryResponse};
pub use legacy::{DefaultLegacyConverter, LegacyConverter};
pub use models::*;
