//! Integration tests for discovery aggregation
//!
//! This crate contains end-to-end tests that exercise the full stack over
//! real HTTP:
//! - remote backends reached through `HttpDiscoveryHandler`
//! - the reconciliation engine in `apidisc-aggregator`
//! - the merged document served by the `apidisc-api` router
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p apidisc-tests
//! ```
//!
//! # Test Structure
//!
//! - `remote_aggregation_test.rs` - aggregated, legacy and failing remote
//!   backends merged and served over HTTP

// This crate only contains tests, no library code
