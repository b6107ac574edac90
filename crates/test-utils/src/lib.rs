//! Shared test utilities for lease6 crates.
//!
//! This crate provides common test helpers to reduce boilerplate across test modules:
//!
//! - [`fixtures`] - Eight fixed leases on `2001:db8::/64` and a populated manager
//! - [`strategies`] - Proptest generators for leases, identifiers and operation sequences
//! - [`assert_strictly_ascending`] / [`collect_pages`] - Checks over paged query results
//! - [`init_test_tracing`] - `RUST_LOG`-filtered log output in tests

#![deny(unsafe_code)]

pub mod fixtures;
pub mod strategies;

mod assertions;
pub use assertions::{addresses_of, assert_strictly_ascending, collect_pages};

mod logging;
pub use logging::init_test_tracing;
