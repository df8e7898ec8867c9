//! # facetplan
//!
//! Library half of the facetplan binary: the HTTP API, the CLI commands and
//! the server configuration file. Exposed as a library so integration tests
//! can drive the router directly.

pub mod api;
pub mod cli;
pub mod config;
