//! # hcloud-core
//!
//! Core types and utilities for working with the Hetzner Cloud API.
//!
//! This crate provides the shared error type, the authenticated HTTP transport, client
//! configuration and the generic resource plumbing the per-resource crates build on.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`client`] - HTTP transport, retry logic and rate-limit tracking
//! - [`config`] - Client configuration and environment lookup
//! - [`id`] - Strongly-typed resource identifiers
//! - [`types`] - Schema types shared by several resources
//! - [`query`] - Query parameter and pagination helpers
//! - [`resource`] - Generic CRUD client
//! - [`slice`] - Batching and mapping helpers
//! - [`random`] - Random identifiers

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod id;
pub mod query;
pub mod random;
pub mod resource;
pub mod slice;
pub mod types;

// Re-export commonly used types
pub use client::{ClientConfig, RetryPolicy, ServiceClient, ServiceClientBuilder};
pub use config::{lookup_env, HcloudConfig};
pub use error::{Error, Result};
pub use query::{ListOpts, ListParams};
pub use resource::{Resource, ResourceClient};
