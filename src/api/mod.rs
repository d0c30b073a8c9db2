//! UpCloud API interaction module
//!
//! This module provides everything the CLI needs from the remote API:
//! typed records, typed mutation requests, and the [`CloudService`] seam the
//! resolver and commands are written against.
//!
//! # Module Structure
//!
//! - [`client`] - [`ApiClient`], the HTTP implementation of [`CloudService`]
//! - [`http`] - HTTP verbs, basic auth and error decoding
//! - [`models`] - server, storage, network and router records
//! - [`request`] - one request type per mutation
//! - [`service`] - the [`CloudService`] trait
//!
//! # Example
//!
//! ```ignore
//! use upctl::api::{ApiClient, CloudService, Credentials};
//!
//! async fn example(base: url::Url, creds: Credentials) -> Result<(), upctl::error::ApiError> {
//!     let client = ApiClient::new(base, creds)?;
//!     let servers = client.list_servers().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod models;
pub mod request;
pub mod service;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use http::{format_api_error, Credentials};
pub use service::CloudService;
