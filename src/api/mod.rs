//! Compression service contract: wire types and the HTTP client.

pub mod client;
pub mod types;

pub use client::{CompressionService, HttpCompressionClient, ServiceError};
pub use types::{CompressionRequest, CompressionResponse, HealthResponse};
