//! Host APIs for system interactions.
//!
//! - [`http`] - HTTP client with tracing and timeout classification

pub mod http;
