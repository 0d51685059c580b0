// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # keepstat Fetch
//!
//! API client for the Karakeep statistics endpoint.
//!
//! - [`KarakeepClient`] - Issues authenticated requests and parses responses
//! - [`StatsFetcher`] - The seam the update coordinator depends on
//! - [`ClientError`] - Transport and HTTP failures mapped to a small taxonomy
//! - [`HttpClient`] - reqwest wrapper with tracing and a bounded timeout
//!
//! ## Example
//!
//! ```ignore
//! use keepstat_core::ConnectionConfig;
//! use keepstat_fetch::KarakeepClient;
//!
//! let config = ConnectionConfig::new("https://keep.example.com", "ak1_...", 300)?;
//! let client = KarakeepClient::new()?;
//! let snapshot = client.get_stats(&config).await?;
//! println!("{} bookmarks", snapshot.bookmarks);
//! ```

pub mod client;
pub mod error;
pub mod fetcher;
pub mod host;

pub use client::{parse_stats, KarakeepClient, HEALTH_ENDPOINT, STATS_ENDPOINT};
pub use error::ClientError;
pub use fetcher::StatsFetcher;
pub use host::http::{HttpClient, DEFAULT_TIMEOUT};
