// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # keepstat Store
//!
//! Polling and state for keepstat.
//!
//! This crate provides:
//!
//! - **UpdateCoordinator**: Timer-driven single-flight polling with the last
//!   good snapshot, the last error and listener dispatch
//! - **SettingsStore**: Stored URL, token and interval
//! - **Persistence**: Owner-only JSON file helpers
//!
//! ## Usage
//!
//! ```ignore
//! use keepstat_store::{FnListener, UpdateCoordinator};
//! use keepstat_fetch::KarakeepClient;
//! use std::sync::Arc;
//!
//! let coordinator = UpdateCoordinator::new(config, Arc::new(KarakeepClient::new()?))?;
//! coordinator.add_listener(FnListener::new(|outcome| println!("{outcome:?}")));
//! coordinator.start()?;
//!
//! if let Some(snapshot) = coordinator.last_snapshot() {
//!     println!("{} bookmarks", snapshot.bookmarks);
//! }
//! coordinator.stop();
//! ```

pub mod coordinator;
pub mod error;
pub mod listener;
pub mod persistence;
pub mod settings_store;

pub use coordinator::{DEFAULT_LISTENER_BUDGET, Phase, UpdateCoordinator};
pub use error::{CoordinatorError, StoreError};
pub use listener::{FnListener, Listener, ListenerId, ListenerRegistry};
pub use persistence::{default_config_dir, default_settings_path, load_json, save_json};
pub use settings_store::{Settings, SettingsStore};
