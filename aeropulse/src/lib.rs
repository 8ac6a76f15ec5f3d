//! Aeropulse - data source orchestration and real-time synchronization
//! for an air-quality sensor network dashboard.
//!
//! The library decides which measurement source is authoritative,
//! caches and expires fetched data, fails over between sources, detects
//! connectivity loss with bounded retries, and incrementally merges
//! newly arrived measurements into a running view without reloading the
//! whole dataset.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a facade that
//! wires everything together:
//!
//! ```ignore
//! use aeropulse::provider::RemoteConfig;
//! use aeropulse::service::{DashboardConfig, DashboardService};
//!
//! let config = DashboardConfig::new(
//!     RemoteConfig::new(2863798),
//!     "data/air_quality_data.csv",
//!     "http://localhost:8000/api/status",
//! );
//! let service = DashboardService::start(config).await?;
//! ```
//!
//! The individual subsystems - [`manager::SourceManager`],
//! [`sync::SyncEngine`], [`connectivity::ConnectivityMonitor`] - are
//! independently constructible for finer control and for testing.

pub mod connectivity;
pub mod logging;
pub mod manager;
pub mod measurement;
pub mod provider;
pub mod service;
pub mod sync;

/// Version of the aeropulse library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
