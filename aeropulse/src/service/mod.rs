//! High-level service facade.
//!
//! Wires the concrete providers into the Source Manager, seeds the
//! sync engine through an initial bulk load, and starts the
//! connectivity monitor - all from a single [`DashboardConfig`].
//!
//! # Example
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
//!
//! let mut updates = service.sync().subscribe();
//! let mut status = service.connectivity().subscribe();
//! ```

mod config;
mod error;
mod facade;

pub use config::{DashboardConfig, DEFAULT_INITIAL_WINDOW_DAYS};
pub use error::ServiceError;
pub use facade::DashboardService;
