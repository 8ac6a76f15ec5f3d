//! Service-level errors.

use thiserror::Error;

use crate::connectivity::ProbeError;
use crate::manager::LoadError;
use crate::provider::ProviderError;

/// Errors surfaced by the service facade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// A component's HTTP client could not be constructed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The liveness probe could not be constructed.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// A bulk load failed on both sources.
    #[error(transparent)]
    Load(#[from] LoadError),
}
