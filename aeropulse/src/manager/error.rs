//! Error types for the Source Manager.

use thiserror::Error;

use crate::provider::{ProviderError, SourceKind};

/// Why a single source could not satisfy a load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceFailure {
    /// The fetch itself failed.
    #[error(transparent)]
    Fetch(#[from] ProviderError),

    /// The fetch succeeded but returned zero records.
    #[error("source returned no records")]
    Empty,
}

/// Terminal error for a single `load` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The preferred source and its fallback both failed. Carries the
    /// failure of the last source attempted, for diagnostics.
    #[error("both sources unavailable; last attempt ({source}) failed: {cause}")]
    BothSourcesUnavailable {
        source: SourceKind,
        #[source]
        cause: SourceFailure,
    },
}
