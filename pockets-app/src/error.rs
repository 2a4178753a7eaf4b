use std::path::PathBuf;

use pockets_core::RepositoryError;
use pockets_core::scan::ScanError;
use pockets_data::{ExportError, ImportError, SlabLoadError};
use thiserror::Error;

/// Everything an application operation can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    /// A data operation ran without a signed-in user.
    #[error("not signed in: pass --user or set POCKETS_USER_ID")]
    NotAuthenticated,

    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),

    /// Every field message collected during validation.
    #[error("invalid input: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("receipt scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("slab table: {0}")]
    Slabs(#[from] SlabLoadError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("preferences error: {0}")]
    Preferences(String),

    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
