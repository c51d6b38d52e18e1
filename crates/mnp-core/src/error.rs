// Errors surfaced by the analysis entry points.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no such team: {0}")]
    TeamNotFound(String),

    #[error("no such player: {0}")]
    PlayerNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
