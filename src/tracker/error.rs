use thiserror::Error;

use crate::predict::PredictError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker already running")]
    AlreadyRunning,
    #[error("predict error: {0}")]
    Predict(#[from] PredictError),
    #[error("tracker worker failed: {0}")]
    Worker(String),
}
