use thiserror::Error;

use crate::predict::PredictError;

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("position query failed: {0}")]
    Predict(#[from] PredictError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
