use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid satellite id '{0}': expected a NORAD number or an international designator like 2017-073A")]
    InvalidId(String),
    #[error("satellite not found: {0}")]
    SatelliteNotFound(String),
    #[error("failed to fetch elements from {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Invalid TLE format in {file}: {message}")]
    InvalidTle { file: String, message: String },
    #[error("Propagation error: {0}")]
    Propagation(String),
}
