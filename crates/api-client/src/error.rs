use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to reach the stats feed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("The stats feed returned HTTP {0}: {1}")]
    ApiError(u16, String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}
