use thiserror::Error;

/// Every failure the registry can report, each with a fixed HTTP-equivalent status.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Stats feed error: {0}")]
    Fetch(#[from] api_client::error::ApiError),

    #[error("Storage error: {0}")]
    Persistence(#[from] database::StoreError),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Server(String),
}

impl RegistryError {
    pub fn status_code(&self) -> u16 {
        match self {
            RegistryError::Validation(_) => 400,
            RegistryError::Auth(_) => 401,
            RegistryError::NotFound(_) => 404,
            RegistryError::Conflict(_) => 409,
            RegistryError::Fetch(_) => 502,
            RegistryError::Persistence(_) | RegistryError::Server(_) => 500,
        }
    }
}

/// Rejects a missing or blank token, returning the trimmed value otherwise.
pub(crate) fn require_token(token: &str) -> Result<&str, RegistryError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(RegistryError::Validation("missing token".to_string()));
    }
    Ok(token)
}
