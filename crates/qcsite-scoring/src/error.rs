use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommenderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("recommendation endpoint returned status {0}")]
    UnexpectedStatus(u16),

    #[error("recommendation endpoint returned no text")]
    EmptyResponse,
}
