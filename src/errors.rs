use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    JsonDeserialization(#[from] serde_json::Error),

    #[error("upstream returned an error response: {0}")]
    Upstream(String),
}

pub type AppResult<T> = Result<T, AppError>;
