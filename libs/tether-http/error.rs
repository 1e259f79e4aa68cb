use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The server answered with anything but 200
    #[error("[http] response status is not 2xx, code = {status}")]
    Status { status: u16, body: Option<String> },

    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),

    /// A success hook rejected the response
    #[error("Hook failed: {0}")]
    Hook(String),
}

impl HttpError {
    /// Status code of a rejected response
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;
