use thiserror::Error;

use quill_shared::ErrorResponse;

/// Failures surfaced by [`crate::PostsClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Build from a non-2xx response body; RFC 7807 bodies yield their detail.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let detail = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(problem) => problem.message().to_string(),
            Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
            Err(_) => body.trim().to_string(),
        };
        ClientError::Api { status, detail }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            ClientError::Unauthenticated | ClientError::InvalidUrl(_) => None,
        }
    }
}
