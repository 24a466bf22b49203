/// Failure of a single CRUD request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server rejected the credential; the session has been logged out.
    #[error("Unauthorized")]
    Unauthorized,

    /// No credential to send.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Non-success status with the server-provided detail.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            detail: detail.into(),
        }
    }

    /// Whether the host should drop to the logged-out state.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::NotLoggedIn)
    }
}
