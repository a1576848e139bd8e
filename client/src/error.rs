#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure; the request may never have reached the server.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with an error envelope.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("Failed to decode server response: {0}")]
    Decode(String),

    /// The secure on-device store failed.
    #[error("Secure storage error: {0}")]
    Storage(String),

    /// The session is gone for good; the UI must force a re-login rather
    /// than offer a retry.
    #[error("Session expired. Please log in again.")]
    SessionExpired,
}

impl ClientError {
    /// True for responses that mean the presented credential was rejected.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == 401 || *status == 403)
    }
}
