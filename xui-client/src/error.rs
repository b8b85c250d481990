//! Error types for the x-ui panel client

use thiserror::Error;

/// Errors that can occur when using the panel client
#[derive(Error, Debug)]
pub enum XuiError {
    /// HTTP exchange could not complete (connection, timeout, DNS)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Login was attempted and failed
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// The panel kept answering with the session-expired status after a fresh login
    #[error("{endpoint} | session expired again right after re-login")]
    SessionExpired {
        /// Path of the request that was retried
        endpoint: String,
    },

    /// Response body was empty or not JSON-shaped where a JSON document was required
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse {
        /// Path of the request
        endpoint: String,
        /// What was wrong with the body
        reason: String,
    },

    /// Response body was JSON but did not match the expected structure
    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        /// Path of the request
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Request payload could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The panel answered with `success: false`
    #[error("{endpoint} | {message}")]
    Api {
        /// Path of the request
        endpoint: String,
        /// The envelope's `msg`
        message: String,
    },

    /// No client with the given email exists on any inbound
    #[error("Client not found: {email}")]
    ClientNotFound {
        /// The email that was searched for
        email: String,
    },

    /// Host URL could not be parsed or carries no host name
    #[error("Invalid host URL: {0}")]
    InvalidHost(String),

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),
}

/// Reasons a login exchange can fail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Panel answered the login request with a non-200 status
    #[error("login rejected with status {status}")]
    Rejected {
        /// The status code that was received
        status: reqwest::StatusCode,
    },

    /// Panel accepted the login but did not set the session cookie
    #[error("no `{name}` session cookie received")]
    MissingCookie {
        /// Name of the expected cookie
        name: String,
    },
}

impl XuiError {
    /// Whether this error came from a failed login
    pub fn is_authentication(&self) -> bool {
        matches!(self, XuiError::Authentication(_))
    }
}
