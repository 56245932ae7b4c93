//! Error types for the ZwiftPower client.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Errors raised while establishing an authenticated session.
#[derive(Error, Debug)]
pub enum AuthError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A redirect step returned no `Location` header
    #[error("Missing redirect location in response from {url}")]
    MissingRedirect { url: String },

    /// The login page did not contain the expected form
    #[error("Login form not found on {url}")]
    FormNotFound { url: String },

    /// The site answered a handshake step with a failure status
    #[error("Login rejected ({status}) at {url}")]
    Rejected { status: u16, url: String },

    /// A redirect target or form action could not be resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Exported browser cookies could not be loaded
    #[error("Failed to load cookies: {0}")]
    Cookies(#[from] CookieError),
}

/// Errors raised by the reporting operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Authentication failed while constructing the client
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// HTTP request failed or timed out
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body did not have the expected shape
    #[error("Unexpected data from {url}: {message}")]
    DataShape { url: String, message: String },

    /// Reference tables could not be built
    #[error("Reference data error: {0}")]
    Reference(String),

    /// Configuration problem
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Create a data-shape error for the given URL
    pub fn data_shape(url: impl Into<String>, message: impl ToString) -> Self {
        Self::DataShape {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Missing required configuration value
    #[error("Missing required config value: {0}")]
    MissingValue(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Errors that can occur while loading cookies.
#[derive(Error, Debug)]
pub enum CookieError {
    /// Failed to read the cookie file.
    #[error("Failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),

    /// Cookie file contains an invalid line.
    #[error("Invalid Netscape cookie line: {0}")]
    InvalidLine(String),

    /// Cookie domain could not be converted into a URL.
    #[error("Invalid cookie domain: {0}")]
    InvalidDomain(String),
}
