use thiserror::Error;

/// Errors raised by a [`StorageBackend`](crate::StorageBackend).
///
/// These never escape [`PersistedStorage`](crate::PersistedStorage); the
/// adapter logs them and degrades to "no stored value".
#[derive(Debug, Error)]
pub enum StorageError {
    /// The browser does not expose `localStorage` (or it was denied).
    #[error("local storage is not supported in this environment")]
    Unavailable,

    /// Reading the raw value failed.
    #[error("failed to read key '{key}': {message}")]
    Read {
        /// Storage key being read
        key: String,
        /// Message from the backend
        message: String,
    },

    /// Writing or removing the raw value failed (quota, private mode, ...).
    #[error("failed to write key '{key}': {message}")]
    Write {
        /// Storage key being written
        key: String,
        /// Message from the backend
        message: String,
    },

    /// The value handed to `set` could not be encoded as JSON.
    #[error("failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored text is not valid JSON.
    #[error("corrupt JSON stored under key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned by [`ApiClient`](crate::ApiClient) requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure, including the configured request timeout.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("server responded with status {0}")]
    Status(u16),

    /// The response body was not the JSON we expected.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// A configured header value is not valid in an HTTP header.
    #[error("invalid header value '{0}'")]
    InvalidHeader(String),

    /// The body decoded but does not have the expected shape.
    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),
}

/// Errors raised while writing a value into [`GlobalState`](crate::GlobalState).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A known field was assigned a JSON value of the wrong type.
    #[error("field '{field}' expects a {expected} value")]
    FieldType {
        field: String,
        expected: &'static str,
    },
}

/// Errors raised by [`Store::map_state`](crate::Store::map_state).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    /// The selection is neither a field name, a list, nor an alias object.
    #[error("Invalid type: {0}")]
    InvalidType(String),
}
