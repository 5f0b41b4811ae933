// Error type shared by the library modules. The binary wraps it in
// `anyhow` at the top level; everything below `main` returns this enum so
// the session controller can tell transport problems apart from the rest.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for credential loading, HTTP calls and console I/O.
#[derive(Error, Debug)]
pub enum PointsError {
    /// The credential file is missing, unreadable or empty.
    #[error("{path}: {source}")]
    Credentials {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The token cannot be sent as an HTTP header value.
    #[error("token contains characters not allowed in a header")]
    InvalidToken,

    /// Connection, TLS or body decoding failure reported by reqwest.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body was not the JSON shape we expect.
    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),

    /// A success envelope came back without the payload we asked for.
    #[error("response is missing `{0}`")]
    MissingData(&'static str),

    /// Reading a prompt answer from the terminal failed.
    #[error("console error: {0}")]
    Console(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PointsError>;
