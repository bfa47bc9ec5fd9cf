/* src/error.rs */

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result type alias for operations that may fail with `PubIpError`.
pub type Result<T> = std::result::Result<T, PubIpError>;

/// Errors raised while configuring or running the service.
///
/// Resolving an address never fails; these only come from startup and
/// the listener.
#[derive(Error, Debug)]
pub enum PubIpError {
    /// A configured proxy header is not a valid HTTP header name.
    #[error("Invalid proxy header name: {0}")]
    InvalidHeaderName(String),

    /// The proxy header list is empty.
    #[error("At least one proxy header must be configured")]
    NoProxyHeaders,

    /// The request timeout is zero.
    #[error("Request timeout must be greater than zero")]
    ZeroTimeout,

    /// Binding the listener failed.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[from] io::Error),
}
