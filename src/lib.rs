/* src/lib.rs */
//! # pubip
//!
//! Report the caller's public IP address.
//!
//! The resolver walks `X-Forwarded-For`, then `X-Real-IP`, from the right,
//! and returns the first entry that is a global unicast address outside the
//! private, loopback, link-local and unique-local ranges. When no header
//! yields one, the connection's peer address is used under the same rules.
//! An empty string means no public address could be determined.
//!
//! ## Features
//!
//! - `axum` (default): [`PublicIpLayer`] middleware and [`PublicIp`] extractor
//! - `server` (default): the `pubip` binary, its configuration and router
//!
//! ## Examples
//!
//! ```rust
//! use pubip::{resolve_public_ip, HeaderMap};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("x-real-ip".to_string(), "198.51.100.9".to_string());
//!
//! assert_eq!(resolve_public_ip(&headers, "10.0.0.7:51000"), "198.51.100.9");
//! assert_eq!(resolve_public_ip(&HeaderMap::new(), "8.8.8.8:54321"), "8.8.8.8");
//! ```

pub mod error;
pub mod extractor;
pub mod ranges;

#[cfg(feature = "axum")]
pub mod middleware;

#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod server;

pub use error::{PubIpError, Result};
pub use extractor::{ClientIpResolver, HeaderMap, resolve_public_ip};
pub use ranges::{PRIVATE_RANGES, is_global_unicast, is_private, is_public};

#[cfg(feature = "axum")]
pub use middleware::{PublicIp, PublicIpLayer, PublicIpService};

#[cfg(feature = "server")]
pub use config::{Args, Config};
#[cfg(feature = "server")]
pub use server::{router, serve, with_middleware};
