/* src/config.rs */

use axum::http::HeaderName;
use clap::Parser;
use std::{net::SocketAddr, time::Duration};

use crate::error::{PubIpError, Result};
use crate::extractor::ClientIpResolver;

/// Report the caller's public IP address as JSON.
#[derive(Parser, Debug, Clone)]
#[command(name = "pubip", version, about, long_about = None)]
pub struct Args {
    /// Address to listen on.
    #[arg(long, env = "PUBIP_LISTEN", default_value = "0.0.0.0:8082")]
    pub listen: SocketAddr,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PUBIP_REQUEST_TIMEOUT", default_value_t = 120)]
    pub request_timeout: u64,

    /// Proxy chain headers to inspect, in order of preference.
    #[arg(
        long,
        env = "PUBIP_PROXY_HEADERS",
        value_delimiter = ',',
        default_value = "X-Forwarded-For,X-Real-IP"
    )]
    pub proxy_headers: Vec<String>,
}

/// Validated service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub request_timeout: Duration,
    /// Lowercase header names.
    pub proxy_headers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8082)),
            request_timeout: Duration::from_secs(120),
            proxy_headers: ClientIpResolver::default().headers,
        }
    }
}

impl Config {
    /// Build the resolver these settings describe.
    pub fn resolver(&self) -> ClientIpResolver {
        ClientIpResolver::new().with_headers(self.proxy_headers.clone())
    }
}

impl TryFrom<Args> for Config {
    type Error = PubIpError;

    fn try_from(args: Args) -> Result<Self> {
        if args.request_timeout == 0 {
            return Err(PubIpError::ZeroTimeout);
        }

        let proxy_headers = args
            .proxy_headers
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes())
                    .map(|header| header.as_str().to_string())
                    .map_err(|_| PubIpError::InvalidHeaderName(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        if proxy_headers.is_empty() {
            return Err(PubIpError::NoProxyHeaders);
        }

        Ok(Self {
            listen: args.listen,
            request_timeout: Duration::from_secs(args.request_timeout),
            proxy_headers,
        })
    }
}
