/* src/extractor.rs */

use std::collections::HashMap;
use std::net::IpAddr;

use crate::ranges::is_public;

/// Type alias for header maps. Keys are lowercase header names.
///
/// A header that arrived on several lines is expected as one value joined
/// with `", "`, in arrival order.
pub type HeaderMap = HashMap<String, String>;

/// Resolves the public address of the client that sent a request.
#[derive(Debug, Clone)]
pub struct ClientIpResolver {
    /// Proxy chain headers to check, in order of preference.
    pub headers: Vec<String>,
}

impl Default for ClientIpResolver {
    fn default() -> Self {
        Self {
            headers: vec!["x-forwarded-for".to_string(), "x-real-ip".to_string()],
        }
    }
}

impl ClientIpResolver {
    /// Create a resolver checking `X-Forwarded-For`, then `X-Real-IP`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set proxy chain headers to check, in order of preference.
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers.into_iter().map(|h| h.to_lowercase()).collect();
        self
    }

    /// Resolve the client's public IP as text.
    ///
    /// Returns an empty string when neither the headers nor `remote_addr`
    /// carry a public address. Never fails.
    pub fn resolve(&self, headers: &HeaderMap, remote_addr: &str) -> String {
        self.find(headers, remote_addr)
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Same as [`resolve`](Self::resolve) but parsed.
    pub fn resolve_ip(&self, headers: &HeaderMap, remote_addr: &str) -> Option<IpAddr> {
        self.find(headers, remote_addr)
            .and_then(|candidate| candidate.parse().ok())
    }

    fn find<'a>(&self, headers: &'a HeaderMap, remote_addr: &'a str) -> Option<&'a str> {
        for header_name in &self.headers {
            let Some(value) = headers.get(header_name.as_str()) else {
                continue;
            };
            if let Some(candidate) = last_public_token(value) {
                tracing::debug!(header = %header_name, ip = candidate, "resolved from header");
                return Some(candidate);
            }
        }

        let host = split_host(remote_addr);
        match host.parse::<IpAddr>() {
            Ok(ip) if is_public(&ip) => {
                tracing::debug!(ip = host, "resolved from remote address");
                Some(host)
            }
            _ => None,
        }
    }
}

/// Walk a comma separated chain from right to left and return the first
/// public entry. Each hop appends to the right, so the rightmost public
/// entry is the one recorded nearest to us.
fn last_public_token(value: &str) -> Option<&str> {
    value.split(',').rev().map(str::trim).find(|token| {
        match token.parse::<IpAddr>() {
            Ok(ip) if is_public(&ip) => true,
            _ => {
                if !token.is_empty() {
                    tracing::trace!(token, "skipping non-public chain entry");
                }
                false
            }
        }
    })
}

/// Host part of a `host:port` peer address.
///
/// Also accepts a bare IP and a bracketed IPv6 literal without port.
fn split_host(remote_addr: &str) -> &str {
    let remote_addr = remote_addr.trim();
    if remote_addr.parse::<IpAddr>().is_ok() {
        return remote_addr;
    }
    if let Some(rest) = remote_addr.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((host, _)) => host,
            None => rest,
        };
    }
    match remote_addr.rsplit_once(':') {
        Some((host, _)) => host,
        None => remote_addr,
    }
}

/// Convenience function resolving with the default header order.
///
/// # Arguments
///
/// * `headers` - Map of HTTP headers with lowercase keys
/// * `remote_addr` - Peer address of the connection, `host:port`
///
/// # Examples
///
/// ```rust
/// use pubip::{resolve_public_ip, HeaderMap};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     "x-forwarded-for".to_string(),
///     "10.0.0.1, 203.0.113.5, 192.168.1.1".to_string(),
/// );
///
/// assert_eq!(resolve_public_ip(&headers, "127.0.0.1:40000"), "203.0.113.5");
/// assert_eq!(resolve_public_ip(&HeaderMap::new(), "127.0.0.1:40000"), "");
/// ```
pub fn resolve_public_ip(headers: &HeaderMap, remote_addr: &str) -> String {
    ClientIpResolver::default().resolve(headers, remote_addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_forwarded_for_skips_private_from_right() {
        let headers = headers(&[("x-forwarded-for", "10.0.0.1, 203.0.113.5, 192.168.1.1")]);
        assert_eq!(resolve_public_ip(&headers, ""), "203.0.113.5");
    }

    #[test]
    fn test_rightmost_public_wins() {
        let headers = headers(&[("x-forwarded-for", "198.51.100.1, 203.0.113.5")]);
        assert_eq!(resolve_public_ip(&headers, "8.8.8.8:1"), "203.0.113.5");
    }

    #[test]
    fn test_x_real_ip_only() {
        let headers = headers(&[("x-real-ip", "198.51.100.9")]);
        assert_eq!(resolve_public_ip(&headers, ""), "198.51.100.9");
    }

    #[test]
    fn test_real_ip_used_when_forwarded_for_is_all_private() {
        let headers = headers(&[
            ("x-forwarded-for", "10.0.0.1, 127.0.0.1"),
            ("x-real-ip", "198.51.100.9"),
        ]);
        assert_eq!(resolve_public_ip(&headers, ""), "198.51.100.9");
    }

    #[test]
    fn test_forwarded_for_preferred_over_real_ip() {
        let headers = headers(&[
            ("x-forwarded-for", "203.0.113.5"),
            ("x-real-ip", "198.51.100.9"),
        ]);
        assert_eq!(resolve_public_ip(&headers, ""), "203.0.113.5");
    }

    #[test]
    fn test_malformed_token_skipped() {
        let leading = headers(&[("x-forwarded-for", "not-an-ip, 203.0.113.5")]);
        assert_eq!(resolve_public_ip(&leading, ""), "203.0.113.5");

        let trailing = headers(&[("x-forwarded-for", "203.0.113.5, not-an-ip,,")]);
        assert_eq!(resolve_public_ip(&trailing, ""), "203.0.113.5");
    }

    #[test]
    fn test_whitespace_trimmed() {
        let headers = headers(&[("x-forwarded-for", "  203.0.113.5\t,   10.0.0.1 ")]);
        assert_eq!(resolve_public_ip(&headers, ""), "203.0.113.5");
    }

    #[test]
    fn test_private_only_chain_is_empty() {
        let headers = headers(&[
            ("x-forwarded-for", "10.0.0.1, 172.16.5.4, 192.168.1.1, ::1, fe80::1, fd00::1"),
            ("x-real-ip", "127.0.0.1"),
        ]);
        assert_eq!(resolve_public_ip(&headers, "192.168.0.10:443"), "");
    }

    #[test]
    fn test_remote_addr_fallback() {
        let empty = HeaderMap::new();
        assert_eq!(resolve_public_ip(&empty, "8.8.8.8:54321"), "8.8.8.8");
        assert_eq!(resolve_public_ip(&empty, "127.0.0.1:54321"), "");
        assert_eq!(resolve_public_ip(&empty, "[2606:4700::1111]:443"), "2606:4700::1111");
        assert_eq!(resolve_public_ip(&empty, "[::1]:443"), "");
        assert_eq!(resolve_public_ip(&empty, "8.8.4.4"), "8.8.4.4");
        assert_eq!(resolve_public_ip(&empty, "2606:4700::1111"), "2606:4700::1111");
        assert_eq!(resolve_public_ip(&empty, "garbage"), "");
        assert_eq!(resolve_public_ip(&empty, ""), "");
    }

    #[test]
    fn test_headers_without_public_entry_fall_back_to_remote() {
        let headers = headers(&[("x-forwarded-for", "10.0.0.1")]);
        assert_eq!(resolve_public_ip(&headers, "8.8.8.8:54321"), "8.8.8.8");
    }

    #[test]
    fn test_non_global_entries_skipped() {
        let headers = headers(&[("x-forwarded-for", "203.0.113.5, 0.0.0.0, 169.254.1.1, 224.0.0.1")]);
        assert_eq!(resolve_public_ip(&headers, ""), "203.0.113.5");
    }

    #[test]
    fn test_ipv6_chain() {
        let headers = headers(&[("x-forwarded-for", "2001:4860:4860::8888, fd00::1")]);
        assert_eq!(resolve_public_ip(&headers, ""), "2001:4860:4860::8888");
    }

    #[test]
    fn test_custom_headers_case_insensitive() {
        let resolver = ClientIpResolver::new().with_headers(vec!["CF-Connecting-IP".to_string()]);
        let headers = headers(&[
            ("cf-connecting-ip", "198.51.100.42"),
            ("x-forwarded-for", "203.0.113.5"),
        ]);
        assert_eq!(resolver.resolve(&headers, ""), "198.51.100.42");
    }

    #[test]
    fn test_resolve_ip() {
        let headers = headers(&[("x-real-ip", "198.51.100.9")]);
        let resolver = ClientIpResolver::default();
        assert_eq!(
            resolver.resolve_ip(&headers, ""),
            Some("198.51.100.9".parse().unwrap())
        );
        assert_eq!(resolver.resolve_ip(&HeaderMap::new(), "10.0.0.1:80"), None);
    }

    #[test]
    fn test_idempotent() {
        let headers = headers(&[("x-forwarded-for", "not-an-ip, 203.0.113.5, 10.0.0.1")]);
        let resolver = ClientIpResolver::default();
        let first = resolver.resolve(&headers, "8.8.8.8:1");
        for _ in 0..10 {
            assert_eq!(resolver.resolve(&headers, "8.8.8.8:1"), first);
        }
    }
}
