/* src/middleware.rs */

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{Extensions, HeaderMap, request::Parts},
    response::Response,
};
use futures_util::future::BoxFuture;
use std::{
    borrow::Cow,
    convert::Infallible,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::extractor::{self, ClientIpResolver};

/// Extension that holds the resolved public IP, empty when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicIp(pub String);

impl PublicIp {
    /// Get the address as it was reported.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the parsed address, if one was found.
    pub fn ip(&self) -> Option<IpAddr> {
        self.0.parse().ok()
    }

    fn from_parts(
        resolver: &ClientIpResolver,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> Self {
        let header_map = headers_to_map(headers, &resolver.headers);
        let remote_addr = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|connect_info| connect_info.0.to_string())
            .unwrap_or_default();

        PublicIp(resolver.resolve(&header_map, &remote_addr))
    }
}

/// Layer that resolves the caller's public IP once per request.
///
/// The result is stored as a [`PublicIp`] request extension. The peer
/// address is read from `ConnectInfo<SocketAddr>`, so serve the router with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// A proxy header sent on several lines is read as one chain: the lines are
/// joined in arrival order before the right-to-left scan. Only looking at
/// the first line would hide the hops appended on later ones.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{Json, Router, routing::get};
/// use pubip::{PublicIp, PublicIpLayer};
///
/// async fn handler(public_ip: PublicIp) -> Json<String> {
///     Json(public_ip.0)
/// }
///
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .layer(PublicIpLayer::default());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PublicIpLayer {
    resolver: Arc<ClientIpResolver>,
}

impl PublicIpLayer {
    /// Create a layer with the default header order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer with a custom resolver.
    pub fn with_resolver(resolver: ClientIpResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

impl<S> Layer<S> for PublicIpLayer {
    type Service = PublicIpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PublicIpService {
            inner,
            resolver: Arc::clone(&self.resolver),
        }
    }
}

/// Service that resolves public IP addresses.
#[derive(Debug, Clone)]
pub struct PublicIpService<S> {
    inner: S,
    resolver: Arc<ClientIpResolver>,
}

impl<S> Service<Request> for PublicIpService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let public_ip = PublicIp::from_parts(&self.resolver, req.headers(), req.extensions());
        req.extensions_mut().insert(public_ip);

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}

/// Collect the proxy headers the resolver cares about.
///
/// Repeated header lines are joined with `", "` so the chain keeps its
/// order. Values are decoded lossily, so a non-ASCII token only spoils
/// itself and not the rest of its line.
fn headers_to_map(headers: &HeaderMap, wanted: &[String]) -> extractor::HeaderMap {
    let mut map = extractor::HeaderMap::new();

    for name in wanted {
        let values: Vec<Cow<'_, str>> = headers
            .get_all(name.as_str())
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
            .collect();
        if !values.is_empty() {
            map.insert(name.to_lowercase(), values.join(", "));
        }
    }

    map
}

/// Axum extractor for the public IP.
///
/// Reads the extension set by [`PublicIpLayer`]; without the layer it
/// resolves on the spot with the default header order.
impl<S> FromRequestParts<S> for PublicIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(public_ip) = parts.extensions.get::<PublicIp>() {
            return Ok(public_ip.clone());
        }

        Ok(PublicIp::from_parts(
            &ClientIpResolver::default(),
            &parts.headers,
            &parts.extensions,
        ))
    }
}
