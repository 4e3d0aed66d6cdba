use async_trait::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Client identity used for rate limiting.
///
/// Resolved from proxy headers first (`x-forwarded-for`, then
/// `x-real-ip`), falling back to the peer address and finally to a
/// shared `"unknown"` bucket when nothing is available.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(resolve_client_ip(&parts.headers, &parts.extensions)))
    }
}

fn resolve_client_ip(headers: &HeaderMap, extensions: &Extensions) -> String {
    // Proxy headers take precedence over the socket address
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return first_ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            let ip_str = ip_str.trim();
            if !ip_str.is_empty() {
                return ip_str.to_string();
            }
        }
    }

    if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Logging middleware for request/response tracking.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = resolve_client_ip(request.headers(), request.extensions());
    let started = Instant::now();

    info!(
        target: "tagx::middleware",
        %request_id,
        method = %method,
        uri = %uri,
        client_ip = %client_ip,
        "Incoming request"
    );

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(
        target: "tagx::middleware",
        %request_id,
        method = %method,
        uri = %uri,
        status = %status,
        elapsed_ms,
        "Request completed"
    );

    response
}
