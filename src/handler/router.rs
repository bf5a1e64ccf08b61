//! Request routing dispatch module
//!
//! Runs the per-request pipeline around the item route table.

use crate::api;
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderName, REFERER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let start = Instant::now();
    let (parts, body) = req.into_parts();

    let mut response = route_request(&parts, body, &state).await;

    http::set_server_header(&mut response, &state.config.http.server_name);
    if state.config.http.enable_cors {
        http::apply_cors_headers(&mut response);
    }

    if state.config.logging.access_log {
        let entry = access_entry(&parts, &response, remote_addr, start);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn route_request<B>(parts: &Parts, body: B, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let path = parts.uri.path();
    let config = &state.config;

    // 1. Health check endpoints (highest priority)
    let health = &config.routes.health;
    if health.enabled
        && parts.method == Method::GET
        && (path == health.liveness_path || path == health.readiness_path)
    {
        return http::build_health_response("ok");
    }

    // 2. Preflight
    if parts.method == Method::OPTIONS {
        let allowed = state.routes.allowed_methods(path);
        if allowed.is_empty() {
            return api::not_found(path);
        }
        return http::build_options_response(&allowed, config.http.enable_cors);
    }

    // 3. Body size
    if let Some(resp) = check_body_size(&parts.headers, config.http.max_body_size) {
        return resp;
    }
    let body = match read_body(body, config.http.max_body_size).await {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };

    // 4. Item API
    api::dispatch(&state.routes, &parts.method, path, parts.uri.query(), &body)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Collect the body, enforcing the limit for chunked uploads too
async fn read_body<B>(body: B, max_body_size: u64) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!("Request body exceeded {max_body_size} bytes"));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_text_response(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
            ))
        }
    }
}

fn access_entry(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    remote_addr: SocketAddr,
    start: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header_string(&parts.headers, &REFERER);
    entry.user_agent = header_string(&parts.headers, &USER_AGENT);
    entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, SERVER};

    fn state_with(edit: impl FnOnce(&mut Config)) -> Arc<AppState> {
        let mut config = Config::load_from("does-not-exist/config").unwrap();
        config.logging.access_log = false;
        edit(&mut config);
        Arc::new(AppState::new(&config).unwrap())
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    async fn send(state: Arc<AppState>, req: Request<Full<Bytes>>) -> (Response<()>, Bytes) {
        let response = handle_request(req, state, peer()).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (Response::from_parts(parts, ()), bytes)
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    #[tokio::test]
    async fn test_item_route_through_pipeline() {
        let state = state_with(|_| {});
        let (response, body) = send(state, request(Method::GET, "/items/?skip=5&limit=20", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "items-server/0.1");
        assert_eq!(&body[..], br#"{"skip":5,"limit":20}"#);
    }

    #[tokio::test]
    async fn test_health_checks() {
        let state = state_with(|_| {});
        let (response, body) = send(Arc::clone(&state), request(Method::GET, "/healthz", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body[..], br#"{"status":"ok"}"#);

        let (response, _) = send(state, request(Method::GET, "/readyz", "")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let disabled = state_with(|c| c.routes.health.enabled = false);
        let (response, _) = send(disabled, request(Method::GET, "/healthz", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let state = state_with(|c| c.http.max_body_size = 8);
        let (response, _) = send(
            Arc::clone(&state),
            request(Method::POST, "/echo/", r#"{"a":"0123456789"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let mut req = request(Method::POST, "/echo/", "{}");
        req.headers_mut().insert("content-length", "4096".parse().unwrap());
        let (response, _) = send(state, req).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_options_and_cors() {
        let state = state_with(|c| c.http.enable_cors = true);
        let (response, _) = send(Arc::clone(&state), request(Method::OPTIONS, "/items/", "")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[ALLOW], "GET, POST, HEAD, OPTIONS");
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let (response, _) = send(Arc::clone(&state), request(Method::GET, "/", "")).await;
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let (response, _) = send(state, request(Method::OPTIONS, "/nowhere", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_access_entry() {
        let req = Request::builder()
            .method(Method::DELETE)
            .uri("/items/7?force=1")
            .header(USER_AGENT, "curl/8.5.0")
            .body(())
            .unwrap();
        let (parts, ()) = req.into_parts();
        let response = Response::new(Full::new(Bytes::from_static(b"12345")));
        let entry = access_entry(&parts, &response, peer(), Instant::now());
        assert_eq!(entry.remote_addr, "127.0.0.1");
        assert_eq!(entry.path, "/items/7");
        assert_eq!(entry.query.as_deref(), Some("force=1"));
        assert_eq!(entry.body_bytes, 5);
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.5.0"));
        assert_eq!(entry.referer, None);
    }
}
