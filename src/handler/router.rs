//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Dispatch is an explicit mapping
//! from (method, path prefix) to a handler, selected by plain conditionals.

use crate::api;
use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use chrono::Local;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context handed to the static file responder
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Where a request is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// OPTIONS, any path
    Preflight,
    /// GET/HEAD, any path
    Static,
    /// POST under the /api/ prefix
    ApiEcho,
    /// Everything else
    NotFound,
}

/// Map (method, path) to a handler decision
pub fn classify(method: &Method, path: &str) -> RouteDecision {
    match *method {
        Method::OPTIONS => RouteDecision::Preflight,
        Method::GET | Method::HEAD => RouteDecision::Static,
        Method::POST if api::is_api_path(path) => RouteDecision::ApiEcho,
        _ => RouteDecision::NotFound,
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let http_version = version_label(req.version()).to_string();
    let if_none_match = header_string(&req, "if-none-match");
    let referer = header_string(&req, "referer");
    let user_agent = header_string(&req, "user-agent");

    let response = match classify(&method, &path) {
        RouteDecision::Preflight => http::build_preflight_response(),
        RouteDecision::NotFound => http::build_404_response(),
        RouteDecision::ApiEcho => {
            match check_body_size(&req, state.config.http.max_body_size) {
                Some(resp) => resp,
                None => api::handle_echo(req).await,
            }
        }
        RouteDecision::Static => {
            let ctx = RequestContext {
                path: &path,
                is_head: method == Method::HEAD,
                if_none_match,
            };
            static_files::serve(&ctx, &state).await
        }
    };

    if state.config.logging.access_log {
        let entry = AccessLogEntry {
            remote_addr: peer_addr.to_string(),
            time: Local::now(),
            method: method.to_string(),
            path,
            query,
            http_version,
            status: response.status().as_u16(),
            body_bytes: content_length_of(&response),
            referer,
            user_agent,
            request_time_us: u64::try_from(started.elapsed().as_micros())
                .unwrap_or(u64::MAX),
        };
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Validate Content-Length against the configured cap, 413 when exceeded
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
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

fn header_string(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}

/// Read a response's declared Content-Length for access logging
fn content_length_of(response: &Response<Full<Bytes>>) -> usize {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_is_preflight_on_any_path() {
        assert_eq!(classify(&Method::OPTIONS, "/"), RouteDecision::Preflight);
        assert_eq!(
            classify(&Method::OPTIONS, "/api/contact"),
            RouteDecision::Preflight
        );
        assert_eq!(
            classify(&Method::OPTIONS, "/index.html"),
            RouteDecision::Preflight
        );
    }

    #[test]
    fn test_get_and_head_are_static() {
        assert_eq!(classify(&Method::GET, "/"), RouteDecision::Static);
        assert_eq!(classify(&Method::GET, "/api/contact"), RouteDecision::Static);
        assert_eq!(classify(&Method::HEAD, "/css/style.css"), RouteDecision::Static);
    }

    #[test]
    fn test_post_dispatch_hinges_on_api_prefix() {
        assert_eq!(classify(&Method::POST, "/api/contact"), RouteDecision::ApiEcho);
        assert_eq!(classify(&Method::POST, "/api/x"), RouteDecision::ApiEcho);
        assert_eq!(classify(&Method::POST, "/api"), RouteDecision::NotFound);
        assert_eq!(classify(&Method::POST, "/other"), RouteDecision::NotFound);
    }

    #[test]
    fn test_other_methods_fall_through_to_404() {
        assert_eq!(classify(&Method::PUT, "/api/contact"), RouteDecision::NotFound);
        assert_eq!(classify(&Method::DELETE, "/"), RouteDecision::NotFound);
        assert_eq!(classify(&Method::PATCH, "/index.html"), RouteDecision::NotFound);
    }
}
