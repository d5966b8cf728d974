// API echo module
// Every POST under /api/ gets the same treatment: parse the body as JSON
// and echo it back in the demo envelope. Nothing is stored.

mod response;

pub use response::{echo_success, invalid_json, ApiEnvelope};

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response};

use crate::logger;

/// Handle a POST to a path under the /api/ prefix
///
/// There is no routing below the prefix; /api/contact and /api/anything
/// behave identically.
pub async fn handle_echo(req: Request<hyper::body::Incoming>) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_error(&format!("Failed to read request body for {path}: {e}"));
            logger::log_api_request("POST", &path, 400);
            return invalid_json();
        }
    };

    // from_slice rejects both invalid UTF-8 and malformed JSON
    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(data) => {
            logger::log_api_request("POST", &path, 200);
            echo_success(data)
        }
        Err(e) => {
            logger::log_warning(&format!("Invalid JSON posted to {path}: {e}"));
            logger::log_api_request("POST", &path, 400);
            invalid_json()
        }
    }
}

/// Whether a path falls under the demo API prefix
///
/// The test is a literal prefix check: `/api` without the trailing slash
/// is not an API path.
pub fn is_api_path(path: &str) -> bool {
    path.starts_with("/api/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_prefix() {
        assert!(is_api_path("/api/contact"));
        assert!(is_api_path("/api/anything/nested"));
        assert!(!is_api_path("/api"));
        assert!(!is_api_path("/apiary"));
        assert!(!is_api_path("/other"));
        assert!(!is_api_path("/"));
    }
}
