// API response envelope module

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Demo-mode acknowledgement sent with every echoed payload
pub const SUCCESS_MESSAGE: &str =
    "Data received successfully! (Demo mode - not stored in database)";

const INVALID_JSON_MESSAGE: &str = "Invalid JSON data";

/// Response envelope for the demo API
///
/// Field order is part of the wire contract: success, message, then data.
/// Failure responses omit `data` entirely.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Build the 200 echo response, CORS-open for browser clients
pub fn echo_success(data: serde_json::Value) -> Response<Full<Bytes>> {
    let envelope = ApiEnvelope {
        success: true,
        message: SUCCESS_MESSAGE.to_string(),
        data: Some(data),
    };

    json_response(StatusCode::OK, &envelope, true)
}

/// Build the 400 response for bodies that are not valid UTF-8 JSON
pub fn invalid_json() -> Response<Full<Bytes>> {
    let envelope = ApiEnvelope {
        success: false,
        message: INVALID_JSON_MESSAGE.to_string(),
        data: None,
    };

    json_response(StatusCode::BAD_REQUEST, &envelope, false)
}

/// Build a JSON response from a serializable body
fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    cors: bool,
) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(
                    r#"{"success":false,"message":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Content-Length", json.len());

    if cors {
        builder = builder.header("Access-Control-Allow-Origin", "*");
    }

    builder
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let envelope = ApiEnvelope {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            data: Some(serde_json::json!({"name": "Ann"})),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(
            json,
            r#"{"success":true,"message":"Data received successfully! (Demo mode - not stored in database)","data":{"name":"Ann"}}"#
        );
    }

    #[test]
    fn test_failure_envelope_omits_data() {
        let envelope = ApiEnvelope {
            success: false,
            message: INVALID_JSON_MESSAGE.to_string(),
            data: None,
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"success":false,"message":"Invalid JSON data"}"#);
    }

    #[test]
    fn test_echo_success_response_headers() {
        let resp = echo_success(serde_json::json!([1, 2, 3]));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }

    #[test]
    fn test_invalid_json_response_has_no_cors_header() {
        let resp = invalid_json();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp
            .headers()
            .get("Access-Control-Allow-Origin")
            .is_none());
    }
}
