use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;
use tracing::{error, warn};

/// Convert a ServerError into a JSON error response.
pub fn error_to_response(err: ServerError) -> Response {
    let status = err.status_code();
    if status >= 500 {
        error!("request failed: {err}");
    } else {
        warn!(status, "request rejected: {err}");
    }

    json_error_response(status, &err.public_message())
}

/// `{ "success": false, "message": ... }`
pub fn json_error_response(status: u16, message: &str) -> Response {
    let body = json!({
        "success": false,
        "message": message,
    })
    .to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body.clone()))
        .unwrap_or_else(|_| Response::new(Body::from(body)))
}
