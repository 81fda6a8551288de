// SPDX-License-Identifier: Apache-2.0

//! Request routing, separated from the hyper connection plumbing in
//! [`crate::server`] so it can be exercised directly in tests without
//! constructing real `hyper::body::Incoming` bodies.

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::Full;
use pima_protocol::ArmMode;
use pima_supervisor::Supervisor;
use pima_transport::TransportOpener;
use serde::{Deserialize, Serialize};

const STATUS_PATH: &str = "/pima/status";
const ARM_PATH: &str = "/pima/arm";

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Deserialize)]
struct ArmRequest {
    mode: String,
    #[serde(default = "default_partitions")]
    partitions: Vec<u8>,
}

fn default_partitions() -> Vec<u8> {
    vec![1]
}

/// Reads the `api_key` query parameter out of a raw (undecoded) query string.
fn query_param<'a>(query: &'a str, key: &str) -> Option<std::borrow::Cow<'a, str>> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> http::Response<Full<Bytes>> {
    let bytes = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(bytes)))
        .unwrap_or_else(|_| http::Response::new(Full::new(Bytes::new())))
}

fn error_response(status: StatusCode, error: &'static str) -> http::Response<Full<Bytes>> {
    json_response(status, &ErrorBody { error })
}

/// Routes one already-parsed request to its handler.
///
/// `query` is the raw (undecoded) query string from the request URI, and
/// `body` is the already-collected request body. Every response is JSON,
/// matching the status codes in spec §6: 200 on success, 400 missing body,
/// 401 bad key, 501 invalid mode.
pub(crate) async fn route<O>(
    method: &Method,
    path: &str,
    query: &str,
    body: Bytes,
    supervisor: &Supervisor<O>,
    api_key: &str,
) -> http::Response<Full<Bytes>>
where
    O: TransportOpener + 'static,
{
    if query_param(query, "api_key").as_deref() != Some(api_key) {
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    match (method, path) {
        (&Method::GET, STATUS_PATH) => {
            let status = supervisor.current_status().await;
            json_response(StatusCode::OK, &status)
        }
        (&Method::POST, ARM_PATH) => handle_arm(body, supervisor).await,
        _ => error_response(StatusCode::NOT_FOUND, "Invalid URL"),
    }
}

async fn handle_arm<O>(body: Bytes, supervisor: &Supervisor<O>) -> http::Response<Full<Bytes>>
where
    O: TransportOpener + 'static,
{
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing body");
    }
    let request: ArmRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Malformed JSON body"),
    };
    let mode = match ArmMode::from_label(&request.mode.to_lowercase()) {
        Some(mode) => mode,
        None => return error_response(StatusCode::NOT_IMPLEMENTED, "Invalid arm mode"),
    };
    let partitions = request.partitions.into_iter().collect();
    match supervisor.arm(mode, &partitions).await {
        Ok(status) => json_response(StatusCode::OK, &status),
        Err(_unavailable) => error_response(StatusCode::SERVICE_UNAVAILABLE, "Panel link unavailable"),
    }
}
