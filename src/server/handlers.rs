//! HTTP request handlers for the v1 API
//!
//! Every handler answers with JSON. Failures are returned as [`GatewayError`],
//! which renders as `{"error": "<message>"}` with the matching status code.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, Request, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use log::{error, info};

use super::config::MAX_BODY_BYTES;
use crate::core::GatewayEngine;
use crate::types::{GatewayError, TransactionId, TransactionRecord};

/// Path of the batch resource
pub const COLLECTION_PATH: &str = "/v1/transactions.json";

/// Path of a single transaction, `{file}` being `<id>.json`
pub const MEMBER_PATH: &str = "/v1/transactions/{file}";

const JSON_SUFFIX: &str = ".json";

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("api: {}", self);
        }

        let mut response = (status, Json(self.to_json())).into_response();
        if let GatewayError::MethodNotAllowed { allowed, .. } = &self {
            if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}

/// Run engine work on the blocking pool
///
/// Registry operations can wait on the registry-wide lock; off the async
/// workers that wait stays visible to the request deadline.
async fn blocking<T, F>(engine: &GatewayEngine, work: F) -> Result<T, GatewayError>
where
    T: Send + 'static,
    F: FnOnce(&GatewayEngine) -> Result<T, GatewayError> + Send + 'static,
{
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || work(&engine))
        .await
        .map_err(|e| GatewayError::internal(e.to_string()))?
}

/// Extract the transaction id from the last path segment
fn transaction_id(file: &str) -> Result<TransactionId, GatewayError> {
    file.strip_suffix(JSON_SUFFIX)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::route_not_found(&format!("/v1/transactions/{}", file)))
}

fn body_error(rejection: BytesRejection) -> GatewayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge {
            limit: MAX_BODY_BYTES,
        }
    } else {
        GatewayError::malformed(rejection.body_text())
    }
}

/// Handler for `POST /v1/transactions/{id}.json` - create a transaction.
///
/// Returns 202 Accepted with the in-progress record. A taken id is answered
/// with 422 before the body is looked at.
pub async fn create_transaction_handler(
    State(engine): State<GatewayEngine>,
    Path(file): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<TransactionRecord>), GatewayError> {
    let id = transaction_id(&file)?;
    let body = body.map_err(body_error);

    let record = blocking(&engine, move |engine| match body {
        Ok(body) => engine.submit(&id, &body),
        Err(e) => {
            engine.ensure_absent(&id)?;
            Err(e)
        }
    })
    .await?;
    Ok((StatusCode::ACCEPTED, Json(record)))
}

/// Handler for `GET /v1/transactions/{id}.json` - poll a transaction.
pub async fn get_transaction_handler(
    State(engine): State<GatewayEngine>,
    Path(file): Path<String>,
) -> Result<Json<TransactionRecord>, GatewayError> {
    let id = transaction_id(&file)?;
    let record = blocking(&engine, move |engine| engine.get(&id)).await?;
    Ok(Json(record))
}

/// Handler for `GET /v1/transactions.json` - the whole batch, oldest first.
pub async fn list_transactions_handler(
    State(engine): State<GatewayEngine>,
) -> Result<Json<Vec<TransactionRecord>>, GatewayError> {
    let records = blocking(&engine, |engine| Ok(engine.list())).await?;
    Ok(Json(records))
}

/// Handler for `DELETE /v1/transactions.json` - flush the batch.
///
/// Always 204 with no body, whether or not anything was stored.
pub async fn flush_transactions_handler(
    State(engine): State<GatewayEngine>,
) -> Result<StatusCode, GatewayError> {
    blocking(&engine, |engine| Ok(engine.flush())).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fallback for paths outside the API
pub async fn not_found_handler(uri: Uri) -> GatewayError {
    GatewayError::route_not_found(uri.path())
}

/// Fallback for API paths requested with an unsupported method
pub async fn method_not_allowed_handler(method: Method, uri: Uri) -> GatewayError {
    let allowed: &[&str] = if uri.path() == COLLECTION_PATH {
        &["GET", "HEAD", "DELETE"]
    } else {
        &["GET", "HEAD", "POST"]
    };
    GatewayError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
        allowed: allowed.iter().map(|m| m.to_string()).collect(),
    }
}

/// Turn a failure of the timeout layer into a response
pub async fn timeout_error_handler(error: BoxError) -> GatewayError {
    if error.is::<tower::timeout::error::Elapsed>() {
        GatewayError::Timeout
    } else {
        GatewayError::internal(error.to_string())
    }
}

/// Log method, path and status of every request
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    info!("api: {} {} -> {}", method, path, response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("t1.json", Some("t1"))]
    #[case::uuid(
        "0b6c1c2e-7d3f-4a59-9f0e-2d7a1c3b4e5f.json",
        Some("0b6c1c2e-7d3f-4a59-9f0e-2d7a1c3b4e5f")
    )]
    #[case::no_suffix("t1", None)]
    #[case::empty_id(".json", None)]
    #[case::other_suffix("t1.xml", None)]
    fn test_transaction_id(#[case] file: &str, #[case] expected: Option<&str>) {
        match expected {
            Some(id) => assert_eq!(transaction_id(file).unwrap(), id),
            None => assert!(matches!(
                transaction_id(file),
                Err(GatewayError::RouteNotFound { .. })
            )),
        }
    }

    #[tokio::test]
    async fn test_error_response_is_json() {
        let response = GatewayError::not_found("abc").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Transaction abc not found"}));
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = GatewayError::MethodNotAllowed {
            method: "PUT".to_string(),
            path: COLLECTION_PATH.to_string(),
            allowed: vec!["GET".to_string(), "DELETE".to_string()],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, DELETE");
    }

    #[rstest]
    #[case::timeout(GatewayError::Timeout, StatusCode::SERVICE_UNAVAILABLE)]
    #[case::internal(GatewayError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case::too_large(GatewayError::PayloadTooLarge { limit: 1 }, StatusCode::PAYLOAD_TOO_LARGE)]
    fn test_error_status(#[case] error: GatewayError, #[case] expected: StatusCode) {
        assert_eq!(error.into_response().status(), expected);
    }
}
