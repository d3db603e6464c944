//! Route table for the v1 API

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;

use super::config::MAX_BODY_BYTES;
use super::handlers::{
    create_transaction_handler, flush_transactions_handler, get_transaction_handler,
    list_transactions_handler, log_request, method_not_allowed_handler, not_found_handler,
    timeout_error_handler, COLLECTION_PATH, MEMBER_PATH,
};
use crate::core::GatewayEngine;

/// Create the API router
///
/// Requests not answered within `request_timeout` get 503. Bodies larger than
/// [`MAX_BODY_BYTES`] get 413.
pub fn create_router(engine: GatewayEngine, request_timeout: Duration) -> Router {
    Router::new()
        .route(
            COLLECTION_PATH,
            get(list_transactions_handler).delete(flush_transactions_handler),
        )
        .route(
            MEMBER_PATH,
            get(get_transaction_handler).post(create_transaction_handler),
        )
        .fallback(not_found_handler)
        .method_not_allowed_fallback(method_not_allowed_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(timeout_error_handler))
                .timeout(request_timeout),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(engine)
}
