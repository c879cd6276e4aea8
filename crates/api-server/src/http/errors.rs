use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::agent_directory::AgentDirectoryError;
use shared::models::ErrorResponse;
use tracing::{error, warn};

pub(super) fn bad_request_response(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

/// A body that is not JSON, or not sent as JSON, keeps the rejection's
/// status but answers with the usual error shape.
pub(super) fn invalid_body_response(rejection: &JsonRejection) -> Response {
    warn!(status = %rejection.status(), "rejected request body: {rejection}");
    (
        rejection.status(),
        Json(ErrorResponse::new("Invalid request body").with_details(rejection.body_text())),
    )
        .into_response()
}

pub(super) fn not_found_response(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message))).into_response()
}

pub(super) fn directory_error_response(message: &str, err: &AgentDirectoryError) -> Response {
    error!(upstream_status = ?err.status(), "{message}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message).with_details(err.to_string())),
    )
        .into_response()
}

/// Like [`directory_error_response`], with the error's cause chain attached.
pub(super) fn directory_error_with_stack_response(
    message: &str,
    err: &AgentDirectoryError,
) -> Response {
    error!(upstream_status = ?err.status(), "{message}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(
            ErrorResponse::new(message)
                .with_details(err.to_string())
                .with_stack(err.source_chain()),
        ),
    )
        .into_response()
}
