//! Responses produced by the pipeline when no hook answers.

use crate::handler::FezzError;
use crate::http::{FezzResponse, StatusCode};

/// Body of the default not-found response.
pub const NOT_FOUND_BODY: &str = "404 - Resource not found";

/// Default response when no handler answered and the not-found hook declined.
pub fn not_found() -> FezzResponse {
    FezzResponse::plain(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// Default response when dispatch failed and the error hook declined.
pub fn server_error(error: &FezzError) -> FezzResponse {
    FezzResponse::plain(StatusCode::INTERNAL_SERVER_ERROR, format!("500 - {}", error))
}
