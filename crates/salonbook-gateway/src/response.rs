// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response envelope and error mapping shared by every route.
//!
//! Every JSON body is `{success, message?, data?, count?}`; errors keep the
//! same shape with `success: false`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use salonbook_core::BookingError;
use serde::Serialize;

/// JSON body returned by the REST API.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            count: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// List body carrying the item count.
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            count: Some(count),
            ..Self::data(items)
        }
    }
}

impl Envelope<()> {
    pub fn message(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: Some(message.into()),
            data: None,
            count: None,
        }
    }
}

pub type ApiResult = Result<Response, ApiError>;

pub fn ok<T: Serialize>(body: Envelope<T>) -> ApiResult {
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub fn created<T: Serialize>(body: Envelope<T>) -> ApiResult {
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Failure of a request handler.
#[derive(Debug)]
pub enum ApiError {
    Booking(BookingError),
    /// The request could not be parsed (body, path, or query string).
    BadRequest(String),
    /// A collaborator the route needs is not configured.
    Unavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Booking(BookingError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Booking(BookingError::Conflict { .. }) => StatusCode::CONFLICT,
            ApiError::Booking(BookingError::Validation(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Booking(BookingError::Voice { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Booking(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Booking(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::Unavailable(msg) => msg.clone(),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        } else {
            tracing::debug!(%status, error = %message, "request rejected");
        }
        (status, Json(Envelope::message(false, message))).into_response()
    }
}
