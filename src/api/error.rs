//! HTTP error bridge.
//!
//! Maps the core taxonomy onto status codes and a stable `{ error, code }`
//! JSON body. Handlers return `Result<_, ApiError>` and rely on the `From`
//! impl, so a `?` on any core call produces the right response.

use crate::error::TicketingError;
use crate::payment_gateway::PaymentGatewayError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Application error for HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

/// JSON body rendered for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ApiError {
    /// Creates an error with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// The mapped status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<TicketingError> for ApiError {
    fn from(err: TicketingError) -> Self {
        let status = match &err {
            TicketingError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TicketingError::RouteNotFound { .. } | TicketingError::TicketNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            TicketingError::Encoding { .. } | TicketingError::Persistence { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            TicketingError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TicketingError::Gateway(gateway) => match gateway {
                PaymentGatewayError::Declined { .. } => StatusCode::PAYMENT_REQUIRED,
                PaymentGatewayError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
                PaymentGatewayError::Other { .. } => StatusCode::BAD_GATEWAY,
            },
        };
        let code = match &err {
            TicketingError::Validation { .. } => "VALIDATION_ERROR",
            TicketingError::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            TicketingError::TicketNotFound { .. } => "TICKET_NOT_FOUND",
            TicketingError::Encoding { .. } => "ENCODING_ERROR",
            TicketingError::Persistence { .. } => "PERSISTENCE_ERROR",
            TicketingError::Unavailable { .. } => "STORE_UNAVAILABLE",
            TicketingError::Gateway(_) => "PAYMENT_FAILED",
        };
        Self::new(status, err.to_string(), code)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, "{}", self.message);
        } else {
            tracing::debug!(status = %self.status, code = self.code, "{}", self.message);
        }
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
                code: self.code,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RouteId, TicketId};

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        let cases = [
            (
                TicketingError::validation("bad quantity"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                TicketingError::RouteNotFound {
                    id: RouteId::new(9999),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                TicketingError::TicketNotFound {
                    id: TicketId::new(1),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                TicketingError::Encoding {
                    reason: "qr".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                TicketingError::Persistence {
                    reason: "tx".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                TicketingError::Unavailable {
                    reason: "pool".to_string(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                TicketingError::Gateway(PaymentGatewayError::Declined {
                    reason: "issuer".to_string(),
                }),
                StatusCode::PAYMENT_REQUIRED,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
