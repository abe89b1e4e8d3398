use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Request-recoverable error taxonomy. Every variant renders a structured
/// JSON body; nothing here is fatal to the process.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// Duplicate clock-in/out, duplicate employee code/email, duplicate
    /// outlet name. Answered with 400, matching the original wire contract.
    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// Geofence violation. Carries the measured distance so the kiosk can
    /// show the operator how far off they are.
    #[display(fmt = "You are {}m away from {}. Maximum allowed: {}m.", distance, outlet, radius)]
    OutOfRange {
        distance: i64,
        outlet: String,
        radius: i64,
    },

    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::OutOfRange { .. } => StatusCode::FORBIDDEN,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::OutOfRange {
                distance,
                outlet,
                radius,
            } => json!({
                "error": self.to_string(),
                "distance": distance,
                "outlet": outlet,
                "radius": radius,
            }),
            other => json!({ "error": other.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "database error");
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_carries_measurements() {
        let err = ApiError::OutOfRange {
            distance: 150,
            outlet: "Outlet Kemang".into(),
            radius: 100,
        };
        assert_eq!(
            err.to_string(),
            "You are 150m away from Outlet Kemang. Maximum allowed: 100m."
        );
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn conflict_is_a_bad_request() {
        let err = ApiError::Conflict("Already clocked in today".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
