//! Error-to-response mapping.
//!
//! Error bodies are short plain-text strings. Store and internal detail is
//! logged, never sent to the client.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};
use atlas_content_database::DbError;
use atlas_content_spatial::{MAX_BATCH_POINTS, SpatialError};

/// Handler-level errors, each mapped to one HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Not implemented")]
    NotImplemented,

    #[error("No coastline data available")]
    NoCoastData,

    #[error("{0}")]
    Internal(&'static str),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::NoCoastData | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        log::error!("Store error: {e}");
        Self::Internal("Failed to query content store")
    }
}

impl From<SpatialError> for ApiError {
    fn from(e: SpatialError) -> Self {
        match e {
            SpatialError::InvalidCoordinates { lat, lon } => {
                Self::BadRequest(format!("Invalid coordinates: lat={lat}, lon={lon}"))
            }
            SpatialError::BatchTooLarge { len } => Self::BadRequest(format!(
                "Batch of {len} points exceeds the {MAX_BATCH_POINTS}-point limit"
            )),
            SpatialError::NoCoastData => Self::NoCoastData,
            SpatialError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("Country not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::NotImplemented.status_code(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            ApiError::NoCoastData.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn spatial_errors_map_to_requests() {
        let invalid: ApiError = SpatialError::InvalidCoordinates { lat: 91.0, lon: 0.0 }.into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let oversized: ApiError = SpatialError::BatchTooLarge { len: 1001 }.into();
        assert_eq!(oversized.status_code(), StatusCode::BAD_REQUEST);
        assert!(oversized.to_string().contains("1001"));
    }
}
