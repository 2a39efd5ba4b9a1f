use crate::application::auth_service::AuthService;
use crate::domain::error::{AuthError, ErrorKind};
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, instrument, trace, warn};

pub const LANDING_PAGE: &str =
    "<h1 style='text-align: center;'>Welcome to the backend and Week 2</h1>";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

// AppState holding the service
pub struct AppState {
    pub auth_service: AuthService,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    message: &'a str,
}

/// HTTP status for each error kind. Authentication failures are 400, not 401,
/// so they look like every other rejected request body.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] AuthError);

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(self.kind())
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Infrastructure details stay in the log.
        let message = match &self.0 {
            AuthError::Infrastructure(e) => {
                error!(error = %e, status = %status, "Internal error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => {
                warn!(error = %other, status = %status, "Request rejected");
                other.to_string()
            }
        };

        HttpResponse::build(status).json(ErrorResponse { message: &message })
    }
}

// Handlers

#[instrument]
pub async fn landing() -> HttpResponse {
    trace!("Landing page requested");
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(LANDING_PAGE)
}
