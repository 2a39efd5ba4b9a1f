use crate::domain::error::AuthError;
use crate::domain::user::{LOGIN_FIELDS_REQUIRED, REGISTER_FIELDS_REQUIRED};
use crate::presentation::auth::{login, register};
use crate::presentation::handlers::{ApiError, landing};
use actix_web::web;
use tracing::warn;

/// Route table shared by the binary and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(landing))
        .service(
            web::resource("/register")
                .app_data(body_config(REGISTER_FIELDS_REQUIRED))
                .route(web::post().to(register)),
        )
        .service(
            web::resource("/login")
                .app_data(body_config(LOGIN_FIELDS_REQUIRED))
                .route(web::post().to(login)),
        );
}

// An unreadable body means no field was supplied.
fn body_config(message: &'static str) -> web::JsonConfig {
    web::JsonConfig::default().error_handler(move |err, req| {
        warn!(path = %req.path(), error = %err, "Unreadable request body");
        ApiError::from(AuthError::Validation(message)).into()
    })
}
