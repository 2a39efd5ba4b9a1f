use crate::domain::user::{LoginRequest, RegisterRequest};
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{info, instrument};

pub const REGISTERED_MESSAGE: &str = "User created successfully.";
pub const LOGIN_MESSAGE: &str = "Login Successful";

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub username: String,
}

#[instrument(skip_all)]
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Registration request received");

    let user = state.auth_service.register_user(req.into_inner()).await?;

    info!(user_id = %user.id, "New user registered");
    Ok(HttpResponse::Ok().json(RegisterResponse {
        message: REGISTERED_MESSAGE,
    }))
}

#[instrument(skip_all)]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let username = state.auth_service.login(req.into_inner()).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: LOGIN_MESSAGE,
        username,
    }))
}
