use actix_web::{web, HttpResponse};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};
use crate::services::auth_service;
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Missing fields or email already in use")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let email_str = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /api/auth/register - email: {}", email_str);

    match auth_service::register(state.users.as_ref(), &state.auth, &request).await {
        Ok(response) => Ok(HttpResponse::Created().json(response)),
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", email_str, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let email_str = request.email.as_deref().unwrap_or("N/A");
    log::info!("🔐 POST /api/auth/login - email: {}", email_str);

    match auth_service::login(state.users.as_ref(), &state.auth, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", email_str);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", email_str, e);
            Err(e)
        }
    }
}
