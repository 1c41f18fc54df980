// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, meta::RequestMeta},
    models::auth::{AuthResponse, LoginUserPayload, RegisterUserPayload, User, UserRole},
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Usuário autenticado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (user, token) = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    app_state.activity_service.log(
        Some(user.id),
        "auth.login",
        "user",
        Some(user.id.to_string()),
        None,
        &meta,
    );

    Ok(Json(AuthResponse { user, token }))
}

// POST /api/auth/register (somente admin cria contas)
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 403, description = "Apenas administradores criam contas"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn register(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    if user.0.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }
    payload.validate()?;

    let (new_user, _token) = app_state
        .auth_service
        .register_user(
            &payload.email,
            &payload.password,
            &payload.name,
            payload.role,
            payload.business_id,
        )
        .await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "auth.register",
        "user",
        Some(new_user.id.to_string()),
        Some(json!({ "role": new_user.role })),
        &meta,
    );

    Ok((StatusCode::CREATED, Json(new_user)))
}

// POST /api/auth/logout
// O token é stateless: o logout só registra a atividade; o cliente
// descarta o token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Sessão encerrada")),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
) -> Result<impl IntoResponse, AppError> {
    app_state.activity_service.log(
        Some(user.0.id),
        "auth.logout",
        "user",
        Some(user.0.id.to_string()),
        None,
        &meta,
    );

    Ok(Json(json!({ "message": "Sessão encerrada." })))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Usuário autenticado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_me(user: AuthenticatedUser) -> Result<impl IntoResponse, AppError> {
    Ok(Json(user.0))
}
