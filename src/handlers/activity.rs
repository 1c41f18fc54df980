// src/handlers/activity.rs

use axum::{extract::{Query, State}, response::IntoResponse, Json};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::activity::ActivityLog,
    models::auth::UserRole,
};

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
    pub limit: Option<i64>,
}

// GET /api/activity (somente admin)
#[utoipa::path(
    get,
    path = "/api/activity",
    tag = "Activity",
    params(("limit" = Option<i64>, Query, description = "Máximo de linhas (padrão 100)")),
    responses((status = 200, description = "Atividade recente da API", body = [ActivityLog])),
    security(("api_jwt" = []))
)]
pub async fn list_activity(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ActivityParams>,
) -> Result<impl IntoResponse, AppError> {
    if user.0.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }

    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let logs = app_state.activity_service.list_recent(limit).await?;
    Ok(Json(logs))
}
