// src/handlers/businesses.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, meta::RequestMeta},
    models::auth::{JobScope, UserRole},
    models::business::Business,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Persianas Aurora Ltda")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub pix_key: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusinessPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub pix_key: Option<String>,
    pub address: Option<String>,
}

// POST /api/businesses
#[utoipa::path(
    post,
    path = "/api/businesses",
    tag = "Businesses",
    request_body = CreateBusinessPayload,
    responses((status = 201, description = "Empresa criada", body = Business)),
    security(("api_jwt" = []))
)]
pub async fn create_business(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Json(payload): Json<CreateBusinessPayload>,
) -> Result<impl IntoResponse, AppError> {
    if user.0.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }
    payload.validate()?;

    let business = app_state
        .business_repo
        .create(
            &app_state.db_pool,
            &payload.name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.pix_key.as_deref(),
            payload.address.as_deref(),
        )
        .await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "business.create",
        "business",
        Some(business.id.to_string()),
        None,
        &meta,
    );

    Ok((StatusCode::CREATED, Json(business)))
}

// GET /api/businesses
#[utoipa::path(
    get,
    path = "/api/businesses",
    tag = "Businesses",
    responses((status = 200, description = "Empresas visíveis ao usuário", body = [Business])),
    security(("api_jwt" = []))
)]
pub async fn list_businesses(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    // Admin vê todas; os demais papéis veem só a própria empresa
    let businesses = match JobScope::for_user(&user.0)? {
        JobScope::Admin => app_state.business_repo.list_all().await?,
        JobScope::Business(id) | JobScope::Employee { business_id: id, .. } => {
            match app_state.business_repo.find_by_id(id).await? {
                Some(b) => vec![b],
                None => vec![],
            }
        }
    };

    Ok(Json(businesses))
}

// GET /api/businesses/{id}
#[utoipa::path(
    get,
    path = "/api/businesses/{id}",
    tag = "Businesses",
    params(("id" = Uuid, Path, description = "ID da Empresa")),
    responses(
        (status = 200, description = "Empresa", body = Business),
        (status = 404, description = "Empresa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_business(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    if !scope.can_access_business(id) {
        return Err(AppError::Forbidden);
    }

    let business = app_state
        .business_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Empresa".to_string()))?;

    Ok(Json(business))
}

// PUT /api/businesses/{id}
#[utoipa::path(
    put,
    path = "/api/businesses/{id}",
    tag = "Businesses",
    params(("id" = Uuid, Path, description = "ID da Empresa")),
    request_body = UpdateBusinessPayload,
    responses((status = 200, description = "Empresa atualizada", body = Business)),
    security(("api_jwt" = []))
)]
pub async fn update_business(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBusinessPayload>,
) -> Result<impl IntoResponse, AppError> {
    // Admin edita qualquer empresa; o papel business edita a própria
    let allowed = user.0.role == UserRole::Admin
        || (user.0.role == UserRole::Business && user.0.business_id == Some(id));
    if !allowed {
        return Err(AppError::Forbidden);
    }

    let business = app_state
        .business_repo
        .update(
            &app_state.db_pool,
            id,
            payload.name.as_deref(),
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.pix_key.as_deref(),
            payload.address.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Empresa".to_string()))?;

    app_state.activity_service.log(
        Some(user.0.id),
        "business.update",
        "business",
        Some(id.to_string()),
        None,
        &meta,
    );

    Ok(Json(business))
}

// DELETE /api/businesses/{id}
#[utoipa::path(
    delete,
    path = "/api/businesses/{id}",
    tag = "Businesses",
    params(("id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 204, description = "Empresa removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_business(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if user.0.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }

    let deleted = app_state.business_repo.delete(&app_state.db_pool, id).await?;
    if deleted == 0 {
        return Err(AppError::ResourceNotFound("Empresa".to_string()));
    }

    app_state.activity_service.log(
        Some(user.0.id),
        "business.delete",
        "business",
        Some(id.to_string()),
        None,
        &meta,
    );

    Ok(StatusCode::NO_CONTENT)
}
