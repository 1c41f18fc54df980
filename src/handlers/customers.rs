// src/handlers/customers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, meta::RequestMeta},
    models::auth::{JobScope, User, UserRole},
    models::customers::Customer,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    // Obrigatório para admin; ignorado para os demais papéis, que
    // sempre criam na própria empresa.
    pub business_id: Option<Uuid>,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "João Pereira")]
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    #[schema(value_type = Object)]
    pub address: Option<Value>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    #[schema(value_type = Object)]
    pub address: Option<Value>,
    pub notes: Option<String>,
}

fn resolve_business_id(user: &User, requested: Option<Uuid>) -> Result<Uuid, AppError> {
    match user.role {
        UserRole::Admin => requested.ok_or(AppError::Forbidden),
        _ => user.business_id.ok_or(AppError::Forbidden),
    }
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses((status = 201, description = "Cliente criado", body = Customer)),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let business_id = resolve_business_id(&user.0, payload.business_id)?;

    let customer = app_state
        .customer_repo
        .create(
            &app_state.db_pool,
            business_id,
            &payload.full_name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.mobile.as_deref(),
            payload.address.as_ref(),
            payload.notes.as_deref(),
        )
        .await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "customer.create",
        "customer",
        Some(customer.id.to_string()),
        None,
        &meta,
    );

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses((status = 200, description = "Clientes visíveis ao usuário", body = [Customer])),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let business_filter = match JobScope::for_user(&user.0)? {
        JobScope::Admin => None,
        JobScope::Business(id) | JobScope::Employee { business_id: id, .. } => Some(id),
    };

    let customers = app_state.customer_repo.list(business_filter).await?;
    Ok(Json(customers))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do Cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state
        .customer_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Cliente".to_string()))?;

    let scope = JobScope::for_user(&user.0)?;
    if !scope.can_access_business(customer.business_id) {
        return Err(AppError::Forbidden);
    }

    Ok(Json(customer))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do Cliente")),
    request_body = UpdateCustomerPayload,
    responses((status = 200, description = "Cliente atualizado", body = Customer)),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let existing = app_state
        .customer_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Cliente".to_string()))?;

    let scope = JobScope::for_user(&user.0)?;
    if !scope.can_access_business(existing.business_id) {
        return Err(AppError::Forbidden);
    }

    let customer = app_state
        .customer_repo
        .update(
            &app_state.db_pool,
            id,
            payload.full_name.as_deref(),
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.mobile.as_deref(),
            payload.address.as_ref(),
            payload.notes.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Cliente".to_string()))?;

    app_state.activity_service.log(
        Some(user.0.id),
        "customer.update",
        "customer",
        Some(id.to_string()),
        None,
        &meta,
    );

    Ok(Json(customer))
}

// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do Cliente")),
    responses((status = 204, description = "Cliente removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let existing = app_state
        .customer_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Cliente".to_string()))?;

    let scope = JobScope::for_user(&user.0)?;
    if !scope.can_access_business(existing.business_id) || user.0.role == UserRole::Employee {
        return Err(AppError::Forbidden);
    }

    app_state.customer_repo.delete(&app_state.db_pool, id).await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "customer.delete",
        "customer",
        Some(id.to_string()),
        None,
        &meta,
    );

    Ok(StatusCode::NO_CONTENT)
}
