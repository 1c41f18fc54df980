// src/handlers/jobs.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::job_repo::{JobUpdate, NewJob},
    middleware::{auth::AuthenticatedUser, meta::RequestMeta},
    models::auth::{JobScope, User, UserRole},
    models::jobs::{
        default_installation_checklist, ChecklistItem, Job, JobHistoryEntry, JobMeasurement,
        JobStatus, JobType, SelectedProduct,
    },
    models::workflow::{InstallationState, InstallationStep},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobPayload {
    // Obrigatório para admin; os demais papéis criam na própria empresa
    pub business_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub job_type: JobType,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Medição - Apto 72, Rua das Acácias")]
    pub title: String,
    pub notes: Option<String>,
    #[schema(value_type = String, format = Date)]
    pub scheduled_date: Option<NaiveDate>,
    #[schema(value_type = String)]
    pub scheduled_time: Option<NaiveTime>,
    #[schema(example = "1000.00")]
    pub quotation: Option<Decimal>,
    #[serde(default)]
    pub measurements: Vec<JobMeasurement>,
    #[serde(default)]
    pub selected_products: Vec<SelectedProduct>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobPayload {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub status: Option<JobStatus>,
    #[schema(value_type = String, format = Date)]
    pub scheduled_date: Option<NaiveDate>,
    #[schema(value_type = String)]
    pub scheduled_time: Option<NaiveTime>,
    pub quotation: Option<Decimal>,
    pub measurements: Option<Vec<JobMeasurement>>,
    pub selected_products: Option<Vec<SelectedProduct>>,
    pub checklist: Option<Vec<ChecklistItem>>,
    pub images: Option<Vec<String>>,
    pub documents: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignJobPayload {
    pub employee_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedParams {
    pub business_id: Option<Uuid>,
}

fn resolve_business_id(user: &User, requested: Option<Uuid>) -> Result<Uuid, AppError> {
    match user.role {
        UserRole::Admin => requested.ok_or(AppError::Forbidden),
        _ => user.business_id.ok_or(AppError::Forbidden),
    }
}

// =============================================================================
//  CRUD
// =============================================================================

// POST /api/jobs
#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "Jobs",
    request_body = CreateJobPayload,
    responses((status = 201, description = "Job criado", body = Job)),
    security(("api_jwt" = []))
)]
pub async fn create_job(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let business_id = resolve_business_id(&user.0, payload.business_id)?;

    // Job de instalação criado à mão já nasce com o workflow armado
    let is_installation = payload.job_type == JobType::Installation;

    let new_job = NewJob {
        business_id,
        customer_id: payload.customer_id,
        employee_id: payload.employee_id,
        parent_job_id: None,
        job_type: payload.job_type,
        status: JobStatus::Pending,
        title: payload.title,
        notes: payload.notes,
        scheduled_date: payload.scheduled_date,
        scheduled_time: payload.scheduled_time,
        quotation: payload.quotation.unwrap_or(Decimal::ZERO),
        deposit: Decimal::ZERO,
        deposit_paid: false,
        deposit_payment_method: None,
        deposit_customer_reference: None,
        measurements: payload.measurements,
        selected_products: payload.selected_products,
        checklist: if is_installation { default_installation_checklist() } else { vec![] },
        images: payload.images,
        documents: payload.documents,
        workflow_step: if is_installation { Some(InstallationStep::ConfirmOrder) } else { None },
        installation_state: if is_installation { Some(InstallationState::default()) } else { None },
    };

    let job = app_state.job_service.create_job(new_job, &user.0).await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "job.create",
        "job",
        Some(job.id.to_string()),
        None,
        &meta,
    );

    Ok((StatusCode::CREATED, Json(job)))
}

// GET /api/jobs
#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "Jobs",
    responses((status = 200, description = "Jobs visíveis ao papel do usuário", body = [Job])),
    security(("api_jwt" = []))
)]
pub async fn list_jobs(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let jobs = app_state.job_service.list(scope).await?;
    Ok(Json(jobs))
}

// GET /api/jobs/{id}
#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "ID do Job")),
    responses(
        (status = 200, description = "Job", body = Job),
        (status = 404, description = "Job não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_job(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let job = app_state.job_service.get_job_checked(id, scope).await?;
    Ok(Json(job))
}

// PUT /api/jobs/{id}
#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "ID do Job")),
    request_body = UpdateJobPayload,
    responses((status = 200, description = "Job atualizado", body = Job)),
    security(("api_jwt" = []))
)]
pub async fn update_job(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    app_state.job_service.get_job_checked(id, scope).await?;

    let update = JobUpdate {
        title: payload.title,
        notes: payload.notes,
        status: payload.status,
        scheduled_date: payload.scheduled_date,
        scheduled_time: payload.scheduled_time,
        quotation: payload.quotation,
        measurements: payload.measurements,
        selected_products: payload.selected_products,
        checklist: payload.checklist,
        images: payload.images,
        documents: payload.documents,
    };

    let job = app_state.job_service.update_job(id, update, &user.0).await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "job.update",
        "job",
        Some(id.to_string()),
        None,
        &meta,
    );

    Ok(Json(job))
}

// DELETE /api/jobs/{id}
#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "ID do Job")),
    responses((status = 204, description = "Job removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_job(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if user.0.role == UserRole::Employee {
        return Err(AppError::Forbidden);
    }
    let scope = JobScope::for_user(&user.0)?;
    app_state.job_service.get_job_checked(id, scope).await?;

    app_state.job_service.delete_job(id).await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "job.delete",
        "job",
        Some(id.to_string()),
        None,
        &meta,
    );

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/jobs/{id}/history
#[utoipa::path(
    get,
    path = "/api/jobs/{id}/history",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "ID do Job")),
    responses((status = 200, description = "Trilha de auditoria do job", body = [JobHistoryEntry])),
    security(("api_jwt" = []))
)]
pub async fn job_history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    app_state.job_service.get_job_checked(id, scope).await?;

    let history = app_state.job_service.history(id).await?;
    Ok(Json(history))
}

// =============================================================================
//  ATRIBUIÇÃO
// =============================================================================

// GET /api/jobs/unassigned
#[utoipa::path(
    get,
    path = "/api/jobs/unassigned",
    tag = "Jobs",
    params(("businessId" = Option<Uuid>, Query, description = "Empresa (apenas admin)")),
    responses((status = 200, description = "Jobs pendentes sem responsável", body = [Job])),
    security(("api_jwt" = []))
)]
pub async fn list_unassigned(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<UnassignedParams>,
) -> Result<impl IntoResponse, AppError> {
    let business_id = resolve_business_id(&user.0, params.business_id)?;
    let jobs = app_state.job_service.list_unassigned(business_id).await?;
    Ok(Json(jobs))
}

// POST /api/jobs/{id}/assign
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/assign",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "ID do Job")),
    request_body = AssignJobPayload,
    responses(
        (status = 200, description = "Job atribuído (status confirmado)", body = Job),
        (status = 409, description = "Job já possui responsável")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_job(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignJobPayload>,
) -> Result<impl IntoResponse, AppError> {
    if user.0.role == UserRole::Employee {
        return Err(AppError::Forbidden);
    }
    let scope = JobScope::for_user(&user.0)?;
    let job = app_state.job_service.get_job_checked(id, scope).await?;

    // O responsável precisa existir e pertencer à mesma empresa do job
    let employee = app_state
        .user_repo
        .find_by_id(payload.employee_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    if employee.business_id != Some(job.business_id) {
        return Err(AppError::Forbidden);
    }

    let assigned = app_state.job_service.assign_job(&job, &employee, &user.0).await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "job.assign",
        "job",
        Some(id.to_string()),
        Some(serde_json::json!({ "employeeId": employee.id })),
        &meta,
    );

    Ok(Json(assigned))
}
