// src/handlers/workflow.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
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
    middleware::{auth::AuthenticatedUser, meta::RequestMeta},
    models::auth::JobScope,
    models::finance::{DepositSummary, JobFinancials},
    models::jobs::{DepositMethod, Job},
    models::workflow::StepSubmission,
    services::{DocumentService, JobService},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordDepositPayload {
    pub method: DepositMethod,
    // Ausente = usa os 30% recomendados sobre o subtotal
    #[schema(example = "300.00")]
    pub amount: Option<Decimal>,
    pub customer_reference: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkipDepositPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Cliente vai pagar online na próxima semana")]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInstallationPayload {
    #[schema(value_type = String, format = Date, example = "2026-08-20")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "14:30:00")]
    pub time: Option<NaiveTime>,
}

// =============================================================================
//  DECISÃO DE DEPÓSITO
// =============================================================================

// GET /api/jobs/{id}/deposit
#[utoipa::path(
    get,
    path = "/api/jobs/{id}/deposit",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "ID do Job de medição")),
    responses((status = 200, description = "Subtotal e sinal recomendado", body = DepositSummary)),
    security(("api_jwt" = []))
)]
pub async fn deposit_summary(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let job = app_state.job_service.get_job_checked(id, scope).await?;
    Ok(Json(JobService::deposit_summary(&job)))
}

// POST /api/jobs/{id}/deposit
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/deposit",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "ID do Job de medição")),
    request_body = RecordDepositPayload,
    responses(
        (status = 200, description = "Depósito registrado; agendamento liberado", body = Job),
        (status = 422, description = "Valor fora da regra (zero ou acima do subtotal)")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_deposit(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordDepositPayload>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let job = app_state.job_service.get_job_checked(id, scope).await?;

    let updated = app_state
        .job_service
        .record_deposit(&job, payload.method, payload.amount, payload.customer_reference, &user.0)
        .await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "deposit.record",
        "job",
        Some(id.to_string()),
        Some(serde_json::json!({ "amount": updated.deposit })),
        &meta,
    );

    Ok(Json(updated))
}

// POST /api/jobs/{id}/deposit/skip
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/deposit/skip",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "ID do Job de medição")),
    request_body = SkipDepositPayload,
    responses(
        (status = 200, description = "Depósito adiado; job segue na fila de agendamento", body = Job),
        (status = 422, description = "Motivo em branco")
    ),
    security(("api_jwt" = []))
)]
pub async fn skip_deposit(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<SkipDepositPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let scope = JobScope::for_user(&user.0)?;
    let job = app_state.job_service.get_job_checked(id, scope).await?;

    let updated = app_state
        .job_service
        .skip_deposit(&job, &payload.reason, &user.0)
        .await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "deposit.skip",
        "job",
        Some(id.to_string()),
        None,
        &meta,
    );

    Ok(Json(updated))
}

// =============================================================================
//  AGENDAMENTO DA INSTALAÇÃO
// =============================================================================

// GET /api/jobs/pending-scheduling
#[utoipa::path(
    get,
    path = "/api/jobs/pending-scheduling",
    tag = "Workflow",
    responses((status = 200, description = "Medições aguardando agendamento de instalação", body = [Job])),
    security(("api_jwt" = []))
)]
pub async fn list_pending_scheduling(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let jobs = app_state.job_service.list_pending_scheduling(scope).await?;
    Ok(Json(jobs))
}

// POST /api/jobs/{id}/schedule-installation
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/schedule-installation",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "ID do Job de medição")),
    request_body = ScheduleInstallationPayload,
    responses(
        (status = 201, description = "Job de instalação criado; medição concluída", body = Job),
        (status = 422, description = "Data antes de hoje ou da medição")
    ),
    security(("api_jwt" = []))
)]
pub async fn schedule_installation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleInstallationPayload>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let measurement = app_state.job_service.get_job_checked(id, scope).await?;

    let installation = app_state
        .job_service
        .schedule_installation(&measurement, payload.date, payload.time, &user.0)
        .await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "installation.schedule",
        "job",
        Some(installation.id.to_string()),
        Some(serde_json::json!({ "parentJobId": id, "date": payload.date })),
        &meta,
    );

    Ok((StatusCode::CREATED, Json(installation)))
}

// =============================================================================
//  WORKFLOW DE INSTALAÇÃO
// =============================================================================

// GET /api/jobs/{id}/workflow/summary
// Resumo exibido na confirmação do pedido: cotação, sinal pago e saldo,
// derivados do pai quando o job de instalação veio vazio.
#[utoipa::path(
    get,
    path = "/api/jobs/{id}/workflow/summary",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "ID do Job de instalação")),
    responses((status = 200, description = "Linhas e totais derivados", body = JobFinancials)),
    security(("api_jwt" = []))
)]
pub async fn workflow_summary(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let job = app_state.job_service.get_job_checked(id, scope).await?;
    let summary = app_state.workflow_service.payment_summary(&job).await?;
    Ok(Json(summary))
}

// POST /api/jobs/{id}/workflow/step
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/workflow/step",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "ID do Job de instalação")),
    request_body = StepSubmission,
    responses(
        (status = 200, description = "Etapa aceita; acumulador persistido e job avançado", body = Job),
        (status = 422, description = "Gate da etapa violado ou submissão fora de ordem")
    ),
    security(("api_jwt" = []))
)]
pub async fn workflow_step(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(submission): Json<StepSubmission>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let job = app_state.job_service.get_job_checked(id, scope).await?;

    let step = submission.step();
    let updated = app_state.workflow_service.advance(job, submission, &user.0).await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "workflow.step",
        "job",
        Some(id.to_string()),
        Some(serde_json::json!({ "step": step })),
        &meta,
    );

    Ok(Json(updated))
}

// POST /api/jobs/{id}/workflow/finish
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/workflow/finish",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "ID do Job de instalação")),
    responses(
        (status = 200, description = "Instalação concluída", body = Job),
        (status = 422, description = "Workflow ainda não chegou na etapa final")
    ),
    security(("api_jwt" = []))
)]
pub async fn workflow_finish(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let job = app_state.job_service.get_job_checked(id, scope).await?;

    let updated = app_state.workflow_service.finish(job, &user.0).await?;

    app_state.activity_service.log(
        Some(user.0.id),
        "workflow.finish",
        "job",
        Some(id.to_string()),
        None,
        &meta,
    );

    Ok(Json(updated))
}

// GET /api/jobs/{id}/invoice.pdf
#[utoipa::path(
    get,
    path = "/api/jobs/{id}/invoice.pdf",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "ID do Job")),
    responses((status = 200, description = "Fatura em PDF", body = Vec<u8>, content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn invoice_pdf(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = JobScope::for_user(&user.0)?;
    let job = app_state.job_service.get_job_checked(id, scope).await?;

    let customer = app_state
        .customer_repo
        .find_by_id(job.customer_id)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Cliente".to_string()))?;
    let business = app_state
        .business_repo
        .find_by_id(job.business_id)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Empresa".to_string()))?;

    // As MESMAS linhas e totais da etapa invoice do workflow
    let financials = app_state.workflow_service.payment_summary(&job).await?;

    let pdf = DocumentService::generate_invoice_pdf(&job, &financials, &customer.full_name, &business)?;

    Ok((
        [(header::CONTENT_TYPE, "application/pdf")],
        pdf,
    ))
}
