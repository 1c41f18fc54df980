// src/db/job_repo.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::JobScope,
    models::jobs::{
        ChecklistItem, DepositMethod, Job, JobHistoryEntry, JobMeasurement, JobStatus, JobType,
        SelectedProduct,
    },
    models::workflow::{InstallationState, InstallationStep},
};

// Dados de criação de um job. Os campos JSONB já chegam montados:
// o repositório não interpreta medições nem produtos.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub parent_job_id: Option<Uuid>,
    pub job_type: JobType,
    pub status: JobStatus,
    pub title: String,
    pub notes: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub quotation: Decimal,
    pub deposit: Decimal,
    pub deposit_paid: bool,
    pub deposit_payment_method: Option<DepositMethod>,
    pub deposit_customer_reference: Option<String>,
    pub measurements: Vec<JobMeasurement>,
    pub selected_products: Vec<SelectedProduct>,
    pub checklist: Vec<ChecklistItem>,
    pub images: Vec<String>,
    pub documents: Vec<String>,
    pub workflow_step: Option<InstallationStep>,
    pub installation_state: Option<InstallationState>,
}

// Atualização parcial vinda do PUT de CRUD
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub status: Option<JobStatus>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub quotation: Option<Decimal>,
    pub measurements: Option<Vec<JobMeasurement>>,
    pub selected_products: Option<Vec<SelectedProduct>>,
    pub checklist: Option<Vec<ChecklistItem>>,
    pub images: Option<Vec<String>>,
    pub documents: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    pub async fn create<'e, E>(&self, executor: E, new_job: NewJob) -> Result<Job, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (
                business_id, customer_id, employee_id, parent_job_id,
                job_type, status, title, notes, scheduled_date, scheduled_time,
                quotation, deposit, deposit_paid, deposit_payment_method,
                deposit_customer_reference,
                measurements, selected_products, checklist, images, documents,
                workflow_step, installation_state
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )
            RETURNING *
            "#,
        )
            .bind(new_job.business_id)
            .bind(new_job.customer_id)
            .bind(new_job.employee_id)
            .bind(new_job.parent_job_id)
            .bind(new_job.job_type)
            .bind(new_job.status)
            .bind(&new_job.title)
            .bind(&new_job.notes)
            .bind(new_job.scheduled_date)
            .bind(new_job.scheduled_time)
            .bind(new_job.quotation)
            .bind(new_job.deposit)
            .bind(new_job.deposit_paid)
            .bind(new_job.deposit_payment_method)
            .bind(&new_job.deposit_customer_reference)
            .bind(Json(&new_job.measurements))
            .bind(Json(&new_job.selected_products))
            .bind(Json(&new_job.checklist))
            .bind(Json(&new_job.images))
            .bind(Json(&new_job.documents))
            .bind(new_job.workflow_step)
            .bind(new_job.installation_state.as_ref().map(Json))
            .fetch_one(executor)
            .await?;

        Ok(job)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        let maybe = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    // Listagem com recorte por papel:
    // admin -> tudo; business -> a própria empresa;
    // employee -> a empresa dele OU jobs atribuídos a ele.
    pub async fn list(&self, scope: JobScope) -> Result<Vec<Job>, AppError> {
        let jobs = match scope {
            JobScope::Admin => {
                sqlx::query_as::<_, Job>("SELECT * FROM jobs ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
            JobScope::Business(business_id) => {
                sqlx::query_as::<_, Job>(
                    "SELECT * FROM jobs WHERE business_id = $1 ORDER BY created_at DESC",
                )
                    .bind(business_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            JobScope::Employee { business_id, employee_id } => {
                sqlx::query_as::<_, Job>(
                    r#"
                    SELECT * FROM jobs
                    WHERE business_id = $1 OR employee_id = $2
                    ORDER BY created_at DESC
                    "#,
                )
                    .bind(business_id)
                    .bind(employee_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(jobs)
    }

    // Jobs pendentes sem responsável, para a tela de atribuição
    pub async fn list_unassigned(&self, business_id: Uuid) -> Result<Vec<Job>, AppError> {
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobs
            WHERE business_id = $1 AND employee_id IS NULL AND status = 'PENDING'
            ORDER BY created_at ASC
            "#,
        )
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    // Fila de "aguardando agendamento de instalação".
    // O filtro é needs_installation_scheduling sozinho: o caminho de
    // depósito pago e o de depósito adiado marcam a mesma flag, então
    // jobs adiados continuam visíveis na fila.
    pub async fn list_pending_scheduling(
        &self,
        business_id: Option<Uuid>,
    ) -> Result<Vec<Job>, AppError> {
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobs
            WHERE needs_installation_scheduling
              AND job_type = 'MEASUREMENT'
              AND ($1::uuid IS NULL OR business_id = $1)
            ORDER BY scheduled_date ASC NULLS LAST
            "#,
        )
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        update: JobUpdate,
    ) -> Result<Option<Job>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET
                title             = COALESCE($2, title),
                notes             = COALESCE($3, notes),
                status            = COALESCE($4, status),
                scheduled_date    = COALESCE($5, scheduled_date),
                scheduled_time    = COALESCE($6, scheduled_time),
                quotation         = COALESCE($7, quotation),
                measurements      = COALESCE($8, measurements),
                selected_products = COALESCE($9, selected_products),
                checklist         = COALESCE($10, checklist),
                images            = COALESCE($11, images),
                documents         = COALESCE($12, documents),
                updated_at        = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(&update.title)
            .bind(&update.notes)
            .bind(update.status)
            .bind(update.scheduled_date)
            .bind(update.scheduled_time)
            .bind(update.quotation)
            .bind(update.measurements.as_ref().map(Json))
            .bind(update.selected_products.as_ref().map(Json))
            .bind(update.checklist.as_ref().map(Json))
            .bind(update.images.as_ref().map(Json))
            .bind(update.documents.as_ref().map(Json))
            .fetch_optional(executor)
            .await?;

        Ok(updated)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  ATRIBUIÇÃO
    // =========================================================================

    // O predicado employee_id IS NULL evita atribuir por cima de outra
    // atribuição concorrente: a segunda UPDATE não encontra linha.
    pub async fn assign<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        employee_id: Uuid,
    ) -> Result<Option<Job>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET employee_id = $2, status = 'CONFIRMED', updated_at = NOW()
            WHERE id = $1 AND employee_id IS NULL
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(employee_id)
            .fetch_optional(executor)
            .await?;

        Ok(updated)
    }

    // =========================================================================
    //  DEPÓSITO E AGENDAMENTO
    // =========================================================================

    pub async fn record_deposit<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        amount: Decimal,
        method: DepositMethod,
        customer_reference: Option<&str>,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Job>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET
                deposit = $2,
                deposit_paid = TRUE,
                deposit_paid_at = $3,
                deposit_payment_method = $4,
                deposit_customer_reference = $5,
                deposit_payment_skipped = FALSE,
                deposit_skip_reason = NULL,
                needs_installation_scheduling = TRUE,
                status = 'CONFIRMED',
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(amount)
            .bind(paid_at)
            .bind(method)
            .bind(customer_reference)
            .fetch_optional(executor)
            .await?;

        Ok(updated)
    }

    pub async fn mark_deposit_skipped<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        reason: &str,
    ) -> Result<Option<Job>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET
                deposit_payment_skipped = TRUE,
                deposit_skip_reason = $2,
                needs_installation_scheduling = TRUE,
                status = 'AWAITING_DEPOSIT',
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(reason)
            .fetch_optional(executor)
            .await?;

        Ok(updated)
    }

    // Fecha o job de medição depois que a instalação foi agendada
    pub async fn finish_measurement<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE jobs SET
                needs_installation_scheduling = FALSE,
                status = 'COMPLETED',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    // =========================================================================
    //  WORKFLOW DE INSTALAÇÃO
    // =========================================================================

    // Avanço com compare-and-swap na etapa atual: se outra submissão
    // avançou primeiro, o WHERE não casa e devolvemos None.
    pub async fn advance_workflow<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        expected_step: InstallationStep,
        next_step: InstallationStep,
        state: &InstallationState,
        status: JobStatus,
        invoice_total: Option<Decimal>,
    ) -> Result<Option<Job>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET
                workflow_step = $3,
                installation_state = $4,
                status = $5,
                invoice_total = COALESCE($6, invoice_total),
                updated_at = NOW()
            WHERE id = $1 AND workflow_step = $2
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(expected_step)
            .bind(next_step)
            .bind(Json(state))
            .bind(status)
            .bind(invoice_total)
            .fetch_optional(executor)
            .await?;

        Ok(updated)
    }

    // =========================================================================
    //  HISTÓRICO (append-only)
    // =========================================================================

    // Só INSERT, nunca read-modify-write: duas gravações concorrentes
    // viram duas linhas, sem uma engolir a outra.
    pub async fn append_history<'e, E>(
        &self,
        executor: E,
        job_id: Uuid,
        action: &str,
        description: &str,
        user_id: Option<Uuid>,
        user_name: &str,
        data: Option<Value>,
    ) -> Result<JobHistoryEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, JobHistoryEntry>(
            r#"
            INSERT INTO job_history (job_id, action, description, user_id, user_name, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(job_id)
            .bind(action)
            .bind(description)
            .bind(user_id)
            .bind(user_name)
            .bind(data)
            .fetch_one(executor)
            .await?;

        Ok(entry)
    }

    pub async fn list_history(&self, job_id: Uuid) -> Result<Vec<JobHistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, JobHistoryEntry>(
            "SELECT * FROM job_history WHERE job_id = $1 ORDER BY id ASC",
        )
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }
}
