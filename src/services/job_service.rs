// src/services/job_service.rs

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::job_repo::{JobRepository, JobUpdate, NewJob},
    models::auth::{JobScope, User},
    models::finance::DepositSummary,
    models::jobs::{
        default_installation_checklist, DepositMethod, Job, JobHistoryEntry, JobStatus, JobType,
    },
    models::workflow::{InstallationState, InstallationStep, WorkflowError},
    services::finance_service::FinanceService,
};

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
    repo: JobRepository,
}

impl JobService {
    pub fn new(pool: PgPool, repo: JobRepository) -> Self {
        Self { pool, repo }
    }

    // =========================================================================
    //  REGRAS PURAS (testáveis sem banco)
    // =========================================================================

    // A data da instalação precisa estar em max(hoje, data da medição)
    // ou depois.
    pub fn validate_installation_date(
        candidate: NaiveDate,
        today: NaiveDate,
        measurement_date: Option<NaiveDate>,
    ) -> Result<(), WorkflowError> {
        if candidate < today {
            return Err(WorkflowError::ScheduleDateInPast);
        }
        if let Some(measured) = measurement_date {
            if candidate < measured {
                return Err(WorkflowError::ScheduleBeforeMeasurement);
            }
        }
        Ok(())
    }

    // Sinal: maior que zero e nunca acima do subtotal corrente.
    pub fn validate_deposit(amount: Decimal, subtotal: Decimal) -> Result<(), WorkflowError> {
        if amount <= Decimal::ZERO {
            return Err(WorkflowError::DepositNotPositive);
        }
        if amount > subtotal {
            return Err(WorkflowError::DepositExceedsSubtotal { deposit: amount, subtotal });
        }
        Ok(())
    }

    // Monta o job de instalação a partir da medição agendada: copia
    // cliente, responsável, medições, produtos e o financeiro já pago,
    // e liga o filho ao pai por parent_job_id.
    pub fn installation_job_from(
        measurement: &Job,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> NewJob {
        NewJob {
            business_id: measurement.business_id,
            customer_id: measurement.customer_id,
            employee_id: measurement.employee_id,
            parent_job_id: Some(measurement.id),
            job_type: JobType::Installation,
            status: JobStatus::Pending,
            title: format!("Instalação - {}", measurement.title),
            notes: measurement.notes.clone(),
            scheduled_date: Some(date),
            scheduled_time: time,
            quotation: measurement.quotation,
            deposit: measurement.deposit,
            deposit_paid: measurement.deposit_paid,
            deposit_payment_method: measurement.deposit_payment_method,
            deposit_customer_reference: measurement.deposit_customer_reference.clone(),
            measurements: measurement.measurements.0.clone(),
            selected_products: measurement.selected_products.0.clone(),
            checklist: default_installation_checklist(),
            images: measurement.images.0.clone(),
            documents: measurement.documents.0.clone(),
            workflow_step: Some(InstallationStep::ConfirmOrder),
            installation_state: Some(InstallationState::default()),
        }
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    pub async fn create_job(&self, new_job: NewJob, actor: &User) -> Result<Job, AppError> {
        let mut tx = self.pool.begin().await?;

        let job = self.repo.create(&mut *tx, new_job).await?;
        self.repo
            .append_history(&mut *tx, job.id, "job.created", "Job criado", Some(actor.id), &actor.name, None)
            .await?;

        tx.commit().await?;
        Ok(job)
    }

    // Busca com checagem de escopo: 404 se não existe, 403 se existe
    // mas o papel não alcança. Employee atribuído enxerga o job mesmo
    // fora da própria empresa.
    pub async fn get_job_checked(&self, id: Uuid, scope: JobScope) -> Result<Job, AppError> {
        let job = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Job".to_string()))?;

        if scope.can_access_business(job.business_id) {
            return Ok(job);
        }
        if let JobScope::Employee { employee_id, .. } = scope {
            if job.employee_id == Some(employee_id) {
                return Ok(job);
            }
        }
        Err(AppError::Forbidden)
    }

    pub async fn list(&self, scope: JobScope) -> Result<Vec<Job>, AppError> {
        self.repo.list(scope).await
    }

    pub async fn list_unassigned(&self, business_id: Uuid) -> Result<Vec<Job>, AppError> {
        self.repo.list_unassigned(business_id).await
    }

    pub async fn list_pending_scheduling(&self, scope: JobScope) -> Result<Vec<Job>, AppError> {
        let business_filter = match scope {
            JobScope::Admin => None,
            JobScope::Business(b) => Some(b),
            JobScope::Employee { business_id, .. } => Some(business_id),
        };
        self.repo.list_pending_scheduling(business_filter).await
    }

    pub async fn update_job(
        &self,
        id: Uuid,
        update: JobUpdate,
        actor: &User,
    ) -> Result<Job, AppError> {
        let mut tx = self.pool.begin().await?;

        let job = self
            .repo
            .update(&mut *tx, id, update)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Job".to_string()))?;
        self.repo
            .append_history(&mut *tx, id, "job.updated", "Job atualizado", Some(actor.id), &actor.name, None)
            .await?;

        tx.commit().await?;
        Ok(job)
    }

    pub async fn delete_job(&self, id: Uuid) -> Result<(), AppError> {
        let deleted = self.repo.delete(&self.pool, id).await?;
        if deleted == 0 {
            return Err(AppError::ResourceNotFound("Job".to_string()));
        }
        Ok(())
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<JobHistoryEntry>, AppError> {
        self.repo.list_history(id).await
    }

    // =========================================================================
    //  ATRIBUIÇÃO
    // =========================================================================

    pub async fn assign_job(
        &self,
        job: &Job,
        employee: &User,
        actor: &User,
    ) -> Result<Job, AppError> {
        let mut tx = self.pool.begin().await?;

        let assigned = self
            .repo
            .assign(&mut *tx, job.id, employee.id)
            .await?
            .ok_or(AppError::JobAlreadyAssigned)?;

        self.repo
            .append_history(
                &mut *tx,
                job.id,
                "job.assigned",
                &format!("Job atribuído a {}", employee.name),
                Some(actor.id),
                &actor.name,
                Some(json!({ "employeeId": employee.id })),
            )
            .await?;

        tx.commit().await?;
        Ok(assigned)
    }

    // =========================================================================
    //  DECISÃO DE DEPÓSITO (fim da medição)
    // =========================================================================

    pub fn deposit_summary(job: &Job) -> DepositSummary {
        FinanceService::deposit_summary(job)
    }

    // Registra o sinal: valor custom ou, se ausente, os 30% recomendados.
    pub async fn record_deposit(
        &self,
        job: &Job,
        method: DepositMethod,
        amount: Option<Decimal>,
        customer_reference: Option<String>,
        actor: &User,
    ) -> Result<Job, AppError> {
        if job.job_type != JobType::Measurement || job.measurements.is_empty() {
            return Err(WorkflowError::MeasurementRequired.into());
        }
        if job.deposit_paid {
            return Err(WorkflowError::DepositAlreadyPaid.into());
        }

        let financials = FinanceService::for_job(job);
        let amount =
            amount.unwrap_or_else(|| FinanceService::recommended_deposit(financials.subtotal));
        Self::validate_deposit(amount, financials.subtotal)?;

        let mut tx = self.pool.begin().await?;

        let updated = self
            .repo
            .record_deposit(&mut *tx, job.id, amount, method, customer_reference.as_deref(), Utc::now())
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Job".to_string()))?;

        self.repo
            .append_history(
                &mut *tx,
                job.id,
                "deposit.recorded",
                &format!("Depósito de {} registrado", amount),
                Some(actor.id),
                &actor.name,
                Some(json!({ "amount": amount, "method": method })),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // Adia o depósito com motivo obrigatório. O job continua entrando
    // na fila de agendamento (needs_installation_scheduling); nenhum
    // job de instalação é criado aqui.
    pub async fn skip_deposit(
        &self,
        job: &Job,
        reason: &str,
        actor: &User,
    ) -> Result<Job, AppError> {
        if job.job_type != JobType::Measurement {
            return Err(WorkflowError::MeasurementRequired.into());
        }
        if job.deposit_paid {
            return Err(WorkflowError::DepositAlreadyPaid.into());
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::SkipReasonRequired.into());
        }

        let mut tx = self.pool.begin().await?;

        let updated = self
            .repo
            .mark_deposit_skipped(&mut *tx, job.id, reason)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Job".to_string()))?;

        self.repo
            .append_history(
                &mut *tx,
                job.id,
                "deposit.skipped",
                &format!("Depósito adiado: {}", reason),
                Some(actor.id),
                &actor.name,
                None,
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // =========================================================================
    //  AGENDAMENTO DA INSTALAÇÃO
    // =========================================================================

    // Valida a data, cria o job de instalação copiando os dados da
    // medição e fecha a medição, tudo numa transação só.
    pub async fn schedule_installation(
        &self,
        measurement: &Job,
        date: NaiveDate,
        time: Option<NaiveTime>,
        actor: &User,
    ) -> Result<Job, AppError> {
        if measurement.job_type != JobType::Measurement {
            return Err(WorkflowError::SchedulingNotPending.into());
        }
        if !measurement.needs_installation_scheduling {
            return Err(WorkflowError::SchedulingNotPending.into());
        }
        Self::validate_installation_date(date, Utc::now().date_naive(), measurement.scheduled_date)?;

        let new_job = Self::installation_job_from(measurement, date, time);

        let mut tx = self.pool.begin().await?;

        let installation = self.repo.create(&mut *tx, new_job).await?;
        self.repo.finish_measurement(&mut *tx, measurement.id).await?;

        self.repo
            .append_history(
                &mut *tx,
                measurement.id,
                "installation.scheduled",
                &format!("Instalação agendada para {}", date),
                Some(actor.id),
                &actor.name,
                Some(json!({ "installationJobId": installation.id })),
            )
            .await?;
        self.repo
            .append_history(
                &mut *tx,
                installation.id,
                "job.created",
                "Job de instalação criado a partir da medição",
                Some(actor.id),
                &actor.name,
                Some(json!({ "parentJobId": measurement.id })),
            )
            .await?;

        tx.commit().await?;
        Ok(installation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use sqlx::types::Json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn measurement_job() -> Job {
        Job {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            employee_id: Some(Uuid::new_v4()),
            parent_job_id: None,
            job_type: JobType::Measurement,
            status: JobStatus::Confirmed,
            title: "Apto 72, Rua das Acácias".to_string(),
            notes: Some("Portaria fecha às 18h".to_string()),
            scheduled_date: Some(date("2026-08-10")),
            scheduled_time: None,
            quotation: dec("1000.00"),
            deposit: dec("300.00"),
            deposit_paid: true,
            deposit_paid_at: Some(ts("2026-08-10T15:00:00Z")),
            deposit_payment_method: Some(DepositMethod::Cash),
            deposit_customer_reference: None,
            deposit_payment_skipped: false,
            deposit_skip_reason: None,
            invoice_total: None,
            needs_installation_scheduling: true,
            measurements: Json(vec![]),
            selected_products: Json(vec![]),
            checklist: Json(vec![]),
            images: Json(vec!["uploads/fachada.jpg".to_string()]),
            documents: Json(vec![]),
            workflow_step: None,
            installation_state: None,
            created_at: ts("2026-08-01T12:00:00Z"),
            updated_at: ts("2026-08-10T15:00:00Z"),
        }
    }

    #[test]
    fn installation_date_must_not_be_in_the_past() {
        let err = JobService::validate_installation_date(
            date("2026-08-06"),
            date("2026-08-07"),
            None,
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::ScheduleDateInPast);
    }

    #[test]
    fn installation_date_must_not_precede_measurement() {
        let err = JobService::validate_installation_date(
            date("2026-08-08"),
            date("2026-08-07"),
            Some(date("2026-08-10")),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::ScheduleBeforeMeasurement);

        // No dia da medição, ou depois, pode
        JobService::validate_installation_date(
            date("2026-08-10"),
            date("2026-08-07"),
            Some(date("2026-08-10")),
        )
        .unwrap();
    }

    #[test]
    fn deposit_must_be_positive_and_within_subtotal() {
        assert_eq!(
            JobService::validate_deposit(dec("0"), dec("1000.00")).unwrap_err(),
            WorkflowError::DepositNotPositive
        );
        assert_eq!(
            JobService::validate_deposit(dec("1200.00"), dec("1000.00")).unwrap_err(),
            WorkflowError::DepositExceedsSubtotal {
                deposit: dec("1200.00"),
                subtotal: dec("1000.00")
            }
        );
        JobService::validate_deposit(dec("300.00"), dec("1000.00")).unwrap();
        // Sinal de 100% também é aceito
        JobService::validate_deposit(dec("1000.00"), dec("1000.00")).unwrap();
    }

    #[test]
    fn installation_job_copies_measurement_data() {
        use crate::models::jobs::{BracketType, ControlType, JobMeasurement, SelectedProduct};

        let mut measurement = measurement_job();
        measurement.measurements = Json(vec![JobMeasurement {
            window_id: "w1".to_string(),
            width: dec("120.5"),
            height: dec("210.0"),
            location: "Sala".to_string(),
            control_type: ControlType::ChainCord,
            bracket_type: BracketType::TopFix,
            photos: vec!["uploads/w1.jpg".to_string()],
            product_name: Some("Rolô".to_string()),
            product_price: Some(dec("250.00")),
        }]);
        measurement.selected_products = Json(vec![SelectedProduct {
            product_id: "rolo".to_string(),
            product_name: "Rolô".to_string(),
            quantity: dec("2"),
            price: dec("350.00"),
            customer_approved: true,
        }]);

        let new_job =
            JobService::installation_job_from(&measurement, date("2026-08-15"), None);

        assert_eq!(new_job.parent_job_id, Some(measurement.id));
        assert_eq!(new_job.job_type, JobType::Installation);
        assert_eq!(new_job.workflow_step, Some(InstallationStep::ConfirmOrder));
        // Medições e produtos copiados tal e qual
        assert_eq!(new_job.measurements, measurement.measurements.0);
        assert_eq!(new_job.selected_products, measurement.selected_products.0);
        // Financeiro carregado junto
        assert_eq!(new_job.quotation, dec("1000.00"));
        assert_eq!(new_job.deposit, dec("300.00"));
        assert!(new_job.deposit_paid);
        // Fotos e documentos avulsos acompanham
        assert_eq!(new_job.images, measurement.images.0);
        // Checklist padrão de 5 itens, nenhum concluído
        assert_eq!(new_job.checklist.len(), 5);
        assert!(new_job.checklist.iter().all(|item| !item.done));
        assert_eq!(new_job.checklist[0].key, "confirm_order");
        assert_eq!(new_job.checklist[4].key, "invoice");
    }
}
