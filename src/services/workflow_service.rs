// src/services/workflow_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::job_repo::{JobRepository, JobUpdate},
    models::auth::User,
    models::finance::JobFinancials,
    models::jobs::{Job, JobStatus, JobType},
    models::workflow::{
        BalancePaymentMethod, InstallationState, InstallationStep, InvoiceData, PaymentData,
        SignatureData, StepSubmission, WorkflowError,
    },
    services::finance_service::FinanceService,
};

#[derive(Clone)]
pub struct WorkflowService {
    pool: PgPool,
    repo: JobRepository,
}

impl WorkflowService {
    pub fn new(pool: PgPool, repo: JobRepository) -> Self {
        Self { pool, repo }
    }

    // =========================================================================
    //  A TRANSIÇÃO (pura)
    // =========================================================================

    // Consome o acumulador anterior e devolve o novo, junto com a
    // próxima etapa. Nenhum IO: toda regra de gate mora aqui e é
    // testável sem banco.
    pub fn apply_step(
        state: &InstallationState,
        current: InstallationStep,
        submission: StepSubmission,
        financials: &JobFinancials,
        now: DateTime<Utc>,
    ) -> Result<(InstallationState, InstallationStep), WorkflowError> {
        let got = submission.step();
        if got != current {
            return Err(WorkflowError::StepMismatch { expected: current, got });
        }
        let next = current.next().ok_or(WorkflowError::AlreadyCompleted)?;

        let mut new_state = state.clone();
        match submission {
            StepSubmission::ConfirmOrder { confirmed } => {
                if !confirmed {
                    return Err(WorkflowError::ConfirmationRequired);
                }
                new_state.order_confirmed = true;
                new_state.order_confirmed_at = Some(now);
            }

            StepSubmission::Photos { photos } => {
                let photos: Vec<String> =
                    photos.into_iter().filter(|p| !p.trim().is_empty()).collect();
                if photos.is_empty() {
                    return Err(WorkflowError::PhotoRequired);
                }
                new_state.photos = photos;
            }

            StepSubmission::Signature { signature, signer_name, satisfied } => {
                if signature.trim().is_empty() {
                    return Err(WorkflowError::SignatureRequired);
                }
                if signer_name.trim().is_empty() {
                    return Err(WorkflowError::SignerNameRequired);
                }
                if !satisfied {
                    return Err(WorkflowError::SatisfactionRequired);
                }
                new_state.signature =
                    Some(SignatureData { signature, signer_name, satisfied, signed_at: now });
            }

            StepSubmission::Payment { method, cash_received, bank_reference } => {
                let due = financials.balance;
                let payment = match method {
                    BalancePaymentMethod::Online => {
                        return Err(WorkflowError::OnlinePaymentUnavailable);
                    }
                    BalancePaymentMethod::Cash => {
                        let received =
                            cash_received.ok_or(WorkflowError::CashReceivedRequired)?;
                        if received < due {
                            return Err(WorkflowError::InsufficientCash { received, due });
                        }
                        PaymentData {
                            method,
                            balance_due: due,
                            cash_received: Some(received),
                            change: FinanceService::cash_change(received, due),
                            bank_reference: None,
                            balance_paid: true,
                            paid_at: now,
                        }
                    }
                    BalancePaymentMethod::BankTransfer => {
                        let reference = bank_reference
                            .filter(|r| !r.trim().is_empty())
                            .ok_or(WorkflowError::BankReferenceRequired)?;
                        PaymentData {
                            method,
                            balance_due: due,
                            cash_received: None,
                            change: None,
                            bank_reference: Some(reference),
                            balance_paid: true,
                            paid_at: now,
                        }
                    }
                };
                new_state.payment = Some(payment);
            }

            StepSubmission::Invoice { template } => {
                let template = template
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(WorkflowError::TemplateRequired)?;
                // As linhas saem da MESMA derivação usada no depósito e
                // no pagamento; a fatura não recalcula nada por conta.
                new_state.invoice = Some(InvoiceData {
                    line_items: financials.line_items.clone(),
                    subtotal: financials.subtotal,
                    deposit: financials.deposit,
                    balance: financials.balance,
                    template,
                    sent_at: now,
                });
            }
        }

        Ok((new_state, next))
    }

    // Status refletido no job conforme a etapa em que ele entra
    fn status_for_step(step: InstallationStep) -> JobStatus {
        match step {
            InstallationStep::Payment => JobStatus::AwaitingPayment,
            // Completed só no finish(); até lá o job segue em andamento
            _ => JobStatus::InProgress,
        }
    }

    // =========================================================================
    //  ORQUESTRAÇÃO (persiste o acumulador a cada etapa aceita)
    // =========================================================================

    pub async fn advance(
        &self,
        job: Job,
        submission: StepSubmission,
        actor: &User,
    ) -> Result<Job, AppError> {
        let current = Self::active_step(&job)?;
        if current == InstallationStep::Complete {
            return Err(WorkflowError::AlreadyCompleted.into());
        }

        let financials = self.financials_for(&job).await?;
        let state = job
            .installation_state
            .as_ref()
            .map(|j| j.0.clone())
            .unwrap_or_default();

        let now = Utc::now();
        let (new_state, next_step) =
            Self::apply_step(&state, current, submission, &financials, now)?;

        // A fatura fixa o total cobrado no próprio job
        let invoice_total = match current {
            InstallationStep::Invoice => new_state.invoice.as_ref().map(|i| i.subtotal),
            _ => None,
        };
        let status = Self::status_for_step(next_step);

        let mut tx = self.pool.begin().await?;

        let advanced = self
            .repo
            .advance_workflow(&mut *tx, job.id, current, next_step, &new_state, status, invoice_total)
            .await?;

        let Some(mut updated) = advanced else {
            // Outra submissão avançou primeiro: o compare-and-swap na
            // etapa atual não casou. Relê para informar onde o job está.
            drop(tx);
            let fresh = self
                .repo
                .find_by_id(job.id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("Job".to_string()))?;
            return Err(WorkflowError::StepMismatch {
                expected: fresh.workflow_step.unwrap_or(current),
                got: current,
            }
            .into());
        };

        // Marca o item do checklist correspondente à etapa cumprida
        let mut checklist = updated.checklist.0.clone();
        if let Some(item) = checklist.iter_mut().find(|i| i.key == current.as_str()) {
            item.done = true;
            if let Some(refreshed) = self
                .repo
                .update(&mut *tx, job.id, JobUpdate { checklist: Some(checklist), ..Default::default() })
                .await?
            {
                updated = refreshed;
            }
        }

        let description = Self::describe_transition(current, &new_state);
        self.repo
            .append_history(
                &mut *tx,
                job.id,
                &format!("workflow.{}", current.as_str()),
                &description,
                Some(actor.id),
                &actor.name,
                None,
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // "Finish Job": só vale com o workflow na etapa terminal.
    pub async fn finish(&self, job: Job, actor: &User) -> Result<Job, AppError> {
        let current = Self::active_step(&job)?;
        if current != InstallationStep::Complete {
            return Err(WorkflowError::StepMismatch {
                expected: current,
                got: InstallationStep::Complete,
            }
            .into());
        }

        let mut state = job
            .installation_state
            .as_ref()
            .map(|j| j.0.clone())
            .unwrap_or_default();
        if state.completed_at.is_some() {
            return Err(WorkflowError::AlreadyCompleted.into());
        }
        state.completed_at = Some(Utc::now());

        let mut tx = self.pool.begin().await?;

        let updated = self
            .repo
            .advance_workflow(
                &mut *tx,
                job.id,
                InstallationStep::Complete,
                InstallationStep::Complete,
                &state,
                JobStatus::Completed,
                None,
            )
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Job".to_string()))?;

        self.repo
            .append_history(
                &mut *tx,
                job.id,
                "workflow.completed",
                "Instalação concluída",
                Some(actor.id),
                &actor.name,
                None,
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // Resumo financeiro exibido na confirmação do pedido
    pub async fn payment_summary(&self, job: &Job) -> Result<JobFinancials, AppError> {
        self.financials_for(job).await
    }

    fn active_step(job: &Job) -> Result<InstallationStep, WorkflowError> {
        match (job.job_type, job.workflow_step) {
            (JobType::Installation, Some(step)) => Ok(step),
            _ => Err(WorkflowError::WorkflowNotActive),
        }
    }

    // O job de instalação normalmente já carrega medições e produtos
    // copiados da medição; se estiver vazio (criado à mão), o resumo
    // vem do job pai.
    async fn financials_for(&self, job: &Job) -> Result<JobFinancials, AppError> {
        if job.measurements.is_empty() && job.selected_products.is_empty() {
            if let Some(parent_id) = job.parent_job_id {
                if let Some(parent) = self.repo.find_by_id(parent_id).await? {
                    return Ok(FinanceService::for_job(&parent));
                }
            }
        }
        Ok(FinanceService::for_job(job))
    }

    fn describe_transition(step: InstallationStep, state: &InstallationState) -> String {
        match step {
            InstallationStep::ConfirmOrder => "Pedido confirmado pelo instalador".to_string(),
            InstallationStep::Photos => {
                format!("{} foto(s) da instalação registradas", state.photos.len())
            }
            InstallationStep::Signature => {
                let signer = state
                    .signature
                    .as_ref()
                    .map(|s| s.signer_name.as_str())
                    .unwrap_or("cliente");
                format!("Assinatura capturada de {}", signer)
            }
            InstallationStep::Payment => match state.payment.as_ref() {
                Some(p) => format!("Saldo de {} recebido", p.balance_due),
                None => "Saldo recebido".to_string(),
            },
            InstallationStep::Invoice => match state.invoice.as_ref() {
                Some(i) => format!("Fatura gerada (modelo {})", i.template),
                None => "Fatura gerada".to_string(),
            },
            InstallationStep::Complete => "Instalação concluída".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // Cotação 1000, sinal 300: saldo devido de 700
    fn financials() -> JobFinancials {
        FinanceService::derive(dec("1000.00"), dec("300.00"), &[], &[])
    }

    fn now() -> DateTime<Utc> {
        "2026-08-07T10:00:00Z".parse().unwrap()
    }

    fn confirm() -> StepSubmission {
        StepSubmission::ConfirmOrder { confirmed: true }
    }

    fn photos() -> StepSubmission {
        StepSubmission::Photos { photos: vec!["uploads/a.jpg".to_string()] }
    }

    fn signature() -> StepSubmission {
        StepSubmission::Signature {
            signature: "data:image/png;base64,iVBOR".to_string(),
            signer_name: "João Pereira".to_string(),
            satisfied: true,
        }
    }

    fn cash_payment(amount: &str) -> StepSubmission {
        StepSubmission::Payment {
            method: BalancePaymentMethod::Cash,
            cash_received: Some(dec(amount)),
            bank_reference: None,
        }
    }

    fn invoice() -> StepSubmission {
        StepSubmission::Invoice { template: Some("padrao".to_string()) }
    }

    #[test]
    fn happy_path_walks_all_five_steps() {
        let f = financials();
        let s0 = InstallationState::default();

        let (s1, step) =
            WorkflowService::apply_step(&s0, InstallationStep::ConfirmOrder, confirm(), &f, now())
                .unwrap();
        assert_eq!(step, InstallationStep::Photos);
        assert!(s1.order_confirmed);

        let (s2, step) =
            WorkflowService::apply_step(&s1, InstallationStep::Photos, photos(), &f, now()).unwrap();
        assert_eq!(step, InstallationStep::Signature);
        assert_eq!(s2.photos.len(), 1);

        let (s3, step) =
            WorkflowService::apply_step(&s2, InstallationStep::Signature, signature(), &f, now())
                .unwrap();
        assert_eq!(step, InstallationStep::Payment);
        assert!(s3.signature.is_some());

        let (s4, step) =
            WorkflowService::apply_step(&s3, InstallationStep::Payment, cash_payment("750.00"), &f, now())
                .unwrap();
        assert_eq!(step, InstallationStep::Invoice);
        let payment = s4.payment.as_ref().unwrap();
        assert!(payment.balance_paid);
        assert_eq!(payment.balance_due, dec("700.00"));
        assert_eq!(payment.change, Some(dec("50.00")));

        let (s5, step) =
            WorkflowService::apply_step(&s4, InstallationStep::Invoice, invoice(), &f, now()).unwrap();
        assert_eq!(step, InstallationStep::Complete);
        let inv = s5.invoice.as_ref().unwrap();
        assert_eq!(inv.subtotal, dec("1000.00"));
        assert_eq!(inv.balance, dec("700.00"));
    }

    #[test]
    fn out_of_order_submission_is_rejected() {
        let f = financials();
        let s0 = InstallationState::default();

        // Tentar fotografar antes de confirmar o pedido
        let err = WorkflowService::apply_step(&s0, InstallationStep::ConfirmOrder, photos(), &f, now())
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::StepMismatch {
                expected: InstallationStep::ConfirmOrder,
                got: InstallationStep::Photos,
            }
        );

        // Tentar assinar enquanto a etapa atual ainda é fotos
        let err = WorkflowService::apply_step(&s0, InstallationStep::Photos, signature(), &f, now())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::StepMismatch { .. }));
    }

    #[test]
    fn confirm_order_requires_checkbox() {
        let f = financials();
        let err = WorkflowService::apply_step(
            &InstallationState::default(),
            InstallationStep::ConfirmOrder,
            StepSubmission::ConfirmOrder { confirmed: false },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::ConfirmationRequired);
    }

    #[test]
    fn photos_step_requires_at_least_one() {
        let f = financials();
        let err = WorkflowService::apply_step(
            &InstallationState::default(),
            InstallationStep::Photos,
            StepSubmission::Photos { photos: vec![] },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::PhotoRequired);

        // Strings em branco não contam como foto
        let err = WorkflowService::apply_step(
            &InstallationState::default(),
            InstallationStep::Photos,
            StepSubmission::Photos { photos: vec!["   ".to_string()] },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::PhotoRequired);
    }

    #[test]
    fn signature_gates_each_field() {
        let f = financials();
        let state = InstallationState::default();

        let err = WorkflowService::apply_step(
            &state,
            InstallationStep::Signature,
            StepSubmission::Signature {
                signature: "".to_string(),
                signer_name: "João".to_string(),
                satisfied: true,
            },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::SignatureRequired);

        let err = WorkflowService::apply_step(
            &state,
            InstallationStep::Signature,
            StepSubmission::Signature {
                signature: "data:...".to_string(),
                signer_name: "  ".to_string(),
                satisfied: true,
            },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::SignerNameRequired);

        let err = WorkflowService::apply_step(
            &state,
            InstallationStep::Signature,
            StepSubmission::Signature {
                signature: "data:...".to_string(),
                signer_name: "João".to_string(),
                satisfied: false,
            },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::SatisfactionRequired);
    }

    #[test]
    fn online_payment_is_not_available_yet() {
        let f = financials();
        let err = WorkflowService::apply_step(
            &InstallationState::default(),
            InstallationStep::Payment,
            StepSubmission::Payment {
                method: BalancePaymentMethod::Online,
                cash_received: None,
                bank_reference: None,
            },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::OnlinePaymentUnavailable);
    }

    #[test]
    fn cash_payment_requires_amount_covering_balance() {
        let f = financials();
        let state = InstallationState::default();

        let err = WorkflowService::apply_step(
            &state,
            InstallationStep::Payment,
            StepSubmission::Payment {
                method: BalancePaymentMethod::Cash,
                cash_received: None,
                bank_reference: None,
            },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::CashReceivedRequired);

        let err = WorkflowService::apply_step(&state, InstallationStep::Payment, cash_payment("600.00"), &f, now())
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InsufficientCash { received: dec("600.00"), due: dec("700.00") }
        );

        // Valor exato: sem troco
        let (s, _) = WorkflowService::apply_step(&state, InstallationStep::Payment, cash_payment("700.00"), &f, now())
            .unwrap();
        assert_eq!(s.payment.unwrap().change, None);
    }

    #[test]
    fn bank_transfer_requires_reference() {
        let f = financials();
        let err = WorkflowService::apply_step(
            &InstallationState::default(),
            InstallationStep::Payment,
            StepSubmission::Payment {
                method: BalancePaymentMethod::BankTransfer,
                cash_received: None,
                bank_reference: Some("  ".to_string()),
            },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::BankReferenceRequired);

        let (s, _) = WorkflowService::apply_step(
            &InstallationState::default(),
            InstallationStep::Payment,
            StepSubmission::Payment {
                method: BalancePaymentMethod::BankTransfer,
                cash_received: None,
                bank_reference: Some("TED-20260807-001".to_string()),
            },
            &f,
            now(),
        )
        .unwrap();
        assert_eq!(s.payment.unwrap().bank_reference.as_deref(), Some("TED-20260807-001"));
    }

    #[test]
    fn invoice_requires_template_selection() {
        let f = financials();
        let err = WorkflowService::apply_step(
            &InstallationState::default(),
            InstallationStep::Invoice,
            StepSubmission::Invoice { template: None },
            &f,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::TemplateRequired);
    }

    #[test]
    fn invoice_uses_measurement_products_when_present() {
        use crate::models::jobs::{BracketType, ControlType, JobMeasurement};

        // Duas janelas, uma com produto de 250: subtotal da fatura é 250
        let measurements = vec![
            JobMeasurement {
                window_id: "w1".to_string(),
                width: dec("120"),
                height: dec("200"),
                location: "Sala".to_string(),
                control_type: ControlType::Wand,
                bracket_type: BracketType::FaceFix,
                photos: vec![],
                product_name: Some("Rolô Blackout".to_string()),
                product_price: Some(dec("250.00")),
            },
            JobMeasurement {
                window_id: "w2".to_string(),
                width: dec("80"),
                height: dec("150"),
                location: "Quarto".to_string(),
                control_type: ControlType::None,
                bracket_type: BracketType::TopFix,
                photos: vec![],
                product_name: None,
                product_price: None,
            },
        ];
        let f = FinanceService::derive(dec("1000.00"), dec("0"), &measurements, &[]);

        let (s, _) = WorkflowService::apply_step(
            &InstallationState::default(),
            InstallationStep::Invoice,
            invoice(),
            &f,
            now(),
        )
        .unwrap();
        let inv = s.invoice.unwrap();
        assert_eq!(inv.line_items.len(), 1);
        assert_eq!(inv.subtotal, dec("250.00"));
    }
}
