// src/models/workflow.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::finance::InvoiceLine;

// --- A etapa ---

// Ordem linear estrita: confirm_order -> photos -> signature -> payment
// -> invoice -> complete. Não há pulo nem retorno programático.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "installation_step", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum InstallationStep {
    ConfirmOrder,
    Photos,
    Signature,
    Payment,
    Invoice,
    Complete,
}

impl InstallationStep {
    // A única aresta que existe no grafo: exatamente uma etapa adiante.
    pub fn next(self) -> Option<Self> {
        use InstallationStep::*;
        match self {
            ConfirmOrder => Some(Photos),
            Photos => Some(Signature),
            Signature => Some(Payment),
            Payment => Some(Invoice),
            Invoice => Some(Complete),
            Complete => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use InstallationStep::*;
        match self {
            ConfirmOrder => "confirm_order",
            Photos => "photos",
            Signature => "signature",
            Payment => "payment",
            Invoice => "invoice",
            Complete => "complete",
        }
    }
}

// --- Método de pagamento do saldo (etapa payment) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BalancePaymentMethod {
    Cash,
    BankTransfer,
    // Aceito no payload mas ainda sem gateway: a etapa rejeita com 422
    Online,
}

// --- Incrementos de dados de cada etapa ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignatureData {
    // Data URI do traço capturado no aparelho
    pub signature: String,
    #[schema(example = "João Pereira")]
    pub signer_name: String,
    pub satisfied: bool,
    pub signed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    pub method: BalancePaymentMethod,
    #[schema(example = "700.00")]
    pub balance_due: Decimal,
    pub cash_received: Option<Decimal>,
    // Troco quando o recebido em dinheiro excede o saldo
    pub change: Option<Decimal>,
    pub bank_reference: Option<String>,
    pub balance_paid: bool,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub line_items: Vec<InvoiceLine>,
    pub subtotal: Decimal,
    pub deposit: Decimal,
    pub balance: Decimal,
    #[schema(example = "padrao")]
    pub template: String,
    // "Envio" registrado, sem entrega real
    pub sent_at: DateTime<Utc>,
}

// O acumulador do workflow. Valor imutável: cada transição consome o
// anterior e devolve um novo, que é persistido no próprio job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallationState {
    pub order_confirmed: bool,
    pub order_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub signature: Option<SignatureData>,
    pub payment: Option<PaymentData>,
    pub invoice: Option<InvoiceData>,
    pub completed_at: Option<DateTime<Utc>>,
}

// --- O que o operador envia em cada etapa ---

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepSubmission {
    // O operador atesta as 4 verificações do pedido num único checkbox
    ConfirmOrder { confirmed: bool },
    Photos { photos: Vec<String> },
    Signature {
        signature: String,
        #[serde(rename = "signerName")]
        signer_name: String,
        satisfied: bool,
    },
    Payment {
        method: BalancePaymentMethod,
        #[serde(rename = "cashReceived")]
        cash_received: Option<Decimal>,
        #[serde(rename = "bankReference")]
        bank_reference: Option<String>,
    },
    Invoice { template: Option<String> },
}

impl StepSubmission {
    pub fn step(&self) -> InstallationStep {
        match self {
            StepSubmission::ConfirmOrder { .. } => InstallationStep::ConfirmOrder,
            StepSubmission::Photos { .. } => InstallationStep::Photos,
            StepSubmission::Signature { .. } => InstallationStep::Signature,
            StepSubmission::Payment { .. } => InstallationStep::Payment,
            StepSubmission::Invoice { .. } => InstallationStep::Invoice,
        }
    }
}

// --- Regras violadas ---

// Cada gate do workflow (e das decisões de depósito/agendamento que o
// antecedem) vira um erro tipado com código estável, em vez de um alert
// no cliente.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("o job não está em um workflow de instalação ativo")]
    WorkflowNotActive,

    #[error("o workflow já foi concluído")]
    AlreadyCompleted,

    #[error("etapa fora de ordem: esperada {expected:?}, recebida {got:?}")]
    StepMismatch { expected: InstallationStep, got: InstallationStep },

    #[error("a confirmação do pedido precisa ser marcada")]
    ConfirmationRequired,

    #[error("pelo menos uma foto é obrigatória")]
    PhotoRequired,

    #[error("a assinatura não pode ficar em branco")]
    SignatureRequired,

    #[error("o nome de quem assina não pode ficar em branco")]
    SignerNameRequired,

    #[error("a confirmação de satisfação precisa ser marcada")]
    SatisfactionRequired,

    #[error("pagamento online ainda não está disponível")]
    OnlinePaymentUnavailable,

    #[error("o valor recebido em dinheiro não pode ficar em branco")]
    CashReceivedRequired,

    #[error("valor em dinheiro insuficiente: recebido {received}, devido {due}")]
    InsufficientCash { received: Decimal, due: Decimal },

    #[error("a referência da transferência não pode ficar em branco")]
    BankReferenceRequired,

    #[error("selecione um modelo de fatura antes do envio")]
    TemplateRequired,

    #[error("o job de medição precisa de pelo menos uma medição")]
    MeasurementRequired,

    #[error("o motivo do adiamento não pode ficar em branco")]
    SkipReasonRequired,

    #[error("o depósito precisa ser maior que zero")]
    DepositNotPositive,

    #[error("depósito {deposit} acima do subtotal {subtotal}")]
    DepositExceedsSubtotal { deposit: Decimal, subtotal: Decimal },

    #[error("o depósito deste job já foi registrado")]
    DepositAlreadyPaid,

    #[error("o job não está aguardando agendamento de instalação")]
    SchedulingNotPending,

    #[error("a data de instalação não pode ficar no passado")]
    ScheduleDateInPast,

    #[error("a data de instalação não pode anteceder a medição")]
    ScheduleBeforeMeasurement,
}

impl WorkflowError {
    // Código estável consumido pelo frontend (não mudar sem combinar).
    pub fn code(&self) -> &'static str {
        use WorkflowError::*;
        match self {
            WorkflowNotActive => "workflow-not-active",
            AlreadyCompleted => "workflow-already-completed",
            StepMismatch { .. } => "step-out-of-order",
            ConfirmationRequired => "confirmation-required",
            PhotoRequired => "photo-required",
            SignatureRequired => "signature-required",
            SignerNameRequired => "signer-name-required",
            SatisfactionRequired => "satisfaction-required",
            OnlinePaymentUnavailable => "online-payment-unavailable",
            CashReceivedRequired => "cash-received-required",
            InsufficientCash { .. } => "insufficient-cash",
            BankReferenceRequired => "bank-reference-required",
            TemplateRequired => "template-required",
            MeasurementRequired => "measurement-required",
            SkipReasonRequired => "skip-reason-required",
            DepositNotPositive => "deposit-not-positive",
            DepositExceedsSubtotal { .. } => "deposit-exceeds-subtotal",
            DepositAlreadyPaid => "deposit-already-paid",
            SchedulingNotPending => "scheduling-not-pending",
            ScheduleDateInPast => "schedule-date-in-past",
            ScheduleBeforeMeasurement => "schedule-before-measurement",
        }
    }
}
