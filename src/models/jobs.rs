// src/models/jobs.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "job_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Measurement,
    Installation,
    Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "job_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Tbd,
    AwaitingDeposit,
    AwaitingPayment,
}

// Método do pagamento do depósito (sinal), coletado no fim da medição
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deposit_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "kebab-case")]
pub enum DepositMethod {
    Card,
    Cash,
    BankTransfer,
}

// Tipo de acionamento da persiana medida
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ControlType {
    ChainCord,
    Wand,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BracketType {
    TopFix,
    FaceFix,
}

// --- Conteúdo JSONB (documentos donos exclusivos do job) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobMeasurement {
    #[schema(example = "sala-janela-1")]
    pub window_id: String,
    // Dimensões em cm
    #[schema(example = "120.5")]
    pub width: Decimal,
    #[schema(example = "210.0")]
    pub height: Decimal,
    #[schema(example = "Sala de estar")]
    pub location: String,
    pub control_type: ControlType,
    pub bracket_type: BracketType,
    // Data URIs ou URLs de upload
    #[serde(default)]
    pub photos: Vec<String>,
    // Produto vinculado a esta janela, quando o cliente já escolheu
    pub product_name: Option<String>,
    pub product_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectedProduct {
    pub product_id: String,
    #[schema(example = "Persiana Rolô Blackout")]
    pub product_name: String,
    #[schema(example = "2")]
    pub quantity: Decimal,
    #[schema(example = "350.00")]
    pub price: Decimal,
    #[serde(default)]
    pub customer_approved: bool,
}

impl SelectedProduct {
    pub fn line_total(&self) -> Decimal {
        self.price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    #[schema(example = "confirm_order")]
    pub key: String,
    #[schema(example = "Confirmar pedido")]
    pub label: String,
    #[serde(default)]
    pub done: bool,
}

impl ChecklistItem {
    pub fn new(key: &str, label: &str) -> Self {
        Self { key: key.to_string(), label: label.to_string(), done: false }
    }
}

// Checklist padrão anexado a todo job de instalação
pub fn default_installation_checklist() -> Vec<ChecklistItem> {
    vec![
        ChecklistItem::new("confirm_order", "Confirmar pedido"),
        ChecklistItem::new("photos", "Fotos da instalação"),
        ChecklistItem::new("signature", "Assinatura do cliente"),
        ChecklistItem::new("payment", "Pagamento do saldo"),
        ChecklistItem::new("invoice", "Envio da fatura"),
    ]
}

// --- O Job ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    #[schema(ignore)]
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub employee_id: Option<Uuid>,
    // Jobs de instalação referenciam o job de medição que os originou
    pub parent_job_id: Option<Uuid>,

    pub job_type: JobType,
    pub status: JobStatus,

    #[schema(example = "Medição - Apto 72, Rua das Acácias")]
    pub title: String,
    pub notes: Option<String>,
    #[schema(value_type = String, format = Date, example = "2026-08-20")]
    pub scheduled_date: Option<NaiveDate>,
    #[schema(value_type = String, example = "14:30:00")]
    pub scheduled_time: Option<NaiveTime>,

    // Financeiro
    #[schema(example = "1000.00")]
    pub quotation: Decimal,
    #[schema(example = "300.00")]
    pub deposit: Decimal,
    pub deposit_paid: bool,
    pub deposit_paid_at: Option<DateTime<Utc>>,
    pub deposit_payment_method: Option<DepositMethod>,
    pub deposit_customer_reference: Option<String>,
    pub deposit_payment_skipped: bool,
    pub deposit_skip_reason: Option<String>,
    pub invoice_total: Option<Decimal>,

    pub needs_installation_scheduling: bool,

    // Conteúdo
    #[schema(value_type = Vec<JobMeasurement>)]
    pub measurements: Json<Vec<JobMeasurement>>,
    #[schema(value_type = Vec<SelectedProduct>)]
    pub selected_products: Json<Vec<SelectedProduct>>,
    #[schema(value_type = Vec<ChecklistItem>)]
    pub checklist: Json<Vec<ChecklistItem>>,
    // Fotos e documentos avulsos anexados ao job (URLs de upload)
    #[schema(value_type = Vec<String>)]
    pub images: Json<Vec<String>>,
    #[schema(value_type = Vec<String>)]
    pub documents: Json<Vec<String>>,

    // Workflow de instalação: etapa atual + acumulador persistido
    pub workflow_step: Option<crate::models::workflow::InstallationStep>,
    #[schema(value_type = Object)]
    pub installation_state: Option<Json<crate::models::workflow::InstallationState>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Histórico (append-only) ---

// Uma linha da tabela job_history. Nunca é alterada nem apagada;
// o `id` serial dá a ordem monotônica dentro do job.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobHistoryEntry {
    pub id: i64,
    pub job_id: Uuid,
    pub at: DateTime<Utc>,
    #[schema(example = "deposit.recorded")]
    pub action: String,
    #[schema(example = "Depósito de R$ 300,00 recebido em dinheiro")]
    pub description: String,
    pub user_id: Option<Uuid>,
    pub user_name: String,
    #[schema(value_type = Object)]
    pub data: Option<Value>,
}
