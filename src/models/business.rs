// src/models/business.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Empresa (tenant): toda visão de dados é recortada por business_id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: Uuid,
    #[schema(example = "Persianas Aurora Ltda")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    // Chave Pix impressa na fatura (QR Code)
    pub pix_key: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
