// src/models/finance.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Uma linha da fatura: produto vinculado a uma janela medida (qtd 1)
// ou produto selecionado avulso (preço x quantidade).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    #[schema(example = "Persiana Rolô Blackout (Sala de estar)")]
    pub description: String,
    #[schema(example = "1")]
    pub quantity: Decimal,
    #[schema(example = "250.00")]
    pub unit_price: Decimal,
    #[schema(example = "250.00")]
    pub total: Decimal,
}

// Valores derivados de um job, calculados num lugar só (FinanceService)
// e consumidos pelas etapas de depósito, confirmação, pagamento e fatura.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobFinancials {
    pub line_items: Vec<InvoiceLine>,
    #[schema(example = "1000.00")]
    pub subtotal: Decimal,
    #[schema(example = "300.00")]
    pub deposit: Decimal,
    #[schema(example = "700.00")]
    pub balance: Decimal,
}

// Resumo devolvido ao operador na decisão de depósito
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepositSummary {
    #[schema(example = "1000.00")]
    pub subtotal: Decimal,
    // 30% do subtotal, arredondado para 2 casas
    #[schema(example = "300.00")]
    pub recommended_deposit: Decimal,
}
