// src/services/finance_service.rs

use rust_decimal::Decimal;

use crate::models::{
    finance::{DepositSummary, InvoiceLine, JobFinancials},
    jobs::{Job, JobMeasurement, SelectedProduct},
};

// Derivação financeira centralizada. As etapas de depósito, confirmação
// de pedido, pagamento e fatura consomem TODAS este mesmo cálculo; não
// existe segunda implementação para divergir.
#[derive(Clone)]
pub struct FinanceService;

impl FinanceService {
    // Monta as linhas e deriva subtotal/saldo a partir de um job:
    //   - janelas medidas com produto vinculado entram com quantidade 1;
    //   - produtos selecionados entram com preço x quantidade;
    //   - subtotal cai para a cotação quando a soma computada é zero;
    //   - saldo = subtotal - depósito, nunca negativo.
    pub fn derive(
        quotation: Decimal,
        deposit: Decimal,
        measurements: &[JobMeasurement],
        selected_products: &[SelectedProduct],
    ) -> JobFinancials {
        let mut line_items = Vec::new();

        for m in measurements {
            if let (Some(name), Some(price)) = (&m.product_name, m.product_price) {
                line_items.push(InvoiceLine {
                    description: format!("{} ({})", name, m.location),
                    quantity: Decimal::ONE,
                    unit_price: price,
                    total: price,
                });
            }
        }

        for p in selected_products {
            line_items.push(InvoiceLine {
                description: p.product_name.clone(),
                quantity: p.quantity,
                unit_price: p.price,
                total: p.line_total(),
            });
        }

        let computed: Decimal = line_items.iter().map(|l| l.total).sum();
        let subtotal = if computed > Decimal::ZERO { computed } else { quotation };

        // Piso em zero: linha legada com depósito acima do subtotal não
        // pode exibir saldo negativo.
        let balance = (subtotal - deposit).max(Decimal::ZERO);

        JobFinancials { line_items, subtotal, deposit, balance }
    }

    pub fn for_job(job: &Job) -> JobFinancials {
        Self::derive(
            job.quotation,
            job.deposit,
            &job.measurements,
            &job.selected_products,
        )
    }

    // 30% do subtotal, arredondado a 2 casas
    pub fn recommended_deposit(subtotal: Decimal) -> Decimal {
        let rate = Decimal::new(30, 2); // 0.30
        (subtotal * rate).round_dp(2)
    }

    pub fn deposit_summary(job: &Job) -> DepositSummary {
        let financials = Self::for_job(job);
        DepositSummary {
            recommended_deposit: Self::recommended_deposit(financials.subtotal),
            subtotal: financials.subtotal,
        }
    }

    // Troco quando o recebido em dinheiro excede o saldo devido
    pub fn cash_change(received: Decimal, due: Decimal) -> Option<Decimal> {
        if received > due {
            Some(received - due)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::jobs::{BracketType, ControlType};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn window(location: &str, product: Option<(&str, &str)>) -> JobMeasurement {
        JobMeasurement {
            window_id: format!("w-{}", location),
            width: dec("120.0"),
            height: dec("210.0"),
            location: location.to_string(),
            control_type: ControlType::ChainCord,
            bracket_type: BracketType::TopFix,
            photos: vec![],
            product_name: product.map(|(n, _)| n.to_string()),
            product_price: product.map(|(_, p)| dec(p)),
        }
    }

    fn product(name: &str, qty: &str, price: &str) -> SelectedProduct {
        SelectedProduct {
            product_id: name.to_lowercase(),
            product_name: name.to_string(),
            quantity: dec(qty),
            price: dec(price),
            customer_approved: true,
        }
    }

    #[test]
    fn subtotal_sums_selected_products() {
        let products = vec![product("Rolô", "2", "350.00"), product("Romana", "1", "420.00")];
        let f = FinanceService::derive(dec("0"), dec("0"), &[], &products);
        assert_eq!(f.subtotal, dec("1120.00"));
        assert_eq!(f.line_items.len(), 2);
    }

    #[test]
    fn empty_products_fall_back_to_quotation() {
        let f = FinanceService::derive(dec("1000.00"), dec("0"), &[], &[]);
        assert_eq!(f.subtotal, dec("1000.00"));
        assert!(f.line_items.is_empty());
    }

    #[test]
    fn balance_is_subtotal_minus_deposit() {
        // Cotação de 1000 sem produtos, sinal de 300 (30% recomendado)
        let f = FinanceService::derive(dec("1000.00"), dec("300.00"), &[], &[]);
        assert_eq!(f.balance, dec("700.00"));
    }

    #[test]
    fn balance_never_negative() {
        let f = FinanceService::derive(dec("100.00"), dec("250.00"), &[], &[]);
        assert_eq!(f.balance, Decimal::ZERO);
    }

    #[test]
    fn measurement_products_count_and_unpriced_windows_do_not() {
        // Duas janelas, uma com produto de 250 e outra sem: subtotal 250
        let measurements = vec![
            window("Sala", Some(("Rolô Blackout", "250.00"))),
            window("Quarto", None),
        ];
        let f = FinanceService::derive(dec("1000.00"), dec("0"), &measurements, &[]);
        assert_eq!(f.subtotal, dec("250.00"));
        assert_eq!(f.line_items.len(), 1);
    }

    #[test]
    fn measurement_and_selected_products_combine() {
        let measurements = vec![window("Sala", Some(("Rolô", "250.00")))];
        let products = vec![product("Bandô", "1", "150.00")];
        let f = FinanceService::derive(dec("0"), dec("100.00"), &measurements, &products);
        assert_eq!(f.subtotal, dec("400.00"));
        assert_eq!(f.balance, dec("300.00"));
    }

    #[test]
    fn recommended_deposit_is_thirty_percent() {
        assert_eq!(FinanceService::recommended_deposit(dec("1000.00")), dec("300.00"));
        assert_eq!(FinanceService::recommended_deposit(dec("333.33")), dec("100.00"));
    }

    #[test]
    fn cash_change_only_when_overpaid() {
        assert_eq!(FinanceService::cash_change(dec("750.00"), dec("700.00")), Some(dec("50.00")));
        assert_eq!(FinanceService::cash_change(dec("700.00"), dec("700.00")), None);
        assert_eq!(FinanceService::cash_change(dec("600.00"), dec("700.00")), None);
    }
}
