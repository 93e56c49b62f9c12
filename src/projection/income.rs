//! Income statement projection

use super::table::{IncomeRow, IncomeTable};
use crate::assumptions::{Assumptions, Driver};
use crate::error::{ModelError, Result};
use crate::historical::resolver::{NET_INCOME_ALIASES, REVENUE_ALIASES};
use crate::historical::{resolve, HistoricalStatement};
use log::debug;

/// Project revenue, EBIT, taxes and net income for years 1..=`years`
///
/// Revenue compounds from the latest reported revenue at the sales growth
/// driver. No interest expense is modelled, so EBT equals EBIT. Net income is
/// resolved from the history only to confirm the filing is usable.
pub fn project_income_statement(
    history: &HistoricalStatement,
    assumptions: &Assumptions,
    years: u32,
) -> Result<IncomeTable> {
    if years == 0 {
        return Err(ModelError::InvalidConfig("forecast horizon must be at least one year".to_string()));
    }

    let revenue_field = resolve(history.columns(), REVENUE_ALIASES)?;
    let net_income_field = resolve(history.columns(), NET_INCOME_ALIASES)?;
    debug!("Income anchors: revenue={}, net income={}", revenue_field, net_income_field);

    let growth = assumptions.rate(Driver::SalesGrowth)?;
    let margin = assumptions.rate(Driver::EbitMargin)?;
    let tax_rate = assumptions.rate(Driver::TaxRate)?;

    // A null latest revenue leaves nothing to compound from
    let revenue0 = history
        .latest()
        .and_then(|period| period.get(&revenue_field))
        .ok_or_else(|| ModelError::UnresolvedField {
            candidates: vec![revenue_field.clone()],
            available: history.columns().to_vec(),
        })?;

    let rows = (1..=years)
        .map(|year| {
            let revenue = revenue0 * (1.0 + growth).powi(year as i32);
            let ebit = revenue * margin;
            let ebt = ebit;
            let taxes = -ebt * tax_rate;

            IncomeRow {
                year,
                revenue,
                ebit,
                ebt,
                taxes,
                net_income: ebt + taxes,
            }
        })
        .collect();

    Ok(IncomeTable::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::tests::base_assumptions;
    use crate::historical::{Period, StatementKind};
    use approx::assert_relative_eq;

    fn history(revenue_field: &str, revenue: f64) -> HistoricalStatement {
        HistoricalStatement::new(
            StatementKind::Income,
            vec![Period::new().with(revenue_field, revenue).with("NetIncomeLoss", 150.0)],
        )
    }

    #[test]
    fn test_two_year_projection() {
        let table = project_income_statement(&history("revenues", 1000.0), &base_assumptions(), 2).unwrap();
        assert_eq!(table.years(), 2);

        let y1 = table.year(1).unwrap();
        assert_relative_eq!(y1.revenue, 1100.0, epsilon = 1e-9);
        assert_relative_eq!(y1.ebit, 220.0, epsilon = 1e-9);
        assert_relative_eq!(y1.ebt, 220.0, epsilon = 1e-9);
        assert_relative_eq!(y1.taxes, -55.0, epsilon = 1e-9);
        assert_relative_eq!(y1.net_income, 165.0, epsilon = 1e-9);

        let y2 = table.year(2).unwrap();
        assert_relative_eq!(y2.revenue, 1210.0, epsilon = 1e-9);
        assert_relative_eq!(y2.ebit, 242.0, epsilon = 1e-9);
        assert_relative_eq!(y2.taxes, -60.5, epsilon = 1e-9);
        assert_relative_eq!(y2.net_income, 181.5, epsilon = 1e-9);
    }

    #[test]
    fn test_only_latest_period_is_used() {
        let statement = HistoricalStatement::new(
            StatementKind::Income,
            vec![
                Period::new().with("Revenue", 500.0).with("netincome", 1.0),
                Period::new().with("Revenue", 9999.0).with("netincome", 1.0),
            ],
        );
        let table = project_income_statement(&statement, &base_assumptions(), 1).unwrap();
        assert_relative_eq!(table.year(1).unwrap().revenue, 550.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_revenue_field() {
        let statement = HistoricalStatement::new(StatementKind::Income, vec![Period::new().with("netincome", 1.0)]);
        let err = project_income_statement(&statement, &base_assumptions(), 3).unwrap_err();
        assert!(matches!(err, ModelError::UnresolvedField { .. }));
    }

    #[test]
    fn test_missing_net_income_field() {
        let statement = HistoricalStatement::new(StatementKind::Income, vec![Period::new().with("revenue", 1.0)]);
        let err = project_income_statement(&statement, &base_assumptions(), 3).unwrap_err();
        match err {
            ModelError::UnresolvedField { candidates, .. } => assert_eq!(candidates[0], "netincome"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_driver() {
        let assumptions = Assumptions::from_pairs([("Sales Growth %", 5.0), ("EBIT Margin %", 10.0)]);
        let err = project_income_statement(&history("revenue", 100.0), &assumptions, 1).unwrap_err();
        assert_eq!(err, ModelError::MissingAssumption { driver: "Tax Rate %".to_string() });
    }

    #[test]
    fn test_null_latest_revenue_is_unresolved() {
        let mut period = Period::new().with("netincome", 1.0);
        period.insert("revenue", None);
        let statement = HistoricalStatement::new(StatementKind::Income, vec![period]);
        assert!(project_income_statement(&statement, &base_assumptions(), 1).is_err());
    }
}
