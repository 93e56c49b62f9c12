//! Balance sheet projection

use super::table::{BalanceRow, BalanceTable, IncomeTable};
use crate::assumptions::{Assumptions, Driver};
use crate::error::Result;
use crate::historical::resolver::{CASH_ALIASES, DEBT_ALIASES, EQUITY_ALIASES, PPE_ALIASES};
use crate::historical::{resolve, resolve_optional, HistoricalStatement};
use log::debug;

/// Historical balance sheet fields located in the filing
///
/// Cash and PP&E must exist; debt and equity are optional because many
/// filings do not report them under a canonical name.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceFields {
    pub cash: String,
    pub ppe: String,
    pub debt: Option<String>,
    pub equity: Option<String>,
}

/// Locate the balance sheet anchor fields
pub fn resolve_balance_fields(history: &HistoricalStatement) -> Result<BalanceFields> {
    let cash = resolve(history.columns(), CASH_ALIASES)?;
    let ppe = resolve(history.columns(), PPE_ALIASES)?;

    let debt = resolve_optional(history.columns(), DEBT_ALIASES);
    if debt.is_none() {
        debug!("Debt field unavailable in balance sheet history");
    }
    let equity = resolve_optional(history.columns(), EQUITY_ALIASES);
    if equity.is_none() {
        debug!("Equity field unavailable in balance sheet history");
    }

    Ok(BalanceFields { cash, ppe, debt, equity })
}

/// Project cash, PP&E, debt and equity from the income projection
///
/// The history is only checked for usable fields; the forecast itself is
/// driven entirely by the assumptions and projected revenue. Equity is the
/// running total of projected net income. Totals are reported as computed,
/// with no balancing item.
pub fn project_balance_sheet(
    history: &HistoricalStatement,
    income: &IncomeTable,
    assumptions: &Assumptions,
) -> Result<BalanceTable> {
    let fields = resolve_balance_fields(history)?;
    debug!("Balance anchors: {:?}", fields);

    let cash_pct = assumptions.rate(Driver::CashPctOfSales)?;
    let capex_pct = assumptions.rate(Driver::CapexPctOfSales)?;
    let target_debt = assumptions.rate(Driver::TargetDebtPct)?;

    let mut equity = 0.0;
    let rows = income
        .rows()
        .iter()
        .map(|is| {
            let cash = cash_pct * is.revenue;
            let ppe = capex_pct * is.revenue;
            let debt = target_debt * ppe;
            equity += is.net_income;

            BalanceRow {
                year: is.year,
                cash,
                ppe,
                debt,
                equity,
                total_assets: cash + ppe,
                total_liab_eq: debt + equity,
            }
        })
        .collect();

    Ok(BalanceTable::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::tests::base_assumptions;
    use crate::error::ModelError;
    use crate::historical::{Period, StatementKind};
    use crate::projection::table::IncomeRow;
    use approx::assert_relative_eq;

    fn balance_history(fields: &[&str]) -> HistoricalStatement {
        let period = fields.iter().fold(Period::new(), |p, f| p.with(*f, 1.0));
        HistoricalStatement::new(StatementKind::Balance, vec![period])
    }

    fn income(net_incomes: &[f64]) -> IncomeTable {
        IncomeTable::from_rows(
            net_incomes
                .iter()
                .enumerate()
                .map(|(i, &ni)| IncomeRow {
                    year: i as u32 + 1,
                    revenue: 1100.0,
                    ebit: 220.0,
                    ebt: 220.0,
                    taxes: -55.0,
                    net_income: ni,
                })
                .collect(),
        )
    }

    #[test]
    fn test_year_one_balance() {
        let history = balance_history(&["cashandcashequivalents", "propertyplantandequipmentnet"]);
        let table = project_balance_sheet(&history, &income(&[165.0]), &base_assumptions()).unwrap();

        let y1 = table.year(1).unwrap();
        assert_relative_eq!(y1.cash, 110.0, epsilon = 1e-9);
        assert_relative_eq!(y1.ppe, 55.0, epsilon = 1e-9);
        assert_relative_eq!(y1.debt, 27.5, epsilon = 1e-9);
        assert_relative_eq!(y1.equity, 165.0, epsilon = 1e-9);
        assert_relative_eq!(y1.total_assets, 165.0, epsilon = 1e-9);
        assert_relative_eq!(y1.total_liab_eq, 192.5, epsilon = 1e-9);
        assert_relative_eq!(y1.imbalance(), -27.5, epsilon = 1e-9);
    }

    #[test]
    fn test_equity_is_cumulative_and_non_decreasing() {
        let history = balance_history(&["cash", "propertyplantandequipment"]);
        let table = project_balance_sheet(&history, &income(&[10.0, 0.0, 5.0, 20.0]), &base_assumptions()).unwrap();

        let equity: Vec<f64> = table.rows().iter().map(|r| r.equity).collect();
        assert_eq!(equity, vec![10.0, 10.0, 15.0, 35.0]);
        assert!(equity.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_missing_debt_and_equity_tolerated() {
        let history = balance_history(&["cash", "propertyplantandequipment"]);
        let fields = resolve_balance_fields(&history).unwrap();
        assert_eq!(fields.debt, None);
        assert_eq!(fields.equity, None);
        assert!(project_balance_sheet(&history, &income(&[1.0]), &base_assumptions()).is_ok());
    }

    #[test]
    fn test_optional_fields_resolved_when_present() {
        let history = balance_history(&["cash", "propertyplantandequipment", "LongTermDebt", "StockholdersEquity"]);
        let fields = resolve_balance_fields(&history).unwrap();
        assert_eq!(fields.debt.as_deref(), Some("LongTermDebt"));
        assert_eq!(fields.equity.as_deref(), Some("StockholdersEquity"));
    }

    #[test]
    fn test_missing_ppe_is_fatal() {
        let history = balance_history(&["cash", "totaldebt"]);
        let err = project_balance_sheet(&history, &income(&[1.0]), &base_assumptions()).unwrap_err();
        assert!(matches!(err, ModelError::UnresolvedField { .. }));
    }

    #[test]
    fn test_years_follow_income_index() {
        let history = balance_history(&["cash", "propertyplantandequipment"]);
        let table = project_balance_sheet(&history, &income(&[1.0, 2.0, 3.0]), &base_assumptions()).unwrap();
        let years: Vec<u32> = table.rows().iter().map(|r| r.year).collect();
        assert_eq!(years, vec![1, 2, 3]);
    }
}
