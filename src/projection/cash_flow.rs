//! Cash flow statement projection

use super::table::{BalanceTable, CashFlowRow, CashFlowTable, IncomeTable};
use crate::assumptions::{Assumptions, Driver};
use crate::error::{ModelError, Result};

/// Derive free cash flow and ending cash from the income and balance projections
///
/// Change in debt for year 1 is measured against zero opening debt.
pub fn project_cash_flow(
    income: &IncomeTable,
    balance: &BalanceTable,
    assumptions: &Assumptions,
) -> Result<CashFlowTable> {
    if income.years() != balance.years() {
        return Err(ModelError::InvalidConfig(format!(
            "income projection has {} years but balance projection has {}",
            income.years(),
            balance.years()
        )));
    }

    let capex_pct = assumptions.rate(Driver::CapexPctOfSales)?;

    let mut prior_debt = 0.0;
    let rows = income
        .rows()
        .iter()
        .zip(balance.rows())
        .map(|(is, bs)| {
            let capex = -capex_pct * is.revenue;
            let change_in_debt = bs.debt - prior_debt;
            prior_debt = bs.debt;

            CashFlowRow {
                year: is.year,
                net_income: is.net_income,
                capex,
                change_in_debt,
                free_cash_flow: is.net_income + capex + change_in_debt,
                ending_cash: bs.cash,
            }
        })
        .collect();

    Ok(CashFlowTable::from_rows(rows))
}
