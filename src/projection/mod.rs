//! Three-statement projection: income statement, balance sheet, cash flow
//!
//! Each stage only reads fields computed by an earlier stage, so the
//! projectors always run income -> balance -> cash flow.

mod balance;
mod cash_flow;
mod income;
mod npv;
mod table;

pub use balance::{project_balance_sheet, resolve_balance_fields, BalanceFields};
pub use cash_flow::project_cash_flow;
pub use income::project_income_statement;
pub use npv::npv;
pub use table::{
    BalanceRow, BalanceTable, CashFlowRow, CashFlowTable, IncomeRow, IncomeTable, ProjectionRow, ProjectionTable,
};

use crate::assumptions::Assumptions;
use crate::error::Result;
use crate::historical::HistoricalFinancials;
use serde::{Deserialize, Serialize};

/// The three projected statements of one run, sharing one year index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub income: IncomeTable,
    pub balance: BalanceTable,
    pub cash_flow: CashFlowTable,
}

impl Projection {
    /// NPV of free cash flow at an annual discount rate
    pub fn npv_fcf(&self, rate: f64) -> f64 {
        let fcf: Vec<f64> = self.cash_flow.rows().iter().map(|r| r.free_cash_flow).collect();
        npv(rate, &fcf)
    }

    /// Ending cash in the final forecast year
    pub fn terminal_cash(&self) -> f64 {
        self.cash_flow.last().map(|r| r.ending_cash).unwrap_or(0.0)
    }
}

/// Run the three projectors in dependency order
///
/// Pure function of its inputs: safe to call from many threads with
/// independent assumption sets.
pub fn project(history: &HistoricalFinancials, assumptions: &Assumptions, years: u32) -> Result<Projection> {
    let income = project_income_statement(&history.income, assumptions, years)?;
    let balance = project_balance_sheet(&history.balance, &income, assumptions)?;
    let cash_flow = project_cash_flow(&income, &balance, assumptions)?;

    Ok(Projection {
        income,
        balance,
        cash_flow,
    })
}
