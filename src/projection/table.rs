//! Projection output structures: one row per forecast year

use crate::workbook::Table;
use serde::{Deserialize, Serialize};

/// A forecast row with a year index and a fixed set of labelled values
pub trait ProjectionRow {
    /// Column labels, in the order returned by [`ProjectionRow::values`]
    const LABELS: &'static [&'static str];

    fn year(&self) -> u32;
    fn values(&self) -> Vec<f64>;
}

/// Projected income statement for one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeRow {
    pub year: u32,
    pub revenue: f64,
    pub ebit: f64,
    pub ebt: f64,
    /// Tax expense, negative
    pub taxes: f64,
    pub net_income: f64,
}

impl ProjectionRow for IncomeRow {
    const LABELS: &'static [&'static str] = &["Revenue", "EBIT", "EBT", "Taxes", "Net Income"];

    fn year(&self) -> u32 {
        self.year
    }

    fn values(&self) -> Vec<f64> {
        vec![self.revenue, self.ebit, self.ebt, self.taxes, self.net_income]
    }
}

/// Projected balance sheet for one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceRow {
    pub year: u32,
    pub cash: f64,
    pub ppe: f64,
    pub debt: f64,
    pub equity: f64,
    pub total_assets: f64,
    pub total_liab_eq: f64,
}

impl BalanceRow {
    /// Total assets minus total liabilities and equity (no balancing plug is applied)
    pub fn imbalance(&self) -> f64 {
        self.total_assets - self.total_liab_eq
    }
}

impl ProjectionRow for BalanceRow {
    const LABELS: &'static [&'static str] = &["Cash", "PP&E", "Debt", "Equity", "Total Assets", "Total Liab+Eq"];

    fn year(&self) -> u32 {
        self.year
    }

    fn values(&self) -> Vec<f64> {
        vec![self.cash, self.ppe, self.debt, self.equity, self.total_assets, self.total_liab_eq]
    }
}

/// Projected cash flow statement for one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    pub year: u32,
    pub net_income: f64,
    /// Capital expenditure, negative
    pub capex: f64,
    pub change_in_debt: f64,
    pub free_cash_flow: f64,
    pub ending_cash: f64,
}

impl ProjectionRow for CashFlowRow {
    const LABELS: &'static [&'static str] = &["Net Income", "CapEx", "Change in Debt", "Free Cash Flow", "Ending Cash"];

    fn year(&self) -> u32 {
        self.year
    }

    fn values(&self) -> Vec<f64> {
        vec![self.net_income, self.capex, self.change_in_debt, self.free_cash_flow, self.ending_cash]
    }
}

/// Rows for years 1..=N, strictly increasing with no gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionTable<R> {
    rows: Vec<R>,
}

pub type IncomeTable = ProjectionTable<IncomeRow>;
pub type BalanceTable = ProjectionTable<BalanceRow>;
pub type CashFlowTable = ProjectionTable<CashFlowRow>;

impl<R: ProjectionRow> ProjectionTable<R> {
    /// Build from rows already indexed 1..=N
    pub(crate) fn from_rows(rows: Vec<R>) -> Self {
        debug_assert!(rows.iter().enumerate().all(|(i, r)| r.year() as usize == i + 1));
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Row for a forecast year (1-indexed)
    pub fn year(&self, year: u32) -> Option<&R> {
        if year == 0 {
            return None;
        }
        self.rows.get(year as usize - 1)
    }

    pub fn last(&self) -> Option<&R> {
        self.rows.last()
    }

    pub fn years(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render with a leading `Year` column, as written to the workbook
    pub fn to_table(&self) -> Table {
        let header = std::iter::once("Year")
            .chain(R::LABELS.iter().copied())
            .map(str::to_string)
            .collect();

        let mut table = Table::new(header);
        for row in &self.rows {
            let cells = std::iter::once(row.year().to_string())
                .chain(row.values().into_iter().map(|v| v.to_string()))
                .collect();
            table.push_row(cells);
        }
        table
    }
}
