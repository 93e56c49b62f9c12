//! Historical financial statements as reported in company filings

pub mod resolver;
mod source;

pub use resolver::{resolve, resolve_optional};
pub use source::{HistoricalDataSource, HistoryCache, HistoryKey, InMemorySource, JsonDirectorySource};

use std::collections::HashMap;
use std::fmt;

/// The three statements fetched for each company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Income,
    Balance,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [StatementKind::Income, StatementKind::Balance, StatementKind::CashFlow];

    /// File stem / endpoint name used by the as-reported data source
    pub fn slug(&self) -> &'static str {
        match self {
            StatementKind::Income => "income-statement-as-reported",
            StatementKind::Balance => "balance-sheet-statement-as-reported",
            StatementKind::CashFlow => "cash-flow-statement-as-reported",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::Income => "income statement",
            StatementKind::Balance => "balance sheet",
            StatementKind::CashFlow => "cash flow statement",
        };
        f.write_str(name)
    }
}

/// One reporting period: field name to value (null values kept as `None`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Period {
    /// Period end date as reported, if the source supplied one
    pub date: Option<String>,
    values: HashMap<String, Option<f64>>,
}

impl Period {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<f64>) {
        self.values.insert(field.into(), value);
    }

    /// Builder-style insert of a non-null value
    pub fn with(mut self, field: impl Into<String>, value: f64) -> Self {
        self.insert(field, Some(value));
        self
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied().flatten()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    fn fields(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

/// An ordered sequence of periods, most recent first
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalStatement {
    kind: StatementKind,
    columns: Vec<String>,
    periods: Vec<Period>,
}

impl HistoricalStatement {
    /// Build a statement; columns are the union of period fields, in period order
    /// and sorted within each period so resolution is deterministic
    pub fn new(kind: StatementKind, periods: Vec<Period>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for period in &periods {
            let mut fields: Vec<&String> = period.fields().collect();
            fields.sort();
            for field in fields {
                if !columns.iter().any(|c| c == field) {
                    columns.push(field.clone());
                }
            }
        }

        Self {
            kind,
            columns,
            periods,
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Most recent period (index 0), the only one the projectors consume
    pub fn latest(&self) -> Option<&Period> {
        self.periods.first()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Keep at most `limit` periods
    pub fn truncate(&mut self, limit: usize) {
        self.periods.truncate(limit);
    }
}

/// Income statement, balance sheet and cash flow history for one company
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalFinancials {
    pub income: HistoricalStatement,
    pub balance: HistoricalStatement,
    pub cash_flow: HistoricalStatement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_union_of_periods() {
        let statement = HistoricalStatement::new(
            StatementKind::Income,
            vec![
                Period::new().with("revenues", 100.0),
                Period::new().with("revenues", 90.0).with("netincomeloss", 9.0),
            ],
        );

        assert_eq!(statement.columns(), &["revenues".to_string(), "netincomeloss".to_string()]);
        assert_eq!(statement.latest().and_then(|p| p.get("revenues")), Some(100.0));
    }

    #[test]
    fn test_null_values_read_as_none() {
        let mut period = Period::new();
        period.insert("revenue", None);
        assert!(period.contains("revenue"));
        assert_eq!(period.get("revenue"), None);
    }
}
