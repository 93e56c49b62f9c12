//! Assumption store: reads and writes the (Metric, Value) driver table

use super::Assumptions;
use crate::error::{ModelError, Result};
use crate::workbook::Table;
use std::sync::Mutex;

/// Name of the tab holding driver assumptions
pub const ASSUMPTIONS_TAB: &str = "Assumptions";

/// Column headers of the assumption table
pub const ASSUMPTION_HEADER: [&str; 2] = ["Metric", "Value"];

/// Backing store for driver assumptions
///
/// `read` is never cached; `write` replaces the whole mapping.
pub trait AssumptionStore: Send + Sync {
    fn read_assumptions(&self) -> Result<Assumptions>;
    fn write_assumptions(&self, assumptions: &Assumptions) -> Result<()>;
}

/// Parse a number the way a spreadsheet displays it ("1,250.5", "12%")
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell.trim().trim_end_matches('%').chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse().ok()
}

/// Parse a (Metric, Value) block; the first row is the header
///
/// Reading stops at the first row whose Metric cell is empty, so other blocks
/// further down the tab are not mistaken for assumptions.
pub fn parse_assumption_rows(rows: &[Vec<String>]) -> Result<Assumptions> {
    let mut assumptions = Assumptions::new();

    for row in rows.iter().skip(1) {
        let metric = row.first().map(|s| s.trim()).unwrap_or("");
        if metric.is_empty() {
            break;
        }

        let raw = row.get(1).map(String::as_str).unwrap_or("");
        let value = parse_number(raw).ok_or_else(|| ModelError::InvalidAssumption {
            metric: metric.to_string(),
            value: raw.to_string(),
        })?;

        assumptions.set_metric(metric, value);
    }

    Ok(assumptions)
}

/// Render assumptions as a (Metric, Value) table
pub fn assumption_table(assumptions: &Assumptions) -> Table {
    let mut table = Table::new(ASSUMPTION_HEADER.iter().map(|s| s.to_string()).collect());
    for (metric, value) in assumptions.iter() {
        table.push_row(vec![metric.to_string(), value.to_string()]);
    }
    table
}

/// Assumption store held in memory, recording every write
#[derive(Debug, Default)]
pub struct InMemoryAssumptionStore {
    current: Mutex<Assumptions>,
    writes: Mutex<Vec<Assumptions>>,
}

impl InMemoryAssumptionStore {
    pub fn new(assumptions: Assumptions) -> Self {
        Self {
            current: Mutex::new(assumptions),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every assumption set written so far, in write order
    pub fn writes(&self) -> Vec<Assumptions> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl AssumptionStore for InMemoryAssumptionStore {
    fn read_assumptions(&self) -> Result<Assumptions> {
        self.current
            .lock()
            .map(|a| a.clone())
            .map_err(|e| ModelError::SourceFetch {
                statement: ASSUMPTIONS_TAB.to_string(),
                reason: e.to_string(),
            })
    }

    fn write_assumptions(&self, assumptions: &Assumptions) -> Result<()> {
        let poisoned = |e: String| ModelError::SinkWrite {
            destination: ASSUMPTIONS_TAB.to_string(),
            reason: e,
        };
        *self.current.lock().map_err(|e| poisoned(e.to_string()))? = assumptions.clone();
        self.writes
            .lock()
            .map_err(|e| poisoned(e.to_string()))?
            .push(assumptions.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::Driver;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    #[test]
    fn test_parse_stops_at_blank_metric() {
        let rows = rows(&[
            &["Metric", "Value"],
            &["Sales Growth %", "8"],
            &["EBIT Margin %", " 30.5 "],
            &["", ""],
            &["Driver", "Value", "NPV_FCF"],
            &["Sales Growth %", "3", "100"],
        ]);

        let a = parse_assumption_rows(&rows).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(Driver::SalesGrowth).unwrap(), 8.0);
        assert_eq!(a.get(Driver::EbitMargin).unwrap(), 30.5);
    }

    #[test]
    fn test_parse_accepts_percent_and_separators() {
        assert_eq!(parse_number("12%"), Some(12.0));
        assert_eq!(parse_number("1,250.5"), Some(1250.5));
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn test_non_numeric_value_is_rejected() {
        let rows = rows(&[&["Metric", "Value"], &["Tax Rate %", "twenty"]]);
        let err = parse_assumption_rows(&rows).unwrap_err();
        assert!(matches!(err, ModelError::InvalidAssumption { .. }));
    }

    #[test]
    fn test_table_lists_metrics_in_order() {
        let a = Assumptions::from_pairs([("Tax Rate %", 21.0), ("Sales Growth %", 4.0)]);
        let table = assumption_table(&a);
        assert_eq!(table.header(), &["Metric".to_string(), "Value".to_string()]);
        assert_eq!(table.rows()[0], vec!["Tax Rate %".to_string(), "21".to_string()]);
        assert_eq!(table.rows()[1][0], "Sales Growth %");
    }

    #[test]
    fn test_in_memory_store_records_writes() {
        let store = InMemoryAssumptionStore::new(Assumptions::from_pairs([("Tax Rate %", 21.0)]));
        let updated = store.read_assumptions().unwrap().with(Driver::TaxRate, 25.0);
        store.write_assumptions(&updated).unwrap();

        assert_eq!(store.read_assumptions().unwrap().get(Driver::TaxRate).unwrap(), 25.0);
        assert_eq!(store.writes().len(), 1);
    }
}
