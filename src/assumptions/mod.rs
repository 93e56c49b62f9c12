//! Driver assumptions controlling the forecast

pub mod loader;

pub use loader::{
    assumption_table, parse_assumption_rows, parse_number, AssumptionStore, InMemoryAssumptionStore,
    ASSUMPTIONS_TAB,
};

use crate::error::{ModelError, Result};
use std::fmt;

/// The driver assumptions every projection needs, all expressed in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    SalesGrowth,
    EbitMargin,
    TaxRate,
    CashPctOfSales,
    CapexPctOfSales,
    TargetDebtPct,
}

impl Driver {
    pub const ALL: [Driver; 6] = [
        Driver::SalesGrowth,
        Driver::EbitMargin,
        Driver::TaxRate,
        Driver::CashPctOfSales,
        Driver::CapexPctOfSales,
        Driver::TargetDebtPct,
    ];

    /// Metric name as it appears in the Assumptions tab
    pub fn label(&self) -> &'static str {
        match self {
            Driver::SalesGrowth => "Sales Growth %",
            Driver::EbitMargin => "EBIT Margin %",
            Driver::TaxRate => "Tax Rate %",
            Driver::CashPctOfSales => "Cash % of Sales",
            Driver::CapexPctOfSales => "Capex % of Sales",
            Driver::TargetDebtPct => "Target Debt %",
        }
    }

    pub fn from_label(label: &str) -> Option<Driver> {
        Driver::ALL.iter().copied().find(|d| d.label() == label.trim())
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered metric -> value mapping, values in percent
///
/// Unknown metrics are carried through untouched so a read-modify-write
/// cycle preserves whatever else lives in the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assumptions {
    entries: Vec<(String, f64)>,
}

impl Assumptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (metric, value) pairs; a repeated metric keeps its last value
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut assumptions = Self::new();
        for (metric, value) in pairs {
            assumptions.set_metric(metric, value);
        }
        assumptions
    }

    /// Value of a driver in percent
    pub fn get(&self, driver: Driver) -> Result<f64> {
        self.metric(driver.label()).ok_or_else(|| ModelError::MissingAssumption {
            driver: driver.label().to_string(),
        })
    }

    /// Value of a driver as a decimal fraction (percent / 100)
    pub fn rate(&self, driver: Driver) -> Result<f64> {
        Ok(self.get(driver)? / 100.0)
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(m, _)| m == name).map(|(_, v)| *v)
    }

    pub fn set(&mut self, driver: Driver, value: f64) {
        self.set_metric(driver.label(), value);
    }

    /// Copy with one driver replaced
    pub fn with(&self, driver: Driver, value: f64) -> Self {
        let mut copy = self.clone();
        copy.set(driver, value);
        copy
    }

    pub fn set_metric(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(m, _)| *m == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Check that all six drivers are present
    pub fn validate(&self) -> Result<()> {
        for driver in Driver::ALL {
            self.get(driver)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(m, v)| (m.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Assumptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (metric, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", metric, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn base_assumptions() -> Assumptions {
        Assumptions::from_pairs([
            ("Sales Growth %", 10.0),
            ("EBIT Margin %", 20.0),
            ("Tax Rate %", 25.0),
            ("Cash % of Sales", 10.0),
            ("Capex % of Sales", 5.0),
            ("Target Debt %", 50.0),
        ])
    }

    #[test]
    fn test_rate_converts_percent() {
        let a = base_assumptions();
        assert!((a.rate(Driver::TaxRate).unwrap() - 0.25).abs() < 1e-12);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_missing_driver_reports_label() {
        let a = Assumptions::from_pairs([("Sales Growth %", 5.0)]);
        match a.get(Driver::EbitMargin) {
            Err(ModelError::MissingAssumption { driver }) => assert_eq!(driver, "EBIT Margin %"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_with_leaves_base_untouched_and_keeps_order() {
        let base = base_assumptions();
        let bumped = base.with(Driver::SalesGrowth, 15.0);

        assert_eq!(base.get(Driver::SalesGrowth).unwrap(), 10.0);
        assert_eq!(bumped.get(Driver::SalesGrowth).unwrap(), 15.0);
        let order: Vec<&str> = bumped.iter().map(|(m, _)| m).collect();
        assert_eq!(order[0], "Sales Growth %");
        assert_eq!(bumped.len(), 6);
    }

    #[test]
    fn test_driver_label_round_trip() {
        for driver in Driver::ALL {
            assert_eq!(Driver::from_label(driver.label()), Some(driver));
        }
        assert_eq!(Driver::from_label("WACC %"), None);
    }
}
