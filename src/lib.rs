//! Three-statement financial forecast engine
//!
//! This library provides:
//! - Historical statement loading with alias-based field resolution
//! - Assumption loading and persistence against a tabular workbook
//! - Income statement, balance sheet and cash flow projections
//! - A cached orchestrator that pushes projections back to the workbook
//! - Scenario, tornado and Monte Carlo sensitivity sweeps

pub mod assumptions;
pub mod config;
pub mod error;
pub mod historical;
pub mod model;
pub mod projection;
pub mod scenario;
pub mod workbook;

// Re-export commonly used types
pub use assumptions::{AssumptionStore, Assumptions, Driver};
pub use config::ModelConfig;
pub use error::{ModelError, Result};
pub use historical::{HistoricalDataSource, HistoricalFinancials, HistoricalStatement, StatementKind};
pub use model::FinancialModel;
pub use projection::{project, Projection};
pub use scenario::{MonteCarloConfig, MonteCarloSummary, ScenarioEngine, ScenarioResult, TornadoRow};
pub use workbook::{Anchor, CsvWorkbook, ResultsSink, Table};
