//! Model orchestrator: history -> assumptions -> projections -> optional push

use crate::assumptions::{AssumptionStore, Assumptions};
use crate::config::ModelConfig;
use crate::error::Result;
use crate::historical::{HistoricalDataSource, HistoricalFinancials, HistoryCache, HistoryKey, JsonDirectorySource};
use crate::projection::{project, Projection};
use crate::workbook::{Anchor, CsvWorkbook, ResultsSink, BALANCE_TAB, CASH_FLOW_TAB, INCOME_TAB};
use log::{debug, info};
use std::sync::Arc;

/// Runs the three-statement forecast against its collaborators
///
/// Historical statements are fetched once per [`HistoryKey`] and reused for
/// the life of the model; assumptions are re-read on every run.
pub struct FinancialModel {
    config: ModelConfig,
    source: Arc<dyn HistoricalDataSource>,
    store: Arc<dyn AssumptionStore>,
    sink: Arc<dyn ResultsSink>,
    cache: HistoryCache,
}

impl FinancialModel {
    pub fn new(
        config: ModelConfig,
        source: Arc<dyn HistoricalDataSource>,
        store: Arc<dyn AssumptionStore>,
        sink: Arc<dyn ResultsSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            store,
            sink,
            cache: HistoryCache::new(),
        })
    }

    /// Model backed by JSON history files and a CSV workbook from `config`
    pub fn from_config(config: ModelConfig) -> Result<Self> {
        let source = Arc::new(JsonDirectorySource::new(&config.history_dir));
        let workbook = Arc::new(CsvWorkbook::new(&config.workbook_dir));
        Self::new(config, source, workbook.clone(), workbook)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    pub fn sink(&self) -> &dyn ResultsSink {
        self.sink.as_ref()
    }

    /// Forget cached history so the next run fetches again
    pub fn reset_cache(&mut self) {
        self.cache.reset();
    }

    /// Fetch key: the forecast horizon doubles as the row limit
    pub fn history_key(&self) -> HistoryKey {
        HistoryKey::new(
            self.config.ticker.clone(),
            self.config.period.clone(),
            self.config.years_forecast as usize,
        )
    }

    pub fn historical(&mut self) -> Result<Arc<HistoricalFinancials>> {
        let key = self.history_key();
        self.cache.get_or_fetch(self.source.as_ref(), &key)
    }

    pub fn read_assumptions(&self) -> Result<Assumptions> {
        self.store.read_assumptions()
    }

    pub fn write_assumptions(&self, assumptions: &Assumptions) -> Result<()> {
        self.store.write_assumptions(assumptions)
    }

    /// Full run using the assumptions currently in the store
    pub fn run(&mut self, push_results: bool) -> Result<Projection> {
        let history = self.historical()?;
        let assumptions = self.read_assumptions()?;
        debug!("Assumptions: {}", assumptions);

        self.finish(&history, &assumptions, push_results)
    }

    /// Full run with an explicit assumption set (the store is not read)
    pub fn run_with(&mut self, assumptions: &Assumptions, push_results: bool) -> Result<Projection> {
        let history = self.historical()?;
        self.finish(&history, assumptions, push_results)
    }

    fn finish(
        &self,
        history: &HistoricalFinancials,
        assumptions: &Assumptions,
        push_results: bool,
    ) -> Result<Projection> {
        let projection = project(history, assumptions, self.config.years_forecast)?;

        if push_results {
            self.push(&projection)?;
        }

        Ok(projection)
    }

    /// Write each statement to its tab, replacing previous contents
    pub fn push(&self, projection: &Projection) -> Result<()> {
        self.sink.write_table(INCOME_TAB, &projection.income.to_table(), Anchor::ORIGIN, true)?;
        self.sink.write_table(BALANCE_TAB, &projection.balance.to_table(), Anchor::ORIGIN, true)?;
        self.sink.write_table(CASH_FLOW_TAB, &projection.cash_flow.to_table(), Anchor::ORIGIN, true)?;
        info!("Pushed {}-year projection for {}", projection.income.years(), self.config.ticker);
        Ok(())
    }
}
