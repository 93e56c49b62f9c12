//! Historical data sources and the per-model fetch cache

use super::{HistoricalFinancials, HistoricalStatement, Period, StatementKind};
use crate::error::{ModelError, Result};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Parameters of one historical fetch cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub ticker: String,
    pub period: String,
    pub limit: usize,
}

impl HistoryKey {
    pub fn new(ticker: impl Into<String>, period: impl Into<String>, limit: usize) -> Self {
        Self {
            ticker: ticker.into(),
            period: period.into(),
            limit,
        }
    }
}

/// Provider of as-reported statements
///
/// Implementations return periods most recent first, at most `key.limit` rows.
pub trait HistoricalDataSource: Send + Sync {
    fn fetch(&self, kind: StatementKind, key: &HistoryKey) -> Result<HistoricalStatement>;
}

/// Reads statements saved from the financial-data API as JSON arrays
///
/// Layout: `<root>/<TICKER>/<period>/<statement-slug>.json`
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn statement_path(&self, kind: StatementKind, key: &HistoryKey) -> PathBuf {
        self.root
            .join(key.ticker.to_uppercase())
            .join(&key.period)
            .join(format!("{}.json", kind.slug()))
    }

    fn load(&self, path: &Path) -> std::result::Result<Vec<Period>, String> {
        let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let json: Value = serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?;
        parse_periods(&json)
    }
}

impl HistoricalDataSource for JsonDirectorySource {
    fn fetch(&self, kind: StatementKind, key: &HistoryKey) -> Result<HistoricalStatement> {
        let path = self.statement_path(kind, key);
        debug!("Loading {} from {}", kind, path.display());

        let periods = self.load(&path).map_err(|reason| ModelError::SourceFetch {
            statement: kind.to_string(),
            reason,
        })?;

        let mut statement = HistoricalStatement::new(kind, periods);
        statement.truncate(key.limit);
        Ok(statement)
    }
}

/// Convert an API response body (array of period objects) into periods
///
/// Numbers become values, nulls become `None`, the `date` string is kept and
/// every other non-numeric field (symbol, period, links) is dropped.
pub(crate) fn parse_periods(json: &Value) -> std::result::Result<Vec<Period>, String> {
    let rows = json
        .as_array()
        .ok_or_else(|| "expected a JSON array of periods".to_string())?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let object = row
                .as_object()
                .ok_or_else(|| format!("period {} is not a JSON object", i))?;

            let mut period = Period::new();
            for (field, value) in object {
                match value {
                    Value::Number(n) => period.insert(field.as_str(), n.as_f64()),
                    Value::Null => period.insert(field.as_str(), None),
                    Value::String(s) if field == "date" => period.date = Some(s.clone()),
                    _ => {}
                }
            }
            Ok(period)
        })
        .collect()
}

/// Fixed statements held in memory, counting fetch calls
#[derive(Debug, Default)]
pub struct InMemorySource {
    statements: HashMap<StatementKind, Vec<Period>>,
    fetches: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statement(mut self, kind: StatementKind, periods: Vec<Period>) -> Self {
        self.statements.insert(kind, periods);
        self
    }

    /// Number of statement fetches served so far
    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl HistoricalDataSource for InMemorySource {
    fn fetch(&self, kind: StatementKind, key: &HistoryKey) -> Result<HistoricalStatement> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let periods = self.statements.get(&kind).ok_or_else(|| ModelError::SourceFetch {
            statement: kind.to_string(),
            reason: format!("no {} loaded for {}", kind, key.ticker),
        })?;

        let mut statement = HistoricalStatement::new(kind, periods.clone());
        statement.truncate(key.limit);
        Ok(statement)
    }
}

/// Memoizes historical fetch cycles by explicit key
///
/// Entries live until [`HistoryCache::reset`] is called.
#[derive(Debug, Default)]
pub struct HistoryCache {
    entries: HashMap<HistoryKey, Arc<HistoricalFinancials>>,

    /// Statistics
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached financials for `key`, fetching all three statements on a miss
    pub fn get_or_fetch(
        &mut self,
        source: &dyn HistoricalDataSource,
        key: &HistoryKey,
    ) -> Result<Arc<HistoricalFinancials>> {
        if let Some(cached) = self.entries.get(key) {
            self.cache_hits += 1;
            debug!("History cache hit for {} ({})", key.ticker, key.period);
            return Ok(Arc::clone(cached));
        }

        self.cache_misses += 1;
        info!(
            "Fetching {} history for {} (limit {})",
            key.period, key.ticker, key.limit
        );

        let financials = Arc::new(HistoricalFinancials {
            income: source.fetch(StatementKind::Income, key)?,
            balance: source.fetch(StatementKind::Balance, key)?,
            cash_flow: source.fetch(StatementKind::CashFlow, key)?,
        });

        self.entries.insert(key.clone(), Arc::clone(&financials));
        Ok(financials)
    }

    /// Drop all cached entries and statistics
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    /// Number of fetch cycles issued against the source
    pub fn fetch_count(&self) -> u64 {
        self.cache_misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_source() -> InMemorySource {
        InMemorySource::new()
            .with_statement(
                StatementKind::Income,
                vec![Period::new().with("revenues", 1000.0), Period::new().with("revenues", 900.0)],
            )
            .with_statement(StatementKind::Balance, vec![Period::new().with("cash", 10.0)])
            .with_statement(StatementKind::CashFlow, vec![Period::new()])
    }

    #[test]
    fn test_parse_periods_keeps_numbers_nulls_and_date() {
        let json: Value = serde_json::from_str(
            r#"[{"date": "2024-09-28", "symbol": "AAPL", "revenues": 391035000000, "netincomeloss": null}]"#,
        )
        .unwrap();

        let periods = parse_periods(&json).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].date.as_deref(), Some("2024-09-28"));
        assert_eq!(periods[0].get("revenues"), Some(391035000000.0));
        assert!(periods[0].contains("netincomeloss"));
        assert!(!periods[0].contains("symbol"));
    }

    #[test]
    fn test_parse_periods_rejects_non_array() {
        let json: Value = serde_json::from_str(r#"{"error": "Invalid API KEY"}"#).unwrap();
        assert!(parse_periods(&json).is_err());
    }

    #[test]
    fn test_cache_fetches_once_per_key() {
        let source = sample_source();
        let mut cache = HistoryCache::new();
        let key = HistoryKey::new("AAPL", "annual", 5);

        let first = cache.get_or_fetch(&source, &key).unwrap();
        let second = cache.get_or_fetch(&source, &key).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.fetch_count(), 1);
        assert_eq!(cache.cache_hits, 1);
        assert_eq!(source.fetch_calls(), 3);
    }

    #[test]
    fn test_cache_reset_forces_refetch() {
        let source = sample_source();
        let mut cache = HistoryCache::new();
        let key = HistoryKey::new("AAPL", "annual", 5);

        cache.get_or_fetch(&source, &key).unwrap();
        cache.reset();
        assert!(cache.is_empty());

        cache.get_or_fetch(&source, &key).unwrap();
        assert_eq!(source.fetch_calls(), 6);
    }

    #[test]
    fn test_limit_truncates_periods() {
        let source = sample_source();
        let key = HistoryKey::new("AAPL", "annual", 1);
        let statement = source.fetch(StatementKind::Income, &key).unwrap();
        assert_eq!(statement.len(), 1);
    }

    #[test]
    fn test_missing_statement_is_fetch_error() {
        let source = InMemorySource::new();
        let mut cache = HistoryCache::new();
        let key = HistoryKey::new("AAPL", "annual", 5);

        let err = cache.get_or_fetch(&source, &key).unwrap_err();
        assert!(matches!(err, ModelError::SourceFetch { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_json_directory_source_reads_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let statement_dir = dir.path().join("MSFT").join("annual");
        fs::create_dir_all(&statement_dir).unwrap();

        let mut file = fs::File::create(statement_dir.join("income-statement-as-reported.json")).unwrap();
        write!(file, r#"[{{"date": "2024-06-30", "revenues": 245122000000}}]"#).unwrap();

        let source = JsonDirectorySource::new(dir.path());
        let key = HistoryKey::new("msft", "annual", 5);
        let statement = source.fetch(StatementKind::Income, &key).unwrap();
        assert_eq!(statement.latest().and_then(|p| p.get("revenues")), Some(245122000000.0));

        let missing = source.fetch(StatementKind::Balance, &key);
        assert!(matches!(missing, Err(ModelError::SourceFetch { .. })));
    }
}
