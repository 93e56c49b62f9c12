//! Tabular persistence: tables, A1 anchors and a CSV-backed workbook
//!
//! A workbook is a directory with one `<tab>.csv` file per tab. Each tab is
//! treated as a sparse grid of string cells so several blocks can share a tab
//! (the assumptions at A1, tornado rows at A15, Monte Carlo rows at K1).

use crate::assumptions::{assumption_table, parse_assumption_rows, AssumptionStore, Assumptions, ASSUMPTIONS_TAB};
use crate::error::{ModelError, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

/// Tab names used by the model
pub const INCOME_TAB: &str = "Income Statement";
pub const BALANCE_TAB: &str = "Balance Sheet";
pub const CASH_FLOW_TAB: &str = "Cash Flow Statement";

/// Top-left cell of a block, zero-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    pub row: usize,
    pub col: usize,
}

impl Anchor {
    pub const ORIGIN: Anchor = Anchor { row: 0, col: 0 };

    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl FromStr for Anchor {
    type Err = ModelError;

    /// Parse A1 notation ("A1", "K1", "AA15")
    fn from_str(cell: &str) -> Result<Self> {
        let invalid = || ModelError::InvalidAnchor(cell.to_string());
        let cell = cell.trim();

        let split = cell.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
        let (letters, digits) = cell.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let col = letters
            .chars()
            .try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add(c.to_ascii_uppercase() as usize - 'A' as usize + 1)
            })
            .ok_or_else(invalid)?
            - 1;
        let row: usize = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(Anchor { row: row - 1, col })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.col + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        let column: String = letters.iter().rev().collect();
        write!(f, "{}{}", column, self.row + 1)
    }
}

/// A header row plus data rows, all rendered as strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>) -> Self {
        Self { header, rows: Vec::new() }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header followed by rows
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone()).chain(self.rows.iter().cloned()).collect()
    }
}

/// Destination for output tables
pub trait ResultsSink: Send + Sync {
    /// Write `table` (header first) with its top-left cell at `anchor`
    ///
    /// With `clear`, the destination is emptied first; otherwise only the
    /// cells covered by the table change.
    fn write_table(&self, destination: &str, table: &Table, anchor: Anchor, clear: bool) -> Result<()>;
}

/// Overwrite the cells of `grid` covered by `block` placed at `anchor`
pub fn place_block(grid: &mut Vec<Vec<String>>, block: &[Vec<String>], anchor: Anchor) {
    for (i, block_row) in block.iter().enumerate() {
        let r = anchor.row + i;
        if grid.len() <= r {
            grid.resize_with(r + 1, Vec::new);
        }
        let row = &mut grid[r];
        let needed = anchor.col + block_row.len();
        if row.len() < needed {
            row.resize(needed, String::new());
        }
        for (j, cell) in block_row.iter().enumerate() {
            row[anchor.col + j] = cell.clone();
        }
    }
}

/// Blank the leading rows of columns `[col, col + width)` while the first of
/// those columns is non-empty; returns how many rows were blanked
fn clear_leading_block(grid: &mut [Vec<String>], col: usize, width: usize) -> usize {
    let mut cleared = 0;
    for row in grid.iter_mut() {
        if row.get(col).map(|c| c.trim().is_empty()).unwrap_or(true) {
            break;
        }
        for cell in row.iter_mut().skip(col).take(width) {
            cell.clear();
        }
        cleared += 1;
    }
    cleared
}

/// Workbook stored as a directory of CSV tabs
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn tab_path(&self, tab: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", tab))
    }

    /// Load a tab as a grid; a tab that does not exist yet is empty
    pub fn read_grid(&self, tab: &str) -> std::result::Result<Vec<Vec<String>>, csv::Error> {
        let path = self.tab_path(tab);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut grid = Vec::new();
        for result in reader.records() {
            let record = result?;
            grid.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(grid)
    }

    fn write_grid(&self, tab: &str, grid: &[Vec<String>]) -> Result<()> {
        let sink_error = |reason: String| ModelError::SinkWrite {
            destination: tab.to_string(),
            reason,
        };

        std::fs::create_dir_all(&self.dir).map_err(|e| sink_error(e.to_string()))?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(self.tab_path(tab))
            .map_err(|e| sink_error(e.to_string()))?;

        for row in grid {
            // csv writes a zero-field record as nothing; keep blank rows as one empty cell
            if row.is_empty() {
                writer.write_record([""]).map_err(|e| sink_error(e.to_string()))?;
            } else {
                writer.write_record(row).map_err(|e| sink_error(e.to_string()))?;
            }
        }
        writer.flush().map_err(|e| sink_error(e.to_string()))
    }

    fn load_for_write(&self, tab: &str) -> Result<Vec<Vec<String>>> {
        self.read_grid(tab).map_err(|e| ModelError::SinkWrite {
            destination: tab.to_string(),
            reason: e.to_string(),
        })
    }
}

impl ResultsSink for CsvWorkbook {
    fn write_table(&self, destination: &str, table: &Table, anchor: Anchor, clear: bool) -> Result<()> {
        let mut grid = if clear { Vec::new() } else { self.load_for_write(destination)? };

        place_block(&mut grid, &table.to_grid(), anchor);
        self.write_grid(destination, &grid)?;

        info!("Wrote {} rows to '{}' at {}", table.len(), destination, anchor);
        Ok(())
    }
}

impl AssumptionStore for CsvWorkbook {
    fn read_assumptions(&self) -> Result<Assumptions> {
        let path = self.tab_path(ASSUMPTIONS_TAB);
        if !path.exists() {
            return Err(ModelError::SourceFetch {
                statement: ASSUMPTIONS_TAB.to_string(),
                reason: format!("{} not found", path.display()),
            });
        }

        let grid = self.read_grid(ASSUMPTIONS_TAB).map_err(|e| ModelError::SourceFetch {
            statement: ASSUMPTIONS_TAB.to_string(),
            reason: e.to_string(),
        })?;

        let assumptions = parse_assumption_rows(&grid)?;
        debug!("Read {} assumptions from {}", assumptions.len(), path.display());
        Ok(assumptions)
    }

    fn write_assumptions(&self, assumptions: &Assumptions) -> Result<()> {
        let mut grid = self.load_for_write(ASSUMPTIONS_TAB)?;
        clear_leading_block(&mut grid, 0, 2);
        place_block(&mut grid, &assumption_table(assumptions).to_grid(), Anchor::ORIGIN);
        self.write_grid(ASSUMPTIONS_TAB, &grid)
    }
}

/// Sink that keeps every tab in memory
#[derive(Debug, Default)]
pub struct InMemorySink {
    tabs: Mutex<HashMap<String, Vec<Vec<String>>>>,
    writes: Mutex<Vec<(String, Anchor, usize)>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of a tab
    pub fn grid(&self, tab: &str) -> Vec<Vec<String>> {
        self.tabs
            .lock()
            .ok()
            .and_then(|tabs| tabs.get(tab).cloned())
            .unwrap_or_default()
    }

    /// (destination, anchor, data rows) for every write, in order
    pub fn writes(&self) -> Vec<(String, Anchor, usize)> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl ResultsSink for InMemorySink {
    fn write_table(&self, destination: &str, table: &Table, anchor: Anchor, clear: bool) -> Result<()> {
        let poisoned = |reason: String| ModelError::SinkWrite {
            destination: destination.to_string(),
            reason,
        };

        let mut tabs = self.tabs.lock().map_err(|e| poisoned(e.to_string()))?;
        let grid = tabs.entry(destination.to_string()).or_default();
        if clear {
            grid.clear();
        }
        place_block(grid, &table.to_grid(), anchor);

        self.writes
            .lock()
            .map_err(|e| poisoned(e.to_string()))?
            .push((destination.to_string(), anchor, table.len()));
        Ok(())
    }
}
