//! Scenario engine: single scenarios, tornado sweeps and Monte Carlo sweeps
//!
//! Every scenario carries its own assumption set through the projection, so
//! nothing is re-read from the store between persisting a scenario and
//! projecting it. When scenarios are not persisted, Monte Carlo iterations
//! are evaluated in parallel.

use crate::assumptions::{Assumptions, Driver, ASSUMPTIONS_TAB};
use crate::error::{ModelError, Result};
use crate::model::FinancialModel;
use crate::projection::{project, Projection};
use crate::workbook::{Anchor, Table};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Triangular};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Points per driver in a tornado sweep
pub const TORNADO_STEPS: usize = 5;

/// Drivers swept by the tornado and their half-width in percentage points
pub const TORNADO_DRIVERS: [(Driver, f64); 2] = [(Driver::SalesGrowth, 5.0), (Driver::EbitMargin, 3.0)];

/// Tornado output block location on the Assumptions tab
pub const TORNADO_ANCHOR: Anchor = Anchor { row: 14, col: 0 };

/// Monte Carlo output block location on the Assumptions tab
pub const MONTE_CARLO_ANCHOR: Anchor = Anchor { row: 0, col: 10 };

/// Half-width of the triangular sales growth distribution, in points
pub const GROWTH_HALF_WIDTH: f64 = 5.0;

/// Standard deviation of the normal EBIT margin distribution, in points
pub const MARGIN_STD_DEV: f64 = 2.0;

/// Summary metrics of one scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub tag: String,
    pub growth: f64,
    pub margin: f64,
    pub npv_fcf: f64,
    pub terminal_cash: f64,
}

impl ScenarioResult {
    /// (Scenario, NPV_FCF, Terminal Cash) cells
    pub fn to_row(&self) -> Vec<String> {
        vec![self.tag.clone(), self.npv_fcf.to_string(), self.terminal_cash.to_string()]
    }
}

/// One (driver, value) point of a tornado sweep
#[derive(Debug, Clone, PartialEq)]
pub struct TornadoRow {
    pub driver: Driver,
    pub value: f64,
    pub npv_fcf: f64,
}

/// Monte Carlo sweep settings
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloConfig {
    pub iterations: usize,

    /// Seed for reproducible draws; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: 5000,
            seed: None,
        }
    }
}

/// Distribution statistics of NPV_FCF over a Monte Carlo sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
    pub mean_terminal_cash: f64,
}

impl MonteCarloSummary {
    pub fn from_results(results: &[ScenarioResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let mut npvs: Vec<f64> = results.iter().map(|r| r.npv_fcf).collect();
        npvs.sort_by(|a, b| a.total_cmp(b));
        let n = npvs.len() as f64;

        Some(Self {
            count: npvs.len(),
            mean: npvs.iter().sum::<f64>() / n,
            min: npvs[0],
            max: npvs[npvs.len() - 1],
            p5: percentile(&npvs, 0.05),
            p50: percentile(&npvs, 0.50),
            p95: percentile(&npvs, 0.95),
            mean_terminal_cash: results.iter().map(|r| r.terminal_cash).sum::<f64>() / n,
        })
    }
}

/// Linear-interpolated percentile of sorted values
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// `steps` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..steps)
            .map(|i| start + (end - start) * i as f64 / (steps - 1) as f64)
            .collect(),
    }
}

/// Runs perturbed assumption sets through a [`FinancialModel`]
pub struct ScenarioEngine {
    model: FinancialModel,
    persist_scenarios: bool,
}

impl ScenarioEngine {
    /// Engine that persists each scenario's assumptions before running it
    pub fn new(model: FinancialModel) -> Self {
        Self {
            model,
            persist_scenarios: true,
        }
    }

    /// Whether each scenario's assumption set is written to the store before it runs
    pub fn persist_scenarios(mut self, persist: bool) -> Self {
        self.persist_scenarios = persist;
        self
    }

    pub fn model(&self) -> &FinancialModel {
        &self.model
    }

    /// Run one scenario with explicit growth and margin over the stored assumptions
    pub fn run_single(&mut self, growth: f64, margin: f64, tag: &str) -> Result<ScenarioResult> {
        let base = self.model.read_assumptions()?;
        self.run_scenario(&base, growth, margin, tag)
    }

    /// Run one scenario with growth and margin overriding `base`
    pub fn run_scenario(&mut self, base: &Assumptions, growth: f64, margin: f64, tag: &str) -> Result<ScenarioResult> {
        let mut assumptions = base.clone();
        assumptions.set(Driver::SalesGrowth, growth);
        assumptions.set(Driver::EbitMargin, margin);

        let projection = self.evaluate(&assumptions)?;
        Ok(self.summarize(tag, &assumptions, &projection))
    }

    /// Persist (if enabled) then project one assumption set without pushing results
    fn evaluate(&mut self, assumptions: &Assumptions) -> Result<Projection> {
        if self.persist_scenarios {
            self.model.write_assumptions(assumptions)?;
        }
        self.model.run_with(assumptions, false)
    }

    fn summarize(&self, tag: &str, assumptions: &Assumptions, projection: &Projection) -> ScenarioResult {
        ScenarioResult {
            tag: tag.to_string(),
            growth: assumptions.get(Driver::SalesGrowth).unwrap_or(f64::NAN),
            margin: assumptions.get(Driver::EbitMargin).unwrap_or(f64::NAN),
            npv_fcf: projection.npv_fcf(self.model.config().discount_rate),
            terminal_cash: projection.terminal_cash(),
        }
    }

    /// One-factor-at-a-time sweep over sales growth and EBIT margin
    ///
    /// Rows come out driver by driver, values ascending.
    pub fn tornado(&mut self) -> Result<Vec<TornadoRow>> {
        let base = self.model.read_assumptions()?;
        info!("Base assumptions: {}", base);

        let mut plan = Vec::with_capacity(TORNADO_DRIVERS.len());
        for (driver, half_width) in TORNADO_DRIVERS {
            let centre = base.get(driver)?;
            let values = linspace(centre - half_width, centre + half_width, TORNADO_STEPS);
            info!("{} test values: {:?}", driver, values);
            plan.push((driver, values));
        }

        // The store is restored whether or not the sweep completed
        let swept = self.run_tornado_plan(&base, plan);
        let restored = self.restore(&base);
        let rows = swept?;
        restored?;

        self.model
            .sink()
            .write_table(ASSUMPTIONS_TAB, &tornado_table(&rows), TORNADO_ANCHOR, false)?;

        Ok(rows)
    }

    fn run_tornado_plan(&mut self, base: &Assumptions, plan: Vec<(Driver, Vec<f64>)>) -> Result<Vec<TornadoRow>> {
        let mut rows = Vec::with_capacity(TORNADO_DRIVERS.len() * TORNADO_STEPS);
        for (driver, values) in plan {
            for value in values {
                let projection = self.evaluate(&base.with(driver, value))?;
                let npv_fcf = projection.npv_fcf(self.model.config().discount_rate);
                info!("{} = {:.4}: NPV_FCF = {:.2}", driver, value, npv_fcf);
                rows.push(TornadoRow { driver, value, npv_fcf });
            }
        }
        Ok(rows)
    }

    /// Random-sampling sweep: triangular growth, normal margin
    ///
    /// Samples are drawn in iteration order before any scenario runs, so a
    /// given seed always yields the same results regardless of scheduling.
    pub fn monte_carlo(&mut self, config: &MonteCarloConfig) -> Result<Vec<ScenarioResult>> {
        if config.iterations == 0 {
            return Ok(Vec::new());
        }

        let base = self.model.read_assumptions()?;
        let samples = draw_samples(&base, config)?;
        info!("Running {} Monte Carlo scenarios", samples.len());

        let swept = if self.persist_scenarios {
            self.run_samples_sequential(&base, &samples)
        } else {
            self.run_samples_parallel(&base, &samples)
        };
        let restored = self.restore(&base);
        let results = swept?;
        restored?;

        self.model
            .sink()
            .write_table(ASSUMPTIONS_TAB, &scenario_table(&results), MONTE_CARLO_ANCHOR, false)?;

        Ok(results)
    }

    fn run_samples_sequential(&mut self, base: &Assumptions, samples: &[(f64, f64)]) -> Result<Vec<ScenarioResult>> {
        let step = (samples.len() / 10).max(1);
        let mut results = Vec::with_capacity(samples.len());

        for (i, &(growth, margin)) in samples.iter().enumerate() {
            results.push(self.run_scenario(base, growth, margin, &format!("MC_{}", i))?);
            if (i + 1) % step == 0 {
                info!("Monte Carlo progress: {}/{}", i + 1, samples.len());
            }
        }
        Ok(results)
    }

    fn run_samples_parallel(&mut self, base: &Assumptions, samples: &[(f64, f64)]) -> Result<Vec<ScenarioResult>> {
        let history = self.model.historical()?;
        let years = self.model.config().years_forecast;
        let rate = self.model.config().discount_rate;

        samples
            .par_iter()
            .enumerate()
            .map(|(i, &(growth, margin))| -> Result<ScenarioResult> {
                let mut assumptions = base.clone();
                assumptions.set(Driver::SalesGrowth, growth);
                assumptions.set(Driver::EbitMargin, margin);

                let projection = project(&history, &assumptions, years)?;
                Ok(ScenarioResult {
                    tag: format!("MC_{}", i),
                    growth,
                    margin,
                    npv_fcf: projection.npv_fcf(rate),
                    terminal_cash: projection.terminal_cash(),
                })
            })
            .collect()
    }

    /// Put the base assumptions back after a persisted sweep
    fn restore(&self, base: &Assumptions) -> Result<()> {
        if self.persist_scenarios {
            self.model.write_assumptions(base)?;
        }
        Ok(())
    }
}

/// Draw (growth, margin) pairs around the base drivers
pub fn draw_samples(base: &Assumptions, config: &MonteCarloConfig) -> Result<Vec<(f64, f64)>> {
    let growth = base.get(Driver::SalesGrowth)?;
    let margin = base.get(Driver::EbitMargin)?;

    let growth_dist = Triangular::new(growth - GROWTH_HALF_WIDTH, growth + GROWTH_HALF_WIDTH, growth)
        .map_err(|e| ModelError::InvalidConfig(format!("growth distribution: {}", e)))?;
    let margin_dist = Normal::new(margin, MARGIN_STD_DEV)
        .map_err(|e| ModelError::InvalidConfig(format!("margin distribution: {}", e)))?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    Ok((0..config.iterations)
        .map(|_| {
            let g = growth_dist.sample(&mut rng);
            let m = margin_dist.sample(&mut rng);
            (g, m)
        })
        .collect())
}

/// Render tornado rows as a (Driver, Value, NPV_FCF) table
pub fn tornado_table(rows: &[TornadoRow]) -> Table {
    let mut table = Table::new(vec!["Driver".into(), "Value".into(), "NPV_FCF".into()]);
    for row in rows {
        table.push_row(vec![row.driver.label().to_string(), row.value.to_string(), row.npv_fcf.to_string()]);
    }
    table
}

/// Render scenario results as a (Scenario, NPV_FCF, Terminal Cash) table
pub fn scenario_table(results: &[ScenarioResult]) -> Table {
    let mut table = Table::new(vec!["Scenario".into(), "NPV_FCF".into(), "Terminal Cash".into()]);
    for r in results {
        table.push_row(r.to_row());
    }
    table
}
