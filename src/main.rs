//! Forecast CLI
//!
//! Command-line interface for running three-statement projections and
//! sensitivity sweeps against a CSV workbook.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use three_statement_model::projection::ProjectionRow;
use three_statement_model::{
    FinancialModel, ModelConfig, MonteCarloConfig, MonteCarloSummary, Projection, ScenarioEngine,
};

/// Three-statement forecast model
#[derive(Parser)]
#[command(name = "forecast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workbook directory (one CSV file per tab)
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,

    /// Historical statements directory
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    /// Ticker symbol
    #[arg(long, global = true)]
    ticker: Option<String>,

    /// Forecast horizon in years
    #[arg(long, global = true)]
    years: Option<u32>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project the three statements and push them to the workbook
    Run {
        /// Print only; do not write the statement tabs
        #[arg(long)]
        no_push: bool,
    },

    /// Run one scenario with explicit growth and margin (percent)
    Scenario {
        #[arg(long)]
        growth: f64,

        #[arg(long)]
        margin: f64,

        #[arg(long, default_value = "scenario")]
        tag: String,
    },

    /// Sweep sales growth and EBIT margin one at a time
    Tornado,

    /// Random-sampling sweep over sales growth and EBIT margin
    MonteCarlo {
        #[arg(short, long, default_value = "5000")]
        iterations: usize,

        /// Seed for reproducible draws
        #[arg(short, long)]
        seed: Option<u64>,

        /// Do not write each scenario's assumptions (runs in parallel)
        #[arg(long)]
        no_persist: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = ModelConfig::from_env();
    if let Some(dir) = cli.workbook {
        config.workbook_dir = dir;
    }
    if let Some(dir) = cli.history {
        config.history_dir = dir;
    }
    if let Some(ticker) = cli.ticker {
        config.ticker = ticker;
    }
    if let Some(years) = cli.years {
        config.years_forecast = years;
    }
    info!("Config: {:?}", config);

    let model = FinancialModel::from_config(config).context("invalid model configuration")?;

    match cli.command {
        Commands::Run { no_push } => run(model, !no_push),
        Commands::Scenario { growth, margin, tag } => scenario(model, growth, margin, &tag),
        Commands::Tornado => tornado(model),
        Commands::MonteCarlo {
            iterations,
            seed,
            no_persist,
        } => monte_carlo(model, MonteCarloConfig { iterations, seed }, !no_persist),
    }
}

fn run(mut model: FinancialModel, push: bool) -> Result<()> {
    let projection = model.run(push).context("projection failed")?;
    print_projection(&projection);

    if push {
        println!("\nStatements written to: {}", model.config().workbook_dir.display());
    }
    println!(
        "\nNPV of FCF @ {:.1}%: {:.2}",
        model.config().discount_rate * 100.0,
        projection.npv_fcf(model.config().discount_rate)
    );
    Ok(())
}

fn scenario(model: FinancialModel, growth: f64, margin: f64, tag: &str) -> Result<()> {
    let mut engine = ScenarioEngine::new(model);
    let result = engine.run_single(growth, margin, tag).context("scenario failed")?;

    println!("Scenario: {}", result.tag);
    println!("  Sales Growth %: {:.4}", result.growth);
    println!("  EBIT Margin %:  {:.4}", result.margin);
    println!("  NPV_FCF:        {:.2}", result.npv_fcf);
    println!("  Terminal Cash:  {:.2}", result.terminal_cash);
    Ok(())
}

fn tornado(model: FinancialModel) -> Result<()> {
    let mut engine = ScenarioEngine::new(model);
    let rows = engine.tornado().context("tornado sweep failed")?;

    println!("{:<16} {:>10} {:>16}", "Driver", "Value", "NPV_FCF");
    println!("{}", "-".repeat(44));
    for row in &rows {
        println!("{:<16} {:>10.4} {:>16.2}", row.driver.label(), row.value, row.npv_fcf);
    }
    Ok(())
}

fn monte_carlo(model: FinancialModel, config: MonteCarloConfig, persist: bool) -> Result<()> {
    let mut engine = ScenarioEngine::new(model).persist_scenarios(persist);
    let results = engine.monte_carlo(&config).context("Monte Carlo sweep failed")?;

    let Some(summary) = MonteCarloSummary::from_results(&results) else {
        println!("No scenarios run");
        return Ok(());
    };

    println!("Monte Carlo Summary ({} scenarios):", summary.count);
    println!("  Mean NPV_FCF:  {:.2}", summary.mean);
    println!("  Min NPV_FCF:   {:.2}", summary.min);
    println!("  P5 NPV_FCF:    {:.2}", summary.p5);
    println!("  P50 NPV_FCF:   {:.2}", summary.p50);
    println!("  P95 NPV_FCF:   {:.2}", summary.p95);
    println!("  Max NPV_FCF:   {:.2}", summary.max);
    println!("  Mean Terminal Cash: {:.2}", summary.mean_terminal_cash);
    Ok(())
}

fn print_projection(projection: &Projection) {
    print_statement("Income Statement", projection.income.rows());
    print_statement("Balance Sheet", projection.balance.rows());
    print_statement("Cash Flow Statement", projection.cash_flow.rows());
}

fn print_statement<R: ProjectionRow>(title: &str, rows: &[R]) {
    println!("\n{}:", title);
    print!("{:>5}", "Year");
    for label in R::LABELS {
        print!(" {:>16}", label);
    }
    println!();
    println!("{}", "-".repeat(5 + 17 * R::LABELS.len()));

    for row in rows {
        print!("{:>5}", row.year());
        for value in row.values() {
            print!(" {:>16.2}", value);
        }
        println!();
    }
}
