//! AlloyMind command-line entry point
//!
//! ```text
//! alloymind serve [--addr HOST:PORT] [--models-dir DIR]
//! alloymind predict --grade G [--furnace F] --composition C=3.5,Si=2.5,... [--json]
//! alloymind targets <GRADE>
//! alloymind compare <GRADE> <GRADE>
//! alloymind grades
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use alloymind::api::{create_app, ApiState};
use alloymind::config::{self, OptimizerConfig};
use alloymind::ensemble::ModelRegistry;
use alloymind::{
    Composition, CompositionOptimizer, ElementSymbol, OptimizationReport,
    OptimizationRequest,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "alloymind")]
#[command(about = "AlloyMind element configuration optimizer")]
#[command(version)]
struct CliArgs {
    /// Configuration file (overrides ALLOYMIND_CONFIG and ./alloymind.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the HTTP API
    Serve {
        /// Override the server address (default from config: "0.0.0.0:8000")
        #[arg(short, long, value_name = "HOST:PORT")]
        addr: Option<String>,
        /// Override the model bundle directory
        #[arg(long, value_name = "DIR")]
        models_dir: Option<PathBuf>,
    },

    /// Optimize one composition and print the report
    Predict {
        #[arg(long)]
        grade: String,
        #[arg(long, default_value = "F01")]
        furnace: String,
        /// Measured composition, e.g. `C=3.5,Si=2.5,Mn=0.2,P=0.05,S=0.01,Cu=0.3,Mg=0.045`
        #[arg(long)]
        composition: String,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        #[arg(long, value_name = "DIR")]
        models_dir: Option<PathBuf>,
    },

    /// Show the target composition of a grade
    Targets { grade: String },

    /// Compare the targets of two grades
    Compare { left: String, right: String },

    /// List supported grades
    Grades,
}

// ============================================================================
// Setup
// ============================================================================

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<OptimizerConfig> {
    match path {
        Some(p) => OptimizerConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(OptimizerConfig::load()),
    }
}

/// Load the bundles behind `keys` and build the optimizer.
fn build_optimizer<'a>(
    config: &OptimizerConfig,
    models_dir: Option<PathBuf>,
    keys: impl IntoIterator<Item = &'a str>,
) -> Result<CompositionOptimizer> {
    let mut config = config.clone();
    if let Some(dir) = models_dir {
        config.models.dir = dir;
    }
    let loader = config.bundle_loader();
    let registry = ModelRegistry::builder().load_all(&loader, keys).build();
    info!(
        dir = %config.models.dir.display(),
        loaded = registry.len(),
        "Model registry ready"
    );
    CompositionOptimizer::from_config(&config, Arc::new(registry)).context("Invalid configuration")
}

fn parse_composition(text: &str) -> Result<Composition> {
    let mut values = BTreeMap::new();
    for pair in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (symbol, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected ELEMENT=VALUE, got '{pair}'"))?;
        let element: ElementSymbol = symbol.trim().parse()?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {element}: '{value}'"))?;
        if values.insert(element, value).is_some() {
            anyhow::bail!("{element} given more than once");
        }
    }
    Composition::try_from_map(values).map_err(|e| anyhow::anyhow!("Incomplete composition: {e}"))
}

// ============================================================================
// Commands
// ============================================================================

async fn serve(addr: Option<String>, models_dir: Option<PathBuf>) -> Result<()> {
    let config = config::get();
    let catalog = config.build_catalog()?;
    let optimizer = build_optimizer(config, models_dir, catalog.model_keys())?;
    if optimizer.registry().is_empty() {
        tracing::warn!("No model bundles loaded; /predict will answer 503 until bundles are provided");
    }

    let server_addr = addr.unwrap_or_else(|| config.server.addr.clone());
    let app = create_app(ApiState::new(Arc::new(optimizer)));
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {server_addr}"))?;

    info!("HTTP server listening on {}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
        })
        .await
        .context("HTTP server error")?;

    info!("Graceful shutdown complete");
    Ok(())
}

fn predict(
    grade: String,
    furnace: String,
    composition: &str,
    json: bool,
    models_dir: Option<PathBuf>,
) -> Result<()> {
    let config = config::get();
    let composition = parse_composition(composition)?;
    let catalog = config.build_catalog()?;
    let model_key = catalog.get(&grade)?.model_key;

    let optimizer = build_optimizer(config, models_dir, [model_key])?;
    let report = optimizer.optimize(&OptimizationRequest {
        grade,
        composition,
        furnace_id: furnace,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &OptimizationReport) {
    println!("Grade: {}   Furnace: {}", report.grade, report.furnace_id);
    println!();
    println!(
        "{:<4} {:>9} {:>9} {:>10} {:>10} {:>8}  {:<5} {:<4}",
        "El", "Current", "Target", "Predicted", "Adjust", "Eff %", "Status", "Prio"
    );
    for p in &report.element_predictions {
        println!(
            "{:<4} {:>9.4} {:>9.4} {:>10.4} {:>+10.4} {:>8.1}  {:<5} {:<4}{}",
            p.element.as_str(),
            p.current,
            p.target,
            p.predicted_config,
            p.adjustment,
            p.efficiency,
            p.status.to_string(),
            p.priority.to_string(),
            if p.sensitive { " *" } else { "" }
        );
    }
    println!();
    println!(
        "Average efficiency: {:.1}%   High-efficiency elements: {}/{}",
        report.totals.average_efficiency,
        report.totals.high_efficiency_count,
        report.totals.total_elements
    );
    println!(
        "Cost impact: {:.2} {} per tonne",
        report.cost_analysis.total_cost_impact_per_tonne, report.cost_analysis.currency
    );
    if let Some(perf) = &report.model_performance {
        println!("Model r2: {:.3} ({} targets)", perf.r2_score, perf.elements_predicted);
    }
    println!();
    println!("Recommendations:");
    for r in &report.recommendations {
        println!("  - {r}");
    }
    for w in &report.warnings {
        println!("  ! {w}");
    }
}

fn targets(grade: &str) -> Result<()> {
    let catalog = config::get().build_catalog()?;
    let g = catalog.get(grade)?;
    println!("{} - {}", g.id, g.description);
    for (element, target) in g.targets.iter() {
        let p = g.parameters[element];
        println!(
            "  {:<3} {:>8.4}%   range {:.4}-{:.4}   cost {:.0}/kg",
            element.as_str(),
            target,
            p.min,
            p.max,
            p.cost_per_unit
        );
    }
    Ok(())
}

fn compare(left: &str, right: &str) -> Result<()> {
    let catalog = config::get().build_catalog()?;
    let rows = catalog.compare(left, right)?;
    println!("{:<4} {:>10} {:>10}  Change", "El", left.to_uppercase(), right.to_uppercase());
    for row in rows {
        println!(
            "{:<4} {:>10.4} {:>10.4}  {}",
            row.element.as_str(),
            row.left,
            row.right,
            row.change
        );
    }
    Ok(())
}

fn grades() -> Result<()> {
    let catalog = config::get().build_catalog()?;
    for g in catalog.grades() {
        let sensitive: Vec<String> = g
            .sensitive
            .iter()
            .map(|s| match s.below {
                Some(floor) => format!("{}>{} else {floor}", s.element, s.high_threshold),
                None => format!("{}>{}", s.element, s.high_threshold),
            })
            .collect();
        println!(
            "{:<18} model={:<18} {}{}",
            g.id,
            g.model_key,
            g.description,
            if sensitive.is_empty() {
                String::new()
            } else {
                format!(" [sensitive: {}]", sensitive.join(", "))
            }
        );
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    config::init(load_config(args.config.as_ref())?);

    match args.command {
        SubCommand::Serve { addr, models_dir } => serve(addr, models_dir).await,
        SubCommand::Predict {
            grade,
            furnace,
            composition,
            json,
            models_dir,
        } => predict(grade, furnace, &composition, json, models_dir),
        SubCommand::Targets { grade } => targets(&grade),
        SubCommand::Compare { left, right } => compare(&left, &right),
        SubCommand::Grades => grades(),
    }
}
