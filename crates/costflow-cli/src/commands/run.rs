//! `run` subcommand: executes an allocation batch over a date window and
//! prints a summary of what was committed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use costflow_core::{CostDate, Currency, Dimension, EdgeId, NodeId};
use costflow_engine::{EngineConfig, RunCancellation, RunCoordinator};
use costflow_memstore::InMemoryStore;
use costflow_traits::{DirectCost, Edge, EdgeStrategyOverride, Node, NodeType, StrategySpec, UsageSample};

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};
use crate::output::{print_single, print_warning};

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// First day (inclusive) of the run's window, as `YYYY-MM-DD`.
    #[arg(long)]
    pub window_start: String,

    /// Last day (inclusive) of the run's window, as `YYYY-MM-DD`.
    #[arg(long)]
    pub window_end: String,

    /// Cost dimension to allocate. Repeatable. Required when `--scenario`
    /// is given; defaults to `cost` for the built-in demo graph.
    #[arg(long = "dimension")]
    pub dimensions: Vec<String>,

    /// Path to a JSON scenario file describing nodes, edges, overrides,
    /// direct costs, and usage samples. Falls back to a small built-in
    /// two-node demo graph when omitted.
    #[arg(long)]
    pub scenario: Option<PathBuf>,
}

/// The shape of a `--scenario` JSON file.
#[derive(Deserialize)]
struct Scenario {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(default)]
    overrides: Vec<EdgeStrategyOverride>,
    direct_costs: Vec<DirectCost>,
    #[serde(default)]
    usage: Vec<UsageSample>,
}

/// A compact, JSON-serializable view of a completed run.
#[derive(Serialize)]
struct RunReport {
    run_id: String,
    days_processed: usize,
    days_total: usize,
    direct_totals_by_dimension: BTreeMap<String, Decimal>,
    warnings: Vec<String>,
    elapsed_ms: u128,
}

/// Parses a `YYYY-MM-DD` string into a [`CostDate`].
pub fn parse_date(raw: &str) -> CliResult<CostDate> {
    CostDate::parse(raw).map_err(|_| CliError::InvalidDate(raw.to_string()))
}

/// Executes the `run` subcommand.
pub async fn execute(args: RunArgs, format: OutputFormat) -> CliResult<()> {
    let window_start = parse_date(&args.window_start)?;
    let window_end = parse_date(&args.window_end)?;
    if window_end < window_start {
        return Err(CliError::InvalidWindow {
            start: args.window_start.clone(),
            end: args.window_end.clone(),
        });
    }

    let (store, dimensions) = match &args.scenario {
        Some(path) => {
            let store = Arc::new(InMemoryStore::new());
            load_scenario(&store, path)?;
            if args.dimensions.is_empty() {
                return Err(CliError::MissingDimension);
            }
            (store, dimensions_from_args(&args.dimensions))
        }
        None => {
            let (store, demo_dimensions) = demo_store(window_start, window_end);
            let dimensions = if args.dimensions.is_empty() {
                demo_dimensions
            } else {
                dimensions_from_args(&args.dimensions)
            };
            (store, dimensions)
        }
    };

    let repos = store.into_repositories();
    let coordinator = RunCoordinator::new(repos, EngineConfig::default());
    let cancellation = RunCancellation::new();

    tracing::info!(start = %window_start, end = %window_end, "starting allocation run");
    let (run_id, summary) = coordinator
        .run(window_start, window_end, dimensions, cancellation)
        .await?;

    for warning in &summary.warnings {
        print_warning(warning);
    }

    let report = RunReport {
        run_id: run_id.to_string(),
        days_processed: summary.days_processed,
        days_total: summary.days_total,
        direct_totals_by_dimension: summary
            .direct_totals_by_dimension
            .into_iter()
            .map(|(dim, amount)| (dim.as_str().to_string(), amount))
            .collect(),
        warnings: summary.warnings,
        elapsed_ms: summary.elapsed.as_millis(),
    };
    print_single(&report, format).map_err(CliError::Output)?;

    Ok(())
}

fn dimensions_from_args(raw: &[String]) -> Vec<Dimension> {
    raw.iter().map(|d| Dimension::new(d.as_str())).collect()
}

fn load_scenario(store: &InMemoryStore, path: &Path) -> CliResult<()> {
    let to_err = |e: anyhow::Error| CliError::Scenario {
        path: path.display().to_string(),
        source: e,
    };
    let raw = std::fs::read_to_string(path)?;
    let scenario: Scenario = serde_json::from_str(&raw).map_err(|e| to_err(e.into()))?;

    for node in scenario.nodes {
        store.put_node(node);
    }
    for edge in scenario.edges {
        store.put_edge(edge);
    }
    for over in scenario.overrides {
        store.put_override(over);
    }
    for cost in scenario.direct_costs {
        store.put_direct_cost(cost);
    }
    for sample in scenario.usage {
        store.put_usage_sample(sample);
    }
    Ok(())
}

/// A two-node demo graph: one shared resource, equal-split onto one
/// product, costing $100/day in the `cost` dimension across the window.
fn demo_store(window_start: CostDate, window_end: CostDate) -> (Arc<InMemoryStore>, Vec<Dimension>) {
    let store = Arc::new(InMemoryStore::new());
    let dimension = Dimension::new("cost");

    let resource = Node {
        id: NodeId::new(),
        name: "Shared Compute".to_string(),
        node_type: NodeType::Resource,
        is_platform: false,
        labels: Default::default(),
        metadata: serde_json::json!({}),
        archived_at: None,
    };
    let product = Node {
        id: NodeId::new(),
        name: "Checkout".to_string(),
        node_type: NodeType::Product,
        is_platform: false,
        labels: Default::default(),
        metadata: serde_json::json!({}),
        archived_at: None,
    };
    let edge = Edge {
        id: EdgeId::new(),
        parent_id: resource.id,
        child_id: product.id,
        default_strategy: StrategySpec::new("equal"),
        active_from: window_start,
        active_to: None,
    };

    for date in window_start.window_through(window_end) {
        store.put_direct_cost(DirectCost {
            node_id: resource.id,
            cost_date: date,
            dimension: dimension.clone(),
            amount: dec!(100),
            currency: Currency::default(),
        });
    }

    store.put_node(resource);
    store.put_node(product);
    store.put_edge(edge);

    (store, vec![dimension])
}
