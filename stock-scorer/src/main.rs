use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use stock_scorer::EntityTable;
use stock_scorer::MetricConfigs;
use stock_scorer::OVERALL_SCORE_COLUMN;
use stock_scorer::ReportEntry;
use stock_scorer::ReportRenderer;
use stock_scorer::SECTOR_SCORE_COLUMN;
use stock_scorer::ScoreLayout;
use stock_scorer::ScoreResult;
use stock_scorer::ScoringEngine;

/// Ranks stocks by global and sector composite scores.
#[derive(Parser)]
struct Cli {
    /// CSV snapshot with a `Ticker` column, an optional `Sector` column and metric columns.
    #[arg(long)]
    entities: PathBuf,

    /// Metric configuration in JSON or YAML. Defaults to the built-in catalog.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reuse scores persisted by an earlier run instead of computing them.
    #[arg(long)]
    scores_from: Option<PathBuf>,

    /// Persist the computed scores as CSV.
    #[arg(long)]
    scores_to: Option<PathBuf>,

    /// Show weighted sub-scores instead of pure percentiles.
    #[arg(long)]
    weighted: bool,
}

#[derive(Serialize)]
struct Output {
    global: Vec<ReportEntry>,
    sector: Vec<ReportEntry>,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    let args = Cli::parse();

    let entities_file = File::open(&args.entities)
        .with_context(|| format!("Failed to open {}", args.entities.display()))?;
    let entities =
        EntityTable::from_csv(entities_file).context("Failed to load the entity table")?;
    let configs = load_configs(args.config.as_deref())?;

    let mut source = args
        .scores_from
        .as_ref()
        .map(File::open)
        .transpose()
        .context("Failed to open the persisted scores")?;
    let mut target = args
        .scores_to
        .as_ref()
        .map(File::create)
        .transpose()
        .context("Failed to create the score file")?;
    let result = ScoringEngine::new(!args.weighted).load_or_compute(
        &entities,
        &configs,
        source.as_mut().map(|file| file as &mut dyn Read),
        target.as_mut().map(|file| file as &mut dyn Write),
        ScoreLayout::Split,
    )?;
    let ScoreResult::Split { global, sector } = result else {
        anyhow::bail!("Expected separate global and sector scores")
    };

    let renderer = ReportRenderer;
    let output = Output {
        global: renderer.render(&global, OVERALL_SCORE_COLUMN, &entities),
        sector: renderer.render(&sector, SECTOR_SCORE_COLUMN, &entities),
    };
    let json =
        serde_json::to_string_pretty(&output).context("Failed to serialize the report as JSON")?;
    println!("{json}");
    Ok(())
}

fn load_configs(path: Option<&Path>) -> anyhow::Result<MetricConfigs> {
    let Some(path) = path else {
        return Ok(MetricConfigs::default_catalog()?);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let configs = match path.extension().and_then(|extension| extension.to_str()) {
        Some("yaml" | "yml") => MetricConfigs::from_yaml(&text),
        _ => MetricConfigs::from_json(&text),
    };
    configs.context("Invalid metric configuration")
}
