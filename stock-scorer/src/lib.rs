mod entity_table;
mod error;
mod metric_config;
mod ranker;
mod report;
mod score_table;

pub use crate::entity_table::Column;
pub use crate::entity_table::EntityTable;
pub use crate::entity_table::SECTOR_COLUMN;
pub use crate::entity_table::TICKER_COLUMN;
pub use crate::error::ConfigError;
pub use crate::error::PersistenceError;
pub use crate::error::ScoringError;
pub use crate::error::TableError;
pub use crate::metric_config::MetricConfig;
pub use crate::metric_config::MetricConfigs;
pub use crate::metric_config::Preference;
pub use crate::ranker::Notional;
pub use crate::ranker::Score;
pub use crate::ranker::ScoringScope;
pub use crate::ranker::Ticker;
pub use crate::report::ReportEntry;
pub use crate::report::ReportRenderer;
pub use crate::score_table::OVERALL_SCORE_COLUMN;
pub use crate::score_table::SECTOR_SCORE_COLUMN;
pub use crate::score_table::ScoreColumn;
pub use crate::score_table::ScoreTable;

use crate::ranker::PercentileRanker;
use crate::ranker::StockScorer;
use std::collections::HashMap;
use std::io::Read;
use std::io::Write;

/// Precision of every score table handed out.
pub const SCORE_DECIMALS: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreLayout {
    /// One table holding global and sector columns side by side.
    #[default]
    Merged,
    Split,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreResult {
    Merged(ScoreTable),
    Split {
        global: ScoreTable,
        sector: ScoreTable,
    },
}

impl ScoreResult {
    fn from_merged(table: ScoreTable, layout: ScoreLayout) -> Self {
        match layout {
            ScoreLayout::Merged => Self::Merged(table),
            ScoreLayout::Split => {
                let (global, sector) = table.split_sector_columns();
                Self::Split { global, sector }
            }
        }
    }
}

/// Turns an entity table and a metric configuration into score tables.
///
/// Holds no state between calls, so independent calls may run on any thread.
#[derive(Default)]
pub struct ScoringEngine {
    scorer: StockScorer,
}

impl ScoringEngine {
    pub fn new(show_unweighted: bool) -> Self {
        Self {
            scorer: StockScorer::new(show_unweighted),
        }
    }

    /// Percentiles against every entity, aggregated into `Overall_Score`.
    pub fn global_scores(
        &self,
        table: &EntityTable,
        configs: &MetricConfigs,
    ) -> Result<ScoreTable, ScoringError> {
        let scores = self.scorer.score(table, configs, ScoringScope::Global)?;
        Ok(scores.rounded(SCORE_DECIMALS))
    }

    /// Percentiles against entities of the same sector, aggregated into `Sector_Score`.
    pub fn sector_scores(
        &self,
        table: &EntityTable,
        configs: &MetricConfigs,
    ) -> Result<ScoreTable, ScoringError> {
        let scores = self.scorer.score(table, configs, ScoringScope::Sector)?;
        Ok(scores.rounded(SCORE_DECIMALS))
    }

    pub fn scores(
        &self,
        table: &EntityTable,
        configs: &MetricConfigs,
        layout: ScoreLayout,
    ) -> Result<ScoreResult, ScoringError> {
        let global = self.global_scores(table, configs)?;
        let sector = self.sector_scores(table, configs)?;
        Ok(match layout {
            ScoreLayout::Merged => ScoreResult::Merged(global.merge(sector)),
            ScoreLayout::Split => ScoreResult::Split { global, sector },
        })
    }

    /// Reloads a persisted merged table verbatim when `source` is given,
    /// without looking at `configs`. Otherwise computes the merged table and
    /// persists it to `target` if one is given.
    pub fn load_or_compute(
        &self,
        table: &EntityTable,
        configs: &MetricConfigs,
        source: Option<&mut dyn Read>,
        target: Option<&mut dyn Write>,
        layout: ScoreLayout,
    ) -> Result<ScoreResult, ScoringError> {
        let merged = if let Some(source) = source {
            let merged = ScoreTable::read_csv(source)?;
            log::info!("Loaded persisted scores of {} entities", merged.len());
            merged
        } else {
            let global = self.global_scores(table, configs)?;
            let merged = global.merge(self.sector_scores(table, configs)?);
            if let Some(target) = target {
                merged.write_csv(target)?;
                log::info!("Persisted scores of {} entities", merged.len());
            }
            merged
        };
        Ok(ScoreResult::from_merged(merged, layout))
    }
}

/// Tie-averaged percentile of every candidate, inverted when low values are preferred.
pub fn percentile_rank(
    candidates: &HashMap<Ticker, Notional>,
    preference: Preference,
) -> HashMap<Ticker, Score> {
    PercentileRanker.rank(candidates, preference)
}
