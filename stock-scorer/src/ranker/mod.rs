mod metric_ranker;
mod percentile_ranker;

pub use self::percentile_ranker::PercentileRanker;

use crate::entity_table::EntityTable;
use crate::error::ScoringError;
use crate::metric_config::MetricConfig;
use crate::metric_config::MetricConfigs;
use crate::score_table::OVERALL_SCORE_COLUMN;
use crate::score_table::SECTOR_SCORE_COLUMN;
use crate::score_table::ScoreColumn;
use crate::score_table::ScoreTable;
use derive_more::Display;
use derive_more::From;
use itertools::Itertools;
use std::collections::HashMap;
use std::sync::Arc;

#[mockall_double::double]
use self::metric_ranker::MetricRanker;

/// Population a percentile is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringScope {
    /// Every entity with a value for the metric.
    Global,

    /// Entities sharing the scored entity's sector label.
    Sector,
}

impl ScoringScope {
    pub fn metric_column(&self, metric: &str) -> String {
        match self {
            Self::Global => format!("{metric}_Score"),
            Self::Sector => format!("{metric}_{SECTOR_SCORE_COLUMN}"),
        }
    }

    pub fn aggregate_column(&self) -> &'static str {
        match self {
            Self::Global => OVERALL_SCORE_COLUMN,
            Self::Sector => SECTOR_SCORE_COLUMN,
        }
    }
}

pub struct StockScorer {
    metric_ranker: MetricRanker,
    show_unweighted: bool,
}

impl Default for StockScorer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl StockScorer {
    /// With `show_unweighted`, sub-score columns hold pure percentiles instead
    /// of weighted ones. The aggregate is the same either way.
    pub fn new(show_unweighted: bool) -> Self {
        Self {
            metric_ranker: Default::default(),
            show_unweighted,
        }
    }

    /// Aggregates are a weighted sum divided by the total weight of every
    /// participating metric. The divisor is shared by all entities, so a
    /// missing value lowers the reachable maximum instead of being
    /// renormalized away.
    pub fn score(
        &self,
        table: &EntityTable,
        configs: &MetricConfigs,
        scope: ScoringScope,
    ) -> Result<ScoreTable, ScoringError> {
        if scope == ScoringScope::Sector && table.sectors().is_none() {
            return Err(ScoringError::MissingSectorColumn);
        }

        let mut columns = Vec::new();
        let mut weighted_sums: Vec<Option<f64>> = vec![None; table.len()];
        let mut total_weight = 0.0;
        for config in configs.iter() {
            if config.weight <= 0.0 {
                log::debug!("Skipping metric `{}` with weight 0", config.name);
                continue;
            }
            let Some(values) = table.numeric_column(&config.name) else {
                log::debug!("Skipping metric `{}` without numeric column", config.name);
                continue;
            };

            let percentiles = self.score_metric(table, values, config, scope);
            for (sum, percentile) in weighted_sums.iter_mut().zip(&percentiles) {
                if let Some(percentile) = percentile {
                    *sum = Some(sum.unwrap_or_default() + percentile * config.weight);
                }
            }
            total_weight += config.weight;

            let displayed = if self.show_unweighted {
                percentiles
            } else {
                percentiles
                    .into_iter()
                    .map(|percentile| percentile.map(|p| p * config.weight))
                    .collect()
            };
            columns.push(ScoreColumn {
                name: scope.metric_column(&config.name),
                values: displayed,
            });
        }

        // A sum only exists where some metric contributed, so the divisor is positive there.
        let aggregate = weighted_sums
            .into_iter()
            .map(|sum| sum.map(|sum| sum / total_weight))
            .collect();
        columns.push(ScoreColumn {
            name: scope.aggregate_column().into(),
            values: aggregate,
        });
        Ok(ScoreTable::from_parts(table.tickers().to_vec(), columns))
    }

    /// Percentile of every row, in table order.
    fn score_metric(
        &self,
        table: &EntityTable,
        values: &[Option<f64>],
        config: &MetricConfig,
        scope: ScoringScope,
    ) -> Vec<Option<f64>> {
        let scores: HashMap<Ticker, Score> = partition(table, values, scope)
            .iter()
            .flat_map(|population| self.metric_ranker.rank(population, config))
            .collect();
        table
            .tickers()
            .iter()
            .map(|ticker| scores.get(ticker).map(|score| score.value))
            .collect()
    }
}

/// Splits the rows holding a value into independent ranking populations.
fn partition(
    table: &EntityTable,
    values: &[Option<f64>],
    scope: ScoringScope,
) -> Vec<HashMap<Ticker, Notional>> {
    let candidates = table
        .tickers()
        .iter()
        .zip(values)
        .enumerate()
        .filter_map(|(row, (ticker, value))| {
            Some((row, (ticker.clone(), Notional::from((*value)?))))
        });
    match scope {
        ScoringScope::Global => vec![candidates.map(|(_, candidate)| candidate).collect()],
        ScoringScope::Sector => {
            let sectors = table.sectors().unwrap_or_default();
            candidates
                .filter_map(|(row, candidate)| Some((sectors.get(row)?.as_deref()?, candidate)))
                .into_group_map()
                .into_values()
                .map(|population| population.into_iter().collect())
                .collect()
        }
    }
}

/// Code name of a stock.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Display)]
pub struct Ticker {
    value: Arc<str>,
}

impl Ticker {
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl From<&str> for Ticker {
    fn from(value: &str) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl From<String> for Ticker {
    fn from(value: String) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Raw value of a metric.
#[derive(Clone, Copy, From, PartialEq, Debug)]
pub struct Notional {
    pub value: f64,
}

impl Eq for Notional {}

/// Percentile between 0 and 100.
#[derive(Debug, From, PartialEq, Clone, Copy, Default)]
pub struct Score {
    pub value: f64,
}
