use super::Notional;
use super::Score;
use super::Ticker;
use crate::metric_config::MetricConfig;
use std::collections::HashMap;

#[mockall_double::double]
use super::percentile_ranker::PercentileRanker;

/// Scores one metric over one population, applying its negative-value policy.
#[derive(Default)]
pub struct MetricRanker {
    percentile_ranker: PercentileRanker,
}

#[mockall::automock]
impl MetricRanker {
    pub fn rank(
        &self,
        candidates: &HashMap<Ticker, Notional>,
        config: &MetricConfig,
    ) -> HashMap<Ticker, Score> {
        if !config.penalize_negative {
            return self.percentile_ranker.rank(candidates, config.preference);
        }

        // Negative values do not take a rank position.
        let (negative, rankable): (HashMap<_, _>, HashMap<_, _>) = candidates
            .iter()
            .map(|(ticker, notional)| (ticker.clone(), *notional))
            .partition(|(_, notional)| notional.value < 0.0);
        let mut scores = self.percentile_ranker.rank(&rankable, config.preference);
        scores.extend(negative.into_keys().map(|ticker| (ticker, Score::default())));
        scores
    }
}
