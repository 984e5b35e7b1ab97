use crate::entity_table::EntityTable;
use crate::score_table::ScoreTable;
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Default)]
pub struct ReportRenderer;

impl ReportRenderer {
    /// Ranks entities by `aggregate_column`, best first and unscored last.
    pub fn render(
        &self,
        scores: &ScoreTable,
        aggregate_column: &str,
        entities: &EntityTable,
    ) -> Vec<ReportEntry> {
        let aggregate = scores.column(aggregate_column).unwrap_or_default();
        scores
            .tickers()
            .iter()
            .enumerate()
            .map(|(row, ticker)| (ticker, aggregate.get(row).copied().flatten()))
            .sorted_by(|(_, x), (_, y)| compare_descendingly(*x, *y))
            .map(|(ticker, score)| ReportEntry {
                ticker: ticker.to_string(),
                sector: entities.sector_of(ticker).map(Into::into),
                score: render_score(score),
            })
            .collect()
    }
}

fn compare_descendingly(x: Option<f64>, y: Option<f64>) -> Ordering {
    match (x, y) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn render_float(value: f64) -> String {
    format!("{:.2}", value)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .into()
}

fn render_score(score: Option<f64>) -> String {
    score.map_or_else(|| "None".into(), render_float)
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ReportEntry {
    pub ticker: String,
    pub sector: Option<String>,
    pub score: String,
}
