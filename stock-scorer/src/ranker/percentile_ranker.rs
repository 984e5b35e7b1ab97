use super::Notional;
use super::Score;
use super::Ticker;
use crate::metric_config::Preference;
use itertools::Itertools;
use std::collections::HashMap;

/// Ranks a population into tie-averaged percentiles between 0 and 100.
#[derive(Default)]
pub struct PercentileRanker;

#[mockall::automock]
impl PercentileRanker {
    /// The lowest raw value lands on 0 and the highest on 100 before the
    /// preference is applied, so the scale always spans both ends. A
    /// population of one scores 100. NaN counts as missing and gets no score.
    pub fn rank(
        &self,
        candidates: &HashMap<Ticker, Notional>,
        preference: Preference,
    ) -> HashMap<Ticker, Score> {
        let rankable: Vec<_> = candidates
            .iter()
            .filter(|(_, notional)| !notional.value.is_nan())
            .collect();
        if rankable.len() <= 1 {
            return rankable
                .into_iter()
                .map(|(ticker, _)| (ticker.clone(), 100.0.into()))
                .collect();
        }

        let last_position = (rankable.len() - 1) as f64;
        let ties_by_value = rankable
            .into_iter()
            .sorted_unstable_by(|(_, x), (_, y)| x.value.total_cmp(&y.value))
            .enumerate()
            .chunk_by(|(_, (_, notional))| notional.value);

        let mut scores = HashMap::with_capacity(candidates.len());
        for (_, ties) in &ties_by_value {
            let ties: Vec<_> = ties.collect();
            let average_position = ties
                .iter()
                .map(|(position, _)| *position as f64)
                .sum::<f64>()
                / ties.len() as f64;
            let ascending = average_position / last_position * 100.0;
            let percentile = match preference {
                Preference::High => ascending,
                Preference::Low => 100.0 - ascending,
            };
            scores.extend(
                ties.into_iter()
                    .map(|(_, (ticker, _))| (ticker.clone(), percentile.into())),
            );
        }
        scores
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::case;

    fn candidates(values: &[(&str, f64)]) -> HashMap<Ticker, Notional> {
        values
            .iter()
            .map(|(ticker, value)| ((*ticker).into(), (*value).into()))
            .collect()
    }

    #[test]
    fn rank_low_preferred() {
        // Given
        let candidates = candidates(&[("A", 10.0), ("B", 20.0), ("C", 30.0)]);
        let expected_scores: HashMap<_, _> = [
            ("A".into(), 100.0.into()),
            ("B".into(), 50.0.into()),
            ("C".into(), 0.0.into()),
        ]
        .into();

        // When
        let actual_scores = PercentileRanker.rank(&candidates, Preference::Low);

        // Then
        assert_eq!(expected_scores, actual_scores);
    }

    #[test]
    fn rank_high_preferred() {
        // Given
        let candidates = candidates(&[("A", 10.0), ("B", 20.0), ("C", 30.0)]);
        let expected_scores: HashMap<_, _> = [
            ("A".into(), 0.0.into()),
            ("B".into(), 50.0.into()),
            ("C".into(), 100.0.into()),
        ]
        .into();

        // When
        let actual_scores = PercentileRanker.rank(&candidates, Preference::High);

        // Then
        assert_eq!(expected_scores, actual_scores);
    }

    #[test]
    fn ties_share_average_percentile() {
        // Given
        let candidates = candidates(&[("A", 1.0), ("B", 1.0), ("C", 2.0), ("D", -4.0), ("E", 2.0)]);
        let expected_scores: HashMap<_, _> = [
            ("D".into(), 0.0.into()),
            ("A".into(), 37.5.into()),
            ("B".into(), 37.5.into()),
            ("C".into(), 87.5.into()),
            ("E".into(), 87.5.into()),
        ]
        .into();

        // When
        let actual_scores = PercentileRanker.rank(&candidates, Preference::High);

        // Then
        assert_eq!(expected_scores, actual_scores);
    }

    #[test]
    fn low_preference_inverts_high_preference() {
        // Given
        let candidates = candidates(&[
            ("A", 3.7),
            ("B", -1.2),
            ("C", 0.4),
            ("D", 3.7),
            ("E", 12.9),
            ("F", 0.0),
        ]);

        // When
        let high = PercentileRanker.rank(&candidates, Preference::High);
        let low = PercentileRanker.rank(&candidates, Preference::Low);

        // Then
        for (ticker, score) in &high {
            assert!((0.0..=100.0).contains(&score.value));
            assert!((100.0 - score.value - low[ticker].value).abs() < 1e-9);
        }
    }

    #[case(Preference::High ; "High preferred")]
    #[case(Preference::Low  ; "Low preferred")]
    fn rank_single_candidate(preference: Preference) {
        // Given
        let candidates = candidates(&[("A", -3.0)]);
        let expected_scores: HashMap<_, _> = [("A".into(), 100.0.into())].into();

        // When
        let actual_scores = PercentileRanker.rank(&candidates, preference);

        // Then
        assert_eq!(expected_scores, actual_scores);
    }

    #[test]
    fn missing_values_stay_out_of_population() {
        // Given
        let candidates = candidates(&[("A", 1.0), ("B", f64::NAN), ("C", 2.0)]);
        let expected_scores: HashMap<_, _> =
            [("A".into(), 0.0.into()), ("C".into(), 100.0.into())].into();

        // When
        let actual_scores = PercentileRanker.rank(&candidates, Preference::High);

        // Then
        assert_eq!(expected_scores, actual_scores);
    }

    #[test]
    fn rank_only_missing_values() {
        let candidates = candidates(&[("A", f64::NAN)]);
        assert!(PercentileRanker.rank(&candidates, Preference::Low).is_empty());
    }

    #[test]
    fn rank_empty() {
        // Given
        let candidates = HashMap::default();
        let expected_scores = HashMap::default();

        // When
        let actual_scores = PercentileRanker.rank(&candidates, Preference::High);

        // Then
        assert_eq!(expected_scores, actual_scores);
    }
}
