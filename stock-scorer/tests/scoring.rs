use std::collections::HashMap;
use std::io::Read;
use std::io::Write;
use stock_scorer::Column;
use stock_scorer::EntityTable;
use stock_scorer::MetricConfigs;
use stock_scorer::Preference;
use stock_scorer::ScoreLayout;
use stock_scorer::ScoreResult;
use stock_scorer::ScoreTable;
use stock_scorer::ScoringEngine;
use stock_scorer::ScoringError;
use stock_scorer::Ticker;

fn configs(json: &str) -> MetricConfigs {
    MetricConfigs::from_json(json).unwrap()
}

fn pe_table(values: &[Option<f64>]) -> EntityTable {
    let tickers = ["A", "B", "C", "D"].into_iter().take(values.len());
    EntityTable::new(tickers)
        .and_then(|table| table.with_column("P/E", Column::Numeric(values.to_vec())))
        .unwrap()
}

fn sector_table(energy_roe: f64) -> EntityTable {
    EntityTable::new(["A", "B", "C"])
        .and_then(|table| table.with_sectors([Some("Tech"), Some("Tech"), Some("Energy")]))
        .and_then(|table| {
            table.with_column(
                "ROE",
                Column::Numeric(vec![Some(0.1), Some(0.2), Some(energy_roe)]),
            )
        })
        .unwrap()
}

#[test]
fn low_preferred_metric_scores_inverted_percentiles() -> Result<(), ScoringError> {
    // Given
    let table = pe_table(&[Some(10.0), Some(20.0), Some(30.0)]);
    let configs = configs(r#"[["P/E", "low", 1]]"#);

    // When
    let scores = ScoringEngine::default().global_scores(&table, &configs)?;

    // Then
    let expected = [Some(100.0), Some(50.0), Some(0.0)];
    assert_eq!(Some(expected.as_slice()), scores.column("P/E_Score"));
    assert_eq!(Some(expected.as_slice()), scores.column("Overall_Score"));
    Ok(())
}

#[test]
fn negative_value_is_penalized() -> Result<(), ScoringError> {
    // Given
    let table = pe_table(&[Some(10.0), Some(20.0), None, Some(-5.0)]);
    let configs = configs(
        r#"{"P/E": {"preference": "low", "weight": 1, "penalize_negative": true}}"#,
    );

    // When
    let scores = ScoringEngine::default().global_scores(&table, &configs)?;

    // Then
    assert_eq!(
        Some([Some(100.0), Some(0.0), None, Some(0.0)].as_slice()),
        scores.column("P/E_Score")
    );
    assert_eq!(None, scores.get("C", "Overall_Score"));
    Ok(())
}

#[test]
fn sector_percentile_ignores_other_sectors() -> Result<(), ScoringError> {
    // Given
    let configs = configs(r#"[["ROE", "high", 1]]"#);
    let engine = ScoringEngine::default();

    // When
    let first = engine.sector_scores(&sector_table(0.9), &configs)?;
    let second = engine.sector_scores(&sector_table(-40.0), &configs)?;

    // Then
    assert_eq!(Some(0.0), first.get("A", "ROE_Sector_Score"));
    assert_eq!(Some(100.0), first.get("B", "ROE_Sector_Score"));
    assert_eq!(Some(100.0), first.get("C", "Sector_Score"));
    assert_eq!(first.get("A", "Sector_Score"), second.get("A", "Sector_Score"));
    assert_eq!(first.get("B", "Sector_Score"), second.get("B", "Sector_Score"));
    Ok(())
}

#[test]
fn missing_metric_lowers_aggregate_without_renormalizing() -> Result<(), ScoringError> {
    // Given
    let table = EntityTable::new(["A", "B"])
        .and_then(|table| table.with_column("P/E", Column::Numeric(vec![Some(10.0), Some(20.0)])))
        .and_then(|table| table.with_column("ROE", Column::Numeric(vec![Some(0.3), None])))
        .unwrap();
    let configs = configs(r#"[["P/E", "high", 1], ["ROE", "high", 1]]"#);

    // When
    let scores = ScoringEngine::default().global_scores(&table, &configs)?;

    // Then
    assert_eq!(Some(50.0), scores.get("A", "Overall_Score"));
    assert_eq!(Some(50.0), scores.get("B", "Overall_Score"));
    Ok(())
}

#[test]
fn zero_weight_and_absent_metrics_do_not_participate() -> Result<(), ScoringError> {
    // Given
    let table = pe_table(&[Some(10.0), Some(20.0), Some(30.0)])
        .with_column("Price", Column::Numeric(vec![Some(3.0), Some(2.0), Some(1.0)]))
        .and_then(|table| table.with_column("Company", Column::Text(vec![None; 3])))
        .unwrap();
    let plain = configs(r#"[["P/E", "low", 0.8]]"#);
    let padded = configs(
        r#"[["Price", "low", 0], ["P/E", "low", 0.8], ["Dividend Yield", "high", 2], ["Company", "high", 1]]"#,
    );
    let engine = ScoringEngine::default();

    // When
    let plain_scores = engine.global_scores(&table, &plain)?;
    let padded_scores = engine.global_scores(&table, &padded)?;

    // Then
    assert_eq!(plain_scores, padded_scores);
    let names: Vec<_> = padded_scores.column_names().collect();
    assert_eq!(vec!["P/E_Score", "Overall_Score"], names);
    Ok(())
}

#[test]
fn global_scores_do_not_need_sectors() {
    // Given
    let table = pe_table(&[Some(1.0), Some(2.0)]);
    let configs = configs(r#"[["P/E", "low", 1]]"#);
    let engine = ScoringEngine::default();

    // Then
    assert!(engine.global_scores(&table, &configs).is_ok());
    assert!(matches!(
        engine.sector_scores(&table, &configs),
        Err(ScoringError::MissingSectorColumn)
    ));
    assert!(matches!(
        engine.scores(&table, &configs, ScoreLayout::Merged),
        Err(ScoringError::MissingSectorColumn)
    ));
}

#[test]
fn merged_columns_in_configuration_order() -> Result<(), ScoringError> {
    // Given
    let table = sector_table(0.5)
        .with_column("Beta", Column::Numeric(vec![Some(1.2), Some(0.8), Some(1.0)]))
        .unwrap();
    let configs = configs(r#"[["ROE", "high", 1], ["Beta", "low", 0.5]]"#);

    // When
    let result = ScoringEngine::default().scores(&table, &configs, ScoreLayout::Merged)?;

    // Then
    let ScoreResult::Merged(merged) = result else {
        panic!("Expected a merged table")
    };
    let names: Vec<_> = merged.column_names().collect();
    assert_eq!(
        vec![
            "ROE_Score",
            "Beta_Score",
            "Overall_Score",
            "ROE_Sector_Score",
            "Beta_Sector_Score",
            "Sector_Score"
        ],
        names
    );
    Ok(())
}

#[test]
fn show_weighted_sub_scores() -> Result<(), ScoringError> {
    // Given
    let table = pe_table(&[Some(10.0), Some(20.0), Some(30.0)]);
    let configs = configs(r#"[["P/E", "low", 0.5]]"#);

    // When
    let scores = ScoringEngine::new(false).global_scores(&table, &configs)?;

    // Then
    assert_eq!(Some(50.0), scores.get("A", "P/E_Score"));
    assert_eq!(Some(100.0), scores.get("A", "Overall_Score"));
    Ok(())
}

#[test]
fn persist_and_reload() -> Result<(), ScoringError> {
    // Given
    let table = sector_table(0.5)
        .with_column(
            "Beta",
            Column::Numeric(vec![Some(1.2), Some(0.8), Some(1.0)]),
        )
        .unwrap();
    let configs = configs(r#"[["ROE", "high", 0.7], ["Beta", "low", 0.3]]"#);
    let engine = ScoringEngine::default();
    let mut persisted = Vec::new();

    // When
    let computed = engine.load_or_compute(
        &table,
        &configs,
        None,
        Some(&mut persisted as &mut dyn Write),
        ScoreLayout::Merged,
    )?;
    let reloaded = engine.load_or_compute(
        &table,
        &MetricConfigs::default(),
        Some(&mut persisted.as_slice() as &mut dyn Read),
        None,
        ScoreLayout::Merged,
    )?;

    // Then
    assert_eq!(computed, reloaded);
    Ok(())
}

#[test]
fn reload_verbatim_and_split() -> Result<(), ScoringError> {
    // Given
    let persisted = "\
Ticker,P/E_Score,Overall_Score,P/E_Sector_Score,Sector_Score
X,12.34,12.34,50,50
Y,,,,
";
    let table = pe_table(&[Some(1.0)]);

    // When
    let result = ScoringEngine::default().load_or_compute(
        &table,
        &configs(r#"[["P/E", "high", 1]]"#),
        Some(&mut persisted.as_bytes() as &mut dyn Read),
        None,
        ScoreLayout::Split,
    )?;

    // Then
    let ScoreResult::Split { global, sector } = result else {
        panic!("Expected split tables")
    };
    let tickers: Vec<_> = global.tickers().iter().map(Ticker::as_str).collect();
    assert_eq!(vec!["X", "Y"], tickers);
    assert_eq!(Some(12.34), global.get("X", "Overall_Score"));
    assert_eq!(None, global.get("Y", "Overall_Score"));
    let sector_names: Vec<_> = sector.column_names().collect();
    assert_eq!(vec!["P/E_Sector_Score", "Sector_Score"], sector_names);
    Ok(())
}

#[test]
fn unreadable_persisted_scores_fail() {
    // Given
    let persisted = "Ticker,Overall_Score\nX,excellent\n";
    let table = pe_table(&[Some(1.0)]);

    // When
    let result = ScoringEngine::default().load_or_compute(
        &table,
        &configs(r#"[["P/E", "high", 1]]"#),
        Some(&mut persisted.as_bytes() as &mut dyn Read),
        None,
        ScoreLayout::Merged,
    );

    // Then
    assert!(matches!(result, Err(ScoringError::Persistence(_))));
}

#[test]
fn score_rounded_to_two_decimals() -> Result<(), ScoringError> {
    // Given
    let table = pe_table(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
    let configs = configs(r#"[["P/E", "high", 1]]"#);

    // When
    let scores = ScoringEngine::default().global_scores(&table, &configs)?;

    // Then
    assert_eq!(
        Some([Some(0.0), Some(33.33), Some(66.67), Some(100.0)].as_slice()),
        scores.column("Overall_Score")
    );
    Ok(())
}

#[test]
fn independent_calls_in_parallel() {
    // Given
    let table = sector_table(0.5);
    let high = configs(r#"[["ROE", "high", 1]]"#);
    let low = configs(r#"[["ROE", "low", 1]]"#);
    let engine = ScoringEngine::default();

    // When
    let (high_scores, low_scores) = std::thread::scope(|scope| {
        let high = scope.spawn(|| engine.global_scores(&table, &high));
        let low = scope.spawn(|| engine.global_scores(&table, &low));
        (high.join().unwrap(), low.join().unwrap())
    });

    // Then
    let high_scores: ScoreTable = high_scores.unwrap();
    let low_scores: ScoreTable = low_scores.unwrap();
    for ticker in ["A", "B", "C"] {
        let high = high_scores.get(ticker, "Overall_Score").unwrap();
        let low = low_scores.get(ticker, "Overall_Score").unwrap();
        assert!((100.0 - high - low).abs() < 1e-9);
    }
}

#[test]
fn percentile_rank_primitive() {
    // Given
    let candidates: HashMap<Ticker, _> = [
        ("A".into(), 5.0.into()),
        ("B".into(), 5.0.into()),
        ("C".into(), 9.0.into()),
    ]
    .into();

    // When
    let scores = stock_scorer::percentile_rank(&candidates, Preference::High);

    // Then
    assert_eq!(25.0, scores[&Ticker::from("A")].value);
    assert_eq!(25.0, scores[&Ticker::from("B")].value);
    assert_eq!(100.0, scores[&Ticker::from("C")].value);
}

#[test]
fn percentile_rank_skips_nan() {
    // Given
    let candidates: HashMap<Ticker, _> = [
        ("A".into(), 1.0.into()),
        ("B".into(), f64::NAN.into()),
        ("C".into(), 2.0.into()),
    ]
    .into();

    // When
    let scores = stock_scorer::percentile_rank(&candidates, Preference::High);

    // Then
    assert!(!scores.contains_key(&Ticker::from("B")));
    assert_eq!(0.0, scores[&Ticker::from("A")].value);
    assert_eq!(100.0, scores[&Ticker::from("C")].value);
}
