use crate::entity_table::TICKER_COLUMN;
use crate::error::PersistenceError;
use crate::error::TableError;
use crate::ranker::Ticker;
use itertools::Itertools;
use std::collections::HashMap;
use std::io::Read;
use std::io::Write;

pub const OVERALL_SCORE_COLUMN: &str = "Overall_Score";
pub const SECTOR_SCORE_COLUMN: &str = "Sector_Score";

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreColumn {
    pub name: String,

    /// Scores in row order, `None` where nothing could be scored.
    pub values: Vec<Option<f64>>,
}

/// Scores of every entity, never mutated once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreTable {
    tickers: Vec<Ticker>,
    columns: Vec<ScoreColumn>,
}

impl ScoreTable {
    /// Every column must hold exactly one value per ticker.
    pub fn new(tickers: Vec<Ticker>, columns: Vec<ScoreColumn>) -> Result<Self, TableError> {
        if let Some(ticker) = tickers.iter().duplicates().next() {
            return Err(TableError::DuplicateTicker(ticker.to_string()));
        }
        if let Some(column) = columns.iter().find(|c| c.values.len() != tickers.len()) {
            return Err(TableError::LengthMismatch {
                column: column.name.clone(),
                expected: tickers.len(),
                actual: column.values.len(),
            });
        }
        Ok(Self::from_parts(tickers, columns))
    }

    /// Caller guarantees one value per ticker in every column.
    pub(crate) fn from_parts(tickers: Vec<Ticker>, columns: Vec<ScoreColumn>) -> Self {
        Self { tickers, columns }
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }

    pub fn get(&self, ticker: &str, column: &str) -> Option<f64> {
        let row = self.tickers.iter().position(|t| t.as_str() == ticker)?;
        *self.column(column)?.get(row)?
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn rounded(&self, decimals: i32) -> Self {
        let factor = 10_f64.powi(decimals);
        let columns = self
            .columns
            .iter()
            .map(|column| ScoreColumn {
                name: column.name.clone(),
                values: column
                    .values
                    .iter()
                    .map(|value| value.map(|v| (v * factor).round() / factor))
                    .collect(),
            })
            .collect();
        Self::from_parts(self.tickers.clone(), columns)
    }

    /// Joins on ticker, keeping the rows of `self` that `other` also has.
    pub fn merge(self, other: Self) -> Self {
        let other_rows: HashMap<&Ticker, usize> = other
            .tickers
            .iter()
            .enumerate()
            .map(|(row, ticker)| (ticker, row))
            .collect();
        let (rows, tickers): (Vec<_>, Vec<_>) = self
            .tickers
            .iter()
            .enumerate()
            .filter(|(_, ticker)| other_rows.contains_key(ticker))
            .map(|(row, ticker)| (row, ticker.clone()))
            .unzip();

        let own_columns = self.columns.iter().map(|column| ScoreColumn {
            name: column.name.clone(),
            values: rows.iter().map(|row| column.values[*row]).collect(),
        });
        let other_columns = other.columns.iter().map(|column| ScoreColumn {
            name: column.name.clone(),
            values: tickers
                .iter()
                .map(|ticker| column.values[other_rows[ticker]])
                .collect(),
        });
        let columns = own_columns.chain(other_columns).collect();
        Self::from_parts(tickers, columns)
    }

    /// Separates global columns from the columns ending with `Sector_Score`.
    pub fn split_sector_columns(self) -> (Self, Self) {
        let (sector, global): (Vec<_>, Vec<_>) = self
            .columns
            .into_iter()
            .partition(|column| column.name.ends_with(SECTOR_SCORE_COLUMN));
        (
            Self::from_parts(self.tickers.clone(), global),
            Self::from_parts(self.tickers, sector),
        )
    }

    /// Writes a `Ticker` column followed by every score column. Missing scores are empty cells.
    pub fn write_csv(&self, writer: impl Write) -> Result<(), PersistenceError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(std::iter::once(TICKER_COLUMN).chain(self.column_names()))?;
        for (row, ticker) in self.tickers.iter().enumerate() {
            let cells = self
                .columns
                .iter()
                .map(|column| column.values[row].map(|v| v.to_string()).unwrap_or_default());
            writer.write_record(std::iter::once(ticker.to_string()).chain(cells))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads a table written by [`Self::write_csv`]. The first column holds the tickers.
    pub fn read_csv(reader: impl Read) -> Result<Self, PersistenceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(PersistenceError::MissingTickerColumn);
        }

        let mut tickers: Vec<Ticker> = Vec::new();
        let mut columns: Vec<ScoreColumn> = headers
            .iter()
            .skip(1)
            .map(|name| ScoreColumn {
                name: name.into(),
                values: Vec::new(),
            })
            .collect();
        for record in reader.records() {
            let record = record?;
            let ticker = record.get(0).unwrap_or_default();
            for (column, cell) in columns.iter_mut().zip(record.iter().skip(1)) {
                column.values.push(parse_score(ticker, &column.name, cell)?);
            }
            tickers.push(ticker.into());
        }
        if let Some(ticker) = tickers.iter().duplicates().next() {
            return Err(PersistenceError::DuplicateTicker(ticker.to_string()));
        }
        Ok(Self::from_parts(tickers, columns))
    }
}

fn parse_score(ticker: &str, column: &str, cell: &str) -> Result<Option<f64>, PersistenceError> {
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell.parse().map_err(|_| PersistenceError::InvalidValue {
        ticker: ticker.into(),
        column: column.into(),
        value: cell.into(),
    })?;
    Ok(Some(value).filter(|value| !value.is_nan()))
}
