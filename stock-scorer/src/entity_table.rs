use crate::error::TableError;
use crate::ranker::Ticker;
use itertools::Itertools;
use std::io::Read;

pub const TICKER_COLUMN: &str = "Ticker";
pub const SECTOR_COLUMN: &str = "Sector";

/// Values of one column, one per entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// `None` marks a missing value.
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }
}

/// Snapshot of raw metric values, one row per entity.
///
/// The set of columns is whatever the data source produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTable {
    tickers: Vec<Ticker>,
    sectors: Option<Vec<Option<String>>>,
    columns: Vec<(String, Column)>,
}

impl EntityTable {
    pub fn new(tickers: impl IntoIterator<Item = impl Into<Ticker>>) -> Result<Self, TableError> {
        let tickers: Vec<Ticker> = tickers.into_iter().map(Into::into).collect();
        if let Some(ticker) = tickers.iter().duplicates().next() {
            return Err(TableError::DuplicateTicker(ticker.to_string()));
        }
        Ok(Self {
            tickers,
            ..Default::default()
        })
    }

    /// Empty labels mean the entity has no sector.
    pub fn with_sectors<S: Into<String>>(
        mut self,
        sectors: impl IntoIterator<Item = Option<S>>,
    ) -> Result<Self, TableError> {
        let sectors: Vec<Option<String>> = sectors
            .into_iter()
            .map(|sector| sector.map(Into::into).filter(|sector| !sector.is_empty()))
            .collect();
        self.check_length(SECTOR_COLUMN, sectors.len())?;
        self.sectors = Some(sectors);
        Ok(self)
    }

    /// Adds a column, replacing any column of the same name. NaN is stored as missing.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self, TableError> {
        let name = name.into();
        if name == TICKER_COLUMN || name == SECTOR_COLUMN {
            return Err(TableError::ReservedColumn(name));
        }
        self.check_length(&name, column.len())?;
        let column = match column {
            Column::Numeric(values) => Column::Numeric(
                values
                    .into_iter()
                    .map(|value| value.filter(|value| !value.is_nan()))
                    .collect(),
            ),
            text => text,
        };
        self.columns.retain(|(existing, _)| existing != &name);
        self.columns.push((name, column));
        Ok(self)
    }

    /// Reads a CSV snapshot with a `Ticker` column and an optional `Sector` column.
    ///
    /// A column is numeric when all of its non-empty cells parse as numbers.
    pub fn from_csv(reader: impl Read) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
        let cells = |index: usize| -> Vec<&str> {
            records
                .iter()
                .map(|record| record.get(index).unwrap_or_default())
                .collect()
        };

        let ticker_index = headers
            .iter()
            .position(|header| header == TICKER_COLUMN)
            .ok_or(TableError::MissingTickerColumn)?;
        let mut table = Self::new(cells(ticker_index))?;
        for (index, header) in headers.iter().enumerate() {
            if index == ticker_index {
                continue;
            }
            table = if header == SECTOR_COLUMN {
                table.with_sectors(cells(index).into_iter().map(Some))?
            } else {
                table.with_column(header, parse_column(&cells(index)))?
            };
        }
        Ok(table)
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// `None` when the table has no sector column at all.
    pub fn sectors(&self) -> Option<&[Option<String>]> {
        self.sectors.as_deref()
    }

    pub fn sector_of(&self, ticker: &Ticker) -> Option<&str> {
        let row = self.tickers.iter().position(|t| t == ticker)?;
        self.sectors.as_ref()?.get(row)?.as_deref()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, column)| column)
    }

    /// `None` when the column is absent or holds text.
    pub fn numeric_column(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name)? {
            Column::Numeric(values) => Some(values),
            Column::Text(_) => None,
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    fn check_length(&self, column: &str, actual: usize) -> Result<(), TableError> {
        if actual == self.tickers.len() {
            Ok(())
        } else {
            Err(TableError::LengthMismatch {
                column: column.into(),
                expected: self.tickers.len(),
                actual,
            })
        }
    }
}

fn parse_column(cells: &[&str]) -> Column {
    let numbers: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                Some(None)
            } else {
                cell.parse().ok().map(Some)
            }
        })
        .collect();
    numbers.map_or_else(
        || {
            Column::Text(
                cells
                    .iter()
                    .map(|cell| Some(cell.to_string()).filter(|cell| !cell.is_empty()))
                    .collect(),
            )
        },
        Column::Numeric,
    )
}
