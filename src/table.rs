//! Raw table loading: one CSV read at start, column role resolution, and
//! the train/test row split.
//!
//! Columns are typed by inspection: a column whose every non-empty cell
//! parses as a number is numeric, anything else is categorical. Empty cells
//! and "NA" become missing values and survive until the imputation step of
//! the recipe.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::ColumnRoles;

/// Values of a single table column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => {
                ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A loaded dataset with named, role-resolved columns.
///
/// Identifier columns are dropped at load time and the date column, when
/// present, is decomposed into numeric year/month predictors, so every
/// remaining non-outcome column is a predictor.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub names: Vec<String>,
    pub columns: Vec<ColumnData>,
    pub outcome: String,
    n_rows: usize,
}

impl RawTable {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
    }

    /// Outcome values as f32, rejecting missing entries.
    pub fn outcome_values(&self) -> Result<Vec<f32>> {
        let col = self
            .column(&self.outcome)
            .ok_or_else(|| anyhow!("Outcome column '{}' not found", self.outcome))?;
        match col {
            ColumnData::Numeric(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    v.map(|x| x as f32)
                        .ok_or_else(|| anyhow!("Missing outcome value at row {}", i + 1))
                })
                .collect(),
            ColumnData::Categorical(_) => {
                bail!("Outcome column '{}' is not numeric", self.outcome)
            }
        }
    }

    /// Names of all predictor columns, in table order.
    pub fn predictor_names(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|n| **n != self.outcome)
            .map(|n| n.as_str())
            .collect()
    }

    /// Build a new table containing the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> RawTable {
        RawTable {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(indices)).collect(),
            outcome: self.outcome.clone(),
            n_rows: indices.len(),
        }
    }

    /// Seeded shuffled split into (train, test) tables.
    pub fn split(&self, test_fraction: f32, seed: u64) -> (RawTable, RawTable) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut indices: Vec<usize> = (0..self.n_rows).collect();
        indices.shuffle(&mut rng);

        let n_test = ((self.n_rows as f64) * test_fraction as f64).round() as usize;
        let n_test = n_test.min(self.n_rows.saturating_sub(1));
        let (test_idx, train_idx) = indices.split_at(n_test);

        log::info!(
            "Split {} rows into {} train / {} test",
            self.n_rows,
            train_idx.len(),
            test_idx.len()
        );
        (self.select_rows(train_idx), self.select_rows(test_idx))
    }

    /// Read a CSV file once, resolving column roles.
    pub fn from_csv<P: AsRef<Path>>(path: P, roles: &ColumnRoles) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .with_context(|| format!("Failed to open dataset: {}", path.as_ref().display()))?;

        let headers = reader
            .headers()
            .context("Failed to read dataset header row")?
            .clone();

        if !headers.iter().any(|h| h == roles.outcome) {
            bail!("Missing outcome column '{}'", roles.outcome);
        }
        if let Some(date) = &roles.date_column {
            if !headers.iter().any(|h| h == date.as_str()) {
                bail!("Missing date column '{}'", date);
            }
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for (row_idx, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
            if record.len() != headers.len() {
                bail!(
                    "Row {} has {} fields, expected {}",
                    row_idx + 1,
                    record.len(),
                    headers.len()
                );
            }
            for (col, value) in record.iter().enumerate() {
                cells[col].push(value.trim().to_string());
            }
        }

        let n_rows = cells.first().map(|c| c.len()).unwrap_or(0);
        if n_rows == 0 {
            bail!("Dataset {} has no rows", path.as_ref().display());
        }

        let mut names = Vec::new();
        let mut columns = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if roles.id_columns.iter().any(|c| c == header) {
                log::debug!("Dropping identifier column '{}'", header);
                continue;
            }
            if roles.date_column.as_deref() == Some(header) {
                let (years, months) = parse_date_column(&cells[idx], header)?;
                names.push(format!("{}_year", header));
                columns.push(ColumnData::Numeric(years));
                names.push(format!("{}_month", header));
                columns.push(ColumnData::Numeric(months));
                continue;
            }
            names.push(header.to_string());
            columns.push(type_column(&cells[idx]));
        }

        log::info!(
            "Loaded {} rows x {} columns from {}",
            n_rows,
            names.len(),
            path.as_ref().display()
        );

        Ok(RawTable {
            names,
            columns,
            outcome: roles.outcome.clone(),
            n_rows,
        })
    }
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("na") || value.eq_ignore_ascii_case("nan")
}

/// Numeric if every non-missing cell parses as f64, categorical otherwise.
fn type_column(cells: &[String]) -> ColumnData {
    let all_numeric = cells
        .iter()
        .filter(|v| !is_missing(v))
        .all(|v| v.parse::<f64>().is_ok());

    if all_numeric && cells.iter().any(|v| !is_missing(v)) {
        ColumnData::Numeric(
            cells
                .iter()
                .map(|v| {
                    if is_missing(v) {
                        None
                    } else {
                        v.parse::<f64>().ok()
                    }
                })
                .collect(),
        )
    } else {
        ColumnData::Categorical(
            cells
                .iter()
                .map(|v| {
                    if is_missing(v) {
                        None
                    } else {
                        Some(v.to_string())
                    }
                })
                .collect(),
        )
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d);
    }
    // Compact stamp form, e.g. 20141013T000000
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .map(|dt| dt.date())
        .ok()
}

fn parse_date_column(
    cells: &[String],
    name: &str,
) -> Result<(Vec<Option<f64>>, Vec<Option<f64>>)> {
    let mut years = Vec::with_capacity(cells.len());
    let mut months = Vec::with_capacity(cells.len());
    for (row_idx, value) in cells.iter().enumerate() {
        if is_missing(value) {
            years.push(None);
            months.push(None);
            continue;
        }
        let date = parse_date(value).ok_or_else(|| {
            anyhow!(
                "Invalid date '{}' in column '{}' at row {}",
                value,
                name,
                row_idx + 1
            )
        })?;
        years.push(Some(chrono::Datelike::year(&date) as f64));
        months.push(Some(chrono::Datelike::month(&date) as f64));
    }
    Ok((years, months))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(values: &[f64]) -> ColumnData {
        ColumnData::Numeric(values.iter().map(|&v| Some(v)).collect())
    }

    fn table() -> RawTable {
        RawTable {
            names: vec!["price".to_string(), "sqft".to_string()],
            columns: vec![
                numeric(&[1.0, 2.0, 3.0, 4.0]),
                numeric(&[10.0, 20.0, 30.0, 40.0]),
            ],
            outcome: "price".to_string(),
            n_rows: 4,
        }
    }

    #[test]
    fn select_rows_reorders_all_columns() {
        let t = table().select_rows(&[2, 0]);
        assert_eq!(t.n_rows(), 2);
        match t.column("price").unwrap() {
            ColumnData::Numeric(v) => assert_eq!(v, &vec![Some(3.0), Some(1.0)]),
            _ => panic!("price should stay numeric"),
        }
    }

    #[test]
    fn split_is_disjoint_and_exhaustive() {
        let (train, test) = table().split(0.25, 7);
        assert_eq!(train.n_rows() + test.n_rows(), 4);
        assert_eq!(test.n_rows(), 1);
    }

    #[test]
    fn split_is_deterministic_per_seed() {
        let a = table().split(0.5, 9);
        let b = table().split(0.5, 9);
        assert_eq!(a.0.column("sqft"), b.0.column("sqft"));
        assert_eq!(a.1.column("sqft"), b.1.column("sqft"));
    }

    #[test]
    fn type_column_detects_numeric_with_missing() {
        let col = type_column(&["1.5".to_string(), "".to_string(), "2".to_string()]);
        assert_eq!(
            col,
            ColumnData::Numeric(vec![Some(1.5), None, Some(2.0)])
        );
    }

    #[test]
    fn type_column_falls_back_to_categorical() {
        let col = type_column(&["a".to_string(), "2".to_string()]);
        match col {
            ColumnData::Categorical(v) => {
                assert_eq!(v, vec![Some("a".to_string()), Some("2".to_string())])
            }
            _ => panic!("mixed column should be categorical"),
        }
    }

    #[test]
    fn parse_date_accepts_both_forms() {
        assert!(parse_date("2014-10-13").is_some());
        assert!(parse_date("20141013T000000").is_some());
        assert!(parse_date("13/10/2014").is_none());
    }
}
