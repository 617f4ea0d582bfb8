//! Series preparation: raw tabular records to clean per-attribute series.
//!
//! Cleaning drops whole rows when any of year/male/female/total fails to
//! parse, so the three derived series always share one set of years. The
//! cutoff year must match between training and serving, or forecasts
//! silently drift out of the scale the predictors were trained on; both
//! sides take it from the same [`CleanConfig`].

use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{AnnualSeries, Attribute};
use crate::error::{ForecastError, Result};

/// Default final year kept by cleaning; 2020 is excluded as a
/// pandemic-affected outlier, matching the span the models were trained on.
pub const DEFAULT_CUTOFF_YEAR: i32 = 2019;

/// One row of the raw input table, fields still unparsed.
///
/// Values may carry thousands separators and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub year: String,
    pub male: String,
    pub female: String,
    pub total: String,
}

/// Knobs for the cleaning stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Drop years strictly after this one; `None` keeps the full span.
    pub cutoff_year: Option<i32>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            cutoff_year: Some(DEFAULT_CUTOFF_YEAR),
        }
    }
}

impl CleanConfig {
    pub fn with_cutoff(year: i32) -> Self {
        Self {
            cutoff_year: Some(year),
        }
    }

    pub fn without_cutoff() -> Self {
        Self { cutoff_year: None }
    }
}

/// Cleaned emigrant counts: one row per year, all three attributes present.
#[derive(Debug, Clone, PartialEq)]
pub struct EmigrantTable {
    years: Vec<i32>,
    male: Vec<f32>,
    female: Vec<f32>,
    total: Vec<f32>,
}

impl EmigrantTable {
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Extract the series for one attribute.
    pub fn series(&self, attribute: Attribute) -> AnnualSeries {
        let values = match attribute {
            Attribute::Total => self.total.clone(),
            Attribute::Male => self.male.clone(),
            Attribute::Female => self.female.clone(),
        };
        AnnualSeries::from_sorted_unchecked(self.years.clone(), values)
    }
}

/// Strip thousands separators and whitespace, then parse a count.
///
/// Failures become `None` rather than errors; the row is dropped later.
fn parse_count(raw: &str) -> Option<f32> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Parse a year, coercing float-typed columns ("1981.0") to integers.
fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v as i32)
}

/// Clean raw records into a sorted table.
///
/// Rows with any unparseable field are dropped whole; remaining rows are
/// sorted ascending by year. For duplicate years the first record in sorted
/// (stable) order is kept. Years beyond the configured cutoff are excluded.
pub fn clean(records: &[RawRecord], config: &CleanConfig) -> Result<EmigrantTable> {
    let mut rows: Vec<(i32, f32, f32, f32)> = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        match (
            parse_year(&record.year),
            parse_count(&record.male),
            parse_count(&record.female),
            parse_count(&record.total),
        ) {
            (Some(year), Some(male), Some(female), Some(total)) => {
                rows.push((year, male, female, total));
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(dropped, "dropped rows with unparseable fields");
    }

    rows.sort_by_key(|row| row.0);

    let mut duplicates = 0usize;
    rows.dedup_by(|current, kept| {
        if current.0 == kept.0 {
            duplicates += 1;
            true
        } else {
            false
        }
    });
    if duplicates > 0 {
        warn!(duplicates, "dropped duplicate-year rows, keeping the first");
    }

    if let Some(cutoff) = config.cutoff_year {
        rows.retain(|row| row.0 <= cutoff);
    }

    let mut table = EmigrantTable {
        years: Vec::with_capacity(rows.len()),
        male: Vec::with_capacity(rows.len()),
        female: Vec::with_capacity(rows.len()),
        total: Vec::with_capacity(rows.len()),
    };
    for (year, male, female, total) in rows {
        table.years.push(year);
        table.male.push(male);
        table.female.push(female);
        table.total.push(total);
    }
    Ok(table)
}

/// Normalize a caller-supplied `(years, values)` series through the same
/// cleaning invariants as the default table: paired lengths, ascending
/// sort, keep-first duplicate policy, cutoff filter.
pub fn normalize_series(
    years: &[i32],
    values: &[f32],
    config: &CleanConfig,
) -> Result<AnnualSeries> {
    if years.len() != values.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: years.len(),
            got: values.len(),
        });
    }

    let mut pairs: Vec<(i32, f32)> = years
        .iter()
        .copied()
        .zip(values.iter().copied())
        .filter(|(_, v)| v.is_finite())
        .collect();
    let dropped = years.len() - pairs.len();
    if dropped > 0 {
        warn!(dropped, "dropped non-finite values from supplied series");
    }

    pairs.sort_by_key(|pair| pair.0);
    pairs.dedup_by(|current, kept| current.0 == kept.0);
    if let Some(cutoff) = config.cutoff_year {
        pairs.retain(|pair| pair.0 <= cutoff);
    }

    let (years, values) = pairs.into_iter().unzip();
    Ok(AnnualSeries::from_sorted_unchecked(years, values))
}

/// Read raw records from CSV input.
///
/// Column matching is whitespace-trimmed and case-insensitive; all four of
/// year/male/female/total must be present. Field-level problems are left
/// for [`clean`] to drop row-wise.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| ForecastError::Data(e.to_string()))?
        .clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let year_idx = find("year")
        .ok_or_else(|| ForecastError::Data("missing required column 'year'".to_string()))?;
    let male_idx = find("male")
        .ok_or_else(|| ForecastError::Data("missing required column 'male'".to_string()))?;
    let female_idx = find("female")
        .ok_or_else(|| ForecastError::Data("missing required column 'female'".to_string()))?;
    let total_idx = find("total")
        .ok_or_else(|| ForecastError::Data("missing required column 'total'".to_string()))?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row.map_err(|e| ForecastError::Data(e.to_string()))?;
        let field = |idx: usize| row.get(idx).unwrap_or("").to_string();
        records.push(RawRecord {
            year: field(year_idx),
            male: field(male_idx),
            female: field(female_idx),
            total: field(total_idx),
        });
    }
    Ok(records)
}

/// Read and clean in one step.
pub fn load_table<R: Read>(reader: R, config: &CleanConfig) -> Result<EmigrantTable> {
    let records = read_records(reader)?;
    clean(&records, config)
}
