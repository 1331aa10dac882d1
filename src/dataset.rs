use crate::error::BacktestError;
use crate::models::{Observation, PairObservation};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SeriesRecord {
    date: NaiveDate,
    close: f64,
}

/// Loads a `date,close` CSV into observations, keeping file order. Extra
/// columns are ignored; a missing required column fails fast by name rather
/// than letting nulls reach the state machine.
pub fn load_series(path: &Path) -> Result<Vec<Observation>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open data file {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read headers from {}", path.display()))?
        .clone();
    for required in ["date", "close"] {
        if !headers.iter().any(|h| h == required) {
            return Err(BacktestError::MissingData {
                column: required.to_string(),
            }
            .into());
        }
    }

    let mut observations = Vec::new();
    for record in reader.deserialize() {
        let record: SeriesRecord =
            record.with_context(|| format!("Malformed row in {}", path.display()))?;
        if !record.close.is_finite() {
            warn!(
                "Skipping {} row with non-finite close ({})",
                record.date, record.close
            );
            continue;
        }
        observations.push(Observation::new(record.date, record.close));
    }

    if observations.is_empty() {
        return Err(BacktestError::EmptyData.into());
    }
    Ok(observations)
}

/// Inclusive date-range filter.
pub fn between_date(
    observations: Vec<Observation>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<Observation> {
    observations
        .into_iter()
        .filter(|obs| from.is_none_or(|f| obs.date >= f) && to.is_none_or(|t| obs.date <= t))
        .collect()
}

/// Joins two single-instrument series on date into a paired series. Only
/// dates present in both legs survive; order follows the first leg.
pub fn merge_pair(
    series_1: &[Observation],
    series_2: &[Observation],
) -> Result<Vec<PairObservation>> {
    let closes_2: HashMap<NaiveDate, f64> =
        series_2.iter().map(|obs| (obs.date, obs.close)).collect();

    let merged: Vec<PairObservation> = series_1
        .iter()
        .filter_map(|obs| {
            closes_2
                .get(&obs.date)
                .map(|&close_2| PairObservation::new(obs.date, obs.close, close_2))
        })
        .collect();

    if merged.is_empty() {
        return Err(BacktestError::EmptyData.into());
    }
    if merged.len() < series_1.len() || merged.len() < series_2.len() {
        warn!(
            "Pair merge kept {} of {}/{} rows (dates missing from one leg)",
            merged.len(),
            series_1.len(),
            series_2.len()
        );
    }
    Ok(merged)
}
