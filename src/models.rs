use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Raw per-period strategy output. Values outside {+1, -1, 0} collapse to
/// `Hold` so malformed signal data cannot move the position state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    Enter,
    Exit,
    #[default]
    Hold,
}

impl Signal {
    pub fn from_raw(value: i64) -> Self {
        match value {
            1 => Signal::Enter,
            -1 => Signal::Exit,
            _ => Signal::Hold,
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            Signal::Enter => 1,
            Signal::Exit => -1,
            Signal::Hold => 0,
        }
    }
}

/// Position marker: 0 is flat, anything else is the held instrument id.
/// Single-instrument mode only ever uses 0 and 1.
pub const FLAT: u8 = 0;

/// One row of a single-instrument series. Strategies fill `signal` in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: Signal,
}

impl Observation {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            signal: Signal::Hold,
        }
    }
}

/// One (signal, instrument) entry of a multi-instrument period. The source
/// data encoded these as semicolon-delimited strings; they are typed here and
/// keep their list order, which the simulator applies sequentially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairSignal {
    pub signal: Signal,
    pub instrument: u8,
}

/// One row of a paired-instrument series.
#[derive(Debug, Clone, PartialEq)]
pub struct PairObservation {
    pub date: NaiveDate,
    pub close_1: f64,
    pub close_2: f64,
    pub signals: Vec<PairSignal>,
}

impl PairObservation {
    pub fn new(date: NaiveDate, close_1: f64, close_2: f64) -> Self {
        Self {
            date,
            close_1,
            close_2,
            signals: Vec::new(),
        }
    }
}

/// Multi-instrument return attribution. `Lagged` credits period i's market
/// move to the instrument held at i-1 (the single-instrument rule);
/// `Immediate` credits it to the instrument held at i. Both variants exist in
/// the reference behavior, so the choice is a policy rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LagPolicy {
    Lagged,
    #[default]
    Immediate,
}

/// Finalized single-instrument backtest row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: Signal,
    pub position: u8,
    pub market_return: Option<f64>,
    pub strategy_return: Option<f64>,
    pub cumulative_market_return: f64,
    pub cumulative_strategy_return: f64,
}

/// Finalized paired-instrument backtest row. Cumulative market returns are
/// tracked per leg so each instrument can be benchmarked on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResultRow {
    pub date: NaiveDate,
    pub close_1: f64,
    pub close_2: f64,
    pub position: u8,
    pub market_return_1: Option<f64>,
    pub market_return_2: Option<f64>,
    pub strategy_return: Option<f64>,
    pub cumulative_market_return_1: f64,
    pub cumulative_market_return_2: f64,
    pub cumulative_strategy_return: f64,
}

/// The finalized output of a backtest run. Immutable once built; the
/// performance analyzer and reporting only borrow it.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSeries {
    Single(Vec<ResultRow>),
    Pair(Vec<PairResultRow>),
}

impl ResultSeries {
    pub fn len(&self) -> usize {
        match self {
            ResultSeries::Single(rows) => rows.len(),
            ResultSeries::Pair(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        match self {
            ResultSeries::Single(rows) => rows.iter().map(|r| r.date).collect(),
            ResultSeries::Pair(rows) => rows.iter().map(|r| r.date).collect(),
        }
    }

    pub fn cumulative_strategy(&self) -> Vec<f64> {
        match self {
            ResultSeries::Single(rows) => {
                rows.iter().map(|r| r.cumulative_strategy_return).collect()
            }
            ResultSeries::Pair(rows) => {
                rows.iter().map(|r| r.cumulative_strategy_return).collect()
            }
        }
    }

    /// Cumulative market return of the primary instrument (leg 1 in pair
    /// mode), indexed to 1.0 at period 0.
    pub fn cumulative_market(&self) -> Vec<f64> {
        match self {
            ResultSeries::Single(rows) => {
                rows.iter().map(|r| r.cumulative_market_return).collect()
            }
            ResultSeries::Pair(rows) => {
                rows.iter().map(|r| r.cumulative_market_return_1).collect()
            }
        }
    }

    pub fn strategy_returns(&self) -> Vec<Option<f64>> {
        match self {
            ResultSeries::Single(rows) => rows.iter().map(|r| r.strategy_return).collect(),
            ResultSeries::Pair(rows) => rows.iter().map(|r| r.strategy_return).collect(),
        }
    }

    pub fn positions(&self) -> Vec<u8> {
        match self {
            ResultSeries::Single(rows) => rows.iter().map(|r| r.position).collect(),
            ResultSeries::Pair(rows) => rows.iter().map(|r| r.position).collect(),
        }
    }
}

/// Read-only performance snapshot, computed on demand from a finalized
/// [`ResultSeries`]. `risk_adjusted` is NaN when volatility is zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub total_market_return: f64,
    pub total_strategy_return: f64,
    pub max_drawdown: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub risk_adjusted: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_raw_signals_collapse_to_hold() {
        assert_eq!(Signal::from_raw(1), Signal::Enter);
        assert_eq!(Signal::from_raw(-1), Signal::Exit);
        assert_eq!(Signal::from_raw(0), Signal::Hold);
        assert_eq!(Signal::from_raw(2), Signal::Hold);
        assert_eq!(Signal::from_raw(-7), Signal::Hold);
    }

    #[test]
    fn raw_round_trip_for_valid_values() {
        for value in [-1i64, 0, 1] {
            assert_eq!(Signal::from_raw(value).as_raw(), value);
        }
    }
}
