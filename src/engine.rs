use crate::error::BacktestError;
use crate::models::{
    LagPolicy, Observation, PairObservation, PerformanceReport, ResultSeries, Signal,
};
use crate::performance::PerformanceAnalyzer;
use crate::returns::ReturnsCalculator;
use crate::simulator::PositionSimulator;
use crate::strategy::Strategy;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

pub const DEFAULT_INITIAL_CASH: f64 = 200_000.0;

/// Orchestrates one backtest: the strategy populates signals, the simulator
/// turns them into positions, the returns calculator builds the result
/// series, and the analyzer reads it back out on demand.
///
/// Each run rebuilds the result series from scratch, so rerunning the same
/// engine never carries position state across runs.
pub struct BacktestEngine {
    strategy: Box<dyn Strategy + Send + Sync>,
    initial_cash: f64,
    lag_policy: LagPolicy,
    results: Option<ResultSeries>,
    bench: Option<Vec<Observation>>,
}

impl BacktestEngine {
    pub fn new(strategy: Box<dyn Strategy + Send + Sync>) -> Self {
        Self {
            strategy,
            initial_cash: DEFAULT_INITIAL_CASH,
            lag_policy: LagPolicy::default(),
            results: None,
            bench: None,
        }
    }

    pub fn set_initial_cash(&mut self, cash: f64) {
        self.initial_cash = cash;
    }

    pub fn set_lag_policy(&mut self, policy: LagPolicy) {
        self.lag_policy = policy;
    }

    /// Independent comparison series; never touches strategy or position
    /// state.
    pub fn set_bench(&mut self, bench: Vec<Observation>) {
        self.bench = Some(bench);
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    /// Runs a single-instrument backtest over an owned observation sequence.
    pub fn run(&mut self, mut data: Vec<Observation>) -> Result<(), BacktestError> {
        if data.is_empty() {
            return Err(BacktestError::EmptyData);
        }
        self.results = None;

        self.strategy.trade(&mut data)?;

        let signals: Vec<Signal> = data.iter().map(|obs| obs.signal).collect();
        let positions = PositionSimulator::simulate(&signals);
        let rows = ReturnsCalculator::build_single(&data, &positions, self.initial_cash);

        info!(
            "Backtest `{}` complete: {} periods, final value {:.2}",
            self.strategy.name(),
            rows.len(),
            rows.last().map(|r| r.cumulative_strategy_return).unwrap_or(self.initial_cash)
        );
        self.results = Some(ResultSeries::Single(rows));
        Ok(())
    }

    /// Runs a paired-instrument backtest.
    pub fn run_pairs(&mut self, mut data: Vec<PairObservation>) -> Result<(), BacktestError> {
        if data.is_empty() {
            return Err(BacktestError::EmptyData);
        }
        self.results = None;

        self.strategy.trade_pairs(&mut data)?;

        let signal_lists: Vec<_> = data.iter().map(|obs| obs.signals.clone()).collect();
        let positions = PositionSimulator::simulate_pairs(&signal_lists);
        let rows =
            ReturnsCalculator::build_pair(&data, &positions, self.initial_cash, self.lag_policy);

        info!(
            "Pair backtest `{}` complete: {} periods, final value {:.2}",
            self.strategy.name(),
            rows.len(),
            rows.last().map(|r| r.cumulative_strategy_return).unwrap_or(self.initial_cash)
        );
        self.results = Some(ResultSeries::Pair(rows));
        Ok(())
    }

    pub fn results(&self) -> Result<&ResultSeries, BacktestError> {
        self.results.as_ref().ok_or(BacktestError::NotRun)
    }

    pub fn report(&self) -> Result<PerformanceReport, BacktestError> {
        let series = self.results()?;
        Ok(PerformanceAnalyzer::analyze(series, self.initial_cash))
    }

    /// Benchmark cumulative market return, computed on demand from the bench
    /// series alone.
    pub fn bench_curve(&self) -> Option<Vec<(chrono::NaiveDate, f64)>> {
        let bench = self.bench.as_ref()?;
        let closes: Vec<f64> = bench.iter().map(|obs| obs.close).collect();
        let returns = ReturnsCalculator::market_returns(&closes);
        let cumulative = ReturnsCalculator::cumulative(&returns, 1.0);
        Some(
            bench
                .iter()
                .zip(cumulative)
                .map(|(obs, cum)| (obs.date, cum))
                .collect(),
        )
    }

    /// Dumps the full result series to a flat CSV for offline inspection or
    /// plotting. Null returns are written as empty fields.
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let series = self.results().context("Nothing to export")?;
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        match series {
            ResultSeries::Single(rows) => {
                writer.write_record([
                    "date",
                    "close",
                    "signal",
                    "position",
                    "market_return",
                    "strategy_return",
                    "cumulative_market_return",
                    "cumulative_strategy_return",
                ])?;
                for row in rows {
                    writer.write_record([
                        row.date.to_string(),
                        row.close.to_string(),
                        row.signal.as_raw().to_string(),
                        row.position.to_string(),
                        optional_field(row.market_return),
                        optional_field(row.strategy_return),
                        row.cumulative_market_return.to_string(),
                        row.cumulative_strategy_return.to_string(),
                    ])?;
                }
            }
            ResultSeries::Pair(rows) => {
                writer.write_record([
                    "date",
                    "close_1",
                    "close_2",
                    "position",
                    "market_return_1",
                    "market_return_2",
                    "strategy_return",
                    "cumulative_market_return_1",
                    "cumulative_market_return_2",
                    "cumulative_strategy_return",
                ])?;
                for row in rows {
                    writer.write_record([
                        row.date.to_string(),
                        row.close_1.to_string(),
                        row.close_2.to_string(),
                        row.position.to_string(),
                        optional_field(row.market_return_1),
                        optional_field(row.market_return_2),
                        optional_field(row.strategy_return),
                        row.cumulative_market_return_1.to_string(),
                        row.cumulative_market_return_2.to_string(),
                        row.cumulative_strategy_return.to_string(),
                    ])?;
                }
            }
        }

        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;
        Ok(())
    }
}

fn optional_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// Marks every period after the first as Enter; the state machine's
    /// idempotent-enter rule keeps a single long position.
    struct AlwaysEnter;

    impl Strategy for AlwaysEnter {
        fn name(&self) -> &str {
            "always_enter"
        }

        fn trade(&self, data: &mut [Observation]) -> Result<(), BacktestError> {
            for obs in data.iter_mut().skip(1) {
                obs.signal = Signal::Enter;
            }
            Ok(())
        }
    }

    struct NeverTrades;

    impl Strategy for NeverTrades {
        fn name(&self) -> &str {
            "never_trades"
        }

        fn trade(&self, _data: &mut [Observation]) -> Result<(), BacktestError> {
            Ok(())
        }
    }

    fn observations(closes: &[f64]) -> Vec<Observation> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64);
                Observation::new(date, close)
            })
            .collect()
    }

    #[test]
    fn report_before_run_is_not_run_error() {
        let engine = BacktestEngine::new(Box::new(NeverTrades));
        assert!(matches!(engine.report(), Err(BacktestError::NotRun)));
        assert!(matches!(engine.results(), Err(BacktestError::NotRun)));
    }

    #[test]
    fn run_on_empty_data_is_rejected() {
        let mut engine = BacktestEngine::new(Box::new(NeverTrades));
        assert!(matches!(
            engine.run(Vec::new()),
            Err(BacktestError::EmptyData)
        ));
    }

    #[test]
    fn rerunning_resets_position_state() {
        let mut engine = BacktestEngine::new(Box::new(AlwaysEnter));
        engine.set_initial_cash(1000.0);
        let data = observations(&[100.0, 110.0, 121.0]);

        engine.run(data.clone()).unwrap();
        let first = engine.results().unwrap().clone();
        engine.run(data).unwrap();
        let second = engine.results().unwrap().clone();

        // Identical input twice must give identical output; in particular the
        // second run starts flat again.
        assert_eq!(first, second);
        assert_eq!(second.positions()[0], 0);
    }

    #[test]
    fn held_window_tracks_market_exactly() {
        // Entered at period 1 and never exited: strategy growth from period 1
        // on must equal market growth over the same window.
        let mut engine = BacktestEngine::new(Box::new(AlwaysEnter));
        engine.set_initial_cash(1000.0);
        engine
            .run(observations(&[100.0, 105.0, 110.25, 115.7625]))
            .unwrap();

        let series = engine.results().unwrap();
        let cumulative = series.cumulative_strategy();
        let expected = 1000.0 * 115.7625 / 105.0;
        assert!((cumulative[3] - expected).abs() < 1e-9);
    }

    #[test]
    fn bench_curve_is_independent_of_strategy() {
        let bench = observations(&[50.0, 55.0, 60.5]);

        let mut engine_a = BacktestEngine::new(Box::new(AlwaysEnter));
        engine_a.set_bench(bench.clone());
        engine_a.run(observations(&[100.0, 101.0, 99.0])).unwrap();

        let mut engine_b = BacktestEngine::new(Box::new(NeverTrades));
        engine_b.set_bench(bench);
        engine_b.run(observations(&[100.0, 101.0, 99.0])).unwrap();

        assert_eq!(engine_a.bench_curve(), engine_b.bench_curve());
        let curve = engine_a.bench_curve().unwrap();
        assert!((curve[0].1 - 1.0).abs() < 1e-12);
        assert!((curve[2].1 - 1.21).abs() < 1e-9);
    }

    #[test]
    fn export_before_run_fails() {
        let engine = BacktestEngine::new(Box::new(NeverTrades));
        let dir = tempfile::tempdir().unwrap();
        assert!(engine.export_csv(&dir.path().join("out.csv")).is_err());
    }
}
