use crate::models::{PerformanceReport, ResultSeries};
use statrs::statistics::Statistics;

/// Trading periods per year used for annualization.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Computes summary statistics from a finalized cumulative-return trajectory.
/// Only borrows the series; the engine keeps ownership.
pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    pub fn analyze(series: &ResultSeries, initial_cash: f64) -> PerformanceReport {
        let cumulative_strategy = series.cumulative_strategy();
        let cumulative_market = series.cumulative_market();
        let n = series.len();

        let total_market_return = cumulative_market.last().copied().unwrap_or(1.0) - 1.0;
        let final_value = cumulative_strategy.last().copied().unwrap_or(initial_cash);
        let total_strategy_return = final_value / initial_cash - 1.0;

        let max_drawdown = Self::max_drawdown(&cumulative_strategy, initial_cash);

        // Annualized over observation count, not elapsed calendar time. This
        // is the reference semantics and is kept as-is.
        let annualized_return =
            (1.0 + total_strategy_return).powf(PERIODS_PER_YEAR / n as f64) - 1.0;

        let annualized_volatility = Self::annualized_volatility(&series.strategy_returns());

        let risk_adjusted = if annualized_volatility == 0.0 {
            f64::NAN
        } else {
            annualized_return / annualized_volatility
        };

        PerformanceReport {
            total_market_return,
            total_strategy_return,
            max_drawdown,
            annualized_return,
            annualized_volatility,
            risk_adjusted,
        }
    }

    /// Deepest decline from a running peak, expressed as a fraction of
    /// initial cash: `(min(cum - running_max) + initial_cash) / initial_cash - 1`.
    /// Always in [-1, 0].
    fn max_drawdown(cumulative: &[f64], initial_cash: f64) -> f64 {
        if cumulative.is_empty() {
            return 0.0;
        }

        let mut running_max = cumulative[0];
        let mut min_drawdown = 0.0_f64;
        for &value in cumulative {
            if value > running_max {
                running_max = value;
            }
            let drawdown = value - running_max;
            if drawdown < min_drawdown {
                min_drawdown = drawdown;
            }
        }

        (min_drawdown + initial_cash) / initial_cash - 1.0
    }

    /// Sample standard deviation over all non-null per-period strategy
    /// returns, scaled to a yearly basis.
    fn annualized_volatility(strategy_returns: &[Option<f64>]) -> f64 {
        let returns: Vec<f64> = strategy_returns.iter().filter_map(|r| *r).collect();
        if returns.len() < 2 {
            return 0.0;
        }
        returns.std_dev() * PERIODS_PER_YEAR.sqrt()
    }
}
