use crate::models::{
    LagPolicy, Observation, PairObservation, PairResultRow, ResultRow, FLAT,
};

/// Derives per-period and cumulative returns from prices and a simulated
/// position trajectory.
pub struct ReturnsCalculator;

impl ReturnsCalculator {
    /// Simple per-period returns. `None` at period 0 and wherever the prior
    /// close is zero or non-finite; a missing return never aborts the run, it
    /// just contributes nothing to the cumulative product.
    pub fn market_returns(closes: &[f64]) -> Vec<Option<f64>> {
        let mut returns = vec![None; closes.len()];
        for i in 1..closes.len() {
            let prev = closes[i - 1];
            if prev != 0.0 && prev.is_finite() && closes[i].is_finite() {
                returns[i] = Some((closes[i] - prev) / prev);
            }
        }
        returns
    }

    /// Running product of `1 + r`, with `None` counted as zero for that
    /// period only.
    pub fn cumulative(returns: &[Option<f64>], seed: f64) -> Vec<f64> {
        let mut acc = seed;
        returns
            .iter()
            .map(|r| {
                acc *= 1.0 + r.unwrap_or(0.0);
                acc
            })
            .collect()
    }

    /// Builds the finalized single-instrument rows. Strategy attribution lags
    /// the position by one period: the position held entering period i earns
    /// that period's market move.
    pub fn build_single(
        observations: &[Observation],
        positions: &[u8],
        initial_cash: f64,
    ) -> Vec<ResultRow> {
        let closes: Vec<f64> = observations.iter().map(|o| o.close).collect();
        let market_returns = Self::market_returns(&closes);

        let strategy_returns: Vec<Option<f64>> = (0..observations.len())
            .map(|i| {
                if i == 0 {
                    None
                } else {
                    market_returns[i].map(|r| positions[i - 1] as f64 * r)
                }
            })
            .collect();

        let cumulative_market = Self::cumulative(&market_returns, 1.0);
        let cumulative_strategy = Self::cumulative(&strategy_returns, initial_cash);

        observations
            .iter()
            .enumerate()
            .map(|(i, obs)| ResultRow {
                date: obs.date,
                close: obs.close,
                signal: obs.signal,
                position: positions[i],
                market_return: market_returns[i],
                strategy_return: strategy_returns[i],
                cumulative_market_return: cumulative_market[i],
                cumulative_strategy_return: cumulative_strategy[i],
            })
            .collect()
    }

    /// Builds the finalized paired-instrument rows. The held instrument for
    /// attribution at period i is chosen by `lag_policy`; cumulative market
    /// returns are tracked per leg for benchmarking.
    pub fn build_pair(
        observations: &[PairObservation],
        positions: &[u8],
        initial_cash: f64,
        lag_policy: LagPolicy,
    ) -> Vec<PairResultRow> {
        let closes_1: Vec<f64> = observations.iter().map(|o| o.close_1).collect();
        let closes_2: Vec<f64> = observations.iter().map(|o| o.close_2).collect();
        let market_returns_1 = Self::market_returns(&closes_1);
        let market_returns_2 = Self::market_returns(&closes_2);

        let strategy_returns: Vec<Option<f64>> = (0..observations.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                let held = match lag_policy {
                    LagPolicy::Lagged => positions[i - 1],
                    LagPolicy::Immediate => positions[i],
                };
                match held {
                    FLAT => Some(0.0),
                    1 => market_returns_1[i],
                    _ => market_returns_2[i],
                }
            })
            .collect();

        let cumulative_market_1 = Self::cumulative(&market_returns_1, 1.0);
        let cumulative_market_2 = Self::cumulative(&market_returns_2, 1.0);
        let cumulative_strategy = Self::cumulative(&strategy_returns, initial_cash);

        observations
            .iter()
            .enumerate()
            .map(|(i, obs)| PairResultRow {
                date: obs.date,
                close_1: obs.close_1,
                close_2: obs.close_2,
                position: positions[i],
                market_return_1: market_returns_1[i],
                market_return_2: market_returns_2[i],
                strategy_return: strategy_returns[i],
                cumulative_market_return_1: cumulative_market_1[i],
                cumulative_market_return_2: cumulative_market_2[i],
                cumulative_strategy_return: cumulative_strategy[i],
            })
            .collect()
    }
}
