use crate::error::BacktestError;
use crate::indicators;
use crate::models::{Observation, Signal};
use crate::strategy::get_param_usize;
use std::collections::HashMap;

/// MACD crossover: Enter on a golden cross (dif crossing above dea), Exit on
/// a death cross (dif crossing below dea).
pub struct MacdStrategy {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl MacdStrategy {
    pub fn new(parameters: &HashMap<String, f64>) -> Self {
        Self {
            fast_period: get_param_usize(parameters, "fastPeriod", 12),
            slow_period: get_param_usize(parameters, "slowPeriod", 26),
            signal_period: get_param_usize(parameters, "signalPeriod", 9),
        }
    }
}

impl super::Strategy for MacdStrategy {
    fn name(&self) -> &str {
        "macd"
    }

    fn trade(&self, data: &mut [Observation]) -> Result<(), BacktestError> {
        if data.is_empty() {
            return Err(BacktestError::EmptyData);
        }

        let closes: Vec<f64> = data.iter().map(|obs| obs.close).collect();
        let macd = indicators::calculate_macd(
            &closes,
            self.fast_period,
            self.slow_period,
            self.signal_period,
        );

        data[0].signal = Signal::Hold;
        for i in 1..data.len() {
            let prev_dif = macd.dif[i - 1];
            let prev_dea = macd.dea[i - 1];
            let dif = macd.dif[i];
            let dea = macd.dea[i];

            data[i].signal = if prev_dif <= prev_dea && dif > dea {
                Signal::Enter
            } else if prev_dif >= prev_dea && dif < dea {
                Signal::Exit
            } else {
                Signal::Hold
            };
        }

        Ok(())
    }
}
