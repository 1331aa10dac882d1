use crate::error::BacktestError;
use crate::models::{Observation, PairObservation};
use anyhow::Result;
use std::collections::HashMap;

/// A signal producer. Implementations populate the raw signal column(s) of an
/// observation sequence in place; the engine owns everything downstream.
///
/// Both `trade` variants default to `UnimplementedStrategy`, signaled at call
/// time: a strategy only overrides the mode it supports.
pub trait Strategy {
    fn name(&self) -> &str;

    fn trade(&self, _data: &mut [Observation]) -> Result<(), BacktestError> {
        Err(BacktestError::UnimplementedStrategy {
            name: self.name().to_string(),
        })
    }

    fn trade_pairs(&self, _data: &mut [PairObservation]) -> Result<(), BacktestError> {
        Err(BacktestError::UnimplementedStrategy {
            name: self.name().to_string(),
        })
    }
}

#[path = "strategies/macd.rs"]
pub mod macd;

pub use macd::MacdStrategy;

#[path = "strategies/spread.rs"]
pub mod spread;

pub use spread::SpreadStrategy;

pub fn create_strategy(
    template_id: &str,
    parameters: HashMap<String, f64>,
) -> Result<Box<dyn Strategy + Send + Sync>> {
    match template_id {
        "macd" => Ok(Box::new(MacdStrategy::new(&parameters))),
        "spread" => Ok(Box::new(SpreadStrategy::new(&parameters))),
        _ => Err(anyhow::anyhow!(
            "Unknown strategy template: {}",
            template_id
        )),
    }
}

pub(crate) fn get_param_f64(parameters: &HashMap<String, f64>, key: &str, default: f64) -> f64 {
    parameters.get(key).copied().unwrap_or(default)
}

pub(crate) fn get_param_usize(
    parameters: &HashMap<String, f64>,
    key: &str,
    default: usize,
) -> usize {
    parameters
        .get(key)
        .map(|&value| value.max(0.0) as usize)
        .unwrap_or(default)
}
