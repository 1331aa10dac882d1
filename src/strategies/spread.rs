use crate::error::BacktestError;
use crate::models::{PairObservation, PairSignal, Signal};
use crate::strategy::get_param_f64;
use std::collections::HashMap;

/// Paired-instrument spread strategy over `diff = close_2 - close_1`.
///
/// A wide spread means instrument 2 is rich relative to instrument 1, so the
/// emitted list is Exit(2) then Enter(1); a narrow spread is the mirror
/// image. The Exit-then-Enter ordering matters because the simulator applies
/// each period's list sequentially.
pub struct SpreadStrategy {
    upper: f64,
    lower: f64,
}

impl SpreadStrategy {
    pub fn new(parameters: &HashMap<String, f64>) -> Self {
        Self {
            upper: get_param_f64(parameters, "upper", 2.3),
            lower: get_param_f64(parameters, "lower", 1.7),
        }
    }
}

impl super::Strategy for SpreadStrategy {
    fn name(&self) -> &str {
        "spread"
    }

    fn trade_pairs(&self, data: &mut [PairObservation]) -> Result<(), BacktestError> {
        if data.is_empty() {
            return Err(BacktestError::EmptyData);
        }

        for row in data.iter_mut() {
            let diff = row.close_2 - row.close_1;
            row.signals = if diff >= self.upper {
                vec![
                    PairSignal {
                        signal: Signal::Exit,
                        instrument: 2,
                    },
                    PairSignal {
                        signal: Signal::Enter,
                        instrument: 1,
                    },
                ]
            } else if diff <= self.lower {
                vec![
                    PairSignal {
                        signal: Signal::Exit,
                        instrument: 1,
                    },
                    PairSignal {
                        signal: Signal::Enter,
                        instrument: 2,
                    },
                ]
            } else {
                Vec::new()
            };
        }

        Ok(())
    }
}
