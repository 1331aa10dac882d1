use crate::models::{PairSignal, Signal, FLAT};

/// Converts raw signals into a causal position trajectory. The simulator is
/// stateless between calls; every invocation starts from a flat position, so
/// repeated runs on the same engine cannot carry stale state.
pub struct PositionSimulator;

impl PositionSimulator {
    /// Single-instrument state machine over {flat, long}.
    ///
    /// Period 0 has no preceding signal to react to and stays flat.
    /// From period 1 on: Enter while flat goes long, Exit while long goes
    /// flat, everything else (including Enter while long and Exit while flat)
    /// is a silent no-op. The recorded position is the post-transition state,
    /// so a signal takes effect within its own period.
    pub fn simulate(signals: &[Signal]) -> Vec<u8> {
        let mut positions = vec![FLAT; signals.len()];
        let mut state = FLAT;

        for i in 1..signals.len() {
            match signals[i] {
                Signal::Enter if state == FLAT => state = 1,
                Signal::Exit if state == 1 => state = FLAT,
                _ => {}
            }
            positions[i] = state;
        }

        positions
    }

    /// Multi-instrument state machine over {flat, instrument id}.
    ///
    /// Each period's signal list is applied sequentially in list order, so
    /// when entries conflict the last one wins. Enter for an instrument not
    /// currently held switches to it (at most one instrument is ever held);
    /// Exit while holding anything flattens, regardless of the instrument it
    /// names.
    pub fn simulate_pairs(signal_lists: &[Vec<PairSignal>]) -> Vec<u8> {
        let mut positions = vec![FLAT; signal_lists.len()];
        let mut state = FLAT;

        for i in 1..signal_lists.len() {
            for entry in &signal_lists[i] {
                match entry.signal {
                    Signal::Enter if state != entry.instrument => state = entry.instrument,
                    Signal::Exit if state != FLAT => state = FLAT,
                    _ => {}
                }
            }
            positions[i] = state;
        }

        positions
    }
}
