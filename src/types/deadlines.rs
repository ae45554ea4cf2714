// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::clock::ChainEpoch;
use serde::{Deserialize, Serialize};

/// The number of non-overlapping PoSt windows in a proving period.
pub const WPOST_PERIOD_DEADLINES: u64 = 48;
/// The period over which all a miner's active sectors are challenged.
pub const WPOST_PROVING_PERIOD: ChainEpoch = 2880;
/// The duration of a deadline's challenge window.
pub const WPOST_CHALLENGE_WINDOW: ChainEpoch = WPOST_PROVING_PERIOD / WPOST_PERIOD_DEADLINES as i64;
/// Lookback from the deadline's open epoch to the challenge epoch.
pub const WPOST_CHALLENGE_LOOKBACK: ChainEpoch = 20;
/// Epochs before a deadline opens during which faults may no longer be
/// declared for it.
pub const FAULT_DECLARATION_CUTOFF: ChainEpoch = 50;

/// Deadline calculations with respect to a current epoch. "Deadline" refers
/// to the window during which proofs may be submitted. Windows are
/// non-overlapping ranges [Open, Close), but the challenge epoch for a
/// window occurs before the window opens.
#[derive(Default, Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct DeadlineInfo {
    /// Epoch at which this info was calculated.
    pub current_epoch: ChainEpoch,
    /// First epoch of the proving period (<= CurrentEpoch).
    pub period_start: ChainEpoch,
    /// Current deadline index, in [0..WPoStProvingPeriodDeadlines).
    pub index: u64,
    /// First epoch from which a proof may be submitted (>= CurrentEpoch).
    pub open: ChainEpoch,
    /// First epoch from which a proof may no longer be submitted (>= Open).
    pub close: ChainEpoch,
    /// Epoch at which to sample the chain for challenge (< Open).
    pub challenge: ChainEpoch,
    /// First epoch at which a fault declaration is rejected (< Open).
    pub fault_cutoff: ChainEpoch,
}

impl DeadlineInfo {
    pub fn new(period_start: ChainEpoch, deadline_idx: u64, current_epoch: ChainEpoch) -> Self {
        if deadline_idx < WPOST_PERIOD_DEADLINES {
            let deadline_open = period_start + (deadline_idx as i64 * WPOST_CHALLENGE_WINDOW);
            Self {
                current_epoch,
                period_start,
                index: deadline_idx,
                open: deadline_open,
                close: deadline_open + WPOST_CHALLENGE_WINDOW,
                challenge: deadline_open - WPOST_CHALLENGE_LOOKBACK,
                fault_cutoff: deadline_open - FAULT_DECLARATION_CUTOFF,
            }
        } else {
            // return deadline info for a no-duration deadline
            let after_last_deadline = period_start + WPOST_PROVING_PERIOD;
            Self {
                current_epoch,
                period_start,
                index: deadline_idx,
                open: after_last_deadline,
                close: after_last_deadline,
                challenge: after_last_deadline,
                fault_cutoff: 0,
            }
        }
    }

    /// Whether the proving period has begun.
    pub fn period_started(&self) -> bool {
        self.current_epoch >= self.period_start
    }

    /// The first epoch in the next proving period.
    pub fn next_period_start(&self) -> ChainEpoch {
        self.period_start + WPOST_PROVING_PERIOD
    }

    /// Whether the current deadline is currently open.
    pub fn is_open(&self) -> bool {
        self.current_epoch >= self.open && self.current_epoch < self.close
    }

    /// Whether the current deadline has already closed.
    pub fn has_elapsed(&self) -> bool {
        self.current_epoch >= self.close
    }

    /// Whether the deadline's fault cutoff has passed.
    pub fn fault_cutoff_passed(&self) -> bool {
        self.current_epoch >= self.fault_cutoff
    }
}

/// Returns deadline calculations for a proving period start and the current
/// epoch. Before the period starts every window is reported as the first
/// one, opening at the period start.
pub fn compute_proving_period_deadline(
    period_start: ChainEpoch,
    current_epoch: ChainEpoch,
) -> DeadlineInfo {
    let period_progress = current_epoch - period_start;
    if period_progress < 0 {
        return DeadlineInfo::new(period_start, 0, current_epoch);
    }

    let deadline_idx = (period_progress % WPOST_PROVING_PERIOD) / WPOST_CHALLENGE_WINDOW;
    let period_start = current_epoch - (period_progress % WPOST_PROVING_PERIOD);

    DeadlineInfo::new(period_start, deadline_idx as u64, current_epoch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_deadline_of_period() {
        let info = compute_proving_period_deadline(100, 100);
        assert_eq!(info.index, 0);
        assert_eq!(info.open, 100);
        assert_eq!(info.close, 100 + WPOST_CHALLENGE_WINDOW);
        assert!(info.is_open());
    }

    #[test]
    fn mid_period_deadline() {
        let start = 0;
        let epoch = WPOST_CHALLENGE_WINDOW * 3 + 1;
        let info = compute_proving_period_deadline(start, epoch);
        assert_eq!(info.index, 3);
        assert!(info.is_open());
        assert!(info.period_started());
    }

    #[test]
    fn before_period_starts() {
        let info = compute_proving_period_deadline(500, 100);
        assert_eq!(info.index, 0);
        assert_eq!(info.open, 500);
        assert!(!info.period_started());
    }
}
