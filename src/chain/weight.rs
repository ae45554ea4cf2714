// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::bigint::BigInt;

use crate::blocks::Tipset;

/// Consensus weight formula, opaque to the node core. The chain's fork
/// choice and `ChainTipSetWeight` delegate here.
pub trait WeightCalculator<DB>: Send + Sync {
    fn calculate_weight(&self, db: &DB, tipset: &Tipset) -> anyhow::Result<BigInt>;
}
