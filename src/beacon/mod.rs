// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod beacon_entries;

pub use beacon_entries::BeaconEntry;

use async_trait::async_trait;
use fvm_shared::clock::ChainEpoch;

/// External oracle producing per-epoch randomness entries. Implementations
/// talk to a drand-style network; the core only consumes the entries.
#[async_trait]
pub trait Beaconizer: Send + Sync {
    /// Returns the beacon entries a block produced at `epoch` must carry,
    /// given the newest entry already on chain.
    async fn beacon_entries_for_block(
        &self,
        epoch: ChainEpoch,
        prev: &BeaconEntry,
    ) -> anyhow::Result<Vec<BeaconEntry>>;
}
