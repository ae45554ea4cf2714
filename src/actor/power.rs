// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_hamt::{BytesKey, Hamt};
use fvm_shared::address::Address;
use fvm_shared::bigint::bigint_ser;
use fvm_shared::econ::TokenAmount;
use fvm_shared::sector::StoragePower;
use fvm_shared::HAMT_BIT_WIDTH;

use crate::ipld::BlockStore;

/// Storage power actor state: network power totals and per-miner claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    #[serde(with = "bigint_ser")]
    pub total_raw_byte_power: StoragePower,
    #[serde(with = "bigint_ser")]
    pub total_quality_adj_power: StoragePower,
    pub total_pledge_collateral: TokenAmount,
    pub miner_count: i64,
    /// Claimed power for each miner, keyed by miner address.
    pub claims: Cid,
    pub num_miners_meeting_min_power: i64,
}

/// The claimed power of a single miner.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize_tuple, Deserialize_tuple)]
pub struct Claim {
    /// Sum of raw byte power for a miner's sectors.
    #[serde(with = "bigint_ser")]
    pub raw_byte_power: StoragePower,
    /// Sum of quality adjusted power for a miner's sectors.
    #[serde(with = "bigint_ser")]
    pub quality_adj_power: StoragePower,
}

impl State {
    /// Returns the claim for the given miner, if one is registered.
    pub fn get_claim<DB: BlockStore>(
        &self,
        store: &DB,
        miner: &Address,
    ) -> anyhow::Result<Option<Claim>> {
        let claims: Hamt<&DB, Claim> =
            Hamt::load_with_bit_width(&self.claims, store, HAMT_BIT_WIDTH)?;
        Ok(claims.get(&BytesKey(miner.to_bytes()))?.cloned())
    }

    /// Returns the addresses of every miner with a registered claim.
    pub fn list_miners<DB: BlockStore>(&self, store: &DB) -> anyhow::Result<Vec<Address>> {
        let claims: Hamt<&DB, Claim> =
            Hamt::load_with_bit_width(&self.claims, store, HAMT_BIT_WIDTH)?;
        let mut miners = Vec::new();
        claims.for_each(|k, _| {
            miners.push(Address::from_bytes(&k.0)?);
            Ok(())
        })?;
        Ok(miners)
    }
}
