// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_hamt::{BytesKey, Hamt};
use fvm_shared::address::{Address, Protocol};
use fvm_shared::{ActorID, HAMT_BIT_WIDTH};

use crate::ipld::BlockStore;

/// Init actor state: the assigner of actor IDs, and keeper of the network
/// name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    pub address_map: Cid,
    pub next_id: ActorID,
    pub network_name: String,
}

impl State {
    /// Resolves an address to an ID-form address, if possible. ID-form
    /// inputs resolve to themselves without touching the map.
    pub fn resolve_address<DB: BlockStore>(
        &self,
        store: &DB,
        addr: &Address,
    ) -> anyhow::Result<Option<Address>> {
        if addr.protocol() == Protocol::ID {
            return Ok(Some(*addr));
        }

        let map: Hamt<&DB, ActorID> =
            Hamt::load_with_bit_width(&self.address_map, store, HAMT_BIT_WIDTH)?;
        Ok(map
            .get(&BytesKey(addr.to_bytes()))?
            .copied()
            .map(Address::new_id))
    }
}
