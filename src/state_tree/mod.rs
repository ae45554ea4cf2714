// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context;
use cid::Cid;
use fvm_ipld_hamt::{BytesKey, Hamt};
use fvm_shared::address::{Address, Protocol};
use fvm_shared::HAMT_BIT_WIDTH;
use serde::de::DeserializeOwned;

use crate::actor::{init, ActorState, INIT_ACTOR_ADDR};
use crate::ipld::BlockStore;

/// A read view over the actor state HAMT rooted at a state root cid. The
/// view is cheap to construct and is never persisted; mutations of chain
/// state happen only through the interpreter.
pub struct StateTree<'db, S> {
    hamt: Hamt<&'db S, ActorState>,
}

impl<'db, S> StateTree<'db, S>
where
    S: BlockStore,
{
    /// Constructor for a HAMT state tree given an IPLD store.
    pub fn new_from_root(store: &'db S, root: &Cid) -> anyhow::Result<Self> {
        let hamt = Hamt::load_with_bit_width(root, store, HAMT_BIT_WIDTH)?;
        Ok(Self { hamt })
    }

    /// Retrieve store reference.
    pub fn store(&self) -> &'db S {
        self.hamt.store()
    }

    /// Get actor state from an address. The address is resolved to its ID
    /// form first.
    pub fn get_actor(&self, addr: &Address) -> anyhow::Result<Option<ActorState>> {
        let addr = match self.lookup_id(addr)? {
            Some(addr) => addr,
            None => return Ok(None),
        };

        Ok(self.hamt.get(&BytesKey(addr.to_bytes()))?.cloned())
    }

    /// Get an ID address from any address. ID-form inputs are returned
    /// unchanged; other forms are resolved through the init actor's address
    /// map.
    pub fn lookup_id(&self, addr: &Address) -> anyhow::Result<Option<Address>> {
        if addr.protocol() == Protocol::ID {
            return Ok(Some(*addr));
        }

        let init_act = self
            .hamt
            .get(&BytesKey(INIT_ACTOR_ADDR.to_bytes()))?
            .context("Init actor address could not be resolved")?;

        let state: init::State = self
            .store()
            .get_obj(&init_act.state)?
            .context("Could not resolve init actor state")?;

        state.resolve_address(self.store(), addr)
    }

    /// Fetches and decodes the state of the actor at `addr` as the typed
    /// state `D`.
    pub fn get_actor_state<D>(&self, addr: &Address) -> anyhow::Result<Option<D>>
    where
        D: DeserializeOwned,
    {
        let actor = match self.get_actor(addr)? {
            Some(actor) => actor,
            None => return Ok(None),
        };
        let state = self
            .store()
            .get_obj(&actor.state)?
            .with_context(|| format!("Actor state not found: {}", actor.state))?;
        Ok(Some(state))
    }

    /// Returns the root cid the view reads from. The tree is read-only, so
    /// this is always the root it was constructed with.
    pub fn flush(&mut self) -> anyhow::Result<Cid> {
        Ok(self.hamt.flush()?)
    }

    /// Returns the address of every actor in the tree.
    pub fn list_addresses(&self) -> anyhow::Result<Vec<Address>> {
        let mut addresses = Vec::new();
        self.hamt.for_each(|k, _| {
            addresses.push(Address::from_bytes(&k.0)?);
            Ok(())
        })?;
        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ACCOUNT_ACTOR_CODE_ID;
    use crate::db::MemoryDB;
    use cid::multihash::Code;
    use fvm_shared::econ::TokenAmount;
    use fvm_shared::ActorID;
    use num_traits::Zero;

    fn empty_actor(state: Cid) -> ActorState {
        ActorState::new(*ACCOUNT_ACTOR_CODE_ID, state, TokenAmount::zero(), 0)
    }

    /// Builds a state tree with an init actor mapping `key_addr` to id 100
    /// and an account actor at that id.
    fn setup(db: &MemoryDB, key_addr: &Address) -> Cid {
        let mut address_map: Hamt<&MemoryDB, ActorID> = Hamt::new_with_bit_width(db, HAMT_BIT_WIDTH);
        address_map
            .set(BytesKey(key_addr.to_bytes()), 100)
            .unwrap();
        let address_map = address_map.flush().unwrap();

        let init_state = init::State {
            address_map,
            next_id: 101,
            network_name: "test".to_string(),
        };
        let init_head = db.put_obj(&init_state, Code::Blake2b256).unwrap();

        let account_state = crate::actor::account::State { address: *key_addr };
        let account_head = db.put_obj(&account_state, Code::Blake2b256).unwrap();

        let mut actors: Hamt<&MemoryDB, ActorState> = Hamt::new_with_bit_width(db, HAMT_BIT_WIDTH);
        actors
            .set(
                BytesKey(INIT_ACTOR_ADDR.to_bytes()),
                empty_actor(init_head),
            )
            .unwrap();
        actors
            .set(
                BytesKey(Address::new_id(100).to_bytes()),
                empty_actor(account_head),
            )
            .unwrap();
        actors.flush().unwrap()
    }

    #[test]
    fn lookup_id_is_idempotent() {
        let db = MemoryDB::default();
        let key_addr = Address::new_secp256k1(&[4u8; 65]).unwrap();
        let root = setup(&db, &key_addr);

        let tree = StateTree::new_from_root(&db, &root).unwrap();
        let id = tree.lookup_id(&key_addr).unwrap().unwrap();
        assert_eq!(id, Address::new_id(100));
        // already-ID addresses resolve to themselves
        assert_eq!(tree.lookup_id(&id).unwrap(), Some(id));
    }

    #[test]
    fn get_actor_resolves_through_id() {
        let db = MemoryDB::default();
        let key_addr = Address::new_secp256k1(&[4u8; 65]).unwrap();
        let root = setup(&db, &key_addr);

        let tree = StateTree::new_from_root(&db, &root).unwrap();
        let by_key = tree.get_actor(&key_addr).unwrap().unwrap();
        let by_id = tree.get_actor(&Address::new_id(100)).unwrap().unwrap();
        assert_eq!(by_key, by_id);

        assert_eq!(tree.get_actor(&Address::new_id(999)).unwrap(), None);
    }

    #[test]
    fn typed_state_access() {
        let db = MemoryDB::default();
        let key_addr = Address::new_secp256k1(&[4u8; 65]).unwrap();
        let root = setup(&db, &key_addr);

        let tree = StateTree::new_from_root(&db, &root).unwrap();
        let state: crate::actor::account::State = tree
            .get_actor_state(&Address::new_id(100))
            .unwrap()
            .unwrap();
        assert_eq!(state.address, key_addr);
    }
}
