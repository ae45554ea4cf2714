// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::multihash::Code::Blake2b256;
use cid::Cid;
use fvm_shared::address::Address;
use std::sync::Arc;

use super::Error;
use crate::actor::ActorState;
use crate::blocks::Tipset;
use crate::ipld::BlockStore;
use crate::message::SignedMessage;
use crate::state_manager::StateManager;
use crate::state_tree::StateTree;

/// The medium the message pool reads chain state through, behind a trait so
/// tests can substitute a stub chain.
pub trait Provider: Send + Sync {
    /// Get the heaviest tipset known to the provider.
    fn get_heaviest_tipset(&self) -> Option<Arc<Tipset>>;
    /// Return the state of an actor as seen by the given tipset.
    fn get_actor_at(&self, addr: &Address, ts: &Tipset) -> Result<ActorState, Error>;
    /// Persist a message, returning its cid.
    fn put_message(&self, msg: &SignedMessage) -> Result<Cid, Error>;
}

/// Default Provider implementation backed by the state manager, used by the
/// mpool RPC handlers.
pub struct MpoolRpcProvider<DB> {
    sm: Arc<StateManager<DB>>,
}

impl<DB> MpoolRpcProvider<DB>
where
    DB: BlockStore + Send + Sync,
{
    pub fn new(sm: Arc<StateManager<DB>>) -> Self {
        Self { sm }
    }
}

impl<DB> Provider for MpoolRpcProvider<DB>
where
    DB: BlockStore + Send + Sync + 'static,
{
    fn get_heaviest_tipset(&self) -> Option<Arc<Tipset>> {
        self.sm.chain_store().heaviest_tipset()
    }

    fn get_actor_at(&self, addr: &Address, ts: &Tipset) -> Result<ActorState, Error> {
        let state = StateTree::new_from_root(self.sm.blockstore(), ts.parent_state())
            .map_err(|e| Error::Other(e.to_string()))?;
        let actor = state
            .get_actor(addr)
            .map_err(|e| Error::Other(e.to_string()))?;
        actor.ok_or_else(|| Error::SenderNotFound(addr.to_string()))
    }

    fn put_message(&self, msg: &SignedMessage) -> Result<Cid, Error> {
        self.sm
            .blockstore()
            .put_obj(msg, Blake2b256)
            .map_err(|e| Error::Other(e.to_string()))
    }
}
