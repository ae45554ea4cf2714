// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
pub mod utils;

pub use self::errors::*;

use fvm_ipld_encoding::{to_vec, RawBytes};
use fvm_shared::address::Address;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::sector::{SectorInfo, SectorSize, StoragePower};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::actor::{
    account, init, market, miner, power, ActorState, ACCOUNT_ACTOR_CODE_ID, INIT_ACTOR_ADDR,
    STORAGE_MARKET_ACTOR_ADDR, STORAGE_POWER_ACTOR_ADDR,
};
use crate::beacon::{BeaconEntry, Beaconizer};
use crate::blocks::{Tipset, TipsetKeys};
use crate::chain::ChainStore;
use crate::crypto::{draw_randomness, DomainSeparationTag};
use crate::interpreter::{
    normalize_vm_exit_code, Interpreter, InterpreterResult, Invoker, VmError,
};
use crate::ipld::BlockStore;
use crate::message::{MessageReceipt, UnsignedMessage};
use crate::state_tree::StateTree;
use crate::types::ProofVerifier;

/// Epochs to look back for the sector set challenged by a winning PoSt.
pub const WINNING_POST_SECTOR_SET_LOOKBACK: ChainEpoch = 10;

/// Result of a state call: the message, its receipt and the actor error if
/// the invoked actor aborted.
#[derive(Clone, Debug, PartialEq)]
pub struct InvocResult {
    pub msg: UnsignedMessage,
    pub msg_rct: MessageReceipt,
    pub actor_error: Option<String>,
}

/// Escrow and locked balances of an address in the storage market.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketBalance {
    pub escrow: TokenAmount,
    pub locked: TokenAmount,
}

/// Everything a miner needs to produce a winning block at an epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct MiningBaseInfo {
    pub miner_power: StoragePower,
    pub network_power: StoragePower,
    pub sectors: Vec<SectorInfo>,
    pub worker: Address,
    pub sector_size: SectorSize,
    pub prev_beacon_entry: BeaconEntry,
    pub beacon_entries: Vec<BeaconEntry>,
}

/// A per-request view of the chain state at a tipset: the tipset itself and
/// a state tree rooted either at the tipset's parent state root
/// (uninterpreted, the state *as seen by* the tipset) or at the root the
/// interpreter produced for it (interpreted, the state *after* the tipset).
pub struct TipsetContext<'db, DB> {
    pub tipset: Arc<Tipset>,
    pub state_tree: StateTree<'db, DB>,
    pub interpreted: Option<InterpreterResult>,
}

impl<'db, DB> TipsetContext<'db, DB>
where
    DB: BlockStore,
{
    /// Typed state of the storage market actor.
    pub fn market_state(&self) -> Result<market::State, Error> {
        self.state(&STORAGE_MARKET_ACTOR_ADDR)
    }

    /// Typed state of a miner actor.
    pub fn miner_state(&self, address: &Address) -> Result<miner::State, Error> {
        self.state(address)
    }

    /// Typed state of the storage power actor.
    pub fn power_state(&self) -> Result<power::State, Error> {
        self.state(&STORAGE_POWER_ACTOR_ADDR)
    }

    /// Typed state of the init actor.
    pub fn init_state(&self) -> Result<init::State, Error> {
        self.state(&INIT_ACTOR_ADDR)
    }

    /// The public-key address recorded in the account actor behind the
    /// given ID address. Callers pass key-form addresses through without
    /// consulting the state.
    pub fn account_key(&self, address: &Address) -> Result<Address, Error> {
        let actor = self.get_actor(address)?;
        if actor.code != *ACCOUNT_ACTOR_CODE_ID {
            return Err(Error::NotAccountActor(address.to_string()));
        }
        let state: account::State = self
            .state_tree
            .store()
            .get_obj(&actor.state)
            .map_err(|e| Error::State(e.to_string()))?
            .ok_or_else(|| Error::ActorStateNotFound(actor.state.to_string()))?;
        Ok(state.address)
    }

    /// Raw actor entry for an address.
    pub fn get_actor(&self, address: &Address) -> Result<ActorState, Error> {
        self.state_tree
            .get_actor(address)
            .map_err(|e| Error::State(e.to_string()))?
            .ok_or_else(|| Error::ActorNotFound(address.to_string()))
    }

    fn state<D: serde::de::DeserializeOwned>(&self, address: &Address) -> Result<D, Error> {
        self.state_tree
            .get_actor_state(address)
            .map_err(|e| Error::State(e.to_string()))?
            .ok_or_else(|| Error::ActorNotFound(address.to_string()))
    }
}

/// Intermediary for resolving tipset keys to state views and for replaying
/// tipsets through the interpreter. Interpretation results are memoized by
/// tipset key.
pub struct StateManager<DB> {
    cs: Arc<ChainStore<DB>>,
    interpreter: Arc<dyn Interpreter<DB>>,
    invoker: Arc<dyn Invoker<DB>>,
    cache: RwLock<HashMap<TipsetKeys, InterpreterResult>>,
}

impl<DB> StateManager<DB>
where
    DB: BlockStore + Send + Sync + 'static,
{
    pub fn new(
        cs: Arc<ChainStore<DB>>,
        interpreter: Arc<dyn Interpreter<DB>>,
        invoker: Arc<dyn Invoker<DB>>,
    ) -> Self {
        Self {
            cs,
            interpreter,
            invoker,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns reference to the underlying blockstore.
    pub fn blockstore(&self) -> &DB {
        self.cs.blockstore()
    }

    /// Returns the chain store the manager reads heads from.
    pub fn chain_store(&self) -> &Arc<ChainStore<DB>> {
        &self.cs
    }

    /// Returns the interpreter behind the manager, for collaborators that
    /// replay tipsets themselves (block production).
    pub fn interpreter(&self) -> &Arc<dyn Interpreter<DB>> {
        &self.interpreter
    }

    /// Replays the tipset's state transitions, memoizing by tipset key.
    pub fn interpret_tipset(&self, tipset: &Tipset) -> Result<InterpreterResult, Error> {
        if let Some(result) = self.cache.read().get(tipset.key()) {
            return Ok(result.clone());
        }

        let result = self
            .interpreter
            .interpret(self.blockstore(), tipset)
            .map_err(|e| Error::State(e.to_string()))?;
        self.cache
            .write()
            .insert(tipset.key().clone(), result.clone());
        Ok(result)
    }

    /// Resolves a tipset key to a [`TipsetContext`]. An empty key resolves
    /// to the heaviest tipset. With `interpret`, the context's state tree is
    /// re-rooted at the tipset's own execution result.
    ///
    /// The returned context is a per-request value; it borrows the store
    /// and is not meant to be held across suspension points.
    pub fn tipset_context(
        &self,
        keys: &TipsetKeys,
        interpret: bool,
    ) -> Result<TipsetContext<'_, DB>, Error> {
        let tipset = self.cs.tipset_from_keys(keys)?;
        self.context_for(tipset, interpret)
    }

    /// Builds a [`TipsetContext`] for an already resolved tipset.
    pub fn context_for(
        &self,
        tipset: Arc<Tipset>,
        interpret: bool,
    ) -> Result<TipsetContext<'_, DB>, Error> {
        let mut context = TipsetContext {
            state_tree: StateTree::new_from_root(self.blockstore(), tipset.parent_state())
                .map_err(|e| Error::State(e.to_string()))?,
            tipset,
            interpreted: None,
        };
        if interpret {
            let result = self.interpret_tipset(&context.tipset)?;
            context.state_tree = StateTree::new_from_root(self.blockstore(), &result.state_root)
                .map_err(|e| Error::State(e.to_string()))?;
            context.interpreted = Some(result);
        }
        Ok(context)
    }

    /// Walks back from `tipset` to the first tipset at or below the winning
    /// PoSt sector-set lookback for `epoch`, returning it interpreted. The
    /// state selected here is the one miners are challenged against.
    pub fn get_lookback_tipset_for_round(
        &self,
        tipset: Arc<Tipset>,
        epoch: ChainEpoch,
    ) -> Result<TipsetContext<'_, DB>, Error> {
        let lookback = std::cmp::max(0, epoch - WINNING_POST_SECTOR_SET_LOOKBACK);
        let mut ts = tipset;
        while ts.epoch() > lookback {
            ts = Arc::new(ts.load_parent(self.blockstore())?);
        }

        let result = self.interpret_tipset(&ts)?;
        Ok(TipsetContext {
            state_tree: StateTree::new_from_root(self.blockstore(), &result.state_root)
                .map_err(|e| Error::State(e.to_string()))?,
            tipset: ts,
            interpreted: Some(result),
        })
    }

    /// Runs a message against the state of the given tipset (heaviest when
    /// absent) without persisting changes and without balance or sequence
    /// checks. A VM exit code becomes a receipt with the normalized code
    /// and an empty return value; other failures propagate.
    pub fn call(
        &self,
        message: &UnsignedMessage,
        tipset: Option<Arc<Tipset>>,
    ) -> Result<InvocResult, Error> {
        let ts = match tipset {
            Some(ts) => ts,
            None => self
                .cs
                .heaviest_tipset()
                .ok_or_else(|| Error::Other("Heaviest tipset not initialized".to_string()))?,
        };

        match self
            .invoker
            .apply_implicit_message(self.blockstore(), &ts, message)
        {
            Ok(ret) => Ok(InvocResult {
                msg: message.clone(),
                msg_rct: MessageReceipt {
                    exit_code: ExitCode::OK,
                    return_data: ret,
                    gas_used: 0,
                },
                actor_error: None,
            }),
            Err(VmError::ExitCode(code)) => {
                let exit_code = normalize_vm_exit_code(code).ok_or_else(|| {
                    Error::State(format!("actor returned unknown exit code {}", code))
                })?;
                Ok(InvocResult {
                    msg: message.clone(),
                    msg_rct: MessageReceipt {
                        exit_code,
                        return_data: RawBytes::default(),
                        gas_used: 0,
                    },
                    actor_error: Some(format!("actor exited with code {}", code)),
                })
            }
            Err(VmError::Fatal(e)) => Err(Error::State(e)),
        }
    }

    /// Gathers everything a miner needs for block production at `epoch` on
    /// top of the tipset at `keys`. Returns `None`, not an error, when the
    /// challenged sector set is empty.
    pub async fn miner_get_base_info<V, B>(
        &self,
        beacon: &B,
        miner: &Address,
        epoch: ChainEpoch,
        keys: &TipsetKeys,
    ) -> Result<Option<MiningBaseInfo>, Error>
    where
        V: ProofVerifier,
        B: Beaconizer,
    {
        // resolve the beacon before any state view is opened; contexts
        // borrow the store and must not be held across suspension points
        let tipset = self.cs.tipset_from_keys(keys)?;
        let prev_beacon_entry = self.cs.latest_beacon_entry(&tipset)?;
        let beacon_entries = beacon
            .beacon_entries_for_block(epoch, &prev_beacon_entry)
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        let context = self.context_for(tipset, true)?;
        let lookback = self.get_lookback_tipset_for_round(context.tipset.clone(), epoch)?;
        let state = lookback.miner_state(miner)?;

        let entropy = to_vec(miner).map_err(|e| Error::Other(e.to_string()))?;
        let rbase = beacon_entries.last().unwrap_or(&prev_beacon_entry);
        let post_rand = draw_randomness(
            rbase.data(),
            DomainSeparationTag::WinningPoStChallengeSeed,
            epoch,
            &entropy,
        )
        .map_err(|e| Error::Other(e.to_string()))?;

        let sectors = utils::get_sectors_for_winning_post::<DB, V>(
            self.blockstore(),
            miner,
            &state,
            &post_rand,
        )?;
        if sectors.is_empty() {
            return Ok(None);
        }

        let power_state = lookback.power_state()?;
        let claim = power_state
            .get_claim(self.blockstore(), miner)?
            .ok_or_else(|| Error::ActorNotFound(format!("no power claim for {}", miner)))?;

        let worker = context.account_key(&state.info.worker)?;

        Ok(Some(MiningBaseInfo {
            miner_power: claim.quality_adj_power,
            network_power: power_state.total_quality_adj_power,
            sectors,
            worker,
            sector_size: state.info.sector_size,
            prev_beacon_entry,
            beacon_entries,
        }))
    }

    /// Draws randomness for the epoch on top of the given tipset: the
    /// newest beacon entry at or before the tipset, mixed with the domain
    /// tag and caller entropy.
    pub fn get_randomness(
        &self,
        tipset: &Tipset,
        tag: DomainSeparationTag,
        epoch: ChainEpoch,
        entropy: &[u8],
    ) -> Result<[u8; 32], Error> {
        let entry = self.cs.latest_beacon_entry(tipset)?;
        draw_randomness(entry.data(), tag, epoch, entropy).map_err(|e| Error::Other(e.to_string()))
    }

    /// Looks up the escrow and locked market balances of an address,
    /// defaulting missing table entries to zero.
    pub fn market_balance(
        &self,
        address: &Address,
        keys: &TipsetKeys,
    ) -> Result<MarketBalance, Error> {
        let context = self.tipset_context(keys, false)?;
        let state = context.market_state()?;
        let id_address = context
            .state_tree
            .lookup_id(address)
            .map_err(|e| Error::State(e.to_string()))?
            .ok_or_else(|| Error::ActorNotFound(address.to_string()))?;

        Ok(MarketBalance {
            escrow: state.escrow_balance(self.blockstore(), &id_address)?,
            locked: state.locked_balance(self.blockstore(), &id_address)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{
        miner as miner_actor, power as power_actor, INIT_ACTOR_CODE_ID, MINER_ACTOR_CODE_ID,
        POWER_ACTOR_CODE_ID,
    };
    use crate::actor::{account as account_actor, ACCOUNT_ACTOR_CODE_ID};
    use crate::blocks::{BlockHeader, Ticket};
    use crate::crypto::VRFProof;
    use crate::db::MemoryDB;
    use crate::types::MockVerifier;
    use crate::utils::encoding::cid_from_cbor_blake2b256;
    use async_trait::async_trait;
    use cid::multihash::Code::Blake2b256;
    use cid::Cid;
    use fvm_ipld_amt::Amt;
    use fvm_ipld_bitfield::BitField;
    use fvm_ipld_hamt::{BytesKey, Hamt};
    use fvm_shared::sector::{RegisteredSealProof, SectorNumber};
    use fvm_shared::HAMT_BIT_WIDTH;
    use num_traits::Zero;

    struct StaticBeacon;

    #[async_trait]
    impl Beaconizer for StaticBeacon {
        async fn beacon_entries_for_block(
            &self,
            _epoch: ChainEpoch,
            prev: &BeaconEntry,
        ) -> anyhow::Result<Vec<BeaconEntry>> {
            Ok(vec![BeaconEntry::new(prev.round() + 1, vec![1, 2, 3])])
        }
    }

    struct EchoInterpreter {
        receipts: Cid,
    }

    /// Interprets a tipset as the identity transition: the post-state is
    /// the parent state.
    impl Interpreter<MemoryDB> for EchoInterpreter {
        fn interpret(&self, _: &MemoryDB, tipset: &Tipset) -> anyhow::Result<InterpreterResult> {
            Ok(InterpreterResult {
                state_root: *tipset.parent_state(),
                message_receipts: self.receipts,
            })
        }
    }

    struct FailingInvoker;

    impl Invoker<MemoryDB> for FailingInvoker {
        fn apply_implicit_message(
            &self,
            _: &MemoryDB,
            _: &Tipset,
            _: &UnsignedMessage,
        ) -> Result<RawBytes, VmError> {
            Err(VmError::Fatal("unused".to_string()))
        }
    }

    fn sector(n: SectorNumber) -> miner_actor::SectorOnChainInfo {
        miner_actor::SectorOnChainInfo {
            info: miner_actor::SectorPreCommitInfo {
                registered_proof: RegisteredSealProof::StackedDRG2KiBV1,
                sector_number: n,
                sealed_cid: cid_from_cbor_blake2b256(&n.to_be_bytes()),
                seal_rand_epoch: 0,
                deal_ids: Vec::new(),
                expiration: 1000,
            },
            activation_epoch: 0,
            deal_weight: fvm_shared::bigint::BigInt::zero(),
            pledge_requirement: TokenAmount::zero(),
            declared_fault_epoch: -1,
            declared_fault_duration: -1,
        }
    }

    fn actor(code: Cid, state: Cid) -> ActorState {
        ActorState::new(code, state, TokenAmount::zero(), 0)
    }

    /// Builds a chain of one genesis block whose state holds init, account
    /// (worker), power and two miner actors: id 1000 with `sector_count`
    /// committed sectors, id 2000 with none.
    async fn setup(
        sector_count: u64,
    ) -> (Arc<StateManager<MemoryDB>>, Address, Arc<MemoryDB>) {
        let db = Arc::new(MemoryDB::default());
        let worker_key = Address::new_secp256k1(&[7u8; 65]).unwrap();

        // init actor resolving the worker key to id 101
        let mut address_map: Hamt<&MemoryDB, u64> =
            Hamt::new_with_bit_width(&*db, HAMT_BIT_WIDTH);
        address_map
            .set(BytesKey(worker_key.to_bytes()), 101)
            .unwrap();
        let address_map = address_map.flush().unwrap();
        let init_head = db
            .put_obj(
                &init::State {
                    address_map,
                    next_id: 102,
                    network_name: "fuhon-test".to_string(),
                },
                Blake2b256,
            )
            .unwrap();
        let account_head = db
            .put_obj(
                &account_actor::State {
                    address: worker_key,
                },
                Blake2b256,
            )
            .unwrap();

        // miner with `sector_count` sectors, none faulty
        let mut sectors: Amt<miner_actor::SectorOnChainInfo, &MemoryDB> = Amt::new(&*db);
        for i in 0..sector_count {
            sectors.set(i, sector(i)).unwrap();
        }
        let sectors_root = sectors.flush().unwrap();
        let deadlines_cid = db
            .put_obj(
                &miner_actor::Deadlines {
                    due: vec![BitField::new(); 48],
                },
                Blake2b256,
            )
            .unwrap();
        let empty_map = {
            let mut m: Hamt<&MemoryDB, u64> = Hamt::new_with_bit_width(&*db, HAMT_BIT_WIDTH);
            m.flush().unwrap()
        };
        let empty_sectors_root = {
            let mut a: Amt<miner_actor::SectorOnChainInfo, &MemoryDB> = Amt::new(&*db);
            a.flush().unwrap()
        };
        let miner_state = |sectors: Cid| miner_actor::State {
            info: miner_actor::MinerInfo {
                owner: Address::new_id(101),
                worker: Address::new_id(101),
                pending_worker_key: None,
                peer_id: Vec::new(),
                sector_size: fvm_shared::sector::SectorSize::_2KiB,
            },
            precommit_deposit: TokenAmount::zero(),
            locked_funds: TokenAmount::zero(),
            vesting_funds: empty_map,
            precommitted_sectors: empty_map,
            sectors,
            proving_period_start: 0,
            new_sectors: BitField::new(),
            deadlines: deadlines_cid,
            fault_set: BitField::new(),
            fault_epochs: empty_map,
            recoveries: BitField::new(),
            post_submissions: BitField::new(),
        };
        let miner_head = db.put_obj(&miner_state(sectors_root), Blake2b256).unwrap();
        let empty_miner_head = db
            .put_obj(&miner_state(empty_sectors_root), Blake2b256)
            .unwrap();

        // power actor with a claim for the populated miner
        let mut claims: Hamt<&MemoryDB, power_actor::Claim> =
            Hamt::new_with_bit_width(&*db, HAMT_BIT_WIDTH);
        claims
            .set(
                BytesKey(Address::new_id(1000).to_bytes()),
                power_actor::Claim {
                    raw_byte_power: 2048.into(),
                    quality_adj_power: 2048.into(),
                },
            )
            .unwrap();
        let claims = claims.flush().unwrap();
        let power_head = db
            .put_obj(
                &power::State {
                    total_raw_byte_power: 4096.into(),
                    total_quality_adj_power: 4096.into(),
                    total_pledge_collateral: TokenAmount::zero(),
                    miner_count: 2,
                    claims,
                    num_miners_meeting_min_power: 1,
                },
                Blake2b256,
            )
            .unwrap();

        let mut actors: Hamt<&MemoryDB, ActorState> =
            Hamt::new_with_bit_width(&*db, HAMT_BIT_WIDTH);
        actors
            .set(
                BytesKey(INIT_ACTOR_ADDR.to_bytes()),
                actor(*INIT_ACTOR_CODE_ID, init_head),
            )
            .unwrap();
        actors
            .set(
                BytesKey(STORAGE_POWER_ACTOR_ADDR.to_bytes()),
                actor(*POWER_ACTOR_CODE_ID, power_head),
            )
            .unwrap();
        actors
            .set(
                BytesKey(Address::new_id(101).to_bytes()),
                actor(*ACCOUNT_ACTOR_CODE_ID, account_head),
            )
            .unwrap();
        actors
            .set(
                BytesKey(Address::new_id(1000).to_bytes()),
                actor(*MINER_ACTOR_CODE_ID, miner_head),
            )
            .unwrap();
        actors
            .set(
                BytesKey(Address::new_id(2000).to_bytes()),
                actor(*MINER_ACTOR_CODE_ID, empty_miner_head),
            )
            .unwrap();
        let state_root = actors.flush().unwrap();

        let receipts_root = {
            let mut a: Amt<MessageReceipt, &MemoryDB> = Amt::new(&*db);
            a.flush().unwrap()
        };
        let genesis = BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .state_root(state_root)
            .message_receipts(receipts_root)
            .build_and_validate()
            .unwrap();

        let cs = Arc::new(ChainStore::new(db.clone()));
        cs.set_genesis(genesis).unwrap();

        let sm = Arc::new(StateManager::new(
            cs,
            Arc::new(EchoInterpreter {
                receipts: receipts_root,
            }),
            Arc::new(FailingInvoker),
        ));
        (sm, worker_key, db)
    }

    /// Extends the chain with single-block tipsets, one per epoch.
    async fn extend(sm: &StateManager<MemoryDB>, heights: &[ChainEpoch]) {
        for (i, height) in heights.iter().enumerate() {
            let parent = sm.chain_store().heaviest_tipset().unwrap();
            let header = BlockHeader::builder()
                .miner_address(Address::new_id(0))
                .ticket(Some(Ticket::new(VRFProof::new(vec![i as u8 + 1]))))
                .parents(parent.key().clone())
                .state_root(*parent.parent_state())
                .epoch(*height)
                .build_and_validate()
                .unwrap();
            let tipset = Tipset::new(vec![header]).unwrap();
            sm.chain_store().persist_headers(&tipset).unwrap();
            sm.chain_store()
                .set_heaviest_tipset(Arc::new(tipset))
                .unwrap();
        }
    }

    #[async_std::test]
    async fn interpreted_context_uses_execution_root() {
        let (sm, _worker, _db) = setup(2).await;
        let keys = TipsetKeys::default();

        let plain = sm.tipset_context(&keys, false).unwrap();
        assert!(plain.interpreted.is_none());

        let interpreted = sm.tipset_context(&keys, true).unwrap();
        let result = interpreted.interpreted.as_ref().unwrap();
        assert_eq!(&result.state_root, plain.tipset.parent_state());

        // interpretation is deterministic and memoized
        let again = sm.interpret_tipset(&interpreted.tipset).unwrap();
        assert_eq!(&again, result);
    }

    #[async_std::test]
    async fn lookback_walks_to_challenge_epoch() {
        let (sm, _worker, _db) = setup(2).await;
        extend(&sm, &[1, 2, 3, 4, 5, 12, 13, 14]).await;

        let head = sm.chain_store().heaviest_tipset().unwrap();
        // lookback for epoch 15 is epoch 5
        let lookback = sm
            .get_lookback_tipset_for_round(head.clone(), 15)
            .unwrap();
        assert_eq!(lookback.tipset.epoch(), 5);
        assert!(lookback.interpreted.is_some());

        // rounds close to genesis look all the way back
        let lookback = sm.get_lookback_tipset_for_round(head, 4).unwrap();
        assert_eq!(lookback.tipset.epoch(), 0);
    }

    #[async_std::test]
    async fn base_info_selects_challenged_sectors() {
        let (sm, worker, _db) = setup(2).await;

        let info = sm
            .miner_get_base_info::<MockVerifier, StaticBeacon>(
                &StaticBeacon,
                &Address::new_id(1000),
                1,
                &TipsetKeys::default(),
            )
            .await
            .unwrap()
            .expect("expected base info for miner with sectors");

        // the mock challenge picks the first eligible sector only
        assert_eq!(info.sectors.len(), 1);
        assert_eq!(info.sectors[0].sector_number, 0);
        assert_eq!(info.miner_power, StoragePower::from(2048));
        assert_eq!(info.network_power, StoragePower::from(4096));
        assert_eq!(info.worker, worker);
        assert_eq!(info.sector_size, SectorSize::_2KiB);
        assert_eq!(info.beacon_entries.len(), 1);
    }

    #[async_std::test]
    async fn base_info_absent_without_sectors() {
        let (sm, _worker, _db) = setup(2).await;

        let info = sm
            .miner_get_base_info::<MockVerifier, StaticBeacon>(
                &StaticBeacon,
                &Address::new_id(2000),
                1,
                &TipsetKeys::default(),
            )
            .await
            .unwrap();
        assert!(info.is_none());
    }

    #[async_std::test]
    async fn account_key_requires_account_actor() {
        let (sm, worker, _db) = setup(2).await;
        let context = sm.tipset_context(&TipsetKeys::default(), false).unwrap();

        assert_eq!(context.account_key(&Address::new_id(101)).unwrap(), worker);
        assert!(matches!(
            context.account_key(&Address::new_id(1000)),
            Err(Error::NotAccountActor(_))
        ));
        assert!(matches!(
            context.account_key(&Address::new_id(555)),
            Err(Error::ActorNotFound(_))
        ));
    }

    #[async_std::test]
    async fn randomness_is_deterministic() {
        let (sm, _worker, _db) = setup(2).await;
        let head = sm.chain_store().heaviest_tipset().unwrap();

        let a = sm
            .get_randomness(
                &head,
                DomainSeparationTag::WinningPoStChallengeSeed,
                1,
                b"entropy",
            )
            .unwrap();
        let b = sm
            .get_randomness(
                &head,
                DomainSeparationTag::WinningPoStChallengeSeed,
                1,
                b"entropy",
            )
            .unwrap();
        assert_eq!(a, b);
    }
}
