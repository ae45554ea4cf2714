// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod auth_api;
mod chain_api;
mod common_api;
mod data_types;
mod mpool_api;
mod rpc_http_handler;
mod state_api;
mod sync_api;
mod wallet_api;

pub use self::chain_api::chain_notify;
pub use self::data_types::*;
pub use self::mpool_api::mpool_sub;
pub use self::state_api::state_wait_msg;

use jsonrpc_v2::{Data, MapRouter as JsonRpcMapRouter, Server as JsonRpcServer};
use log::info;
use std::sync::Arc;

use crate::beacon::Beaconizer;
use crate::ipld::BlockStore;
use crate::key_management::KeyStore;
use crate::types::ProofVerifier;

use self::rpc_http_handler::rpc_http_handler;

/// Capacity of subscription hand-off channels. A consumer lagging this far
/// behind is disconnected rather than buffered without bound.
pub(crate) const CHANNEL_CAP: usize = 16;

pub type JsonRpcServerState = Arc<JsonRpcServer<JsonRpcMapRouter>>;

/// Registers every request handler and serves them over HTTP. Subscription
/// methods (`ChainNotify`, `MpoolSub`, `StateWaitMsg`) hand out channels
/// and are exposed as in-process functions instead; a streaming transport
/// would forward them.
pub async fn start_rpc<DB, KS, B, V>(
    state: Arc<RpcState<DB, KS, B>>,
    rpc_endpoint: &str,
) -> anyhow::Result<()>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
    V: ProofVerifier + Send + Sync + 'static,
{
    use auth_api::*;
    use chain_api::*;
    use common_api::*;
    use mpool_api::*;
    use state_api::*;
    use sync_api::*;
    use wallet_api::*;

    let rpc_server = Arc::new(
        JsonRpcServer::new()
            .with_data(Data(state))
            // Auth API
            .with_method("Filecoin.AuthNew", auth_new)
            // Chain API
            .with_method("Filecoin.ChainGetBlock", chain_get_block::<DB, KS, B>)
            .with_method(
                "Filecoin.ChainGetBlockMessages",
                chain_get_block_messages::<DB, KS, B>,
            )
            .with_method("Filecoin.ChainGetGenesis", chain_get_genesis::<DB, KS, B>)
            .with_method("Filecoin.ChainGetNode", chain_get_node::<DB, KS, B>)
            .with_method("Filecoin.ChainGetMessage", chain_get_message::<DB, KS, B>)
            .with_method(
                "Filecoin.ChainGetParentMessages",
                chain_get_parent_messages::<DB, KS, B>,
            )
            .with_method(
                "Filecoin.ChainGetParentReceipts",
                chain_get_parent_receipts::<DB, KS, B>,
            )
            .with_method(
                "Filecoin.ChainGetRandomness",
                chain_get_randomness::<DB, KS, B>,
            )
            .with_method("Filecoin.ChainGetTipSet", chain_get_tipset::<DB, KS, B>)
            .with_method(
                "Filecoin.ChainGetTipSetByHeight",
                chain_get_tipset_by_height::<DB, KS, B>,
            )
            .with_method("Filecoin.ChainHead", chain_head::<DB, KS, B>)
            // * Filecoin.ChainNotify is a subscription, handled out of band
            .with_method("Filecoin.ChainReadObj", chain_read_obj::<DB, KS, B>)
            .with_method("Filecoin.ChainSetHead", chain_set_head::<DB, KS, B>)
            .with_method(
                "Filecoin.ChainTipSetWeight",
                chain_tipset_weight::<DB, KS, B>,
            )
            // Miner API
            .with_method("Filecoin.MinerCreateBlock", miner_create_block::<DB, KS, B>)
            .with_method(
                "Filecoin.MinerGetBaseInfo",
                state_miner_get_base_info::<DB, KS, B, V>,
            )
            // Message Pool API
            .with_method("Filecoin.MpoolPending", mpool_pending::<DB, KS, B>)
            .with_method("Filecoin.MpoolPush", mpool_push::<DB, KS, B>)
            .with_method("Filecoin.MpoolPushMessage", mpool_push_message::<DB, KS, B>)
            // * Filecoin.MpoolSub is a subscription, handled out of band
            // State API
            .with_method("Filecoin.StateAccountKey", state_account_key::<DB, KS, B>)
            .with_method("Filecoin.StateCall", state_call::<DB, KS, B>)
            .with_method("Filecoin.StateGetActor", state_get_actor::<DB, KS, B>)
            .with_method("Filecoin.StateGetReceipt", state_get_receipt::<DB, KS, B>)
            .with_method("Filecoin.StateListActors", state_list_actors::<DB, KS, B>)
            .with_method(
                "Filecoin.StateListMessages",
                state_list_messages::<DB, KS, B>,
            )
            .with_method("Filecoin.StateListMiners", state_list_miners::<DB, KS, B>)
            .with_method("Filecoin.StateLookupID", state_lookup_id::<DB, KS, B>)
            .with_method(
                "Filecoin.StateMarketBalance",
                state_market_balance::<DB, KS, B>,
            )
            .with_method("Filecoin.StateMarketDeals", state_market_deals::<DB, KS, B>)
            .with_method(
                "Filecoin.StateMarketStorageDeal",
                state_market_storage_deal::<DB, KS, B>,
            )
            .with_method(
                "Filecoin.StateMinerDeadlines",
                state_miner_deadlines::<DB, KS, B>,
            )
            .with_method("Filecoin.StateMinerFaults", state_miner_faults::<DB, KS, B>)
            .with_method("Filecoin.StateMinerInfo", state_miner_info::<DB, KS, B>)
            .with_method("Filecoin.StateMinerPower", state_miner_power::<DB, KS, B>)
            .with_method(
                "Filecoin.StateMinerProvingDeadline",
                state_miner_proving_deadline::<DB, KS, B>,
            )
            .with_method(
                "Filecoin.StateMinerProvingSet",
                state_miner_proving_set::<DB, KS, B>,
            )
            .with_method(
                "Filecoin.StateMinerSectors",
                state_miner_sectors::<DB, KS, B>,
            )
            .with_method(
                "Filecoin.StateMinerSectorSize",
                state_miner_sector_size::<DB, KS, B>,
            )
            .with_method("Filecoin.StateMinerWorker", state_miner_worker::<DB, KS, B>)
            .with_method(
                "Filecoin.StateNetworkName",
                state_network_name::<DB, KS, B>,
            )
            .with_method("Filecoin.StateReadState", state_read_state::<DB, KS, B>)
            // * Filecoin.StateWaitMsg is a subscription, handled out of band
            // Sync API
            .with_method("Filecoin.SyncSubmitBlock", sync_submit_block::<DB, KS, B>)
            // Common
            .with_method("Filecoin.Version", version)
            // Wallet API
            .with_method("Filecoin.WalletBalance", wallet_balance::<DB, KS, B>)
            .with_method(
                "Filecoin.WalletDefaultAddress",
                wallet_default_address::<DB, KS, B>,
            )
            .with_method("Filecoin.WalletHas", wallet_has::<DB, KS, B>)
            .with_method("Filecoin.WalletSign", wallet_sign::<DB, KS, B>)
            .with_method("Filecoin.WalletVerify", wallet_verify::<DB, KS, B>)
            // Facade entries intentionally left empty
            .with_method("Filecoin.ClientFindData", not_implemented)
            .with_method("Filecoin.ClientHasLocal", not_implemented)
            .with_method("Filecoin.ClientImport", not_implemented)
            .with_method("Filecoin.ClientListImports", not_implemented)
            .with_method("Filecoin.ClientQueryAsk", not_implemented)
            .with_method("Filecoin.ClientRetrieve", not_implemented)
            .with_method("Filecoin.ClientStartDeal", not_implemented)
            .with_method("Filecoin.MarketEnsureAvailable", not_implemented)
            .with_method("Filecoin.NetAddrsListen", not_implemented)
            .with_method("Filecoin.PaychAllocateLane", not_implemented)
            .with_method("Filecoin.PaychGet", not_implemented)
            .with_method("Filecoin.PaychVoucherAdd", not_implemented)
            .with_method("Filecoin.PaychVoucherCheckValid", not_implemented)
            .with_method("Filecoin.PaychVoucherCreate", not_implemented)
            .finish_unwrapped(),
    );

    let mut app = tide::with_state(rpc_server);
    app.at("/rpc/v0").post(rpc_http_handler);

    info!("Ready for RPC connections");

    app.listen(rpc_endpoint).await?;

    info!("Stopped accepting RPC connections");

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_setup {
    use async_std::sync::RwLock;
    use async_trait::async_trait;
    use cid::multihash::Code::Blake2b256;
    use cid::Cid;
    use fvm_ipld_amt::Amt;
    use fvm_ipld_encoding::RawBytes;
    use fvm_ipld_hamt::{BytesKey, Hamt};
    use fvm_shared::address::Address;
    use fvm_shared::bigint::BigInt;
    use fvm_shared::clock::ChainEpoch;
    use fvm_shared::crypto::signature::SignatureType;
    use fvm_shared::econ::TokenAmount;
    use fvm_shared::HAMT_BIT_WIDTH;
    use num_traits::Zero;
    use std::sync::Arc;

    use super::RpcState;
    use crate::actor::{
        account, init, ActorState, ACCOUNT_ACTOR_CODE_ID, INIT_ACTOR_ADDR, INIT_ACTOR_CODE_ID,
    };
    use crate::beacon::{BeaconEntry, Beaconizer};
    use crate::blocks::{BlockHeader, Ticket, Tipset};
    use crate::chain::{ChainStore, MsgWaiter, WeightCalculator};
    use crate::crypto::VRFProof;
    use crate::db::MemoryDB;
    use crate::interpreter::{Interpreter, InterpreterResult, Invoker, VmError};
    use crate::ipld::BlockStore;
    use crate::key_management::{generate_key, Key, MemKeyStore};
    use crate::message::{MessageReceipt, UnsignedMessage};
    use crate::message_pool::{MessagePool, MpoolRpcProvider};
    use crate::state_manager::StateManager;

    pub(crate) const TEST_NET_NAME: &str = "fuhon-test";

    /// Beaconizer returning one fixed follow-up entry.
    pub(crate) struct StaticBeacon;

    #[async_trait]
    impl Beaconizer for StaticBeacon {
        async fn beacon_entries_for_block(
            &self,
            _epoch: ChainEpoch,
            prev: &BeaconEntry,
        ) -> anyhow::Result<Vec<BeaconEntry>> {
            Ok(vec![BeaconEntry::new(prev.round() + 1, vec![9, 9, 9])])
        }
    }

    /// Interpreter stub echoing a fixed result.
    pub(crate) struct StubInterpreter {
        pub result: InterpreterResult,
    }

    impl Interpreter<MemoryDB> for StubInterpreter {
        fn interpret(&self, _: &MemoryDB, _: &Tipset) -> anyhow::Result<InterpreterResult> {
            Ok(self.result.clone())
        }
    }

    /// Invoker stub: method zero succeeds, any other method number is
    /// reported back as that VM exit code.
    pub(crate) struct StubInvoker;

    impl Invoker<MemoryDB> for StubInvoker {
        fn apply_implicit_message(
            &self,
            _: &MemoryDB,
            _: &Tipset,
            message: &UnsignedMessage,
        ) -> Result<RawBytes, VmError> {
            match message.method_num {
                0 => Ok(RawBytes::default()),
                code => Err(VmError::ExitCode(code)),
            }
        }
    }

    pub(crate) struct ZeroWeigher;

    impl WeightCalculator<MemoryDB> for ZeroWeigher {
        fn calculate_weight(&self, _: &MemoryDB, _: &Tipset) -> anyhow::Result<BigInt> {
            Ok(BigInt::zero())
        }
    }

    /// Builds a state tree holding the init actor and one account actor:
    /// `key_addr` maps to id 101, whose actor carries `sequence`.
    pub(crate) fn make_state_tree(db: &MemoryDB, key_addr: &Address, sequence: u64) -> Cid {
        let mut address_map: Hamt<&MemoryDB, u64> = Hamt::new_with_bit_width(db, HAMT_BIT_WIDTH);
        address_map
            .set(BytesKey(key_addr.to_bytes()), 101)
            .unwrap();
        let address_map = address_map.flush().unwrap();

        let init_head = db
            .put_obj(
                &init::State {
                    address_map,
                    next_id: 102,
                    network_name: TEST_NET_NAME.to_string(),
                },
                Blake2b256,
            )
            .unwrap();
        let account_head = db
            .put_obj(&account::State { address: *key_addr }, Blake2b256)
            .unwrap();

        let mut actors: Hamt<&MemoryDB, ActorState> = Hamt::new_with_bit_width(db, HAMT_BIT_WIDTH);
        actors
            .set(
                BytesKey(INIT_ACTOR_ADDR.to_bytes()),
                ActorState::new(*INIT_ACTOR_CODE_ID, init_head, TokenAmount::zero(), 0),
            )
            .unwrap();
        actors
            .set(
                BytesKey(Address::new_id(101).to_bytes()),
                ActorState::new(
                    *ACCOUNT_ACTOR_CODE_ID,
                    account_head,
                    TokenAmount::from_atto(42),
                    sequence,
                ),
            )
            .unwrap();
        actors.flush().unwrap()
    }

    /// Appends one single-block tipset per height, each the child of the
    /// previous head.
    pub(crate) async fn extend_chain(
        cs: &ChainStore<MemoryDB>,
        state_root: Cid,
        heights: &[ChainEpoch],
    ) {
        for (i, height) in heights.iter().enumerate() {
            let parent = cs.heaviest_tipset().unwrap();
            let header = BlockHeader::builder()
                .miner_address(Address::new_id(0))
                .ticket(Some(Ticket::new(VRFProof::new(vec![i as u8 + 1]))))
                .parents(parent.key().clone())
                .state_root(state_root)
                .epoch(*height)
                .build_and_validate()
                .unwrap();
            let tipset = Tipset::new(vec![header]).unwrap();
            cs.persist_headers(&tipset).unwrap();
            cs.set_heaviest_tipset(Arc::new(tipset)).unwrap();
        }
    }

    /// Full request-handler state over an in-memory chain: a genesis block
    /// whose state holds the init actor and one funded account (id 101,
    /// sequence 7) whose key sits in the keystore.
    pub(crate) async fn setup() -> (Arc<RpcState<MemoryDB, MemKeyStore, StaticBeacon>>, Key) {
        let db = Arc::new(MemoryDB::default());
        let mut keystore = MemKeyStore::new();
        let key = generate_key(SignatureType::Secp256k1, &mut keystore).unwrap();

        let state_root = make_state_tree(&db, &key.address, 7);
        let receipts_root = {
            let mut receipts: Amt<MessageReceipt, &MemoryDB> = Amt::new(&db);
            receipts.flush().unwrap()
        };

        let genesis = BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .state_root(state_root)
            .message_receipts(receipts_root)
            .build_and_validate()
            .unwrap();

        let cs = Arc::new(ChainStore::new(db.clone()));
        cs.set_genesis(genesis).unwrap();

        let state_manager = Arc::new(StateManager::new(
            cs.clone(),
            Arc::new(StubInterpreter {
                result: InterpreterResult {
                    state_root,
                    message_receipts: receipts_root,
                },
            }),
            Arc::new(StubInvoker),
        ));

        let mpool = Arc::new(MessagePool::new(
            MpoolRpcProvider::new(state_manager.clone()),
            TEST_NET_NAME.to_string(),
        ));

        let state = Arc::new(RpcState {
            keystore: Arc::new(RwLock::new(keystore)),
            chain_store: cs,
            state_manager,
            mpool,
            msg_waiter: Arc::new(MsgWaiter::new()),
            beacon: Arc::new(StaticBeacon),
            weight_calc: Arc::new(ZeroWeigher),
            network_name: TEST_NET_NAME.to_string(),
        });
        (state, key)
    }
}
