// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use async_std::sync::RwLock;
use cid::Cid;
use fvm_shared::address::Address;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::sector::{PoStProof, SectorInfo, SectorSize};
use libipld_core::ipld::Ipld;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::beacon::{BeaconEntry, Beaconizer};
use crate::blocks::{BlockHeader, ElectionProof, Ticket, Tipset, TipsetKeys};
use crate::chain::{ChainStore, MsgWaiter, WeightCalculator};
use crate::ipld::BlockStore;
use crate::json;
use crate::key_management::KeyStore;
use crate::message::{MessageReceipt, SignedMessage, UnsignedMessage};
use crate::message_pool::{MessagePool, MpoolRpcProvider};
use crate::state_manager::{MiningBaseInfo, StateManager};

/// This is where you store persistent data, or at least access to stateful
/// data.
pub struct RpcState<DB, KS, B>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    pub keystore: Arc<RwLock<KS>>,
    pub chain_store: Arc<ChainStore<DB>>,
    pub state_manager: Arc<StateManager<DB>>,
    pub mpool: Arc<MessagePool<MpoolRpcProvider<DB>>>,
    pub msg_waiter: Arc<MsgWaiter>,
    pub beacon: Arc<B>,
    pub weight_calc: Arc<dyn WeightCalculator<DB>>,
    pub network_name: String,
}

/// The messages of a block, split by signature scheme, plus the combined
/// cid list (bls first).
#[derive(Serialize)]
pub struct BlockMessages {
    #[serde(rename = "BlsMessages", with = "json::message::vec")]
    pub bls_msg: Vec<UnsignedMessage>,
    #[serde(rename = "SecpkMessages", with = "json::signed_message::vec")]
    pub secp_msg: Vec<SignedMessage>,
    #[serde(rename = "Cids", with = "json::cid::vec")]
    pub cids: Vec<Cid>,
}

/// A message paired with its cid, as returned by ChainGetParentMessages.
#[derive(Serialize)]
pub struct CidMessage {
    #[serde(rename = "Cid", with = "json::cid")]
    pub cid: Cid,
    #[serde(rename = "Message", with = "json::message")]
    pub message: UnsignedMessage,
}

/// Receipt and inclusion tipset of a watched message.
#[derive(Serialize)]
pub struct MessageLookup {
    #[serde(rename = "Receipt", with = "json::message_receipt")]
    pub receipt: MessageReceipt,
    #[serde(rename = "TipSet", with = "json::tipset")]
    pub tipset: Tipset,
}

/// An IPLD node resolved by ChainGetNode, addressed by the cid of the block
/// it lives in.
#[derive(Serialize)]
pub struct IpldObject {
    #[serde(rename = "Cid", with = "json::cid")]
    pub cid: Cid,
    #[serde(rename = "Obj")]
    pub obj: Ipld,
}

/// Filter for StateListMessages; absent fields match everything.
#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct MessageFilter {
    #[serde(default)]
    pub to: Option<json::address::AddressJson>,
    #[serde(default)]
    pub from: Option<json::address::AddressJson>,
}

/// Escrow and locked market funds of an address.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketBalanceJson {
    pub escrow: String,
    pub locked: String,
}

/// A deal proposal paired with its on-chain state.
#[derive(Serialize)]
pub struct ApiMarketDeal {
    #[serde(rename = "Proposal")]
    pub proposal: ApiDealProposal,
    #[serde(rename = "State")]
    pub state: ApiDealState,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiDealProposal {
    #[serde(rename = "PieceCID", with = "json::cid")]
    pub piece_cid: Cid,
    pub piece_size: u64,
    #[serde(with = "json::address")]
    pub client: Address,
    #[serde(with = "json::address")]
    pub provider: Address,
    pub start_epoch: ChainEpoch,
    pub end_epoch: ChainEpoch,
    pub storage_price_per_epoch: String,
    pub provider_collateral: String,
    pub client_collateral: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiDealState {
    pub sector_start_epoch: ChainEpoch,
    pub last_updated_epoch: ChainEpoch,
    pub slash_epoch: ChainEpoch,
}

/// Claimed power of one miner next to the network totals.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MinerPower {
    pub miner_power: PowerClaim,
    pub total_power: PowerClaim,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PowerClaim {
    pub raw_byte_power: String,
    pub quality_adj_power: String,
}

/// Static miner information shaped for API consumers.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MinerInfoJson {
    #[serde(with = "json::address")]
    pub owner: Address,
    #[serde(with = "json::address")]
    pub worker: Address,
    pub peer_id: String,
    pub sector_size: SectorSize,
}

/// Sector number and on-chain info pair.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiSectorInfo {
    pub sector_number: u64,
    #[serde(rename = "SealedCID", with = "json::cid")]
    pub sealed_cid: Cid,
    pub activation_epoch: ChainEpoch,
    pub expiration: ChainEpoch,
}

/// Result of a state call shaped for API consumers.
#[derive(Serialize)]
pub struct InvocResultJson {
    #[serde(rename = "Msg", with = "json::message")]
    pub msg: UnsignedMessage,
    #[serde(rename = "MsgRct", with = "json::message_receipt")]
    pub msg_rct: MessageReceipt,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Balance and raw head object of an actor, for StateReadState.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActorStateRead {
    pub balance: String,
    pub state: IpldObject,
}

/// Winning sector set and power values for block production.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MiningBaseInfoJson {
    pub miner_power: String,
    pub network_power: String,
    pub sectors: Vec<ApiWinningSector>,
    #[serde(rename = "WorkerKey", with = "json::address")]
    pub worker: Address,
    pub sector_size: SectorSize,
    #[serde(rename = "PrevBeaconEntry", with = "json::beacon_entry")]
    pub prev_beacon_entry: BeaconEntry,
    #[serde(rename = "BeaconEntries", with = "json::beacon_entry::vec")]
    pub beacon_entries: Vec<BeaconEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiWinningSector {
    pub seal_proof: i64,
    pub sector_number: u64,
    #[serde(rename = "SealedCID", with = "json::cid")]
    pub sealed_cid: Cid,
}

impl From<SectorInfo> for ApiWinningSector {
    fn from(info: SectorInfo) -> Self {
        Self {
            seal_proof: i64::from(info.proof),
            sector_number: info.sector_number,
            sealed_cid: info.sealed_cid,
        }
    }
}

impl From<MiningBaseInfo> for MiningBaseInfoJson {
    fn from(info: MiningBaseInfo) -> Self {
        Self {
            miner_power: info.miner_power.to_string(),
            network_power: info.network_power.to_string(),
            sectors: info.sectors.into_iter().map(Into::into).collect(),
            worker: info.worker,
            sector_size: info.sector_size,
            prev_beacon_entry: info.prev_beacon_entry,
            beacon_entries: info.beacon_entries,
        }
    }
}

/// JSON form of a block production template.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockTemplateJson {
    #[serde(with = "json::address")]
    pub miner: Address,
    pub parents: TipsetKeys,
    #[serde(with = "json::ticket")]
    pub ticket: Ticket,
    #[serde(with = "json::election_proof")]
    pub eproof: ElectionProof,
    #[serde(with = "json::beacon_entry::vec", default)]
    pub beacon_values: Vec<BeaconEntry>,
    #[serde(with = "json::signed_message::vec", default)]
    pub messages: Vec<SignedMessage>,
    pub epoch: ChainEpoch,
    pub timestamp: u64,
    #[serde(rename = "WinningPoStProof", default)]
    pub winning_post_proof: Vec<PoStProof>,
}

/// Block production result: the signed header and its message cids.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockMessageJson {
    #[serde(with = "json::block_header")]
    pub header: BlockHeader,
    #[serde(rename = "BlsMessages", with = "json::cid::vec")]
    pub bls_messages: Vec<Cid>,
    #[serde(rename = "SecpkMessages", with = "json::cid::vec")]
    pub secpk_messages: Vec<Cid>,
}

