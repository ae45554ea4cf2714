// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use async_std::channel::{bounded, Receiver};
use async_std::task;
use cid::Cid;
use fvm_ipld_amt::Amt;
use fvm_ipld_bitfield::BitField;
use fvm_shared::address::Protocol;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::deal::DealID;
use fvm_shared::sector::SectorSize;
use jsonrpc_v2::{Data, Error as JsonRpcError, Params};
use libipld_core::ipld::Ipld;
use std::collections::HashMap;

use crate::actor::market::{DealProposal, DealState};
use crate::actor::miner::ChainSectorInfo;
use crate::beacon::Beaconizer;
use crate::blocks::{Tipset, TipsetKeys};
use crate::chain;
use crate::ipld::BlockStore;
use crate::json::address::AddressJson;
use crate::json::bitfield::BitFieldJson;
use crate::json::cid::CidJson;
use crate::json::message::UnsignedMessageJson;
use crate::json::message_receipt::MessageReceiptJson;
use crate::key_management::{self, KeyStore};
use crate::message::{Message, SignedMessage, UnsignedMessage};
use crate::rpc::data_types::*;
use crate::rpc::CHANNEL_CAP;
use crate::types::ProofVerifier;
use crate::utils::encoding::Cbor;

/// Returns the public key address of the given ID address.
pub(crate) async fn state_account_key<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<AddressJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    if address.protocol() == Protocol::BLS || address.protocol() == Protocol::Secp256k1 {
        return Ok(AddressJson(address));
    }
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let key = context.account_key(&address).map_err(|e| e.to_string())?;
    Ok(AddressJson(key))
}

/// Runs the given message on the state of the given tipset and returns its
/// receipt, without any persisted changes. A VM exit code is reported in
/// the receipt, not as a transport error.
pub(crate) async fn state_call<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(UnsignedMessageJson, TipsetKeys)>,
) -> Result<InvocResultJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (UnsignedMessageJson(message), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let result = data
        .state_manager
        .call(&message, Some(context.tipset.clone()))
        .map_err(|e| e.to_string())?;
    Ok(InvocResultJson {
        msg: result.msg,
        msg_rct: result.msg_rct,
        error: result.actor_error,
    })
}

/// Returns the actor entry at the given address, after the tipset executed.
pub(crate) async fn state_get_actor<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<crate::json::actor_state::ActorStateJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, true)
        .map_err(|e| e.to_string())?;
    let actor = context.get_actor(&address).map_err(|e| e.to_string())?;
    Ok(crate::json::actor_state::ActorStateJson(actor))
}

/// Returns the receipt of a message if it already landed on chain at or
/// before the given tipset.
pub(crate) async fn state_get_receipt<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(CidJson, TipsetKeys)>,
) -> Result<MessageReceiptJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (CidJson(msg_cid), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;

    let (receipt, inclusion_keys) = data
        .msg_waiter
        .result_of(&msg_cid)
        .ok_or("receipt for message not found")?;
    let inclusion = Tipset::load(data.chain_store.blockstore(), inclusion_keys.cids())
        .map_err(|e| e.to_string())?;
    if context.tipset.epoch() <= inclusion.epoch() {
        Ok(MessageReceiptJson(receipt))
    } else {
        Err("receipt for message not found".into())
    }
}

/// Returns the addresses of every actor in the state tree.
pub(crate) async fn state_list_actors<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(TipsetKeys,)>,
) -> Result<Vec<AddressJson>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (keys,) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let addresses = context
        .state_tree
        .list_addresses()
        .map_err(|e| e.to_string())?;
    Ok(addresses.into_iter().map(AddressJson).collect())
}

/// Returns the cids of messages matching the filter, walking the chain
/// down from the given tipset to `to_height`.
pub(crate) async fn state_list_messages<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(MessageFilter, TipsetKeys, ChainEpoch)>,
) -> Result<Vec<CidJson>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (filter, keys, to_height) = params;
    let store = data.chain_store.blockstore();
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;

    let matches = |message: &UnsignedMessage| -> bool {
        if let Some(AddressJson(to)) = &filter.to {
            if message.to() != to {
                return false;
            }
        }
        if let Some(AddressJson(from)) = &filter.from {
            if message.from() != from {
                return false;
            }
        }
        true
    };

    let mut out = Vec::new();
    let mut tipset = (*context.tipset).clone();
    loop {
        if tipset.epoch() < to_height {
            break;
        }
        tipset
            .visit_messages(store, |_, bls, cid| {
                let message = if bls {
                    store
                        .get_obj::<UnsignedMessage>(cid)?
                        .ok_or_else(|| anyhow::anyhow!("no message found with cid: {}", cid))?
                } else {
                    store
                        .get_obj::<SignedMessage>(cid)?
                        .ok_or_else(|| anyhow::anyhow!("no message found with cid: {}", cid))?
                        .into_message()
                };
                if matches(&message) {
                    out.push(CidJson(*cid));
                }
                Ok(())
            })
            .map_err(|e| e.to_string())?;

        if tipset.epoch() == 0 {
            break;
        }
        tipset = tipset.load_parent(store).map_err(|e| e.to_string())?;
    }
    Ok(out)
}

/// Returns the addresses of every miner with a power claim.
pub(crate) async fn state_list_miners<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(TipsetKeys,)>,
) -> Result<Vec<AddressJson>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (keys,) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let power_state = context.power_state().map_err(|e| e.to_string())?;
    let miners = power_state
        .list_miners(data.chain_store.blockstore())
        .map_err(|e| e.to_string())?;
    Ok(miners.into_iter().map(AddressJson).collect())
}

/// Retrieves the ID address of the given address.
pub(crate) async fn state_lookup_id<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<AddressJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let id = context
        .state_tree
        .lookup_id(&address)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("address not found: {}", address))?;
    Ok(AddressJson(id))
}

/// Looks up the escrow and locked balances of an address in the storage
/// market.
pub(crate) async fn state_market_balance<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<MarketBalanceJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let balance = data
        .state_manager
        .market_balance(&address, &keys)
        .map_err(|e| e.to_string())?;
    Ok(MarketBalanceJson {
        escrow: balance.escrow.atto().to_string(),
        locked: balance.locked.atto().to_string(),
    })
}

/// Returns every storage deal known to the market actor, keyed by deal id.
pub(crate) async fn state_market_deals<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(TipsetKeys,)>,
) -> Result<HashMap<String, ApiMarketDeal>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (keys,) = params;
    let store = data.chain_store.blockstore();
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let market_state = context.market_state().map_err(|e| e.to_string())?;

    let proposals: Amt<DealProposal, _> =
        Amt::load(&market_state.proposals, store).map_err(|e| e.to_string())?;
    let states: Amt<DealState, _> =
        Amt::load(&market_state.states, store).map_err(|e| e.to_string())?;

    let mut deals = HashMap::new();
    proposals
        .for_each(|deal_id, proposal| {
            let state = states.get(deal_id)?.copied().unwrap_or_default();
            deals.insert(deal_id.to_string(), make_deal(proposal.clone(), state));
            Ok(())
        })
        .map_err(|e| e.to_string())?;
    Ok(deals)
}

/// Returns the proposal and state of a single storage deal. Deals not yet
/// activated report undefined epochs.
pub(crate) async fn state_market_storage_deal<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(DealID, TipsetKeys)>,
) -> Result<ApiMarketDeal, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (deal_id, keys) = params;
    let store = data.chain_store.blockstore();
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let market_state = context.market_state().map_err(|e| e.to_string())?;

    let proposals: Amt<DealProposal, _> =
        Amt::load(&market_state.proposals, store).map_err(|e| e.to_string())?;
    let proposal = proposals
        .get(deal_id)
        .map_err(|e| e.to_string())?
        .cloned()
        .ok_or_else(|| format!("deal {} not found", deal_id))?;

    let states: Amt<DealState, _> =
        Amt::load(&market_state.states, store).map_err(|e| e.to_string())?;
    let state = states
        .get(deal_id)
        .map_err(|e| e.to_string())?
        .copied()
        .unwrap_or_default();

    Ok(make_deal(proposal, state))
}

/// Returns all the proving deadlines for the given miner.
pub(crate) async fn state_miner_deadlines<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<Vec<BitFieldJson>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let miner_state = context.miner_state(&address).map_err(|e| e.to_string())?;
    let deadlines = miner_state
        .get_deadlines(data.chain_store.blockstore())
        .map_err(|e| e.to_string())?;
    Ok(deadlines.due.into_iter().map(BitFieldJson).collect())
}

/// Returns the faulty sectors of the given miner.
pub(crate) async fn state_miner_faults<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<BitFieldJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let miner_state = context.miner_state(&address).map_err(|e| e.to_string())?;
    Ok(BitFieldJson(miner_state.fault_set))
}

/// Returns info about the indicated miner.
pub(crate) async fn state_miner_info<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<MinerInfoJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let miner_state = context.miner_state(&address).map_err(|e| e.to_string())?;
    Ok(MinerInfoJson {
        owner: miner_state.info.owner,
        worker: miner_state.info.worker,
        peer_id: base64::encode(&miner_state.info.peer_id),
        sector_size: miner_state.info.sector_size,
    })
}

/// Returns the power of the indicated miner alongside the network totals.
pub(crate) async fn state_miner_power<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<MinerPower, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let power_state = context.power_state().map_err(|e| e.to_string())?;
    let claim = power_state
        .get_claim(data.chain_store.blockstore(), &address)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("no power claim for {}", address))?;

    Ok(MinerPower {
        miner_power: PowerClaim {
            raw_byte_power: claim.raw_byte_power.to_string(),
            quality_adj_power: claim.quality_adj_power.to_string(),
        },
        total_power: PowerClaim {
            raw_byte_power: power_state.total_raw_byte_power.to_string(),
            quality_adj_power: power_state.total_quality_adj_power.to_string(),
        },
    })
}

/// Calculates the deadline info of the miner's current proving window.
pub(crate) async fn state_miner_proving_deadline<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<crate::types::DeadlineInfo, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let miner_state = context.miner_state(&address).map_err(|e| e.to_string())?;
    Ok(miner_state.deadline_info(context.tipset.epoch()))
}

/// Returns info about the sectors that the given miner is actively proving.
pub(crate) async fn state_miner_proving_set<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<Vec<ApiSectorInfo>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let miner_state = context.miner_state(&address).map_err(|e| e.to_string())?;
    let sectors = miner_state
        .load_proving_set(data.chain_store.blockstore())
        .map_err(|e| e.to_string())?;
    Ok(sectors.into_iter().map(make_sector_info).collect())
}

/// Returns info about the given miner's sectors. If the filter bitfield is
/// nil, all sectors are included. If filter_out is true, sectors in the
/// filter are excluded; if false, only those in the filter are included.
pub(crate) async fn state_miner_sectors<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, Option<BitFieldJson>, bool, TipsetKeys)>,
) -> Result<Vec<ApiSectorInfo>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), filter, filter_out, keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let miner_state = context.miner_state(&address).map_err(|e| e.to_string())?;

    let filter: Option<BitField> = filter.map(|f| f.0);
    let sectors: Amt<crate::actor::miner::SectorOnChainInfo, _> =
        Amt::load(&miner_state.sectors, data.chain_store.blockstore())
            .map_err(|e| e.to_string())?;

    let mut out = Vec::new();
    sectors
        .for_each(|id, info| {
            let include = match &filter {
                None => true,
                Some(field) => filter_out != field.get(id),
            };
            if include {
                out.push(make_sector_info(ChainSectorInfo {
                    info: info.clone(),
                    id,
                }));
            }
            Ok(())
        })
        .map_err(|e| e.to_string())?;
    Ok(out)
}

/// Returns the size of the sectors committed by the given miner.
pub(crate) async fn state_miner_sector_size<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<SectorSize, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let miner_state = context.miner_state(&address).map_err(|e| e.to_string())?;
    Ok(miner_state.info.sector_size)
}

/// Returns the worker address of the given miner.
pub(crate) async fn state_miner_worker<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<AddressJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let miner_state = context.miner_state(&address).map_err(|e| e.to_string())?;
    Ok(AddressJson(miner_state.info.worker))
}

/// Returns the name of the network the node is part of, as recorded by the
/// init actor at genesis.
pub(crate) async fn state_network_name<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
) -> Result<String, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let genesis = data
        .chain_store
        .genesis()
        .ok_or("can't find genesis")?;
    let keys = TipsetKeys::new(vec![*genesis.cid()]);
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let init_state = context.init_state().map_err(|e| e.to_string())?;
    Ok(init_state.network_name)
}

/// Returns the balance and raw head object of an actor.
pub(crate) async fn state_read_state<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, TipsetKeys)>,
) -> Result<ActorStateRead, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    let actor = context.get_actor(&address).map_err(|e| e.to_string())?;
    let obj: Ipld = data
        .chain_store
        .blockstore()
        .get_obj(&actor.state)
        .map_err(|e| e.to_string())?
        .ok_or("actor head object not found")?;
    Ok(ActorStateRead {
        balance: actor.balance.atto().to_string(),
        state: IpldObject {
            cid: actor.state,
            obj,
        },
    })
}

/// Subscribes to the inclusion result of a message. The channel yields the
/// receipt and inclusion tipset once the message lands on chain, or the
/// load failure if the recorded tipset cannot be read back.
pub fn state_wait_msg<DB, KS, B>(
    data: &RpcState<DB, KS, B>,
    cid: Cid,
) -> Receiver<Result<MessageLookup, String>>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (sender, receiver) = bounded(CHANNEL_CAP);
    let waiter_rx = data.msg_waiter.wait(cid);
    let chain_store = data.chain_store.clone();

    task::spawn(async move {
        if let Ok((receipt, keys)) = waiter_rx.recv().await {
            let lookup = Tipset::load(chain_store.blockstore(), keys.cids())
                .map(|tipset| MessageLookup { receipt, tipset })
                .map_err(|e| e.to_string());
            let _ = sender.send(lookup).await;
        }
    });
    receiver
}

/// Gathers everything a miner needs to produce a block at the given epoch.
/// Absent when the winning PoSt challenge selects no sectors.
pub(crate) async fn state_miner_get_base_info<DB, KS, B, V>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, ChainEpoch, TipsetKeys)>,
) -> Result<Option<MiningBaseInfoJson>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
    V: ProofVerifier + Send + Sync + 'static,
{
    let (AddressJson(miner), epoch, keys) = params;
    let info = data
        .state_manager
        .miner_get_base_info::<V, B>(data.beacon.as_ref(), &miner, epoch, &keys)
        .await
        .map_err(|e| e.to_string())?;
    Ok(info.map(Into::into))
}

/// Assembles, signs and returns a block from the given template.
pub(crate) async fn miner_create_block<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(BlockTemplateJson,)>,
) -> Result<BlockMessageJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (template,) = params;
    let store = data.chain_store.blockstore();

    // resolve the worker key first; the context borrows the store and is
    // dropped before the keystore is awaited
    let worker = {
        let context = data
            .state_manager
            .tipset_context(&template.parents, true)
            .map_err(|e| e.to_string())?;
        let miner_state = context
            .miner_state(&template.miner)
            .map_err(|e| e.to_string())?;
        context
            .account_key(&miner_state.info.worker)
            .map_err(|e| e.to_string())?
    };

    let mut block = chain::generate(
        data.state_manager.interpreter().as_ref(),
        data.weight_calc.as_ref(),
        store,
        chain::BlockTemplate {
            miner: template.miner,
            parents: template.parents,
            ticket: template.ticket,
            eproof: template.eproof,
            beacon_values: template.beacon_values,
            messages: template.messages,
            epoch: template.epoch,
            timestamp: template.timestamp,
            winning_post_proof: template.winning_post_proof,
        },
    )
    .map_err(|e| e.to_string())?;

    let signing_bytes = block.header.to_signing_bytes().map_err(|e| e.to_string())?;
    let keystore = data.keystore.read().await;
    let key = key_management::find_key(&worker, &*keystore).map_err(|e| e.to_string())?;
    let sig = key_management::sign(
        *key.key_info.key_type(),
        key.key_info.private_key(),
        &signing_bytes,
    )
    .map_err(|e| e.to_string())?;
    drop(keystore);
    block.header.set_signature(sig).map_err(|e| e.to_string())?;

    let mut bls_cids = Vec::new();
    for msg in &block.bls_messages {
        bls_cids.push(msg.cid().map_err(|e| e.to_string())?);
    }
    let mut secpk_cids = Vec::new();
    for msg in &block.secp_messages {
        secpk_cids.push(msg.cid().map_err(|e| e.to_string())?);
    }

    Ok(BlockMessageJson {
        header: block.header,
        bls_messages: bls_cids,
        secpk_messages: secpk_cids,
    })
}

fn make_deal(proposal: DealProposal, state: DealState) -> ApiMarketDeal {
    ApiMarketDeal {
        proposal: ApiDealProposal {
            piece_cid: proposal.piece_cid,
            piece_size: proposal.piece_size.0,
            client: proposal.client,
            provider: proposal.provider,
            start_epoch: proposal.start_epoch,
            end_epoch: proposal.end_epoch,
            storage_price_per_epoch: proposal.storage_price_per_epoch.atto().to_string(),
            provider_collateral: proposal.provider_collateral.atto().to_string(),
            client_collateral: proposal.client_collateral.atto().to_string(),
        },
        state: ApiDealState {
            sector_start_epoch: state.sector_start_epoch,
            last_updated_epoch: state.last_updated_epoch,
            slash_epoch: state.slash_epoch,
        },
    }
}

fn make_sector_info(sector: ChainSectorInfo) -> ApiSectorInfo {
    ApiSectorInfo {
        sector_number: sector.id,
        sealed_cid: sector.info.info.sealed_cid,
        activation_epoch: sector.info.activation_epoch,
        expiration: sector.info.info.expiration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::message::UnsignedMessageJson;
    use crate::rpc::test_setup::{setup, TEST_NET_NAME};
    use fvm_shared::address::Address;
    use fvm_shared::error::ExitCode;

    #[async_std::test]
    async fn call_reports_vm_exit_code_in_receipt() {
        let (state, _key) = setup().await;
        let head_keys = TipsetKeys::default();

        // the stub invoker exits with the message's method number
        let message = UnsignedMessage::builder()
            .to(Address::new_id(1))
            .from(Address::new_id(101))
            .method_num(16)
            .build()
            .unwrap();
        let result = state_call(
            Data(state.clone()),
            Params((UnsignedMessageJson(message), head_keys.clone())),
        )
        .await
        .unwrap();

        assert_eq!(result.msg_rct.exit_code, ExitCode::new(16));
        assert!(result.msg_rct.return_data.is_empty());
        assert_eq!(result.msg_rct.gas_used, 0);
        assert!(result.error.is_some());

        // a clean call produces an ok receipt
        let message = UnsignedMessage::builder()
            .to(Address::new_id(1))
            .from(Address::new_id(101))
            .build()
            .unwrap();
        let result = state_call(
            Data(state.clone()),
            Params((UnsignedMessageJson(message), head_keys)),
        )
        .await
        .unwrap();
        assert_eq!(result.msg_rct.exit_code, ExitCode::OK);
        assert!(result.error.is_none());
    }

    #[async_std::test]
    async fn account_key_resolves_and_is_stable() {
        let (state, key) = setup().await;
        let keys = TipsetKeys::default();

        // ID addresses resolve through the account actor
        let AddressJson(resolved) = state_account_key(
            Data(state.clone()),
            Params((AddressJson(Address::new_id(101)), keys.clone())),
        )
        .await
        .unwrap();
        assert_eq!(resolved, key.address);

        // key addresses come back unchanged
        let AddressJson(identity) = state_account_key(
            Data(state.clone()),
            Params((AddressJson(key.address), keys.clone())),
        )
        .await
        .unwrap();
        assert_eq!(identity, key.address);

        // resolving an absent actor is an error
        assert!(state_account_key(
            Data(state.clone()),
            Params((AddressJson(Address::new_id(999)), keys)),
        )
        .await
        .is_err());
    }

    #[async_std::test]
    async fn lookup_id_is_idempotent() {
        let (state, key) = setup().await;
        let keys = TipsetKeys::default();

        let AddressJson(id) = state_lookup_id(
            Data(state.clone()),
            Params((AddressJson(key.address), keys.clone())),
        )
        .await
        .unwrap();
        assert_eq!(id, Address::new_id(101));

        let AddressJson(again) =
            state_lookup_id(Data(state.clone()), Params((AddressJson(id), keys)))
                .await
                .unwrap();
        assert_eq!(again, id);
    }

    #[async_std::test]
    async fn network_name_comes_from_genesis_state() {
        let (state, _key) = setup().await;
        let name = state_network_name(Data(state.clone())).await.unwrap();
        assert_eq!(name, TEST_NET_NAME);
    }

    #[async_std::test]
    async fn get_actor_returns_balance_and_nonce() {
        let (state, _key) = setup().await;
        let actor = state_get_actor(
            Data(state.clone()),
            Params((AddressJson(Address::new_id(101)), TipsetKeys::default())),
        )
        .await
        .unwrap();
        assert_eq!(actor.0.sequence, 7);
        assert!(!actor.0.balance.is_zero());
    }

    #[async_std::test]
    async fn list_actors_contains_singletons() {
        let (state, _key) = setup().await;
        let actors = state_list_actors(Data(state.clone()), Params((TipsetKeys::default(),)))
            .await
            .unwrap();
        let addrs: Vec<Address> = actors.into_iter().map(|a| a.0).collect();
        assert!(addrs.contains(&Address::new_id(1)));
        assert!(addrs.contains(&Address::new_id(101)));
    }
}
