// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use async_std::channel::{bounded, Receiver};
use async_std::task;
use cid::Cid;
use fvm_ipld_amt::Amt;
use fvm_shared::clock::ChainEpoch;
use jsonrpc_v2::{Data, Error as JsonRpcError, Params};
use libipld_core::ipld::Ipld;
use std::str::FromStr;

use crate::beacon::Beaconizer;
use crate::blocks::{BlockHeader, Tipset, TipsetKeys};
use crate::chain::{self, HeadChange};
use crate::crypto::DomainSeparationTag;
use crate::ipld::BlockStore;
use crate::json::cid::CidJson;
use crate::json::message::UnsignedMessageJson;
use crate::json::tipset::TipsetJson;
use crate::key_management::KeyStore;
use crate::message::{MessageReceipt, SignedMessage, UnsignedMessage};
use crate::rpc::data_types::{BlockMessages, CidMessage, IpldObject, RpcState};
use crate::rpc::CHANNEL_CAP;

/// Returns a block header by its cid.
pub(crate) async fn chain_get_block<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(CidJson,)>,
) -> Result<crate::json::block_header::BlockHeaderJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (CidJson(blk_cid),) = params;
    let blk: BlockHeader = data
        .chain_store
        .blockstore()
        .get_obj(&blk_cid)
        .map_err(|e| e.to_string())?
        .ok_or("can't find block with that cid")?;
    Ok(crate::json::block_header::BlockHeaderJson(blk))
}

/// Reads raw ipld bytes referenced by a cid.
pub(crate) async fn chain_read_obj<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(CidJson,)>,
) -> Result<Vec<u8>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (CidJson(obj_cid),) = params;
    let ret = data
        .chain_store
        .blockstore()
        .get_bytes(&obj_cid)
        .map_err(|e| e.to_string())?
        .ok_or("can't find object with that cid")?;
    Ok(ret)
}

/// Returns the messages of a block, split by signature scheme, plus the
/// combined cid list (bls before secp).
pub(crate) async fn chain_get_block_messages<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(CidJson,)>,
) -> Result<BlockMessages, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (CidJson(blk_cid),) = params;
    let store = data.chain_store.blockstore();
    let blk: BlockHeader = store
        .get_obj(&blk_cid)
        .map_err(|e| e.to_string())?
        .ok_or("can't find block with that cid")?;

    let (bls_cids, secpk_cids) = chain::read_msg_cids(store, blk.messages()).map_err(|e| e.to_string())?;
    let (bls_msg, secp_msg) = chain::block_messages(store, &blk).map_err(|e| e.to_string())?;

    let cids = bls_cids.into_iter().chain(secpk_cids).collect();

    Ok(BlockMessages {
        bls_msg,
        secp_msg,
        cids,
    })
}

/// Returns the genesis tipset.
pub(crate) async fn chain_get_genesis<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
) -> Result<TipsetJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let genesis = data
        .chain_store
        .genesis()
        .ok_or("can't find genesis tipset")?;
    let gen_ts = Tipset::new(vec![genesis]).map_err(|e| e.to_string())?;
    Ok(TipsetJson(gen_ts))
}

/// Resolves an ipld node by path, `"/ipfs/<root cid>/<part>/..."`.
pub(crate) async fn chain_get_node<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(String,)>,
) -> Result<IpldObject, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (path,) = params;
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < 3 || !parts[0].is_empty() || parts[1] != "ipfs" {
        return Err("invalid ipld path".into());
    }
    let root = Cid::from_str(parts[2]).map_err(|e| e.to_string())?;

    get_node(data.chain_store.blockstore(), root, &parts[3..]).map_err(|e| e.to_string().into())
}

/// Returns a message by cid, unwrapping a signed envelope when present.
pub(crate) async fn chain_get_message<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(CidJson,)>,
) -> Result<UnsignedMessageJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (CidJson(msg_cid),) = params;
    let store = data.chain_store.blockstore();

    if let Some(signed) = store
        .get_obj::<SignedMessage>(&msg_cid)
        .unwrap_or_default()
    {
        return Ok(UnsignedMessageJson(signed.into_message()));
    }

    let ret: UnsignedMessage = store
        .get_obj(&msg_cid)
        .map_err(|e| e.to_string())?
        .ok_or("can't find message with that cid")?;
    Ok(UnsignedMessageJson(ret))
}

/// Returns the messages included by all parents of a block, with secp
/// messages unwrapped to their inner message.
pub(crate) async fn chain_get_parent_messages<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(CidJson,)>,
) -> Result<Vec<CidMessage>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (CidJson(blk_cid),) = params;
    let store = data.chain_store.blockstore();
    let blk: BlockHeader = store
        .get_obj(&blk_cid)
        .map_err(|e| e.to_string())?
        .ok_or("can't find block with that cid")?;

    let mut messages = Vec::new();
    for parent_cid in blk.parents().cids() {
        let parent: BlockHeader = store
            .get_obj(parent_cid)
            .map_err(|e| e.to_string())?
            .ok_or("can't find parent block")?;
        let (bls_cids, secpk_cids) =
            chain::read_msg_cids(store, parent.messages()).map_err(|e| e.to_string())?;
        let (bls_msgs, secp_msgs) =
            chain::block_messages(store, &parent).map_err(|e| e.to_string())?;

        for (cid, message) in bls_cids.into_iter().zip(bls_msgs) {
            messages.push(CidMessage { cid, message });
        }
        for (cid, signed) in secpk_cids.into_iter().zip(secp_msgs) {
            messages.push(CidMessage {
                cid,
                message: signed.into_message(),
            });
        }
    }
    Ok(messages)
}

/// Returns the receipts produced by the parent tipset of a block.
pub(crate) async fn chain_get_parent_receipts<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(CidJson,)>,
) -> Result<Vec<crate::json::message_receipt::MessageReceiptJson>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (CidJson(blk_cid),) = params;
    let store = data.chain_store.blockstore();
    let blk: BlockHeader = store
        .get_obj(&blk_cid)
        .map_err(|e| e.to_string())?
        .ok_or("can't find block with that cid")?;

    let receipts: Amt<MessageReceipt, _> =
        Amt::load(blk.message_receipts(), store).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    receipts
        .for_each(|_, receipt| {
            out.push(crate::json::message_receipt::MessageReceiptJson(
                receipt.clone(),
            ));
            Ok(())
        })
        .map_err(|e| e.to_string())?;
    Ok(out)
}

/// Draws the chain randomness for an epoch on top of a tipset.
pub(crate) async fn chain_get_randomness<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(TipsetKeys, i64, ChainEpoch, String)>,
) -> Result<[u8; 32], JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (keys, tag, epoch, entropy) = params;
    let entropy = base64::decode(entropy).map_err(|e| e.to_string())?;
    let tag = DomainSeparationTag::from_byte(tag as u8).ok_or("invalid domain separation tag")?;

    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;
    data.state_manager
        .get_randomness(&context.tipset, tag, epoch, &entropy)
        .map_err(|e| e.to_string().into())
}

/// Returns the tipset with the given key.
pub(crate) async fn chain_get_tipset<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(TipsetKeys,)>,
) -> Result<TipsetJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (keys,) = params;
    let ts = Tipset::load(data.chain_store.blockstore(), keys.cids()).map_err(|e| e.to_string())?;
    Ok(TipsetJson(ts))
}

/// Walks back from the tipset at `key` to the last tipset still at or above
/// `height`. Requesting a height above the start tipset is an error.
pub(crate) async fn chain_get_tipset_by_height<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(ChainEpoch, TipsetKeys)>,
) -> Result<TipsetJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (height, keys) = params;
    let context = data
        .state_manager
        .tipset_context(&keys, false)
        .map_err(|e| e.to_string())?;

    let mut tipset = (*context.tipset).clone();
    if tipset.epoch() < height {
        return Err("looking for tipset with height greater than start point".into());
    }
    while tipset.epoch() > height {
        let parent = tipset
            .load_parent(data.chain_store.blockstore())
            .map_err(|e| e.to_string())?;
        if parent.epoch() < height {
            break;
        }
        tipset = parent;
    }
    Ok(TipsetJson(tipset))
}

/// Returns the current head of the heaviest chain.
pub(crate) async fn chain_head<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
) -> Result<TipsetJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let heaviest = data
        .chain_store
        .heaviest_tipset()
        .ok_or("can't find heaviest tipset")?;
    Ok(TipsetJson((*heaviest).clone()))
}

/// Not implemented; setting the head belongs to operator tooling.
pub(crate) async fn chain_set_head<DB, KS, B>(
    _data: Data<RpcState<DB, KS, B>>,
    Params(_params): Params<(TipsetKeys,)>,
) -> Result<(), JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    Err("method not implemented".into())
}

/// Computes the consensus weight of the tipset with the given key.
pub(crate) async fn chain_tipset_weight<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(TipsetKeys,)>,
) -> Result<String, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (keys,) = params;
    let store = data.chain_store.blockstore();
    let ts = Tipset::load(store, keys.cids()).map_err(|e| e.to_string())?;
    let weight = data
        .weight_calc
        .calculate_weight(store, &ts)
        .map_err(|e| e.to_string())?;
    Ok(weight.to_string())
}

/// Subscribes to head changes. The current head is delivered first, then
/// every apply/revert. Dropping the receiver cancels the subscription: the
/// forwarding task disconnects on the first failed write.
pub fn chain_notify<DB, KS, B>(data: &RpcState<DB, KS, B>) -> Receiver<HeadChange>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (sender, receiver) = bounded(CHANNEL_CAP);
    let mut subscriber = data.chain_store.subscribe_head_changes();

    let chain_store = data.chain_store.clone();
    task::spawn(async move {
        if let Some(heaviest) = chain_store.heaviest_tipset() {
            if sender.send(HeadChange::Current(heaviest)).await.is_err() {
                return;
            }
        }
        while let Ok(change) = subscriber.recv().await {
            if sender.send(change).await.is_err() {
                // consumer dropped the channel, disconnect
                break;
            }
        }
    });
    receiver
}

/// Walks an ipld path from a root block, following links.
fn get_node<DB: BlockStore>(store: &DB, root: Cid, parts: &[&str]) -> anyhow::Result<IpldObject> {
    let mut cid = root;
    let mut node: Ipld = store
        .get_obj(&cid)?
        .ok_or_else(|| anyhow::anyhow!("node not found: {}", cid))?;

    for part in parts {
        if let Ipld::Link(link) = &node {
            cid = *link;
            node = store
                .get_obj(&cid)?
                .ok_or_else(|| anyhow::anyhow!("node not found: {}", cid))?;
        }
        node = match node {
            Ipld::Map(mut map) => map
                .remove(*part)
                .ok_or_else(|| anyhow::anyhow!("no such key: {}", part))?,
            Ipld::List(mut list) => {
                let i: usize = part.parse()?;
                if i >= list.len() {
                    anyhow::bail!("index out of range: {}", i);
                }
                list.swap_remove(i)
            }
            other => anyhow::bail!("can't index into ipld node: {:?}", other),
        };
    }

    if let Ipld::Link(link) = &node {
        cid = *link;
        node = store
            .get_obj(&cid)?
            .ok_or_else(|| anyhow::anyhow!("node not found: {}", cid))?;
    }
    Ok(IpldObject { cid, obj: node })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::test_setup::{extend_chain, setup};

    #[async_std::test]
    async fn tipset_by_height_stops_above_target() {
        let (state, _key) = setup().await;
        let root = *state
            .chain_store
            .heaviest_tipset()
            .unwrap()
            .parent_state();
        extend_chain(&state.chain_store, root, &[2, 5, 7, 10]).await;

        let head_keys = state
            .chain_store
            .heaviest_tipset()
            .unwrap()
            .key()
            .clone();

        // requesting height 6 returns the last tipset still at or above it
        let TipsetJson(ts) = chain_get_tipset_by_height(
            Data(state.clone()),
            Params((6, head_keys.clone())),
        )
        .await
        .unwrap();
        assert_eq!(ts.epoch(), 7);

        // an exact match returns that tipset
        let TipsetJson(ts) = chain_get_tipset_by_height(
            Data(state.clone()),
            Params((5, head_keys.clone())),
        )
        .await
        .unwrap();
        assert_eq!(ts.epoch(), 5);

        // heights above the start tipset are an error
        assert!(
            chain_get_tipset_by_height(Data(state.clone()), Params((11, head_keys)))
                .await
                .is_err()
        );
    }

    #[async_std::test]
    async fn head_and_genesis_resolve() {
        let (state, _key) = setup().await;
        let TipsetJson(genesis) = chain_get_genesis(Data(state.clone())).await.unwrap();
        let TipsetJson(head) = chain_head(Data(state.clone())).await.unwrap();
        assert_eq!(genesis, head);
        assert_eq!(head.epoch(), 0);
    }

    #[async_std::test]
    async fn block_fetch_roundtrip() {
        let (state, _key) = setup().await;
        let head = state.chain_store.heaviest_tipset().unwrap();
        let cid = head.cids()[0];

        let header = chain_get_block(Data(state.clone()), Params((CidJson(cid),)))
            .await
            .unwrap();
        assert_eq!(header.0.cid(), &cid);

        let raw = chain_read_obj(Data(state.clone()), Params((CidJson(cid),)))
            .await
            .unwrap();
        assert_eq!(raw, header.0.raw_data());
    }

    #[async_std::test]
    async fn notify_delivers_current_then_applies() {
        let (state, _key) = setup().await;
        let receiver = chain_notify(&state);

        match receiver.recv().await.unwrap() {
            HeadChange::Current(ts) => assert_eq!(ts.epoch(), 0),
            other => panic!("expected current head first: {:?}", other),
        }

        let root = *state
            .chain_store
            .heaviest_tipset()
            .unwrap()
            .parent_state();
        extend_chain(&state.chain_store, root, &[1]).await;

        match receiver.recv().await.unwrap() {
            HeadChange::Apply(ts) => assert_eq!(ts.epoch(), 1),
            other => panic!("expected applied tipset: {:?}", other),
        }
    }

    #[async_std::test]
    async fn dropped_subscription_does_not_wedge_publisher() {
        let (state, _key) = setup().await;
        let receiver = chain_notify(&state);
        receiver.recv().await.unwrap();
        drop(receiver);

        // the store keeps publishing into the void
        let root = *state
            .chain_store
            .heaviest_tipset()
            .unwrap()
            .parent_state();
        extend_chain(&state.chain_store, root, &[1, 2]).await;

        // and fresh subscriptions still work
        let receiver = chain_notify(&state);
        match receiver.recv().await.unwrap() {
            HeadChange::Current(ts) => assert_eq!(ts.epoch(), 2),
            other => panic!("expected current head: {:?}", other),
        }
    }
}
