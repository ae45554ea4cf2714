// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use async_std::channel::{bounded, Receiver};
use async_std::task;
use fvm_shared::address::Protocol;
use jsonrpc_v2::{Data, Error as JsonRpcError, Params};

use crate::beacon::Beaconizer;
use crate::blocks::TipsetKeys;
use crate::ipld::BlockStore;
use crate::json::cid::CidJson;
use crate::json::message::UnsignedMessageJson;
use crate::json::signed_message::SignedMessageJson;
use crate::key_management::{self, KeyStore};
use crate::message::SignedMessage;
use crate::message_pool::MpoolUpdate;
use crate::rpc::data_types::RpcState;
use crate::rpc::CHANNEL_CAP;
use crate::utils::encoding::Cbor;

/// Return the pending messages of the pool. Requesting them for a tipset
/// ahead of the current head is an error.
pub(crate) async fn mpool_pending<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(TipsetKeys,)>,
) -> Result<Vec<SignedMessageJson>, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (keys,) = params;
    let requested_epoch = {
        let context = data
            .state_manager
            .tipset_context(&keys, false)
            .map_err(|e| e.to_string())?;
        context.tipset.epoch()
    };
    let heaviest = data
        .chain_store
        .heaviest_tipset()
        .ok_or("can't find heaviest tipset")?;
    if requested_epoch > heaviest.epoch() {
        return Err("tipset from future requested".into());
    }

    let pending = data.mpool.pending().await.map_err(|e| e.to_string())?;
    Ok(pending.into_iter().map(SignedMessageJson).collect())
}

/// Add a SignedMessage to the pool, returning its cid.
pub(crate) async fn mpool_push<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(SignedMessageJson,)>,
) -> Result<CidJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (SignedMessageJson(smsg),) = params;
    let cid = data.mpool.push(smsg).await.map_err(|e| e.to_string())?;
    Ok(CidJson(cid))
}

/// Assign the next nonce to the given message, sign it with the sender's
/// key and add it to the pool. ID-form senders are rewritten to their
/// public-key form first.
pub(crate) async fn mpool_push_message<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(UnsignedMessageJson,)>,
) -> Result<SignedMessageJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (UnsignedMessageJson(mut umsg),) = params;

    if umsg.from.protocol() == Protocol::ID {
        let context = data
            .state_manager
            .tipset_context(&TipsetKeys::default(), false)
            .map_err(|e| e.to_string())?;
        umsg.from = context
            .account_key(&umsg.from)
            .map_err(|e| e.to_string())?;
    }

    umsg.sequence = data
        .mpool
        .get_sequence(&umsg.from)
        .await
        .map_err(|e| e.to_string())?;

    let msg_cid = umsg.cid().map_err(|e| e.to_string())?;
    let keystore = data.keystore.read().await;
    let key = key_management::find_key(&umsg.from, &*keystore).map_err(|e| e.to_string())?;
    let sig = key_management::sign(
        *key.key_info.key_type(),
        key.key_info.private_key(),
        msg_cid.to_bytes().as_slice(),
    )
    .map_err(|e| e.to_string())?;
    drop(keystore);

    let smsg = SignedMessage::new_from_parts(umsg, sig);
    data.mpool
        .add(smsg.clone())
        .await
        .map_err(|e| e.to_string())?;

    Ok(SignedMessageJson(smsg))
}

/// Subscribes to pending set changes. Dropping the receiver cancels the
/// subscription on the next update.
pub fn mpool_sub<DB, KS, B>(data: &RpcState<DB, KS, B>) -> Receiver<MpoolUpdate>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (sender, receiver) = bounded(CHANNEL_CAP);
    let mut subscriber = data.mpool.subscribe();

    task::spawn(async move {
        while let Ok(update) = subscriber.recv().await {
            if sender.send(update).await.is_err() {
                break;
            }
        }
    });
    receiver
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, UnsignedMessage};
    use crate::rpc::test_setup::setup;
    use fvm_shared::address::Address;
    use jsonrpc_v2::Data;

    #[async_std::test]
    async fn push_message_assigns_nonce_and_signs() {
        let (state, key) = setup().await;

        // sender is the ID form of the keystore account
        let umsg = UnsignedMessage::builder()
            .to(Address::new_id(1))
            .from(Address::new_id(101))
            .gas_limit(1000)
            .build()
            .unwrap();

        let SignedMessageJson(smsg) = mpool_push_message(
            Data(state.clone()),
            Params((UnsignedMessageJson(umsg),)),
        )
        .await
        .unwrap();

        // the sender is rewritten to its key form and the actor sequence is
        // assigned
        assert_eq!(smsg.from(), &key.address);
        assert_eq!(smsg.sequence(), 7);

        let msg_cid = smsg.message().cid().unwrap();
        crate::key_management::verify(smsg.signature(), &key.address, &msg_cid.to_bytes())
            .unwrap();

        // the message is pending now, and the next sequence moved up
        let pending = state.mpool.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(state.mpool.get_sequence(&key.address).await.unwrap(), 8);
    }

    #[async_std::test]
    async fn consecutive_pushes_increase_nonce() {
        let (state, key) = setup().await;

        for expected in [7u64, 8, 9] {
            let umsg = UnsignedMessage::builder()
                .to(Address::new_id(1))
                .from(key.address)
                .gas_limit(1000)
                .sequence(0)
                .build()
                .unwrap();
            let SignedMessageJson(smsg) = mpool_push_message(
                Data(state.clone()),
                Params((UnsignedMessageJson(umsg),)),
            )
            .await
            .unwrap();
            assert_eq!(smsg.sequence(), expected);
        }
    }

    #[async_std::test]
    async fn pending_rejects_future_tipset() {
        let (state, _key) = setup().await;
        let root = *state
            .chain_store
            .heaviest_tipset()
            .unwrap()
            .parent_state();
        crate::rpc::test_setup::extend_chain(&state.chain_store, root, &[1, 2]).await;

        let future = state.chain_store.heaviest_tipset().unwrap();
        // rewind the head below the requested tipset
        let genesis = state.chain_store.genesis().unwrap();
        let gen_ts = crate::blocks::Tipset::new(vec![genesis]).unwrap();
        state
            .chain_store
            .set_heaviest_tipset(std::sync::Arc::new(gen_ts))
            .unwrap();

        let result =
            mpool_pending(Data(state.clone()), Params((future.key().clone(),))).await;
        assert!(result.is_err());
    }
}
