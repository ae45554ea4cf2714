// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use jsonrpc_v2::{Data, Error as JsonRpcError, Params};

use crate::beacon::Beaconizer;
use crate::chain::compute_msg_meta;
use crate::ipld::BlockStore;
use crate::json::gossip_block::GossipBlockJson;
use crate::key_management::KeyStore;
use crate::rpc::data_types::RpcState;

/// Submits a locally produced block. The header must commit to exactly the
/// message cids the block carries; the header is then handed to the chain
/// store. Full validation belongs to the sync process.
pub(crate) async fn sync_submit_block<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params((GossipBlockJson(blk),)): Params<(GossipBlockJson,)>,
) -> Result<(), JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let store = data.chain_store.blockstore();
    let meta_cid = compute_msg_meta(store, &blk.bls_messages, &blk.secpk_messages)
        .map_err(|e| e.to_string())?;
    if blk.header.messages() != &meta_cid {
        return Err("block message roots are inconsistent with the header".into());
    }

    data.chain_store
        .add_block(blk.header)
        .map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BlockHeader, GossipBlock, Ticket};
    use crate::crypto::VRFProof;
    use crate::rpc::test_setup::setup;
    use crate::utils::encoding::cid_from_cbor_blake2b256;
    use fvm_shared::address::Address;
    use jsonrpc_v2::Data;

    #[async_std::test]
    async fn submit_rejects_inconsistent_message_roots() {
        let (state, _key) = setup().await;
        let head = state.chain_store.heaviest_tipset().unwrap();

        let header = BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .ticket(Some(Ticket::new(VRFProof::new(vec![1]))))
            .parents(head.key().clone())
            .epoch(1)
            // commits to some unrelated cid
            .messages(cid_from_cbor_blake2b256(b"not a msg meta"))
            .build_and_validate()
            .unwrap();

        let result = sync_submit_block(
            Data(state.clone()),
            Params((GossipBlockJson(GossipBlock {
                header,
                bls_messages: Vec::new(),
                secpk_messages: Vec::new(),
            }),)),
        )
        .await;
        assert!(result.is_err());
    }

    #[async_std::test]
    async fn submit_moves_the_head() {
        let (state, _key) = setup().await;
        let head = state.chain_store.heaviest_tipset().unwrap();
        let store = state.chain_store.blockstore();

        let meta_cid = compute_msg_meta(store, &[], &[]).unwrap();
        let header = BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .ticket(Some(Ticket::new(VRFProof::new(vec![1]))))
            .parents(head.key().clone())
            .epoch(1)
            .messages(meta_cid)
            .build_and_validate()
            .unwrap();
        let cid = *header.cid();

        sync_submit_block(
            Data(state.clone()),
            Params((GossipBlockJson(GossipBlock {
                header,
                bls_messages: Vec::new(),
                secpk_messages: Vec::new(),
            }),)),
        )
        .await
        .unwrap();

        let new_head = state.chain_store.heaviest_tipset().unwrap();
        assert_eq!(new_head.epoch(), 1);
        assert!(new_head.contains(&cid));
    }
}
