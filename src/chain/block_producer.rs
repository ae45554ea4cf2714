// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use bls_signatures::Serialize as BlsSerialize;
use cid::multihash::Code::Blake2b256;
use cid::Cid;
use fvm_ipld_amt::Amt;
use fvm_shared::address::Address;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::crypto::signature::{Signature, SignatureType};
use fvm_shared::sector::PoStProof;

use super::WeightCalculator;
use crate::beacon::BeaconEntry;
use crate::blocks::{Block, BlockHeader, ElectionProof, MsgMeta, Ticket, Tipset, TipsetKeys};
use crate::interpreter::Interpreter;
use crate::ipld::BlockStore;
use crate::message::SignedMessage;

/// Everything a miner won for an epoch, ready to be assembled into a block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockTemplate {
    pub miner: Address,
    pub parents: TipsetKeys,
    pub ticket: Ticket,
    pub eproof: ElectionProof,
    pub beacon_values: Vec<BeaconEntry>,
    pub messages: Vec<SignedMessage>,
    pub epoch: ChainEpoch,
    pub timestamp: u64,
    pub winning_post_proof: Vec<PoStProof>,
}

/// Assembles an unsigned block from a template: interprets the parent
/// tipset for the state and receipt roots, packs the messages into the
/// bls/secp arrays, and aggregates the bls signatures. Header signing is
/// the caller's concern.
pub fn generate<DB: BlockStore>(
    interpreter: &dyn Interpreter<DB>,
    weigher: &dyn WeightCalculator<DB>,
    store: &DB,
    template: BlockTemplate,
) -> anyhow::Result<Block> {
    let parent = Tipset::load(store, template.parents.cids())?;
    let result = interpreter.interpret(store, &parent)?;
    let weight = weigher.calculate_weight(store, &parent)?;

    let mut bls_messages = Vec::new();
    let mut secp_messages = Vec::new();
    let mut bls_cids = Vec::new();
    let mut secp_cids = Vec::new();
    let mut bls_sigs = Vec::new();

    for msg in template.messages {
        match msg.signature().signature_type() {
            SignatureType::BLS => {
                let cid = store.put_obj(msg.message(), Blake2b256)?;
                bls_cids.push(cid);
                bls_sigs.push(msg.signature().clone());
                bls_messages.push(msg.into_message());
            }
            SignatureType::Secp256k1 => {
                let cid = store.put_obj(&msg, Blake2b256)?;
                secp_cids.push(cid);
                secp_messages.push(msg);
            }
        }
    }

    let messages = store.put_obj(
        &MsgMeta {
            bls_message_root: store_msg_cids(store, &bls_cids)?,
            secp_message_root: store_msg_cids(store, &secp_cids)?,
        },
        Blake2b256,
    )?;

    let header = BlockHeader::builder()
        .miner_address(template.miner)
        .ticket(Some(template.ticket))
        .election_proof(Some(template.eproof))
        .beacon_entries(template.beacon_values)
        .winning_post_proof(template.winning_post_proof)
        .parents(template.parents)
        .weight(weight)
        .epoch(template.epoch)
        .state_root(result.state_root)
        .message_receipts(result.message_receipts)
        .messages(messages)
        .bls_aggregate(Some(aggregate_bls_sigs(&bls_sigs)?))
        .timestamp(template.timestamp)
        .build_and_validate()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(Block {
        header,
        bls_messages,
        secp_messages,
    })
}

/// Verifies that a gossip block's header commits to exactly the message
/// cids it carries, returning the recomputed meta cid.
pub fn compute_msg_meta<DB: BlockStore>(
    store: &DB,
    bls_cids: &[Cid],
    secp_cids: &[Cid],
) -> anyhow::Result<Cid> {
    store.put_obj(
        &MsgMeta {
            bls_message_root: store_msg_cids(store, bls_cids)?,
            secp_message_root: store_msg_cids(store, secp_cids)?,
        },
        Blake2b256,
    )
}

/// Persists a message cid array and returns its root.
fn store_msg_cids<DB: BlockStore>(store: &DB, cids: &[Cid]) -> anyhow::Result<Cid> {
    let mut array: Amt<Cid, _> = Amt::new(store);
    for (i, cid) in cids.iter().enumerate() {
        array.set(i as u64, *cid)?;
    }
    Ok(array.flush()?)
}

/// Aggregates the signatures of a block's bls messages. An empty message
/// set aggregates to an empty signature.
fn aggregate_bls_sigs(sigs: &[Signature]) -> anyhow::Result<Signature> {
    if sigs.is_empty() {
        return Ok(Signature::new_bls(Vec::new()));
    }
    let parsed = sigs
        .iter()
        .map(|sig| bls_signatures::Signature::from_bytes(sig.bytes()))
        .collect::<Result<Vec<_>, _>>()?;
    let aggregate = bls_signatures::aggregate(&parsed)?;
    Ok(Signature::new_bls(aggregate.as_bytes()))
}

/// Stores a signed message the way blocks reference it: bls messages by
/// their inner message cid, secp messages by the cid of the signed
/// envelope.
pub fn persist_block_message<DB: BlockStore>(
    store: &DB,
    msg: &SignedMessage,
) -> anyhow::Result<Cid> {
    match msg.signature().signature_type() {
        SignatureType::BLS => store.put_obj(msg.message(), Blake2b256),
        SignatureType::Secp256k1 => store.put_obj(msg, Blake2b256),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::read_msg_cids;
    use crate::db::MemoryDB;
    use crate::interpreter::InterpreterResult;
    use crate::message::UnsignedMessage;
    use crate::utils::encoding::{cid_from_cbor_blake2b256, Cbor};
    use fvm_ipld_blockstore::Blockstore;
    use fvm_shared::bigint::BigInt;

    struct StubInterpreter;
    impl Interpreter<MemoryDB> for StubInterpreter {
        fn interpret(&self, _: &MemoryDB, _: &Tipset) -> anyhow::Result<InterpreterResult> {
            Ok(InterpreterResult {
                state_root: cid_from_cbor_blake2b256(b"state"),
                message_receipts: cid_from_cbor_blake2b256(b"receipts"),
            })
        }
    }

    struct StubWeigher;
    impl WeightCalculator<MemoryDB> for StubWeigher {
        fn calculate_weight(&self, _: &MemoryDB, _: &Tipset) -> anyhow::Result<BigInt> {
            Ok(BigInt::from(42u8))
        }
    }

    fn signed_secp_msg(sequence: u64) -> SignedMessage {
        let message = UnsignedMessage::builder()
            .to(Address::new_id(1))
            .from(Address::new_id(2))
            .sequence(sequence)
            .build()
            .unwrap();
        SignedMessage::new_from_parts(message, Signature::new_secp256k1(vec![0u8; 65]))
    }

    #[test]
    fn generated_block_commits_to_messages() {
        let db = MemoryDB::default();
        let genesis = BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .build_and_validate()
            .unwrap();
        db.put_keyed(genesis.cid(), genesis.raw_data()).unwrap();

        let template = BlockTemplate {
            miner: Address::new_id(1000),
            parents: TipsetKeys::new(vec![*genesis.cid()]),
            ticket: Ticket::default(),
            eproof: ElectionProof::default(),
            beacon_values: Vec::new(),
            messages: vec![signed_secp_msg(0), signed_secp_msg(1)],
            epoch: 1,
            timestamp: 1234,
            winning_post_proof: Vec::new(),
        };

        let block = generate(&StubInterpreter, &StubWeigher, &db, template).unwrap();
        assert_eq!(block.header.epoch(), 1);
        assert_eq!(block.header.weight(), &BigInt::from(42u8));
        assert_eq!(block.secp_messages.len(), 2);
        assert!(block.bls_messages.is_empty());

        // the header's meta resolves to exactly the packed message cids
        let (bls_cids, secp_cids) = read_msg_cids(&db, block.header.messages()).unwrap();
        assert!(bls_cids.is_empty());
        let expected: Vec<Cid> = block
            .secp_messages
            .iter()
            .map(|m| m.cid().unwrap())
            .collect();
        assert_eq!(secp_cids, expected);
    }
}
