// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use derive_builder::Builder;
use fvm_shared::address::Address;
use fvm_shared::bigint::bigint_ser::{BigIntDe, BigIntSer};
use fvm_shared::bigint::BigInt;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::crypto::signature::Signature;
use fvm_shared::sector::PoStProof;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::{ElectionProof, Error, Ticket, TipsetKeys};
use crate::beacon::BeaconEntry;
use crate::key_management;
use crate::utils::encoding::{cid_from_cbor_blake2b256, Cbor};

/// Header of a block
///
/// Usage:
/// ```
/// use fuhon::blocks::{BlockHeader, TipsetKeys, Ticket};
/// use fvm_shared::address::Address;
/// use fvm_shared::bigint::BigInt;
///
/// BlockHeader::builder()
///     .miner_address(Address::new_id(0)) // required
///     .messages(Default::default()) // required
///     .message_receipts(Default::default()) // required
///     .state_root(Default::default()) // required
///     .beacon_entries(Vec::new()) // optional
///     .winning_post_proof(Vec::new()) // optional
///     .election_proof(None) // optional
///     .bls_aggregate(None) // optional
///     .signature(None) // optional
///     .parents(TipsetKeys::default()) // optional
///     .weight(BigInt::from(0u8)) // optional
///     .epoch(0) // optional
///     .timestamp(0) // optional
///     .ticket(Some(Ticket::default())) // optional
///     .fork_signal(0) // optional
///     .build_and_validate()
///     .unwrap();
/// ```
#[derive(Clone, Debug, PartialEq, Builder)]
#[builder(name = "BlockHeaderBuilder")]
pub struct BlockHeader {
    // CHAIN LINKING
    /// Parents is the set of parents this block was based on. Typically one,
    /// but can be several in the case where there were multiple winning
    /// ticket-holders for an epoch.
    #[builder(default)]
    parents: TipsetKeys,

    /// The aggregate chain weight of the parent set.
    #[builder(default)]
    weight: BigInt,

    /// The period in which a new block is generated. There may be multiple
    /// rounds in an epoch.
    #[builder(default)]
    epoch: ChainEpoch,

    /// The verifiable oracle randomness used to elect this block's author
    /// leader.
    #[builder(default)]
    beacon_entries: Vec<BeaconEntry>,

    /// The winning PoSt proofs.
    #[builder(default)]
    winning_post_proof: Vec<PoStProof>,

    // MINER INFO
    /// The address of the miner actor that mined this block.
    miner_address: Address,

    // STATE
    /// The CID of the MsgMeta linking bls_messages and secp_messages.
    #[builder(default)]
    messages: Cid,

    /// The CID of the root of an array of MessageReceipts produced by the
    /// parent tipset.
    #[builder(default)]
    message_receipts: Cid,

    /// The CID of the parent state root after calculating parent tipset.
    #[builder(default)]
    state_root: Cid,

    #[builder(default)]
    fork_signal: u64,

    /// The miner worker's signature over the header.
    #[builder(default)]
    signature: Option<Signature>,

    #[builder(default)]
    election_proof: Option<ElectionProof>,

    // CONSENSUS
    /// Timestamp, in seconds since the Unix epoch, at which this block was
    /// created.
    #[builder(default)]
    timestamp: u64,

    /// The ticket submitted with this block. Absent only for the genesis
    /// block.
    #[builder(default)]
    ticket: Option<Ticket>,

    // SIGNATURES
    /// Aggregate signature of the bls messages in this block.
    #[builder(default)]
    bls_aggregate: Option<Signature>,

    // CACHE
    /// Stores the CID for the block after the first call to `cid()`.
    #[builder(default, setter(skip))]
    cached_cid: Cid,

    /// Stores the marshalled bytes of the block.
    #[builder(default, setter(skip))]
    cached_bytes: Vec<u8>,
}

impl Cbor for BlockHeader {
    fn cid(&self) -> Result<Cid, fvm_ipld_encoding::Error> {
        Ok(*self.cid())
    }
}

impl Serialize for BlockHeader {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (
            &self.miner_address,
            &self.ticket,
            &self.election_proof,
            &self.beacon_entries,
            &self.winning_post_proof,
            &self.parents,
            BigIntSer(&self.weight),
            &self.epoch,
            &self.state_root,
            &self.message_receipts,
            &self.messages,
            &self.bls_aggregate,
            &self.timestamp,
            &self.signature,
            &self.fork_signal,
        )
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BlockHeader {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as Deserializer<'de>>::Error>
    where
        D: Deserializer<'de>,
    {
        let (
            miner_address,
            ticket,
            election_proof,
            beacon_entries,
            winning_post_proof,
            parents,
            BigIntDe(weight),
            epoch,
            state_root,
            message_receipts,
            messages,
            bls_aggregate,
            timestamp,
            signature,
            fork_signal,
        ) = Deserialize::deserialize(deserializer)?;

        BlockHeader::builder()
            .parents(parents)
            .weight(weight)
            .epoch(epoch)
            .beacon_entries(beacon_entries)
            .winning_post_proof(winning_post_proof)
            .miner_address(miner_address)
            .messages(messages)
            .message_receipts(message_receipts)
            .state_root(state_root)
            .fork_signal(fork_signal)
            .signature(signature)
            .election_proof(election_proof)
            .timestamp(timestamp)
            .ticket(ticket)
            .bls_aggregate(bls_aggregate)
            .build_and_validate()
            .map_err(de::Error::custom)
    }
}

impl BlockHeader {
    /// Generates a BlockHeader builder as a constructor.
    pub fn builder() -> BlockHeaderBuilder {
        BlockHeaderBuilder::default()
    }
    /// Getter for BlockHeader parents.
    pub fn parents(&self) -> &TipsetKeys {
        &self.parents
    }
    /// Getter for BlockHeader weight.
    pub fn weight(&self) -> &BigInt {
        &self.weight
    }
    /// Getter for BlockHeader epoch.
    pub fn epoch(&self) -> ChainEpoch {
        self.epoch
    }
    /// Getter for the beacon entries carried by the header.
    pub fn beacon_entries(&self) -> &[BeaconEntry] {
        &self.beacon_entries
    }
    /// Getter for winning PoSt proof.
    pub fn winning_post_proof(&self) -> &[PoStProof] {
        &self.winning_post_proof
    }
    /// Getter for BlockHeader miner_address.
    pub fn miner_address(&self) -> &Address {
        &self.miner_address
    }
    /// Getter for BlockHeader messages.
    pub fn messages(&self) -> &Cid {
        &self.messages
    }
    /// Getter for BlockHeader message_receipts.
    pub fn message_receipts(&self) -> &Cid {
        &self.message_receipts
    }
    /// Getter for BlockHeader state_root.
    pub fn state_root(&self) -> &Cid {
        &self.state_root
    }
    /// Getter for BlockHeader timestamp.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
    /// Getter for BlockHeader ticket.
    pub fn ticket(&self) -> &Option<Ticket> {
        &self.ticket
    }
    /// Getter for BlockHeader bls_aggregate.
    pub fn bls_aggregate(&self) -> &Option<Signature> {
        &self.bls_aggregate
    }
    /// Getter for BlockHeader cid. The cache is filled on construction, so
    /// this never re-hashes.
    pub fn cid(&self) -> &Cid {
        &self.cached_cid
    }
    /// Getter for BlockHeader fork_signal.
    pub fn fork_signal(&self) -> u64 {
        self.fork_signal
    }
    /// Getter for BlockHeader election_proof.
    pub fn election_proof(&self) -> &Option<ElectionProof> {
        &self.election_proof
    }
    /// Getter for BlockHeader signature.
    pub fn signature(&self) -> &Option<Signature> {
        &self.signature
    }
    /// Returns the marshalled bytes filled on construction.
    pub fn raw_data(&self) -> &[u8] {
        &self.cached_bytes
    }
    /// Sets the block signature computed by the miner's worker key.
    pub fn set_signature(&mut self, signature: Signature) -> Result<(), Error> {
        self.signature = Some(signature);
        self.update_cache().map_err(Error::Other)
    }

    /// Updates cache with the CID and encoded bytes of the header.
    fn update_cache(&mut self) -> Result<(), String> {
        self.cached_bytes = self.marshal_cbor().map_err(|e| e.to_string())?;
        self.cached_cid = cid_from_cbor_blake2b256(&self.cached_bytes);
        Ok(())
    }

    /// Serializes the header to bytes for signing purposes, i.e. without the
    /// signature field.
    pub fn to_signing_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut blk = self.clone();
        blk.signature = None;
        blk.marshal_cbor().map_err(|e| Error::Other(e.to_string()))
    }

    /// Check to ensure block signature is valid.
    pub fn check_block_signature(&self, addr: &Address) -> Result<(), Error> {
        let signature = self
            .signature()
            .as_ref()
            .ok_or_else(|| Error::InvalidSignature("Signature is nil in header".to_owned()))?;

        let signing_bytes = self.to_signing_bytes()?;
        key_management::verify(signature, addr, &signing_bytes)
            .map_err(|e| Error::InvalidSignature(format!("Block signature invalid: {}", e)))?;

        Ok(())
    }
}

/// Human-readable string representation of a block CID.
impl fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BlockHeader: {:?}", self.cid())
    }
}

impl BlockHeaderBuilder {
    pub fn build_and_validate(&self) -> Result<BlockHeader, String> {
        // Convert header builder into header struct
        let mut header = self.build().map_err(|e| e.to_string())?;

        // Fill header cache with raw bytes and cid
        header.update_cache()?;

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::VRFProof;

    fn template() -> BlockHeaderBuilder {
        let mut builder = BlockHeader::builder();
        builder
            .miner_address(Address::new_id(101))
            .ticket(Some(Ticket::new(VRFProof::new(b"ticket".to_vec()))))
            .epoch(7);
        builder
    }

    #[test]
    fn symmetric_header_encoding() {
        let header = template().build_and_validate().unwrap();
        let bz = header.marshal_cbor().unwrap();
        let decoded = BlockHeader::unmarshal_cbor(&bz).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.cid(), header.cid());
    }

    #[test]
    fn signing_bytes_exclude_signature() {
        let mut header = template().build_and_validate().unwrap();
        let unsigned = header.to_signing_bytes().unwrap();
        header
            .set_signature(Signature::new_secp256k1(vec![1; 65]))
            .unwrap();
        assert_eq!(header.to_signing_bytes().unwrap(), unsigned);
        assert_ne!(header.raw_data(), unsigned.as_slice());
    }
}
