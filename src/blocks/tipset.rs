// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_amt::Amt;
use fvm_shared::bigint::BigInt;
use fvm_shared::clock::ChainEpoch;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

use super::{BlockHeader, Error, MsgMeta, Ticket};
use crate::ipld::BlockStore;
use crate::utils::encoding::{blake2b_256, Cbor};

/// Deterministic hash of a tipset key, used to address interpretation
/// results and compare keys cheaply.
pub type TipsetHash = [u8; 32];

/// A set of CIDs forming a unique key for a Tipset. The CIDs are kept in the
/// canonical iteration order of the blocks in the tipset, which is by
/// ticket.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Ord, PartialOrd)]
pub struct TipsetKeys {
    pub cids: Vec<Cid>,
}

impl TipsetKeys {
    pub fn new(cids: Vec<Cid>) -> Self {
        Self { cids }
    }

    /// Checks whether the set contains exactly the same CIDs as another.
    pub fn equals(&self, key: &TipsetKeys) -> bool {
        if self.cids.len() != key.cids.len() {
            return false;
        }
        for i in 0..key.cids.len() {
            if self.cids[i] != key.cids[i] {
                return false;
            }
        }
        true
    }

    /// Returns tipset header cids.
    pub fn cids(&self) -> &[Cid] {
        &self.cids
    }

    /// Returns true if the key holds no cids, which callers treat as a
    /// request for the current heaviest tipset.
    pub fn is_empty(&self) -> bool {
        self.cids.is_empty()
    }

    /// Deterministic hash of the ordered cid list.
    pub fn hash(&self) -> TipsetHash {
        let mut bytes = Vec::new();
        for cid in &self.cids {
            bytes.extend(cid.to_bytes());
        }
        blake2b_256(&bytes)
    }
}

impl Serialize for TipsetKeys {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.cids.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TipsetKeys {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let cids: Vec<Cid> = Deserialize::deserialize(deserializer)?;
        Ok(TipsetKeys { cids })
    }
}

impl Cbor for TipsetKeys {}

/// An immutable set of blocks at the same height with the same parent set.
/// Blocks in a tipset are canonically ordered by ticket size.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Tipset {
    blks: Vec<BlockHeader>,
    key: TipsetKeys,
}

/// Incrementally accumulates headers into a tipset, keeping the blocks
/// sorted strictly ascending by ticket. All invariants of a well-formed
/// tipset are enforced here; `Tipset` values exist only through the creator
/// or by decoding previously validated data.
#[derive(Default)]
pub struct TipsetCreator {
    blks: Vec<BlockHeader>,
    cids: Vec<Cid>,
}

impl TipsetCreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether a header can join the tipset under construction. An
    /// empty creator accepts any header, which permits the ticketless
    /// genesis block to form a single-block tipset.
    pub fn can_expand(&self, header: &BlockHeader) -> Result<(), Error> {
        if self.blks.is_empty() {
            return Ok(());
        }

        if header.ticket().is_none() {
            return Err(Error::TicketHasNoValue);
        }

        let first_block = &self.blks[0];

        if header.epoch() != first_block.epoch() {
            return Err(Error::MismatchingHeights);
        }

        if !header.parents().equals(first_block.parents()) {
            return Err(Error::MismatchingParents);
        }

        Ok(())
    }

    /// Inserts the header at its ticket-ordered position. `can_expand` must
    /// have accepted the header first.
    pub fn expand(&mut self, header: BlockHeader) -> Result<(), Error> {
        let cid = *header.cid();
        self.expand_with_cid(cid, header)
    }

    /// As `expand`, with the header cid already known.
    pub fn expand_with_cid(&mut self, cid: Cid, header: BlockHeader) -> Result<(), Error> {
        debug_assert!(self.can_expand(&header).is_ok());

        if self.blks.is_empty() {
            self.blks.push(header);
            self.cids.push(cid);
            return Ok(());
        }

        let ticket = header.ticket().clone().ok_or(Error::TicketHasNoValue)?;

        let mut idx = self.blks.len();
        for (i, blk) in self.blks.iter().enumerate() {
            let other = blk.ticket().as_ref().ok_or(Error::TicketHasNoValue)?;
            match compare_tickets(&ticket, other) {
                std::cmp::Ordering::Equal => return Err(Error::TicketsCollision),
                std::cmp::Ordering::Less => {
                    idx = i;
                    break;
                }
                std::cmp::Ordering::Greater => continue,
            }
        }

        self.blks.insert(idx, header);
        self.cids.insert(idx, cid);
        Ok(())
    }

    /// Finalises the accumulated blocks into a tipset. With `clear` the
    /// creator is emptied; otherwise its state is preserved for reuse.
    pub fn tipset(&mut self, clear: bool) -> Tipset {
        if clear {
            Tipset {
                key: TipsetKeys::new(std::mem::take(&mut self.cids)),
                blks: std::mem::take(&mut self.blks),
            }
        } else {
            Tipset {
                key: TipsetKeys::new(self.cids.clone()),
                blks: self.blks.clone(),
            }
        }
    }

    /// Height of the tipset under construction, zero while empty.
    pub fn height(&self) -> ChainEpoch {
        self.blks.first().map(|b| b.epoch()).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.blks.clear();
        self.cids.clear();
    }
}

/// Tickets order blocks within a tipset by byte comparison of their proofs.
fn compare_tickets(a: &Ticket, b: &Ticket) -> std::cmp::Ordering {
    a.vrfproof.as_bytes().cmp(b.vrfproof.as_bytes())
}

#[allow(clippy::len_without_is_empty)]
impl Tipset {
    /// Builds a new tipset from a collection of blocks. The blocks may be in
    /// any order; the result is sorted by ticket.
    pub fn new(headers: Vec<BlockHeader>) -> Result<Self, Error> {
        if headers.is_empty() {
            return Err(Error::NoBlocks);
        }

        let mut creator = TipsetCreator::new();
        for header in headers {
            creator.can_expand(&header)?;
            creator.expand(header)?;
        }

        Ok(creator.tipset(true))
    }

    /// As `new`, additionally requiring the canonical key to hash to
    /// `expected`. A mismatch means the caller's block order disagrees with
    /// ticket order.
    pub fn new_with_hash(expected: &TipsetHash, headers: Vec<BlockHeader>) -> Result<Self, Error> {
        let tipset = Tipset::new(headers)?;
        if &tipset.key.hash() != expected {
            return Err(Error::BlockOrderFailure);
        }
        Ok(tipset)
    }

    /// Fetches every cid as a block header and builds the tipset. Succeeds
    /// with the same key only if `cids` is already in ticket order.
    pub fn load<DB: BlockStore>(store: &DB, cids: &[Cid]) -> Result<Self, Error> {
        let mut headers = Vec::with_capacity(cids.len());
        for cid in cids {
            let header: BlockHeader = store
                .get_obj(cid)
                .map_err(|e| Error::Other(e.to_string()))?
                .ok_or_else(|| Error::Other(format!("Key for header does not exist: {}", cid)))?;
            headers.push(header);
        }
        let tipset = Tipset::new(headers)?;
        if tipset.key.cids() != cids {
            return Err(Error::BlockOrderFailure);
        }
        Ok(tipset)
    }

    /// Loads the parent tipset of this one from the store.
    pub fn load_parent<DB: BlockStore>(&self, store: &DB) -> Result<Self, Error> {
        Tipset::load(store, self.parents().cids())
    }

    /// Returns epoch of the tipset.
    pub fn epoch(&self) -> ChainEpoch {
        self.blks.first().map(|b| b.epoch()).unwrap_or_default()
    }
    /// Returns all blocks in tipset.
    pub fn blocks(&self) -> &[BlockHeader] {
        &self.blks
    }
    /// Consumes tipset to convert into a vector of blocks.
    pub fn into_blocks(self) -> Vec<BlockHeader> {
        self.blks
    }
    /// Returns the block with the smallest ticket, the canonical
    /// representative for fields shared by all siblings.
    pub fn min_ticket_block(&self) -> &BlockHeader {
        &self.blks[0]
    }
    /// Returns the smallest timestamp of all blocks in the tipset.
    pub fn min_timestamp(&self) -> u64 {
        self.blks
            .iter()
            .map(|block| block.timestamp())
            .min()
            .unwrap_or_default()
    }
    /// Returns the number of blocks in the tipset.
    pub fn len(&self) -> usize {
        self.blks.len()
    }
    /// Returns a key for the tipset.
    pub fn key(&self) -> &TipsetKeys {
        &self.key
    }
    /// Returns slice of cids for the current tipset.
    pub fn cids(&self) -> &[Cid] {
        self.key.cids()
    }
    /// Returns the keys of the parents of the blocks in the tipset.
    pub fn parents(&self) -> &TipsetKeys {
        self.min_ticket_block().parents()
    }
    /// Returns the state root as seen by this tipset, i.e. the state after
    /// its parent tipset executed.
    pub fn parent_state(&self) -> &Cid {
        self.min_ticket_block().state_root()
    }
    /// Returns the receipts root produced by the parent tipset.
    pub fn parent_receipts(&self) -> &Cid {
        self.min_ticket_block().message_receipts()
    }
    /// Returns the tipset's calculated weight.
    pub fn weight(&self) -> &BigInt {
        self.min_ticket_block().weight()
    }
    /// Whether the tipset contains a block with the given cid.
    pub fn contains(&self, cid: &Cid) -> bool {
        self.key.cids().contains(cid)
    }

    /// Visits the message cids referenced by every block of the tipset in
    /// order, bls messages before secp messages per block, skipping cids
    /// already seen. The visitor receives the running index, whether the
    /// message is a bls one, and its cid.
    pub fn visit_messages<DB, F>(&self, store: &DB, mut visitor: F) -> anyhow::Result<()>
    where
        DB: BlockStore,
        F: FnMut(usize, bool, &Cid) -> anyhow::Result<()>,
    {
        let mut visited: HashSet<Cid> = HashSet::new();
        for block in &self.blks {
            let meta: MsgMeta = store
                .get_obj(block.messages())?
                .ok_or_else(|| anyhow::anyhow!("message meta not found: {}", block.messages()))?;
            let bls_cids: Amt<Cid, _> = Amt::load(&meta.bls_message_root, store)?;
            bls_cids.for_each(|_, cid| {
                if visited.insert(*cid) {
                    visitor(visited.len() - 1, true, cid)?;
                }
                Ok(())
            })?;
            let secp_cids: Amt<Cid, _> = Amt::load(&meta.secp_message_root, store)?;
            secp_cids.for_each(|_, cid| {
                if visited.insert(*cid) {
                    visitor(visited.len() - 1, false, cid)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// A tipset is serialized in process as the triple of its key, its blocks
/// and its height; the decoder rebuilds through the creator and rejects
/// inconsistent data.
impl Serialize for Tipset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.key.cids(), &self.blks, self.epoch()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tipset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (cids, blks, height): (Vec<Cid>, Vec<BlockHeader>, ChainEpoch) =
            Deserialize::deserialize(deserializer)?;

        if blks.is_empty() {
            if height != 0 {
                return Err(de::Error::custom(Error::MismatchingHeights));
            }
            // empty tipsets round-trip as a height zero sentinel
            return Ok(Tipset::default());
        }

        let tipset = Tipset::new(blks).map_err(de::Error::custom)?;
        if tipset.key.cids() != cids.as_slice() {
            return Err(de::Error::custom(Error::BlockOrderFailure));
        }
        Ok(tipset)
    }
}

impl Cbor for Tipset {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::VRFProof;
    use fvm_ipld_encoding::{from_slice, to_vec};
    use fvm_shared::address::Address;

    fn header(ticket: &[u8], epoch: ChainEpoch, parents: &TipsetKeys) -> BlockHeader {
        BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .ticket(Some(Ticket::new(VRFProof::new(ticket.to_vec()))))
            .epoch(epoch)
            .parents(parents.clone())
            .build_and_validate()
            .unwrap()
    }

    fn parent_key() -> TipsetKeys {
        let genesis = BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .build_and_validate()
            .unwrap();
        TipsetKeys::new(vec![*genesis.cid()])
    }

    #[test]
    fn blocks_sorted_by_ticket() {
        let parents = parent_key();
        let b1 = header(&[1u8; 32], 10, &parents);
        let b2 = header(&[2u8; 32], 10, &parents);

        // insertion order does not matter
        let ts = Tipset::new(vec![b2.clone(), b1.clone()]).unwrap();
        assert_eq!(ts.blocks(), &[b1.clone(), b2.clone()]);
        assert_eq!(ts.key().cids(), &[*b1.cid(), *b2.cid()]);
        assert_eq!(ts.min_ticket_block(), &b1);
    }

    #[test]
    fn duplicate_tickets_rejected() {
        let parents = parent_key();
        let b1 = header(&[7u8; 32], 10, &parents);
        let mut b2 = header(&[7u8; 32], 10, &parents);
        // distinct headers, identical tickets
        b2 = BlockHeader::builder()
            .miner_address(Address::new_id(1))
            .ticket(b2.ticket().clone())
            .epoch(10)
            .parents(parents)
            .build_and_validate()
            .unwrap();

        assert_eq!(Tipset::new(vec![b1, b2]), Err(Error::TicketsCollision));
    }

    #[test]
    fn mismatching_heights_rejected() {
        let parents = parent_key();
        let b1 = header(&[1u8; 32], 10, &parents);
        let b2 = header(&[2u8; 32], 11, &parents);
        assert_eq!(Tipset::new(vec![b1, b2]), Err(Error::MismatchingHeights));
    }

    #[test]
    fn mismatching_parents_rejected() {
        let b1 = header(&[1u8; 32], 10, &parent_key());
        let b2 = header(&[2u8; 32], 10, &TipsetKeys::default());
        assert_eq!(Tipset::new(vec![b1, b2]), Err(Error::MismatchingParents));
    }

    #[test]
    fn empty_tipset_rejected() {
        assert_eq!(Tipset::new(vec![]), Err(Error::NoBlocks));
    }

    #[test]
    fn genesis_block_may_have_no_ticket() {
        let genesis = BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .build_and_validate()
            .unwrap();
        let ts = Tipset::new(vec![genesis]).unwrap();
        assert_eq!(ts.len(), 1);
        assert_eq!(ts.epoch(), 0);
    }

    #[test]
    fn key_hash_pins_block_order() {
        let parents = parent_key();
        let b1 = header(&[1u8; 32], 10, &parents);
        let b2 = header(&[2u8; 32], 10, &parents);

        let expected = TipsetKeys::new(vec![*b1.cid(), *b2.cid()]).hash();
        let ts = Tipset::new_with_hash(&expected, vec![b1.clone(), b2.clone()]).unwrap();
        assert_eq!(ts.key().hash(), expected);

        let wrong = TipsetKeys::new(vec![*b2.cid(), *b1.cid()]).hash();
        assert_eq!(
            Tipset::new_with_hash(&wrong, vec![b1, b2]),
            Err(Error::BlockOrderFailure)
        );
    }

    #[test]
    fn min_timestamp_spans_all_blocks() {
        let parents = parent_key();
        let mut b1 = BlockHeader::builder();
        b1.miner_address(Address::new_id(0))
            .ticket(Some(Ticket::new(VRFProof::new(vec![1]))))
            .epoch(10)
            .parents(parents.clone())
            .timestamp(50);
        let mut b2 = BlockHeader::builder();
        b2.miner_address(Address::new_id(1))
            .ticket(Some(Ticket::new(VRFProof::new(vec![2]))))
            .epoch(10)
            .parents(parents)
            .timestamp(40);

        let ts = Tipset::new(vec![
            b1.build_and_validate().unwrap(),
            b2.build_and_validate().unwrap(),
        ])
        .unwrap();
        assert_eq!(ts.min_timestamp(), 40);
    }

    #[test]
    fn serialization_roundtrip() {
        let parents = parent_key();
        let b1 = header(&[1u8; 32], 10, &parents);
        let b2 = header(&[2u8; 32], 10, &parents);
        let ts = Tipset::new(vec![b1, b2]).unwrap();

        let bz = to_vec(&ts).unwrap();
        let decoded: Tipset = from_slice(&bz).unwrap();
        assert_eq!(decoded, ts);
    }

    #[test]
    fn decode_rejects_wrong_block_order() {
        let parents = parent_key();
        let b1 = header(&[1u8; 32], 10, &parents);
        let b2 = header(&[2u8; 32], 10, &parents);

        // hand-encode the tuple with the blocks swapped
        let bz = to_vec(&(
            vec![*b2.cid(), *b1.cid()],
            vec![b2.clone(), b1.clone()],
            10 as ChainEpoch,
        ))
        .unwrap();
        let decoded: Result<Tipset, _> = from_slice(&bz);
        assert!(decoded
            .unwrap_err()
            .to_string()
            .contains("Wrong order of blocks"));
    }

    #[test]
    fn decode_rejects_empty_blocks_with_height() {
        let bz = to_vec(&(Vec::<Cid>::new(), Vec::<BlockHeader>::new(), 5 as ChainEpoch)).unwrap();
        let decoded: Result<Tipset, _> = from_slice(&bz);
        assert!(decoded
            .unwrap_err()
            .to_string()
            .contains("mismatching blocks heights"));
    }

    #[test]
    fn load_requires_ticket_order() {
        use crate::db::MemoryDB;
        use crate::ipld::BlockStore;
        use cid::multihash::Code;

        let db = MemoryDB::default();
        let parents = parent_key();
        let b1 = header(&[1u8; 32], 10, &parents);
        let b2 = header(&[2u8; 32], 10, &parents);
        for b in [&b1, &b2] {
            db.put_raw(b.raw_data().to_vec(), Code::Blake2b256).unwrap();
        }

        let ts = Tipset::load(&db, &[*b1.cid(), *b2.cid()]).unwrap();
        assert_eq!(ts.blocks(), &[b1.clone(), b2.clone()]);

        assert_eq!(
            Tipset::load(&db, &[*b2.cid(), *b1.cid()]),
            Err(Error::BlockOrderFailure)
        );
    }
}
