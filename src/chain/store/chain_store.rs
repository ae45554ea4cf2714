// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_blockstore::Blockstore;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast::{self, Receiver as Subscriber, Sender as Publisher};

use super::Error;
use crate::beacon::BeaconEntry;
use crate::blocks::{BlockHeader, Tipset, TipsetKeys};
use crate::ipld::BlockStore;

/// Capacity of the head-change broadcast channel; slow subscribers that lag
/// behind this many events are disconnected.
const SINK_CAP: usize = 200;

/// Tipsets to walk back when looking for the newest beacon entry before
/// giving up.
const LATEST_BEACON_LOOKBACK: usize = 20;

/// Current state of the heaviest chain, published on every change.
#[derive(Clone, Debug)]
pub enum HeadChange {
    Current(Arc<Tipset>),
    Apply(Arc<Tipset>),
    Revert(Arc<Tipset>),
}

/// Tracks the heaviest known chain. Stores and loads blockchain data over
/// the content-addressed store, keeps the heaviest tipset pointer, and
/// publishes a [`HeadChange`] for every head movement. Reads and writes
/// are atomic with respect to one another; handlers may call in from any
/// thread.
pub struct ChainStore<DB> {
    /// Publisher for head change events.
    publisher: Publisher<HeadChange>,

    /// Key-value datastore.
    db: Arc<DB>,

    /// The genesis block header.
    genesis: RwLock<Option<BlockHeader>>,

    /// Tipset at the head of the best-known chain.
    heaviest: RwLock<Option<Arc<Tipset>>>,
}

impl<DB> ChainStore<DB>
where
    DB: BlockStore,
{
    pub fn new(db: Arc<DB>) -> Self {
        let (publisher, _) = broadcast::channel(SINK_CAP);
        Self {
            publisher,
            db,
            genesis: RwLock::new(None),
            heaviest: RwLock::new(None),
        }
    }

    /// Returns reference to the underlying blockstore.
    pub fn blockstore(&self) -> &DB {
        &self.db
    }

    /// Returns a cloned handle of the underlying blockstore.
    pub fn blockstore_cloned(&self) -> Arc<DB> {
        self.db.clone()
    }

    /// Writes genesis to the store and sets it as the initial head.
    pub fn set_genesis(&self, header: BlockHeader) -> Result<(), Error> {
        *self.genesis.write() = Some(header.clone());
        let ts = Arc::new(Tipset::new(vec![header])?);
        self.persist_headers(&ts)?;
        self.set_heaviest_tipset(ts)
    }

    /// Returns the genesis block header, if one was set.
    pub fn genesis(&self) -> Option<BlockHeader> {
        self.genesis.read().clone()
    }

    /// Returns the heaviest tipset.
    pub fn heaviest_tipset(&self) -> Option<Arc<Tipset>> {
        self.heaviest.read().clone()
    }

    /// Sets the heaviest tipset and notifies subscribers.
    pub fn set_heaviest_tipset(&self, ts: Arc<Tipset>) -> Result<(), Error> {
        *self.heaviest.write() = Some(ts.clone());
        // Subscribers coming and going is expected, send failures only mean
        // nobody is listening right now.
        let _ = self.publisher.send(HeadChange::Apply(ts));
        Ok(())
    }

    /// Subscribes to head change events. The returned subscriber lives on
    /// the chain store's scheduling domain; see `rpc` for the hand-off to
    /// consumer channels.
    pub fn subscribe_head_changes(&self) -> Subscriber<HeadChange> {
        self.publisher.subscribe()
    }

    /// Writes encoded blockheader data to the store.
    pub fn persist_headers(&self, tipset: &Tipset) -> Result<(), Error> {
        for header in tipset.blocks() {
            if !self.db.contains(header.cid())? {
                self.db.put_keyed(header.cid(), header.raw_data())?;
            }
        }
        Ok(())
    }

    /// Loads a tipset by its key. An empty key loads the heaviest tipset.
    pub fn tipset_from_keys(&self, keys: &TipsetKeys) -> Result<Arc<Tipset>, Error> {
        if keys.is_empty() {
            return self
                .heaviest_tipset()
                .ok_or_else(|| Error::Other("Heaviest tipset not initialized".to_string()));
        }
        Ok(Arc::new(Tipset::load(self.blockstore(), keys.cids())?))
    }

    /// Accepts a block received through block submission: persists it and,
    /// when it extends or expands the current head, moves the head. Full
    /// fork choice belongs to the sync process.
    pub fn add_block(&self, header: BlockHeader) -> Result<(), Error> {
        if !self.db.contains(header.cid())? {
            self.db.put_keyed(header.cid(), header.raw_data())?;
        }

        let heaviest = self.heaviest_tipset();
        let new_head = match heaviest {
            None => Tipset::new(vec![header])?,
            Some(head) => {
                if header.parents().equals(head.key()) {
                    // child of the current head
                    Tipset::new(vec![header])?
                } else if header.epoch() == head.epoch()
                    && header.parents().equals(head.parents())
                    && !head.contains(header.cid())
                {
                    // sibling of the current head, expand the tipset
                    let mut headers = head.blocks().to_vec();
                    headers.push(header);
                    Tipset::new(headers)?
                } else {
                    return Ok(());
                }
            }
        };
        self.set_heaviest_tipset(Arc::new(new_head))
    }

    /// Returns the newest beacon entry at or before the given tipset,
    /// walking back through parents. The chain start acts as the zero
    /// entry.
    pub fn latest_beacon_entry(&self, ts: &Tipset) -> Result<BeaconEntry, Error> {
        let mut cur = ts.clone();
        for _ in 0..LATEST_BEACON_LOOKBACK {
            if let Some(entry) = cur.min_ticket_block().beacon_entries().last() {
                return Ok(entry.clone());
            }
            if cur.epoch() == 0 {
                return Ok(BeaconEntry::default());
            }
            cur = cur.load_parent(self.blockstore())?;
        }
        Err(Error::Other(format!(
            "found no beacon entries in the {} latest tipsets",
            LATEST_BEACON_LOOKBACK
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDB;
    use crate::utils::encoding::Cbor;
    use fvm_shared::address::Address;

    fn genesis_header() -> BlockHeader {
        BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .build_and_validate()
            .unwrap()
    }

    #[test]
    fn genesis_sets_head() {
        let db = Arc::new(MemoryDB::default());
        let cs = ChainStore::new(db);
        let genesis = genesis_header();
        cs.set_genesis(genesis.clone()).unwrap();

        assert_eq!(cs.genesis(), Some(genesis.clone()));
        let head = cs.heaviest_tipset().unwrap();
        assert_eq!(head.cids(), &[*genesis.cid()]);

        // headers are persisted and re-loadable by key
        let loaded = cs.tipset_from_keys(head.key()).unwrap();
        assert_eq!(&*loaded, &*head);
    }

    #[test]
    fn empty_key_resolves_to_heaviest() {
        let db = Arc::new(MemoryDB::default());
        let cs = ChainStore::new(db);
        cs.set_genesis(genesis_header()).unwrap();

        let head = cs.heaviest_tipset().unwrap();
        let resolved = cs.tipset_from_keys(&TipsetKeys::default()).unwrap();
        assert_eq!(&*resolved, &*head);
    }

    #[async_std::test]
    async fn head_changes_are_published() {
        let db = Arc::new(MemoryDB::default());
        let cs = ChainStore::new(db);
        let mut sub = cs.subscribe_head_changes();

        cs.set_genesis(genesis_header()).unwrap();
        match sub.recv().await.unwrap() {
            HeadChange::Apply(ts) => assert_eq!(ts.epoch(), 0),
            other => panic!("unexpected head change: {:?}", other),
        }
    }

    #[test]
    fn block_header_cid_roundtrip() {
        let db = Arc::new(MemoryDB::default());
        let cs = ChainStore::new(db.clone());
        let genesis = genesis_header();
        cs.set_genesis(genesis.clone()).unwrap();

        // the block fetched by cid hashes back to the same cid
        let raw = crate::ipld::BlockStore::get_bytes(&*db, genesis.cid())
            .unwrap()
            .unwrap();
        let decoded = BlockHeader::unmarshal_cbor(&raw).unwrap();
        assert_eq!(decoded.cid(), genesis.cid());
    }
}
