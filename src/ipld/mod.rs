// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::{
    multihash::{Code, MultihashDigest},
    Cid,
};
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::{from_slice, to_vec, DAG_CBOR};
use serde::{de::DeserializeOwned, Serialize};

/// Extension methods for inserting and retrieving typed IPLD data with CIDs.
///
/// Everything reachable from a chain head is content-addressed: the same CID
/// always resolves to the same bytes, and `put` is idempotent.
pub trait BlockStore: Blockstore {
    /// Get bytes from block store by CID.
    fn get_bytes(&self, cid: &Cid) -> anyhow::Result<Option<Vec<u8>>> {
        self.get(cid)
    }

    /// Get typed object from block store by CID.
    fn get_obj<T>(&self, cid: &Cid) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.get_bytes(cid)? {
            Some(bz) => Ok(Some(from_slice(&bz)?)),
            None => Ok(None),
        }
    }

    /// Put an object in the block store and return the CID identifier.
    fn put_obj<S>(&self, obj: &S, code: Code) -> anyhow::Result<Cid>
    where
        S: Serialize,
    {
        let bytes = to_vec(obj)?;
        self.put_raw(bytes, code)
    }

    /// Put raw bytes in the block store and return the CID identifier.
    fn put_raw(&self, bytes: Vec<u8>, code: Code) -> anyhow::Result<Cid> {
        let cid = Cid::new_v1(DAG_CBOR, code.digest(&bytes));
        self.put_keyed(&cid, &bytes)?;
        Ok(cid)
    }

    /// Checks if a block exists in the store without loading it.
    fn contains(&self, cid: &Cid) -> anyhow::Result<bool> {
        self.has(cid)
    }
}

impl<T: Blockstore> BlockStore for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDB;

    #[test]
    fn roundtrip_and_idempotent_put() {
        let db = MemoryDB::default();
        let value = ("message".to_string(), 8u64);
        let cid = db.put_obj(&value, Code::Blake2b256).unwrap();
        let cid2 = db.put_obj(&value, Code::Blake2b256).unwrap();
        assert_eq!(cid, cid2);

        let fetched: (String, u64) = db.get_obj(&cid).unwrap().unwrap();
        assert_eq!(fetched, value);
        assert!(db.contains(&cid).unwrap());
    }

    #[test]
    fn miss_returns_none() {
        let db = MemoryDB::default();
        let cid = Cid::new_v1(DAG_CBOR, Code::Blake2b256.digest(b"missing"));
        assert_eq!(db.get_obj::<u64>(&cid).unwrap(), None);
    }
}
