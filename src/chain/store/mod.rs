// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod chain_store;
mod errors;

pub use self::chain_store::*;
pub use self::errors::*;

use cid::Cid;
use fvm_ipld_amt::Amt;
use serde::de::DeserializeOwned;

use crate::blocks::{BlockHeader, MsgMeta};
use crate::ipld::BlockStore;
use crate::message::{SignedMessage, UnsignedMessage};

/// Reads the cids of both message arrays referenced by a `MsgMeta` cid,
/// bls first.
pub fn read_msg_cids<DB>(db: &DB, msg_cid: &Cid) -> Result<(Vec<Cid>, Vec<Cid>), Error>
where
    DB: BlockStore,
{
    let msg_meta: MsgMeta = db
        .get_obj(msg_cid)?
        .ok_or_else(|| Error::UndefinedKey(format!("message meta not found: {}", msg_cid)))?;

    let bls_cids = cids_from_messages(db, &msg_meta.bls_message_root)?;
    let secpk_cids = cids_from_messages(db, &msg_meta.secp_message_root)?;
    Ok((bls_cids, secpk_cids))
}

/// Returns a tuple of UnsignedMessage and SignedMessages from their stored
/// cids, in insertion order.
pub fn block_messages<DB>(
    db: &DB,
    bh: &BlockHeader,
) -> Result<(Vec<UnsignedMessage>, Vec<SignedMessage>), Error>
where
    DB: BlockStore,
{
    let (bls_cids, secpk_cids) = read_msg_cids(db, bh.messages())?;

    let bls_msgs: Vec<UnsignedMessage> = messages_from_cids(db, &bls_cids)?;
    let secp_msgs: Vec<SignedMessage> = messages_from_cids(db, &secpk_cids)?;

    Ok((bls_msgs, secp_msgs))
}

/// Returns messages from key-value store based on a slice of cids.
pub fn messages_from_cids<DB, T>(db: &DB, keys: &[Cid]) -> Result<Vec<T>, Error>
where
    DB: BlockStore,
    T: DeserializeOwned,
{
    keys.iter()
        .map(|k| {
            db.get_obj(k)?
                .ok_or_else(|| Error::UndefinedKey(format!("no message found with cid: {}", k)))
        })
        .collect()
}

fn cids_from_messages<DB: BlockStore>(db: &DB, root: &Cid) -> Result<Vec<Cid>, Error> {
    let amt: Amt<Cid, _> = Amt::load(root, db)?;
    let mut cids = Vec::new();
    amt.for_each(|_, cid| {
        cids.push(*cid);
        Ok(())
    })?;
    Ok(cids)
}
