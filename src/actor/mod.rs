// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod account;
pub mod init;
pub mod market;
pub mod miner;
pub mod power;

use cid::{multihash::Multihash, Cid};
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::{IDENTITY_HASH, IPLD_RAW};
use lazy_static::lazy_static;

/// Identifies the builtin actor behind an on-chain actor entry. The
/// identifiers are raw-codec identity cids over well-known manifest
/// strings.
fn make_builtin(bz: &[u8]) -> Cid {
    Cid::new_v1(
        IPLD_RAW,
        Multihash::wrap(IDENTITY_HASH, bz).expect("name too long"),
    )
}

lazy_static! {
    pub static ref SYSTEM_ACTOR_CODE_ID: Cid = make_builtin(b"fil/1/system");
    pub static ref INIT_ACTOR_CODE_ID: Cid = make_builtin(b"fil/1/init");
    pub static ref POWER_ACTOR_CODE_ID: Cid = make_builtin(b"fil/1/storagepower");
    pub static ref MARKET_ACTOR_CODE_ID: Cid = make_builtin(b"fil/1/storagemarket");
    pub static ref MINER_ACTOR_CODE_ID: Cid = make_builtin(b"fil/1/storageminer");
    pub static ref ACCOUNT_ACTOR_CODE_ID: Cid = make_builtin(b"fil/1/account");

    /// Init actor address.
    pub static ref INIT_ACTOR_ADDR: Address = Address::new_id(1);
    /// Storage power actor address.
    pub static ref STORAGE_POWER_ACTOR_ADDR: Address = Address::new_id(4);
    /// Storage market actor address.
    pub static ref STORAGE_MARKET_ACTOR_ADDR: Address = Address::new_id(5);
}

/// State of all actor implementations: the code behaving for the actor, the
/// root of its state, its call sequence counter and its balance.
#[derive(PartialEq, Eq, Clone, Debug, Serialize_tuple, Deserialize_tuple)]
pub struct ActorState {
    /// Link to code for the actor.
    pub code: Cid,
    /// Link to the state of the actor.
    pub state: Cid,
    /// Sequence of the actor.
    pub sequence: u64,
    /// Tokens available to the actor.
    pub balance: TokenAmount,
}

impl ActorState {
    /// Constructor for actor state.
    pub fn new(code: Cid, state: Cid, balance: TokenAmount, sequence: u64) -> Self {
        Self {
            code,
            state,
            sequence,
            balance,
        }
    }
}
