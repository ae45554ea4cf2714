// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

//! Filecoin-compatible node API and chain-state access core.
//!
//! The crate is organised around a tipset-centric state access layer: the
//! [`state_manager::StateManager`] resolves a tipset key to a
//! [`state_manager::TipsetContext`] (a state tree view rooted either at the
//! tipset's parent state or at the interpreter's post-execution state), and
//! the RPC facade in [`rpc`] reads actor state through it.

pub mod actor;
pub mod beacon;
pub mod blocks;
pub mod chain;
pub mod crypto;
pub mod db;
pub mod interpreter;
pub mod ipld;
pub mod json;
pub mod key_management;
pub mod market;
pub mod message;
pub mod message_pool;
pub mod rpc;
pub mod state_manager;
pub mod state_tree;
pub mod types;
pub mod utils;
