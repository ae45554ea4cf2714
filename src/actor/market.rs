// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_hamt::{BytesKey, Hamt};
use fvm_shared::address::Address;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::deal::DealID;
use fvm_shared::econ::TokenAmount;
use fvm_shared::piece::PaddedPieceSize;
use fvm_shared::HAMT_BIT_WIDTH;
use num_traits::Zero;

use crate::ipld::BlockStore;

/// Epoch value used in deal states for "not yet".
pub const EPOCH_UNDEFINED: ChainEpoch = -1;

/// Storage market actor state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    /// Array of deal proposals, keyed by deal id.
    pub proposals: Cid,
    /// Array of deal states, keyed by deal id.
    pub states: Cid,
    /// Total amount held in escrow, indexed by actor address.
    pub escrow_table: Cid,
    /// Amount locked, indexed by actor address. Note: the amounts in this
    /// table do not affect the overall amount in escrow.
    pub locked_table: Cid,
    /// Deal id state sequential incrementer.
    pub next_id: DealID,
    /// Deal ids by the epoch they expire, for cron processing.
    pub deal_ops_by_epoch: Cid,
    pub last_cron: ChainEpoch,
}

/// A proposed storage deal between a client and a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct DealProposal {
    pub piece_cid: Cid,
    pub piece_size: PaddedPieceSize,
    pub client: Address,
    pub provider: Address,
    pub start_epoch: ChainEpoch,
    pub end_epoch: ChainEpoch,
    pub storage_price_per_epoch: TokenAmount,
    pub provider_collateral: TokenAmount,
    pub client_collateral: TokenAmount,
}

/// On-chain state of a single deal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct DealState {
    pub sector_start_epoch: ChainEpoch,
    pub last_updated_epoch: ChainEpoch,
    pub slash_epoch: ChainEpoch,
}

impl Default for DealState {
    fn default() -> Self {
        Self {
            sector_start_epoch: EPOCH_UNDEFINED,
            last_updated_epoch: EPOCH_UNDEFINED,
            slash_epoch: EPOCH_UNDEFINED,
        }
    }
}

impl State {
    /// Amount held in escrow for the given address, zero when absent.
    pub fn escrow_balance<DB: BlockStore>(
        &self,
        store: &DB,
        addr: &Address,
    ) -> anyhow::Result<TokenAmount> {
        balance_table_get(&self.escrow_table, store, addr)
    }

    /// Amount locked for the given address, zero when absent.
    pub fn locked_balance<DB: BlockStore>(
        &self,
        store: &DB,
        addr: &Address,
    ) -> anyhow::Result<TokenAmount> {
        balance_table_get(&self.locked_table, store, addr)
    }
}

fn balance_table_get<DB: BlockStore>(
    root: &Cid,
    store: &DB,
    addr: &Address,
) -> anyhow::Result<TokenAmount> {
    let table: Hamt<&DB, TokenAmount> = Hamt::load_with_bit_width(root, store, HAMT_BIT_WIDTH)?;
    Ok(table
        .get(&BytesKey(addr.to_bytes()))?
        .cloned()
        .unwrap_or_else(TokenAmount::zero))
}
