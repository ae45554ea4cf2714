// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_amt::Amt;
use fvm_ipld_bitfield::BitField;
use fvm_ipld_encoding::serde_bytes;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use fvm_shared::bigint::{bigint_ser, BigInt};
use fvm_shared::clock::ChainEpoch;
use fvm_shared::deal::DealID;
use fvm_shared::econ::TokenAmount;
use fvm_shared::sector::{RegisteredSealProof, SectorNumber, SectorSize};

use crate::ipld::BlockStore;
use crate::types::deadlines::{compute_proving_period_deadline, DeadlineInfo};

/// Storage miner actor state.
#[derive(Clone, Debug, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    /// Static information about the miner.
    pub info: MinerInfo,
    pub precommit_deposit: TokenAmount,
    pub locked_funds: TokenAmount,
    pub vesting_funds: Cid,
    /// Sectors that have been pre-committed but not yet proven, keyed by
    /// sector number.
    pub precommitted_sectors: Cid,
    /// Array of all sector information, keyed by sector number.
    pub sectors: Cid,
    /// The first epoch of this miner's current proving period.
    pub proving_period_start: ChainEpoch,
    /// Sectors added since the last proving period, not yet assigned to a
    /// deadline.
    pub new_sectors: BitField,
    /// The sector numbers due for PoSt at each deadline in the current
    /// proving period.
    pub deadlines: Cid,
    /// All currently known faulty sectors.
    pub fault_set: BitField,
    /// Faulty sector numbers, keyed by the start epoch of the proving
    /// period in which detected.
    pub fault_epochs: Cid,
    /// Faulty sectors that will recover when next included in a valid PoSt.
    pub recoveries: BitField,
    /// Deadlines with PoSt submissions since the proving period started.
    pub post_submissions: BitField,
}

/// Static information about a miner.
#[derive(Clone, Debug, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct MinerInfo {
    /// Account that owns this miner; income and returned collateral are
    /// paid to it.
    pub owner: Address,
    /// Worker account for this miner. The associated pubkey-type address is
    /// used to sign blocks and messages on behalf of this miner.
    pub worker: Address,
    pub pending_worker_key: Option<WorkerKeyChange>,
    /// Libp2p identity that should be used when connecting to this miner.
    #[serde(with = "serde_bytes")]
    pub peer_id: Vec<u8>,
    /// Amount of space in each sector committed to the network by this
    /// miner.
    pub sector_size: SectorSize,
}

#[derive(Clone, Debug, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct WorkerKeyChange {
    pub new_worker: Address,
    pub effective_at: ChainEpoch,
}

/// Information provided when pre-committing a sector.
#[derive(Clone, Debug, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct SectorPreCommitInfo {
    pub registered_proof: RegisteredSealProof,
    pub sector_number: SectorNumber,
    /// CommR of the sector.
    pub sealed_cid: Cid,
    pub seal_rand_epoch: ChainEpoch,
    pub deal_ids: Vec<DealID>,
    /// Sector expiration.
    pub expiration: ChainEpoch,
}

/// Information stored on-chain for a proven sector.
#[derive(Clone, Debug, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct SectorOnChainInfo {
    pub info: SectorPreCommitInfo,
    /// Epoch at which SectorProveCommit is accepted.
    pub activation_epoch: ChainEpoch,
    /// Integral of active deals over sector lifetime.
    #[serde(with = "bigint_ser")]
    pub deal_weight: BigInt,
    /// Fixed pledge collateral requirement determined at activation.
    pub pledge_requirement: TokenAmount,
    pub declared_fault_epoch: ChainEpoch,
    pub declared_fault_duration: ChainEpoch,
}

/// Sector information shaped for API consumers, carrying the sector number
/// alongside the on-chain info.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainSectorInfo {
    pub info: SectorOnChainInfo,
    pub id: SectorNumber,
}

/// The sector numbers due for PoSt at each deadline of a proving period.
#[derive(Clone, Debug, PartialEq, Default, Serialize_tuple, Deserialize_tuple)]
pub struct Deadlines {
    pub due: Vec<BitField>,
}

impl State {
    /// Loads the deadlines record from the store.
    pub fn get_deadlines<DB: BlockStore>(&self, store: &DB) -> anyhow::Result<Deadlines> {
        store
            .get_obj(&self.deadlines)?
            .ok_or_else(|| anyhow::anyhow!("failed to load deadlines: {}", self.deadlines))
    }

    /// Visits every sector in the proving set, that is every committed
    /// sector that is neither faulty nor recovering.
    pub fn visit_proving_set<DB, F>(&self, store: &DB, mut visitor: F) -> anyhow::Result<()>
    where
        DB: BlockStore,
        F: FnMut(SectorNumber, &SectorOnChainInfo) -> anyhow::Result<()>,
    {
        let not_proving = &self.fault_set | &self.recoveries;

        let sectors: Amt<SectorOnChainInfo, _> = Amt::load(&self.sectors, store)?;
        sectors.for_each(|id, info| {
            if !not_proving.get(id) {
                visitor(id, info)?;
            }
            Ok(())
        })
    }

    /// Returns the proving set as an owned list.
    pub fn load_proving_set<DB: BlockStore>(
        &self,
        store: &DB,
    ) -> anyhow::Result<Vec<ChainSectorInfo>> {
        let mut sectors = Vec::new();
        self.visit_proving_set(store, |id, info| {
            sectors.push(ChainSectorInfo {
                info: info.clone(),
                id,
            });
            Ok(())
        })?;
        Ok(sectors)
    }

    /// Deadline calculations for this miner at the given epoch.
    pub fn deadline_info(&self, current_epoch: ChainEpoch) -> DeadlineInfo {
        compute_proving_period_deadline(self.proving_period_start, current_epoch)
    }
}
