// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::address::{Address, Protocol};
use fvm_shared::sector::{RegisteredSealProof, SectorInfo, SectorSize};

use super::Error;
use crate::actor::miner;
use crate::ipld::BlockStore;
use crate::types::ProofVerifier;

/// Selects the sectors of a miner's proving set challenged for a winning
/// PoSt under the given randomness. Returns the challenged subset in
/// challenge order; empty when the miner has no proving set.
pub fn get_sectors_for_winning_post<DB, V>(
    store: &DB,
    address: &Address,
    state: &miner::State,
    rand: &[u8; 32],
) -> Result<Vec<SectorInfo>, Error>
where
    DB: BlockStore,
    V: ProofVerifier,
{
    let seal_proof_type = seal_proof_for_sector_size(state.info.sector_size);
    let win_type = seal_proof_type
        .registered_winning_post_proof()
        .map_err(Error::State)?;

    let mut sector_set = Vec::new();
    state
        .visit_proving_set(store, |id, info| {
            sector_set.push(SectorInfo {
                proof: seal_proof_type,
                sector_number: id,
                sealed_cid: info.info.sealed_cid,
            });
            Ok(())
        })
        .map_err(|err| Error::State(format!("failed to get proving set: {}", err)))?;
    if sector_set.is_empty() {
        return Ok(Vec::new());
    }

    if address.protocol() != Protocol::ID {
        return Err(Error::Other(format!(
            "failed to get ID from miner address {}",
            address
        )));
    }
    let miner_id = address
        .id()
        .map_err(|e| Error::Other(format!("failed to get ID from miner address: {}", e)))?;

    let indices =
        V::generate_winning_post_sector_challenge(win_type, miner_id, rand, sector_set.len() as u64)
            .map_err(|err| Error::State(format!("generate winning post challenge: {}", err)))?;

    indices
        .iter()
        .map(|i| {
            sector_set
                .get(*i as usize)
                .cloned()
                .ok_or_else(|| Error::Other(format!("invalid challenge index {}", i)))
        })
        .collect()
}

fn seal_proof_for_sector_size(sector_size: SectorSize) -> RegisteredSealProof {
    match sector_size {
        SectorSize::_2KiB => RegisteredSealProof::StackedDRG2KiBV1,
        SectorSize::_8MiB => RegisteredSealProof::StackedDRG8MiBV1,
        SectorSize::_512MiB => RegisteredSealProof::StackedDRG512MiBV1,
        SectorSize::_32GiB => RegisteredSealProof::StackedDRG32GiBV1,
        SectorSize::_64GiB => RegisteredSealProof::StackedDRG64GiBV1,
    }
}
