// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use filecoin_proofs_api::{post, ProverId};
use fvm_shared::sector::RegisteredPoStProof;
use fvm_shared::ActorID;

/// Proof-library seam used by the winning PoSt sector selection. The
/// challenge generation is a pure function, but its output is defined by
/// the proofs library, so it stays behind this trait and tests substitute
/// [`MockVerifier`].
pub trait ProofVerifier {
    /// Generates the indices of the sectors challenged for a winning PoSt,
    /// out of `eligible_sector_count` eligible sectors.
    fn generate_winning_post_sector_challenge(
        proof: RegisteredPoStProof,
        prover_id: ActorID,
        randomness: &[u8; 32],
        eligible_sector_count: u64,
    ) -> anyhow::Result<Vec<u64>>;
}

/// Proofs generated with the filecoin proofs library.
pub enum FullVerifier {}

impl ProofVerifier for FullVerifier {
    fn generate_winning_post_sector_challenge(
        proof: RegisteredPoStProof,
        prover_id: ActorID,
        randomness: &[u8; 32],
        eligible_sector_count: u64,
    ) -> anyhow::Result<Vec<u64>> {
        // The last byte is masked to keep the randomness a valid field
        // element for the proof system.
        let mut randomness = *randomness;
        randomness[31] &= 0x3f;

        post::generate_winning_post_sector_challenge(
            winning_post_proof_type(proof)?,
            &randomness,
            eligible_sector_count,
            prover_id_from_u64(prover_id),
        )
        .map_err(|e| anyhow::anyhow!("generate winning post challenge: {}", e))
    }
}

/// Mock verifier. Deterministically challenges the first eligible sector,
/// used in tests.
pub enum MockVerifier {}

impl ProofVerifier for MockVerifier {
    fn generate_winning_post_sector_challenge(
        _: RegisteredPoStProof,
        _: ActorID,
        _: &[u8; 32],
        _: u64,
    ) -> anyhow::Result<Vec<u64>> {
        Ok(vec![0])
    }
}

/// Generates a fixed-width prover id from a miner's actor id.
fn prover_id_from_u64(id: ActorID) -> ProverId {
    let mut prover_id = ProverId::default();
    let prover_bytes = fvm_shared::address::Address::new_id(id).payload_bytes();
    prover_id[..prover_bytes.len()].copy_from_slice(&prover_bytes);
    prover_id
}

fn winning_post_proof_type(
    proof: RegisteredPoStProof,
) -> anyhow::Result<filecoin_proofs_api::RegisteredPoStProof> {
    use filecoin_proofs_api::RegisteredPoStProof as ApiProof;
    match proof {
        RegisteredPoStProof::StackedDRGWinning2KiBV1 => Ok(ApiProof::StackedDrgWinning2KiBV1),
        RegisteredPoStProof::StackedDRGWinning8MiBV1 => Ok(ApiProof::StackedDrgWinning8MiBV1),
        RegisteredPoStProof::StackedDRGWinning512MiBV1 => Ok(ApiProof::StackedDrgWinning512MiBV1),
        RegisteredPoStProof::StackedDRGWinning32GiBV1 => Ok(ApiProof::StackedDrgWinning32GiBV1),
        RegisteredPoStProof::StackedDRGWinning64GiBV1 => Ok(ApiProof::StackedDrgWinning64GiBV1),
        other => Err(anyhow::anyhow!(
            "unsupported winning post proof type: {:?}",
            other
        )),
    }
}
