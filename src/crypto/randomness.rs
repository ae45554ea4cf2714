// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use blake2b_simd::Params;
use fvm_shared::clock::ChainEpoch;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::io::Write;

use crate::utils::encoding::blake2b_256;

/// Specifies a domain for randomness generation.
#[derive(PartialEq, Eq, Copy, Clone, FromPrimitive, Debug, Hash)]
#[repr(i64)]
pub enum DomainSeparationTag {
    TicketProduction = 1,
    ElectionProofProduction = 2,
    WinningPoStChallengeSeed = 3,
    WindowedPoStChallengeSeed = 4,
    SealRandomness = 5,
    InteractiveSealChallengeSeed = 6,
    WindowPoStDeadlineAssignment = 7,
}

impl DomainSeparationTag {
    /// Generate a DST from its encoded byte.
    pub fn from_byte(b: u8) -> Option<Self> {
        FromPrimitive::from_u8(b)
    }
}

/// Computes a 32 byte randomness value from a randomness base (usually a
/// beacon entry), a domain separation tag, the epoch being drawn for, and
/// caller supplied entropy.
pub fn draw_randomness(
    rbase: &[u8],
    pers: DomainSeparationTag,
    round: ChainEpoch,
    entropy: &[u8],
) -> anyhow::Result<[u8; 32]> {
    let mut state = Params::new().hash_length(32).to_state();
    state.write_all(&(pers as i64).to_be_bytes())?;
    let vrf_digest = blake2b_256(rbase);
    state.write_all(&vrf_digest)?;
    state.write_all(&round.to_be_bytes())?;
    state.write_all(entropy)?;

    let mut ret = [0u8; 32];
    ret.clone_from_slice(state.finalize().as_bytes());
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_domain_separated() {
        let a = draw_randomness(
            b"base",
            DomainSeparationTag::WinningPoStChallengeSeed,
            12,
            b"entropy",
        )
        .unwrap();
        let b = draw_randomness(
            b"base",
            DomainSeparationTag::WinningPoStChallengeSeed,
            12,
            b"entropy",
        )
        .unwrap();
        assert_eq!(a, b);

        let other_tag = draw_randomness(
            b"base",
            DomainSeparationTag::TicketProduction,
            12,
            b"entropy",
        )
        .unwrap();
        assert_ne!(a, other_tag);

        let other_round =
            draw_randomness(b"base", DomainSeparationTag::WinningPoStChallengeSeed, 13, b"entropy")
                .unwrap();
        assert_ne!(a, other_round);
    }
}
