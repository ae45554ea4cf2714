// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::tuple::*;

use crate::crypto::VRFProof;

/// Proof of a winning election for block production.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize_tuple, Deserialize_tuple)]
pub struct ElectionProof {
    /// Number of reward units won in this round.
    pub win_count: i64,
    /// A proof output by running a VRF on the election randomness.
    pub vrfproof: VRFProof,
}
