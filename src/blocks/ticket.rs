// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::tuple::*;

use crate::crypto::VRFProof;

/// A Ticket is a marker of a tick of the blockchain's clock. It is the
/// source of randomness for proofs of storage and leader election, and its
/// byte comparison defines the canonical order of sibling blocks in a
/// tipset.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize_tuple, Deserialize_tuple,
)]
pub struct Ticket {
    /// A proof output by running a VRF on the VDFResult of the parent ticket
    pub vrfproof: VRFProof,
}

impl Ticket {
    /// Ticket constructor
    pub fn new(vrfproof: VRFProof) -> Self {
        Self { vrfproof }
    }
}
