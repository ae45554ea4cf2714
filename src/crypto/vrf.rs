// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::{BytesDe, BytesSer};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::encoding::blake2b_256;

/// The output of running a VRF on some proving input. Ticket comparisons,
/// and therefore the canonical block order within a tipset, are defined on
/// these proof bytes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct VRFProof(pub Vec<u8>);

impl VRFProof {
    /// Creates a `VRFProof` from raw bytes.
    pub fn new(output: Vec<u8>) -> Self {
        Self(output)
    }

    /// Returns reference to underlying proof bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Compute the BLAKE2b-256 digest of the proof bytes.
    pub fn digest(&self) -> [u8; 32] {
        blake2b_256(&self.0)
    }
}

impl Serialize for VRFProof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        BytesSer(&self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VRFProof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let BytesDe(bytes) = Deserialize::deserialize(deserializer)?;
        Ok(Self(bytes))
    }
}
