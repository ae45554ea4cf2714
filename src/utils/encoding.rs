// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use blake2b_simd::Params;
use cid::{
    multihash::{Code, MultihashDigest},
    Cid,
};
use fvm_ipld_encoding::{from_slice, to_vec, Error as EncodingError, DAG_CBOR};
use serde::{de::DeserializeOwned, Serialize};

/// Generates BLAKE2b hash of fixed 32 bytes size.
pub fn blake2b_256(ingest: &[u8]) -> [u8; 32] {
    let digest = Params::new()
        .hash_length(32)
        .to_state()
        .update(ingest)
        .finalize();

    let mut ret = [0u8; 32];
    ret.clone_from_slice(digest.as_bytes());
    ret
}

/// Returns the content identifier of a canonical CBOR encoded byte slice.
pub fn cid_from_cbor_blake2b256(bz: &[u8]) -> Cid {
    Cid::new_v1(DAG_CBOR, Code::Blake2b256.digest(bz))
}

/// Shorthand for CBOR-marshalling a type and computing its content identifier.
pub trait Cbor: Serialize + DeserializeOwned {
    /// Marshals the object into canonical CBOR bytes.
    fn marshal_cbor(&self) -> Result<Vec<u8>, EncodingError> {
        to_vec(self)
    }

    /// Unmarshals CBOR encoded bytes into the object.
    fn unmarshal_cbor(bz: &[u8]) -> Result<Self, EncodingError> {
        from_slice(bz)
    }

    /// Returns the CID of the CBOR encoding of the object.
    fn cid(&self) -> Result<Cid, EncodingError> {
        Ok(cid_from_cbor_blake2b256(&self.marshal_cbor()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_vector() {
        let ingest = [];
        let hash = blake2b_256(&ingest);
        assert_eq!(
            hex::encode(hash),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn cid_is_stable() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Pair(u64, u64);
        impl Cbor for Pair {}

        let a = Pair(1, 2).cid().unwrap();
        let b = Pair(1, 2).cid().unwrap();
        let c = Pair(2, 1).cid().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
