// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
mod keystore;
mod wallet_helpers;

pub use errors::Error;
pub use keystore::{KeyInfo, KeyStore, MemKeyStore};
pub use wallet_helpers::{generate, new_address, sign, to_public, verify};

use fvm_shared::address::Address;
use fvm_shared::crypto::signature::SignatureType;

/// A key, coupling its stored info with the derived public key and address.
#[derive(Clone, PartialEq, Debug, Eq)]
pub struct Key {
    pub key_info: KeyInfo,
    pub public_key: Vec<u8>,
    pub address: Address,
}

impl TryFrom<KeyInfo> for Key {
    type Error = Error;

    fn try_from(key_info: KeyInfo) -> Result<Self, Self::Error> {
        let public_key = to_public(*key_info.key_type(), key_info.private_key())?;
        let address = new_address(*key_info.key_type(), &public_key)?;
        Ok(Key {
            key_info,
            public_key,
            address,
        })
    }
}

/// Returns the key store index of an address.
fn format_key_name(addr: &Address) -> String {
    format!("wallet-{}", addr)
}

/// Return the key that corresponds to a given address in the key store.
pub fn find_key<KS: KeyStore>(addr: &Address, keystore: &KS) -> Result<Key, Error> {
    let key_info = keystore.get(&format_key_name(addr))?;
    Key::try_from(key_info)
}

/// Generates a key of the given signature type and stores it, returning the
/// derived address.
pub fn generate_key<KS: KeyStore>(
    sig_type: SignatureType,
    keystore: &mut KS,
) -> Result<Key, Error> {
    let private_key = generate(sig_type)?;
    let key = Key::try_from(KeyInfo::new(sig_type, private_key))?;
    keystore.put(format_key_name(&key.address), key.key_info.clone())?;
    Ok(key)
}

/// Lists the addresses with keys in the store.
pub fn list_addrs<KS: KeyStore>(keystore: &KS) -> Result<Vec<Address>, Error> {
    let mut addrs = Vec::new();
    for name in keystore.list() {
        if let Some(addr) = name.strip_prefix("wallet-") {
            addrs.push(
                addr.parse()
                    .map_err(|e| Error::Other(format!("malformed wallet key {}: {}", name, e)))?,
            );
        }
    }
    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_is_findable() {
        let mut keystore = MemKeyStore::new();
        let key = generate_key(SignatureType::Secp256k1, &mut keystore).unwrap();

        let found = find_key(&key.address, &keystore).unwrap();
        assert_eq!(found, key);
        assert_eq!(list_addrs(&keystore).unwrap(), vec![key.address]);
    }

    #[test]
    fn sign_verify_roundtrip() {
        let mut keystore = MemKeyStore::new();
        for sig_type in [SignatureType::Secp256k1, SignatureType::BLS] {
            let key = generate_key(sig_type, &mut keystore).unwrap();
            let sig = sign(sig_type, key.key_info.private_key(), b"hello").unwrap();
            verify(&sig, &key.address, b"hello").unwrap();
            assert!(verify(&sig, &key.address, b"other").is_err());
        }
    }
}
