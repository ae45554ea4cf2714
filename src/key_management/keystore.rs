// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::crypto::signature::SignatureType;
use std::collections::HashMap;

use super::errors::Error;

/// KeyInfo contains the type of a key and its private bytes. Private keys
/// for BLS and SECP256K1 are not of the same type, so the bytes stay
/// untyped here.
#[derive(Clone, PartialEq, Debug, Eq)]
pub struct KeyInfo {
    key_type: SignatureType,
    private_key: Vec<u8>,
}

impl KeyInfo {
    /// Return a new KeyInfo given the key_type and private_key.
    pub fn new(key_type: SignatureType, private_key: Vec<u8>) -> Self {
        KeyInfo {
            key_type,
            private_key,
        }
    }

    /// Return a reference to the key's signature type.
    pub fn key_type(&self) -> &SignatureType {
        &self.key_type
    }

    /// Return a reference to the private key bytes.
    pub fn private_key(&self) -> &Vec<u8> {
        &self.private_key
    }
}

/// The signing oracle of the node: resolves key names to key info. Key
/// material lives only for the lifetime of the store; persistence is out of
/// scope.
pub trait KeyStore: Send + Sync {
    /// Return all of the keys that are stored in the KeyStore.
    fn list(&self) -> Vec<String>;
    /// Return KeyInfo that corresponds to a given key.
    fn get(&self, k: &str) -> Result<KeyInfo, Error>;
    /// Save a key/KeyInfo pair to the KeyStore.
    fn put(&mut self, key: String, key_info: KeyInfo) -> Result<(), Error>;
    /// Remove the key and corresponding KeyInfo from the KeyStore.
    fn remove(&mut self, key: &str) -> Option<KeyInfo>;
}

/// KeyStore holding keys in memory.
#[derive(Clone, PartialEq, Debug, Eq, Default)]
pub struct MemKeyStore {
    pub key_info: HashMap<String, KeyInfo>,
}

impl MemKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemKeyStore {
    fn list(&self) -> Vec<String> {
        self.key_info.keys().cloned().collect()
    }

    fn get(&self, k: &str) -> Result<KeyInfo, Error> {
        self.key_info.get(k).cloned().ok_or(Error::KeyInfo)
    }

    fn put(&mut self, key: String, key_info: KeyInfo) -> Result<(), Error> {
        if self.key_info.contains_key(&key) {
            return Err(Error::KeyExists);
        }
        self.key_info.insert(key, key_info);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Option<KeyInfo> {
        self.key_info.remove(key)
    }
}
