// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Info that corresponds to key does not exist.
    #[error("Key info not found")]
    KeyInfo,
    /// Key already exists in keystore.
    #[error("Key already exists")]
    KeyExists,
    /// Signature verification failed.
    #[error("Signature verification failed: {0}")]
    VerificationFailure(String),
    #[error("{0}")]
    Other(String),
}
