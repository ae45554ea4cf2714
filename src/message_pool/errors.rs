// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// MessagePool error.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// A message with the same sequence and a different payload is already
    /// pending for the sender.
    #[error("Message with same sequence already in mpool")]
    DuplicateSequence,
    /// The message's signature does not verify against its sender.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    /// No state for the sending actor.
    #[error("Sender actor not found: {0}")]
    SenderNotFound(String),
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}
