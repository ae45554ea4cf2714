// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

use crate::blocks::Error as BlkError;

/// Chain store errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Key was not found.
    #[error("Invalid key: {0}")]
    UndefinedKey(String),
    /// Tipset contains invalid data.
    #[error("Invalid tipset: {0}")]
    Blockchain(#[from] BlkError),
    /// Error originating from state.
    #[error("Error originating from state: {0}")]
    State(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

impl From<fvm_ipld_amt::Error> for Error {
    fn from(e: fvm_ipld_amt::Error) -> Self {
        Error::Other(e.to_string())
    }
}

impl From<fvm_ipld_encoding::Error> for Error {
    fn from(e: fvm_ipld_encoding::Error) -> Self {
        Error::Other(e.to_string())
    }
}
