// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

use crate::blocks::Error as BlkError;
use crate::chain::Error as ChainError;

/// State manager error.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tipset.
    #[error("Invalid tipset: {0}")]
    Tipset(#[from] BlkError),
    /// Error originating from the chain store.
    #[error("{0}")]
    Chain(#[from] ChainError),
    /// Actor for given address not found in the state tree.
    #[error("Actor not found: {0}")]
    ActorNotFound(String),
    /// Actor state not found at the actor's head.
    #[error("Actor state not found: {0}")]
    ActorStateNotFound(String),
    /// An actor of an unexpected type sits behind the queried address.
    #[error("Address {0} was not for an account actor")]
    NotAccountActor(String),
    /// Error originating from state.
    #[error("{0}")]
    State(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::State(e.to_string())
    }
}
