// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Blockchain blocks error
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The given tipset has no blocks
    #[error("No blocks to create tipset")]
    NoBlocks,
    /// Tipset blocks are at different heights
    #[error("Cannot create tipset, mismatching blocks heights")]
    MismatchingHeights,
    /// Tipset blocks have different parent sets
    #[error("Cannot create tipset, mismatching block parents")]
    MismatchingParents,
    /// A non-genesis header carries no ticket
    #[error("An optional ticket is not initialized")]
    TicketHasNoValue,
    /// Two blocks in a tipset have equal tickets
    #[error("Duplicate tickets in tipset")]
    TicketsCollision,
    /// Provided block order disagrees with the canonical ticket order
    #[error("Wrong order of blocks in tipset")]
    BlockOrderFailure,
    /// Invalid signature
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    /// Error in validating arbitrary data
    #[error("Error validating data: {0}")]
    Validation(String),
    /// Generic error
    #[error("{0}")]
    Other(String),
}
