// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod block;
mod election_proof;
mod errors;
mod gossip_block;
mod header;
mod ticket;
mod tipset;

pub use block::*;
pub use election_proof::ElectionProof;
pub use errors::Error;
pub use gossip_block::GossipBlock;
pub use header::{BlockHeader, BlockHeaderBuilder};
pub use ticket::Ticket;
pub use tipset::*;
