// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod randomness;
mod vrf;

pub use randomness::{draw_randomness, DomainSeparationTag};
pub use vrf::VRFProof;
