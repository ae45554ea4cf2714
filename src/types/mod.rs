// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod deadlines;
pub mod verifier;
pub mod version;

pub use deadlines::DeadlineInfo;
pub use verifier::{FullVerifier, MockVerifier, ProofVerifier};
pub use version::{APIVersion, Version, BLOCK_DELAY_SECS};
