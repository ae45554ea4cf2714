// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;

pub use errors::VmError;

use cid::Cid;
use fvm_ipld_encoding::RawBytes;
use fvm_shared::error::ExitCode;

use crate::blocks::Tipset;
use crate::message::UnsignedMessage;

/// The outcome of replaying a tipset's state transitions: the resulting
/// state root and the root of the receipts array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpreterResult {
    pub state_root: Cid,
    pub message_receipts: Cid,
}

/// Replays the state transitions of a tipset. A deterministic pure function
/// of its inputs: interpreting the same tipset twice yields equal results,
/// so results may be memoized by tipset key.
pub trait Interpreter<DB>: Send + Sync {
    fn interpret(&self, store: &DB, tipset: &Tipset) -> anyhow::Result<InterpreterResult>;
}

/// Applies a single message against a tipset's state without balance or
/// sequence checks, returning the raw return value. VM exit codes surface
/// as [`VmError::ExitCode`], distinguishable from transport failures.
pub trait Invoker<DB>: Send + Sync {
    fn apply_implicit_message(
        &self,
        store: &DB,
        tipset: &Tipset,
        message: &UnsignedMessage,
    ) -> Result<RawBytes, VmError>;
}

/// Maps a raw VM exit value into the canonical exit code subset. Unknown
/// values yield `None`; callers treat that as a fatal interpreter fault.
pub fn normalize_vm_exit_code(code: u64) -> Option<ExitCode> {
    // system codes, the reserved gap, and the user range pass through;
    // anything above the known user range is actor-specific
    match code {
        0..=15 => Some(ExitCode::new(code as u32)),
        16..=24 => Some(ExitCode::new(code as u32)),
        32..=u64::MAX if code <= u32::MAX as u64 => Some(ExitCode::new(code as u32)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_normalization() {
        assert_eq!(normalize_vm_exit_code(0), Some(ExitCode::OK));
        assert_eq!(normalize_vm_exit_code(16), Some(ExitCode::new(16)));
        assert_eq!(normalize_vm_exit_code(40), Some(ExitCode::new(40)));
        // the reserved gap between user and actor-specific codes
        assert_eq!(normalize_vm_exit_code(25), None);
        assert_eq!(normalize_vm_exit_code(u32::MAX as u64 + 1), None);
    }
}
