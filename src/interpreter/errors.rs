// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Failure of an implicit message application. Exit codes form a second
/// error channel next to transport faults, and the API preserves the
/// distinction: `StateCall` folds exit codes into receipts and propagates
/// everything else.
#[derive(Debug, Error)]
pub enum VmError {
    /// The invoked actor returned a non-zero exit code.
    #[error("actor exited with code {0}")]
    ExitCode(u64),
    /// The VM itself failed before or while applying the message.
    #[error("fatal vm error: {0}")]
    Fatal(String),
}
