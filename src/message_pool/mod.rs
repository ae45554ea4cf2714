// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
mod msg_pool;
mod provider;

pub use errors::Error;
pub use msg_pool::{MessagePool, MpoolUpdate, MsgSet};
pub use provider::{MpoolRpcProvider, Provider};
