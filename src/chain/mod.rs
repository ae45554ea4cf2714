// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

mod block_producer;
mod msg_waiter;
mod store;
mod weight;

pub use self::block_producer::*;
pub use self::msg_waiter::*;
pub use self::store::*;
pub use self::weight::*;
