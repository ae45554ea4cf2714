// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use derive_builder::Builder;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::MethodNum;
use num_traits::Zero;

use super::Message;
use crate::utils::encoding::Cbor;

/// Default Unsigned VM message type which includes all data needed for a
/// state transition.
///
/// Usage:
/// ```
/// use fuhon::message::UnsignedMessage;
/// use fvm_shared::address::Address;
///
/// // Use the builder to pack the message
/// let message = UnsignedMessage::builder()
///     .to(Address::new_id(0))
///     .from(Address::new_id(1))
///     .sequence(0) // optional
///     .method_num(Default::default()) // optional
///     .params(Default::default()) // optional
///     .gas_limit(0) // optional
///     .build()
///     .unwrap();
/// ```
#[derive(PartialEq, Clone, Debug, Builder, Serialize_tuple, Deserialize_tuple)]
#[builder(name = "MessageBuilder")]
pub struct UnsignedMessage {
    #[builder(default)]
    pub version: i64,
    pub to: Address,
    pub from: Address,
    #[builder(default)]
    pub sequence: u64,
    #[builder(default = "TokenAmount::zero()")]
    pub value: TokenAmount,
    #[builder(default)]
    pub gas_limit: i64,
    #[builder(default = "TokenAmount::zero()")]
    pub gas_fee_cap: TokenAmount,
    #[builder(default = "TokenAmount::zero()")]
    pub gas_premium: TokenAmount,
    #[builder(default)]
    pub method_num: MethodNum,
    #[builder(default)]
    pub params: RawBytes,
}

impl UnsignedMessage {
    /// Generates a message builder as a constructor.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }
}

impl Message for UnsignedMessage {
    fn from(&self) -> &Address {
        &self.from
    }
    fn to(&self) -> &Address {
        &self.to
    }
    fn sequence(&self) -> u64 {
        self.sequence
    }
    fn value(&self) -> &TokenAmount {
        &self.value
    }
    fn method_num(&self) -> MethodNum {
        self.method_num
    }
    fn params(&self) -> &RawBytes {
        &self.params
    }
    fn gas_limit(&self) -> i64 {
        self.gas_limit
    }
    fn gas_fee_cap(&self) -> &TokenAmount {
        &self.gas_fee_cap
    }
    fn gas_premium(&self) -> &TokenAmount {
        &self.gas_premium
    }
}

impl Cbor for UnsignedMessage {}
