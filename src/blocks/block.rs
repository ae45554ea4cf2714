// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_encoding::tuple::*;

use super::BlockHeader;
use crate::message::{SignedMessage, UnsignedMessage};
use crate::utils::encoding::Cbor;

/// A complete Filecoin block. This contains the block header as well as all
/// bls and secp messages.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub header: BlockHeader,
    pub bls_messages: Vec<UnsignedMessage>,
    pub secp_messages: Vec<SignedMessage>,
}

impl Block {
    /// Returns reference to the block header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }
    /// Returns reference to the block's bls messages.
    pub fn bls_msgs(&self) -> &[UnsignedMessage] {
        &self.bls_messages
    }
    /// Returns reference to the block's secp messages.
    pub fn secp_msgs(&self) -> &[SignedMessage] {
        &self.secp_messages
    }
    /// Returns block cid. This cid is the same as the block header cid.
    pub fn cid(&self) -> &Cid {
        self.header.cid()
    }
}

/// Tracks the merkle roots of both secp and bls messages separately. The
/// header's `messages` field is the cid of this record.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize_tuple, Deserialize_tuple)]
pub struct MsgMeta {
    pub bls_message_root: Cid,
    pub secp_message_root: Cid,
}

impl Cbor for MsgMeta {}
