// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

//! JSON wrappers giving chain types the human-readable representation
//! clients expect: cids as `{"/": "..."}` maps, addresses as strings,
//! byte payloads as base64.

pub mod cid {
    use cid::Cid;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    /// Wrapper for serializing and deserializing a Cid from JSON.
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct CidJson(#[serde(with = "self")] pub Cid);

    /// Wrapper for serializing a cid reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct CidJsonRef<'a>(#[serde(with = "self")] pub &'a Cid);

    impl From<CidJson> for Cid {
        fn from(wrapper: CidJson) -> Self {
            wrapper.0
        }
    }

    #[derive(Serialize, Deserialize)]
    struct CidMap {
        #[serde(rename = "/")]
        cid: String,
    }

    pub fn serialize<S>(c: &Cid, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        CidMap { cid: c.to_string() }.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Cid, D::Error>
    where
        D: Deserializer<'de>,
    {
        let CidMap { cid } = Deserialize::deserialize(deserializer)?;
        Cid::from_str(&cid).map_err(de::Error::custom)
    }

    pub mod vec {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S>(m: &[Cid], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(m.len()))?;
            for e in m {
                seq.serialize_element(&CidJsonRef(e))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Cid>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let cids: Vec<CidJson> = Deserialize::deserialize(deserializer)?;
            Ok(cids.into_iter().map(|c| c.0).collect())
        }
    }
}

pub mod address {
    use fvm_shared::address::Address;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    /// Wrapper for serializing and deserializing an Address from JSON.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct AddressJson(#[serde(with = "self")] pub Address);

    impl From<AddressJson> for Address {
        fn from(wrapper: AddressJson) -> Self {
            wrapper.0
        }
    }

    impl From<Address> for AddressJson {
        fn from(addr: Address) -> Self {
            Self(addr)
        }
    }

    pub fn serialize<S>(m: &Address, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        m.to_string().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let address_as_string: String = Deserialize::deserialize(deserializer)?;
        Address::from_str(&address_as_string).map_err(de::Error::custom)
    }
}

pub mod signature {
    use fvm_shared::crypto::signature::Signature;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    /// Wrapper for serializing and deserializing a Signature from JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct SignatureJson(#[serde(with = "self")] pub Signature);

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "Type")]
        sig_type: u8,
        #[serde(rename = "Data")]
        bytes: String,
    }

    pub fn serialize<S>(m: &Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            sig_type: m.signature_type() as u8,
            bytes: base64::encode(m.bytes()),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let JsonHelper { sig_type, bytes } = Deserialize::deserialize(deserializer)?;
        let bytes = base64::decode(bytes).map_err(de::Error::custom)?;
        match sig_type {
            1 => Ok(Signature::new_secp256k1(bytes)),
            2 => Ok(Signature::new_bls(bytes)),
            other => Err(de::Error::custom(format!(
                "Invalid signature type: {}",
                other
            ))),
        }
    }

    pub mod opt {
        use super::*;

        pub fn serialize<S>(v: &Option<Signature>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            v.as_ref().map(|s| SignatureJson(s.clone())).serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Signature>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s: Option<SignatureJson> = Deserialize::deserialize(deserializer)?;
            Ok(s.map(|v| v.0))
        }
    }
}

pub mod vrf {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::crypto::VRFProof;

    pub fn serialize<S>(m: &VRFProof, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&base64::encode(m.as_bytes()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<VRFProof, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: String = Deserialize::deserialize(deserializer)?;
        Ok(VRFProof::new(
            base64::decode(bytes).map_err(serde::de::Error::custom)?,
        ))
    }
}

pub mod ticket {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::blocks::Ticket;
    use crate::crypto::VRFProof;

    /// Wrapper for serializing and deserializing a Ticket from JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct TicketJson(#[serde(with = "self")] pub Ticket);

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "VRFProof", with = "crate::json::vrf")]
        vrfproof: VRFProof,
    }

    pub fn serialize<S>(m: &Ticket, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            vrfproof: m.vrfproof.clone(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Ticket, D::Error>
    where
        D: Deserializer<'de>,
    {
        let JsonHelper { vrfproof } = Deserialize::deserialize(deserializer)?;
        Ok(Ticket { vrfproof })
    }

    pub mod opt {
        use super::*;

        pub fn serialize<S>(v: &Option<Ticket>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            v.as_ref().map(|s| TicketJson(s.clone())).serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Ticket>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s: Option<TicketJson> = Deserialize::deserialize(deserializer)?;
            Ok(s.map(|v| v.0))
        }
    }
}

pub mod election_proof {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::blocks::ElectionProof;
    use crate::crypto::VRFProof;

    /// Wrapper for serializing and deserializing an ElectionProof from JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct ElectionProofJson(#[serde(with = "self")] pub ElectionProof);

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "WinCount")]
        win_count: i64,
        #[serde(rename = "VRFProof", with = "crate::json::vrf")]
        vrfproof: VRFProof,
    }

    pub fn serialize<S>(m: &ElectionProof, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            win_count: m.win_count,
            vrfproof: m.vrfproof.clone(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ElectionProof, D::Error>
    where
        D: Deserializer<'de>,
    {
        let JsonHelper {
            win_count,
            vrfproof,
        } = Deserialize::deserialize(deserializer)?;
        Ok(ElectionProof {
            win_count,
            vrfproof,
        })
    }

    pub mod opt {
        use super::*;

        pub fn serialize<S>(v: &Option<ElectionProof>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            v.as_ref()
                .map(|s| ElectionProofJson(s.clone()))
                .serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ElectionProof>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s: Option<ElectionProofJson> = Deserialize::deserialize(deserializer)?;
            Ok(s.map(|v| v.0))
        }
    }
}

pub mod beacon_entry {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use crate::beacon::BeaconEntry;

    /// Wrapper for serializing and deserializing a BeaconEntry from JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct BeaconEntryJson(#[serde(with = "self")] pub BeaconEntry);

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "Round")]
        round: u64,
        #[serde(rename = "Data")]
        data: String,
    }

    pub fn serialize<S>(m: &BeaconEntry, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            round: m.round(),
            data: base64::encode(m.data()),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BeaconEntry, D::Error>
    where
        D: Deserializer<'de>,
    {
        let JsonHelper { round, data } = Deserialize::deserialize(deserializer)?;
        Ok(BeaconEntry::new(
            round,
            base64::decode(data).map_err(de::Error::custom)?,
        ))
    }

    pub mod vec {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S>(m: &[BeaconEntry], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(m.len()))?;
            for e in m {
                seq.serialize_element(&BeaconEntryJson(e.clone()))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BeaconEntry>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let entries: Vec<BeaconEntryJson> = Deserialize::deserialize(deserializer)?;
            Ok(entries.into_iter().map(|e| e.0).collect())
        }
    }
}

pub mod message {
    use fvm_ipld_encoding::RawBytes;
    use fvm_shared::address::Address;
    use fvm_shared::econ::TokenAmount;
    use fvm_shared::MethodNum;
    use num_bigint::BigInt;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    use crate::message::UnsignedMessage;

    /// Wrapper for serializing and deserializing an UnsignedMessage from
    /// JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct UnsignedMessageJson(#[serde(with = "self")] pub UnsignedMessage);

    impl From<UnsignedMessageJson> for UnsignedMessage {
        fn from(wrapper: UnsignedMessageJson) -> Self {
            wrapper.0
        }
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct JsonHelper {
        version: i64,
        #[serde(with = "crate::json::address")]
        to: Address,
        #[serde(with = "crate::json::address")]
        from: Address,
        nonce: u64,
        value: String,
        gas_limit: i64,
        gas_fee_cap: String,
        gas_premium: String,
        method: MethodNum,
        params: String,
    }

    pub(super) fn token_amount_from_string(s: &str) -> Result<TokenAmount, String> {
        let atto = BigInt::from_str(s).map_err(|e| e.to_string())?;
        Ok(TokenAmount::from_atto(atto))
    }

    pub fn serialize<S>(m: &UnsignedMessage, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            version: m.version,
            to: m.to,
            from: m.from,
            nonce: m.sequence,
            value: m.value.atto().to_string(),
            gas_limit: m.gas_limit,
            gas_fee_cap: m.gas_fee_cap.atto().to_string(),
            gas_premium: m.gas_premium.atto().to_string(),
            method: m.method_num,
            params: base64::encode(m.params.bytes()),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<UnsignedMessage, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        Ok(UnsignedMessage {
            version: m.version,
            to: m.to,
            from: m.from,
            sequence: m.nonce,
            value: token_amount_from_string(&m.value).map_err(de::Error::custom)?,
            gas_limit: m.gas_limit,
            gas_fee_cap: token_amount_from_string(&m.gas_fee_cap).map_err(de::Error::custom)?,
            gas_premium: token_amount_from_string(&m.gas_premium).map_err(de::Error::custom)?,
            method_num: m.method,
            params: RawBytes::new(base64::decode(m.params).map_err(de::Error::custom)?),
        })
    }

    pub mod vec {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S>(m: &[UnsignedMessage], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(m.len()))?;
            for e in m {
                seq.serialize_element(&UnsignedMessageJson(e.clone()))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<UnsignedMessage>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let messages: Vec<UnsignedMessageJson> = Deserialize::deserialize(deserializer)?;
            Ok(messages.into_iter().map(|m| m.0).collect())
        }
    }
}

pub mod signed_message {
    use fvm_shared::crypto::signature::Signature;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::message::{SignedMessage, UnsignedMessage};

    /// Wrapper for serializing and deserializing a SignedMessage from JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct SignedMessageJson(#[serde(with = "self")] pub SignedMessage);

    impl From<SignedMessageJson> for SignedMessage {
        fn from(wrapper: SignedMessageJson) -> Self {
            wrapper.0
        }
    }

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "Message", with = "crate::json::message")]
        message: UnsignedMessage,
        #[serde(rename = "Signature", with = "crate::json::signature")]
        signature: Signature,
    }

    pub fn serialize<S>(m: &SignedMessage, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            message: m.message.clone(),
            signature: m.signature.clone(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SignedMessage, D::Error>
    where
        D: Deserializer<'de>,
    {
        let JsonHelper { message, signature } = Deserialize::deserialize(deserializer)?;
        Ok(SignedMessage { message, signature })
    }

    pub mod vec {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S>(m: &[SignedMessage], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(m.len()))?;
            for e in m {
                seq.serialize_element(&SignedMessageJson(e.clone()))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<SignedMessage>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let messages: Vec<SignedMessageJson> = Deserialize::deserialize(deserializer)?;
            Ok(messages.into_iter().map(|m| m.0).collect())
        }
    }
}

pub mod message_receipt {
    use fvm_ipld_encoding::RawBytes;
    use fvm_shared::error::ExitCode;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use crate::message::MessageReceipt;

    /// Wrapper for serializing and deserializing a MessageReceipt from
    /// JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct MessageReceiptJson(#[serde(with = "self")] pub MessageReceipt);

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct JsonHelper {
        exit_code: u32,
        #[serde(rename = "Return")]
        return_data: String,
        gas_used: i64,
    }

    pub fn serialize<S>(m: &MessageReceipt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            exit_code: m.exit_code.value(),
            return_data: base64::encode(m.return_data.bytes()),
            gas_used: m.gas_used,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<MessageReceipt, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        Ok(MessageReceipt {
            exit_code: ExitCode::new(m.exit_code),
            return_data: RawBytes::new(base64::decode(m.return_data).map_err(de::Error::custom)?),
            gas_used: m.gas_used,
        })
    }
}

pub mod block_header {
    use cid::Cid;
    use fvm_shared::address::Address;
    use fvm_shared::bigint::BigInt;
    use fvm_shared::clock::ChainEpoch;
    use fvm_shared::crypto::signature::Signature;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    use crate::beacon::BeaconEntry;
    use crate::blocks::{BlockHeader, ElectionProof, Ticket, TipsetKeys};

    /// Wrapper for serializing and deserializing a BlockHeader from JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct BlockHeaderJson(#[serde(with = "self")] pub BlockHeader);

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct JsonHelper {
        #[serde(with = "crate::json::address")]
        miner: Address,
        #[serde(with = "crate::json::ticket::opt", default)]
        ticket: Option<Ticket>,
        #[serde(with = "crate::json::election_proof::opt", default)]
        election_proof: Option<ElectionProof>,
        #[serde(with = "crate::json::beacon_entry::vec", default)]
        beacon_entries: Vec<BeaconEntry>,
        #[serde(with = "crate::json::cid::vec", default)]
        parents: Vec<Cid>,
        parent_weight: String,
        height: ChainEpoch,
        #[serde(with = "crate::json::cid")]
        parent_state_root: Cid,
        #[serde(with = "crate::json::cid")]
        parent_message_receipts: Cid,
        #[serde(with = "crate::json::cid")]
        messages: Cid,
        #[serde(rename = "BLSAggregate", with = "crate::json::signature::opt", default)]
        bls_aggregate: Option<Signature>,
        timestamp: u64,
        #[serde(rename = "BlockSig", with = "crate::json::signature::opt", default)]
        block_sig: Option<Signature>,
        fork_signaling: u64,
    }

    pub fn serialize<S>(m: &BlockHeader, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            miner: *m.miner_address(),
            ticket: m.ticket().clone(),
            election_proof: m.election_proof().clone(),
            beacon_entries: m.beacon_entries().to_vec(),
            parents: m.parents().cids().to_vec(),
            parent_weight: m.weight().to_string(),
            height: m.epoch(),
            parent_state_root: *m.state_root(),
            parent_message_receipts: *m.message_receipts(),
            messages: *m.messages(),
            bls_aggregate: m.bls_aggregate().clone(),
            timestamp: m.timestamp(),
            block_sig: m.signature().clone(),
            fork_signaling: m.fork_signal(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BlockHeader, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        BlockHeader::builder()
            .miner_address(m.miner)
            .ticket(m.ticket)
            .election_proof(m.election_proof)
            .beacon_entries(m.beacon_entries)
            .parents(TipsetKeys::new(m.parents))
            .weight(BigInt::from_str(&m.parent_weight).map_err(de::Error::custom)?)
            .epoch(m.height)
            .state_root(m.parent_state_root)
            .message_receipts(m.parent_message_receipts)
            .messages(m.messages)
            .bls_aggregate(m.bls_aggregate)
            .timestamp(m.timestamp)
            .signature(m.block_sig)
            .fork_signal(m.fork_signaling)
            .build_and_validate()
            .map_err(de::Error::custom)
    }

    pub mod vec {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S>(m: &[BlockHeader], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(m.len()))?;
            for e in m {
                seq.serialize_element(&BlockHeaderJson(e.clone()))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BlockHeader>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let headers: Vec<BlockHeaderJson> = Deserialize::deserialize(deserializer)?;
            Ok(headers.into_iter().map(|h| h.0).collect())
        }
    }
}

pub mod tipset {
    use cid::Cid;
    use fvm_shared::clock::ChainEpoch;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use crate::blocks::{BlockHeader, Tipset};

    /// Wrapper for serializing and deserializing a Tipset from JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct TipsetJson(#[serde(with = "self")] pub Tipset);

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct JsonHelper {
        #[serde(with = "crate::json::cid::vec")]
        cids: Vec<Cid>,
        #[serde(with = "crate::json::block_header::vec")]
        blocks: Vec<BlockHeader>,
        height: ChainEpoch,
    }

    pub fn serialize<S>(m: &Tipset, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            cids: m.cids().to_vec(),
            blocks: m.blocks().to_vec(),
            height: m.epoch(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tipset, D::Error>
    where
        D: Deserializer<'de>,
    {
        let JsonHelper { cids, blocks, .. } = Deserialize::deserialize(deserializer)?;
        let tipset = Tipset::new(blocks).map_err(de::Error::custom)?;
        if tipset.cids() != cids.as_slice() {
            return Err(de::Error::custom(crate::blocks::Error::BlockOrderFailure));
        }
        Ok(tipset)
    }
}

pub mod gossip_block {
    use cid::Cid;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::blocks::{BlockHeader, GossipBlock};

    /// Wrapper for serializing and deserializing a GossipBlock from JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct GossipBlockJson(#[serde(with = "self")] pub GossipBlock);

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct JsonHelper {
        #[serde(with = "crate::json::block_header")]
        header: BlockHeader,
        #[serde(rename = "BlsMessages", with = "crate::json::cid::vec", default)]
        bls_messages: Vec<Cid>,
        #[serde(rename = "SecpkMessages", with = "crate::json::cid::vec", default)]
        secpk_messages: Vec<Cid>,
    }

    pub fn serialize<S>(m: &GossipBlock, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            header: m.header.clone(),
            bls_messages: m.bls_messages.clone(),
            secpk_messages: m.secpk_messages.clone(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<GossipBlock, D::Error>
    where
        D: Deserializer<'de>,
    {
        let JsonHelper {
            header,
            bls_messages,
            secpk_messages,
        } = Deserialize::deserialize(deserializer)?;
        Ok(GossipBlock {
            header,
            bls_messages,
            secpk_messages,
        })
    }
}

pub mod actor_state {
    use cid::Cid;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::message::token_amount_from_string;
    use crate::actor::ActorState;

    /// Wrapper for serializing and deserializing an ActorState from JSON.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct ActorStateJson(#[serde(with = "self")] pub ActorState);

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct JsonHelper {
        #[serde(with = "crate::json::cid")]
        code: Cid,
        #[serde(with = "crate::json::cid")]
        head: Cid,
        nonce: u64,
        balance: String,
    }

    pub fn serialize<S>(m: &ActorState, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            code: m.code,
            head: m.state,
            nonce: m.sequence,
            balance: m.balance.atto().to_string(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ActorState, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        Ok(ActorState {
            code: m.code,
            state: m.head,
            sequence: m.nonce,
            balance: token_amount_from_string(&m.balance).map_err(de::Error::custom)?,
        })
    }
}

pub mod bitfield {
    use fvm_ipld_bitfield::BitField;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    /// Wrapper for serializing and deserializing a BitField from JSON as
    /// base64 RLE+ bytes.
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct BitFieldJson(#[serde(with = "self")] pub BitField);

    pub fn serialize<S>(m: &BitField, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&base64::encode(m.to_bytes()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitField, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: String = Deserialize::deserialize(deserializer)?;
        BitField::from_bytes(&base64::decode(bytes).map_err(de::Error::custom)?)
            .map_err(de::Error::custom)
    }

    pub mod opt {
        use super::*;

        pub fn serialize<S>(v: &Option<BitField>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            v.as_ref().map(|s| BitFieldJson(s.clone())).serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BitField>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s: Option<BitFieldJson> = Deserialize::deserialize(deserializer)?;
            Ok(s.map(|v| v.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::cid::CidJson;
    use super::message::UnsignedMessageJson;
    use crate::message::UnsignedMessage;
    use crate::utils::encoding::cid_from_cbor_blake2b256;
    use fvm_shared::address::Address;

    #[test]
    fn cid_json_roundtrip() {
        let cid = cid_from_cbor_blake2b256(b"json");
        let encoded = serde_json::to_string(&CidJson(cid)).unwrap();
        assert!(encoded.contains("\"/\""));
        let decoded: CidJson = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.0, cid);
    }

    #[test]
    fn message_json_roundtrip() {
        let message = UnsignedMessage::builder()
            .to(Address::new_id(1))
            .from(Address::new_id(2))
            .sequence(7)
            .gas_limit(1000)
            .build()
            .unwrap();
        let encoded = serde_json::to_string(&UnsignedMessageJson(message.clone())).unwrap();
        let decoded: UnsignedMessageJson = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.0, message);
    }
}
