// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

//! Retrieval market query protocol boundary: the responder answering
//! "do you have this payload, and at what price" queries from clients. The
//! stream transport lives with the networking stack; this module owns the
//! message types and the response logic.

use cid::Cid;
use fvm_ipld_encoding::repr::{Deserialize_repr, Serialize_repr};
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use log::debug;
use num_derive::FromPrimitive;

use crate::utils::encoding::Cbor;

/// Where a payload was found relative to the piece holding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadLocation {
    /// The payload is directly retrievable from the local ipld store.
    IpldStore,
    /// The payload lives inside a sealed piece.
    Piece,
}

/// Locates piece payloads for the retrieval provider. Implemented by the
/// piece storage subsystem.
pub trait PieceLocator {
    /// Returns where the payload is stored and the cid of the parent piece
    /// containing it, or `None` when the payload is unknown.
    fn locate_payload(&self, payload_cid: &Cid) -> anyhow::Result<Option<(PayloadLocation, Cid)>>;
}

/// Pricing terms the provider answers queries with.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
    pub payment_address: Address,
    pub price_per_byte: TokenAmount,
    pub payment_interval: u64,
    pub interval_increase: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, Serialize_repr, Deserialize_repr)]
#[repr(u64)]
pub enum QueryResponseStatus {
    Available = 0,
    Unavailable = 1,
    Error = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, Serialize_repr, Deserialize_repr)]
#[repr(u64)]
pub enum QueryItemStatus {
    Available = 0,
    Unavailable = 1,
    Unknown = 2,
}

/// Query parameters; the optional piece cid constrains which piece the
/// payload must be served from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct QueryParams {
    pub piece_cid: Option<Cid>,
}

/// A retrieval query for a payload cid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct QueryRequest {
    pub payload_cid: Cid,
    pub params: QueryParams,
}

impl Cbor for QueryRequest {}

/// Answer to a retrieval query: availability and payment terms.
#[derive(Clone, Debug, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct QueryResponse {
    pub response_status: QueryResponseStatus,
    pub item_status: QueryItemStatus,
    pub payment_address: Address,
    pub min_price_per_byte: TokenAmount,
    pub payment_interval: u64,
    pub interval_increase: u64,
}

impl Cbor for QueryResponse {}

/// Answers retrieval queries against a piece locator and the provider's
/// pricing configuration.
pub struct QueryResponder<L> {
    locator: L,
    config: ProviderConfig,
}

impl<L> QueryResponder<L>
where
    L: PieceLocator,
{
    pub fn new(locator: L, config: ProviderConfig) -> Self {
        Self { locator, config }
    }

    /// Builds the response for a single query.
    pub fn respond(&self, request: &QueryRequest) -> QueryResponse {
        QueryResponse {
            response_status: QueryResponseStatus::Available,
            item_status: self.item_status(&request.payload_cid, request.params.piece_cid.as_ref()),
            payment_address: self.config.payment_address,
            min_price_per_byte: self.config.price_per_byte.clone(),
            payment_interval: self.config.payment_interval,
            interval_increase: self.config.interval_increase,
        }
    }

    /// The payload is available iff the locator knows it; when a piece cid
    /// is specified and differs from the payload cid, the payload must also
    /// live in exactly that parent piece.
    fn item_status(&self, payload_cid: &Cid, piece_cid: Option<&Cid>) -> QueryItemStatus {
        let (location, parent_piece) = match self.locator.locate_payload(payload_cid) {
            Ok(Some(found)) => found,
            Ok(None) => return QueryItemStatus::Unavailable,
            Err(e) => {
                debug!("failed to locate payload {}: {}", payload_cid, e);
                return QueryItemStatus::Unavailable;
            }
        };

        if let Some(piece) = piece_cid {
            if piece != payload_cid && location != PayloadLocation::IpldStore && &parent_piece != piece
            {
                return QueryItemStatus::Unavailable;
            }
        }
        QueryItemStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encoding::cid_from_cbor_blake2b256;
    use num_traits::Zero;
    use std::collections::HashMap;

    struct MapLocator(HashMap<Cid, (PayloadLocation, Cid)>);

    impl PieceLocator for MapLocator {
        fn locate_payload(
            &self,
            payload_cid: &Cid,
        ) -> anyhow::Result<Option<(PayloadLocation, Cid)>> {
            Ok(self.0.get(payload_cid).copied())
        }
    }

    fn config() -> ProviderConfig {
        ProviderConfig {
            payment_address: Address::new_id(99),
            price_per_byte: TokenAmount::zero(),
            payment_interval: 1024,
            interval_increase: 2,
        }
    }

    #[test]
    fn known_payload_is_available() {
        let payload = cid_from_cbor_blake2b256(b"payload");
        let piece = cid_from_cbor_blake2b256(b"piece");
        let responder = QueryResponder::new(
            MapLocator(HashMap::from([(payload, (PayloadLocation::Piece, piece))])),
            config(),
        );

        let response = responder.respond(&QueryRequest {
            payload_cid: payload,
            params: QueryParams {
                piece_cid: Some(piece),
            },
        });
        assert_eq!(response.item_status, QueryItemStatus::Available);
        assert_eq!(response.payment_address, Address::new_id(99));
    }

    #[test]
    fn mismatched_parent_piece_is_unavailable() {
        let payload = cid_from_cbor_blake2b256(b"payload");
        let piece = cid_from_cbor_blake2b256(b"piece");
        let other_piece = cid_from_cbor_blake2b256(b"other");
        let responder = QueryResponder::new(
            MapLocator(HashMap::from([(payload, (PayloadLocation::Piece, piece))])),
            config(),
        );

        let response = responder.respond(&QueryRequest {
            payload_cid: payload,
            params: QueryParams {
                piece_cid: Some(other_piece),
            },
        });
        assert_eq!(response.item_status, QueryItemStatus::Unavailable);
    }

    #[test]
    fn unknown_payload_is_unavailable() {
        let payload = cid_from_cbor_blake2b256(b"missing");
        let responder = QueryResponder::new(MapLocator(HashMap::new()), config());

        let response = responder.respond(&QueryRequest {
            payload_cid: payload,
            params: QueryParams { piece_cid: None },
        });
        assert_eq!(response.item_status, QueryItemStatus::Unavailable);
    }
}
