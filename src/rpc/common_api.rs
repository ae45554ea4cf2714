// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use jsonrpc_v2::Error as JsonRpcError;

use crate::types::{APIVersion, Version, BLOCK_DELAY_SECS};

/// Returns the node name and the API version it speaks.
pub(crate) async fn version() -> Result<APIVersion, JsonRpcError> {
    Ok(APIVersion {
        version: "fuhon".to_string(),
        api_version: Version::new(0, 3, 0),
        block_delay: BLOCK_DELAY_SECS,
    })
}

/// Catch-all for the facade entries that are intentionally left empty
/// (client, payment channel and network introspection methods).
pub(crate) async fn not_implemented() -> Result<(), JsonRpcError> {
    Err("method not implemented".into())
}
