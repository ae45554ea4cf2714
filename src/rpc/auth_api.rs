// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use jsonrpc_v2::{Error as JsonRpcError, Params};

/// Creates an authorization token for the requested permissions. Token
/// issuance is not wired to a real secret yet; authentication design is
/// outside the node core.
pub(crate) async fn auth_new(
    Params(params): Params<(Vec<String>,)>,
) -> Result<Vec<u8>, JsonRpcError> {
    let (_perms,) = params;
    Ok(vec![1, 2, 3])
}
