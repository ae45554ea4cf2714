// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use jsonrpc_v2::RequestObject;
use tide::http::headers::CONTENT_TYPE;
use tide::{Request, Response, StatusCode};

use super::JsonRpcServerState;

pub(crate) async fn rpc_http_handler(
    mut http_request: Request<JsonRpcServerState>,
) -> tide::Result {
    let call: RequestObject = http_request.body_json().await?;
    let rpc_server = http_request.state();
    let rpc_response = rpc_server.handle(call).await;

    let body = serde_json::to_string(&rpc_response)?;
    let response = Response::builder(StatusCode::Ok)
        .header(CONTENT_TYPE, "application/json-rpc;charset=utf-8")
        .body(body)
        .build();
    Ok(response)
}
