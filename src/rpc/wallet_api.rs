// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::address::{Address, Protocol};
use jsonrpc_v2::{Data, Error as JsonRpcError, Params};

use crate::beacon::Beaconizer;
use crate::blocks::TipsetKeys;
use crate::ipld::BlockStore;
use crate::json::address::AddressJson;
use crate::json::signature::SignatureJson;
use crate::key_management::{self, KeyStore};
use crate::rpc::data_types::RpcState;

/// Returns the balance of the actor at the given address.
pub(crate) async fn wallet_balance<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson,)>,
) -> Result<String, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address),) = params;
    let context = data
        .state_manager
        .tipset_context(&TipsetKeys::default(), false)
        .map_err(|e| e.to_string())?;
    let actor = context.get_actor(&address).map_err(|e| e.to_string())?;
    Ok(actor.balance.atto().to_string())
}

/// Whether the key store holds the key behind the given address.
pub(crate) async fn wallet_has<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson,)>,
) -> Result<bool, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address),) = params;
    let address = resolve_key_address(&data, address)?;
    let keystore = data.keystore.read().await;
    Ok(key_management::find_key(&address, &*keystore).is_ok())
}

/// Signs arbitrary bytes (base64) with the key behind the given address.
pub(crate) async fn wallet_sign<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, String)>,
) -> Result<SignatureJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), msg_string) = params;
    let msg = base64::decode(msg_string).map_err(|e| e.to_string())?;
    let address = resolve_key_address(&data, address)?;

    let keystore = data.keystore.read().await;
    let key = key_management::find_key(&address, &*keystore).map_err(|e| e.to_string())?;
    let sig = key_management::sign(*key.key_info.key_type(), key.key_info.private_key(), &msg)
        .map_err(|e| e.to_string())?;
    Ok(SignatureJson(sig))
}

/// Verifies a signature over arbitrary bytes (base64) against an address.
pub(crate) async fn wallet_verify<DB, KS, B>(
    data: Data<RpcState<DB, KS, B>>,
    Params(params): Params<(AddressJson, String, SignatureJson)>,
) -> Result<bool, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    let (AddressJson(address), msg_string, SignatureJson(sig)) = params;
    let msg = base64::decode(msg_string).map_err(|e| e.to_string())?;
    let address = resolve_key_address(&data, address)?;

    Ok(key_management::verify(&sig, &address, &msg).is_ok())
}

/// Not implemented; the node keeps no default address.
pub(crate) async fn wallet_default_address<DB, KS, B>(
    _data: Data<RpcState<DB, KS, B>>,
) -> Result<AddressJson, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    Err("method not implemented".into())
}

/// Resolves a non-key address through its account actor at the current
/// head.
fn resolve_key_address<DB, KS, B>(
    data: &RpcState<DB, KS, B>,
    address: Address,
) -> Result<Address, JsonRpcError>
where
    DB: BlockStore + Send + Sync + 'static,
    KS: KeyStore + Send + Sync + 'static,
    B: Beaconizer + Send + Sync + 'static,
{
    if address.protocol() == Protocol::BLS || address.protocol() == Protocol::Secp256k1 {
        return Ok(address);
    }
    let context = data
        .state_manager
        .tipset_context(&TipsetKeys::default(), false)
        .map_err(|e| e.to_string())?;
    context
        .account_key(&address)
        .map_err(|e| e.to_string().into())
}
