// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use bls_signatures::{
    verify_messages, PrivateKey as BlsPrivate, PublicKey as BlsPublic, Serialize as BlsSerialize,
    Signature as BlsSignature,
};
use fvm_shared::address::{Address, Payload};
use fvm_shared::crypto::signature::{Signature, SignatureType};
use libsecp256k1::{
    recover, Message as SecpMessage, PublicKey as SecpPublic, RecoveryId, SecretKey as SecpPrivate,
    Signature as SecpSignature,
};
use rand::rngs::OsRng;

use super::errors::Error;
use crate::utils::encoding::blake2b_256;

/// Return the public key for a given private key and SignatureType.
pub fn to_public(sig_type: SignatureType, private_key: &[u8]) -> Result<Vec<u8>, Error> {
    match sig_type {
        SignatureType::BLS => Ok(BlsPrivate::from_bytes(private_key)
            .map_err(|err| Error::Other(err.to_string()))?
            .public_key()
            .as_bytes()),
        SignatureType::Secp256k1 => {
            let private_key = SecpPrivate::parse_slice(private_key)
                .map_err(|err| Error::Other(err.to_string()))?;
            let public_key = SecpPublic::from_secret_key(&private_key);
            Ok(public_key.serialize().to_vec())
        }
    }
}

/// Return a new Address that is of a given SignatureType and uses the
/// supplied public key.
pub fn new_address(sig_type: SignatureType, public_key: &[u8]) -> Result<Address, Error> {
    match sig_type {
        SignatureType::BLS => {
            Address::new_bls(public_key).map_err(|err| Error::Other(err.to_string()))
        }
        SignatureType::Secp256k1 => {
            Address::new_secp256k1(public_key).map_err(|err| Error::Other(err.to_string()))
        }
    }
}

/// Sign takes in SignatureType, private key and message. Returns a
/// Signature for that message.
pub fn sign(sig_type: SignatureType, private_key: &[u8], msg: &[u8]) -> Result<Signature, Error> {
    match sig_type {
        SignatureType::BLS => {
            let priv_key =
                BlsPrivate::from_bytes(private_key).map_err(|err| Error::Other(err.to_string()))?;
            let sig = priv_key.sign(msg);
            Ok(Signature::new_bls(sig.as_bytes()))
        }
        SignatureType::Secp256k1 => {
            let priv_key = SecpPrivate::parse_slice(private_key)
                .map_err(|err| Error::Other(err.to_string()))?;
            let msg_hash = blake2b_256(msg);
            let message = SecpMessage::parse(&msg_hash);
            let (sig, recovery_id) = libsecp256k1::sign(&message, &priv_key);
            let mut new_bytes = [0; 65];
            new_bytes[..64].copy_from_slice(&sig.serialize());
            new_bytes[64] = recovery_id.serialize();
            Ok(Signature::new_secp256k1(new_bytes.to_vec()))
        }
    }
}

/// Checks a signature against the address it claims to be signed by. The
/// address must be in public-key form.
pub fn verify(signature: &Signature, addr: &Address, msg: &[u8]) -> Result<(), Error> {
    match signature.signature_type() {
        SignatureType::BLS => verify_bls_sig(signature.bytes(), addr, msg),
        SignatureType::Secp256k1 => verify_secp256k1_sig(signature.bytes(), addr, msg),
    }
}

/// Generate a new private key of the given signature type.
pub fn generate(sig_type: SignatureType) -> Result<Vec<u8>, Error> {
    let rng = &mut OsRng;
    match sig_type {
        SignatureType::BLS => {
            let key = BlsPrivate::generate(rng);
            Ok(key.as_bytes())
        }
        SignatureType::Secp256k1 => {
            let key = SecpPrivate::random(rng);
            Ok(key.serialize().to_vec())
        }
    }
}

fn verify_bls_sig(sig_bytes: &[u8], addr: &Address, msg: &[u8]) -> Result<(), Error> {
    let public_key = match addr.payload() {
        Payload::BLS(key) => BlsPublic::from_bytes(key)
            .map_err(|err| Error::VerificationFailure(err.to_string()))?,
        _ => {
            return Err(Error::VerificationFailure(format!(
                "cannot verify bls signature against non-bls address {}",
                addr
            )))
        }
    };
    let sig = BlsSignature::from_bytes(sig_bytes)
        .map_err(|err| Error::VerificationFailure(err.to_string()))?;

    if verify_messages(&sig, &[msg], &[public_key]) {
        Ok(())
    } else {
        Err(Error::VerificationFailure(
            "bls signature did not verify".to_string(),
        ))
    }
}

fn verify_secp256k1_sig(sig_bytes: &[u8], addr: &Address, msg: &[u8]) -> Result<(), Error> {
    if sig_bytes.len() != 65 {
        return Err(Error::VerificationFailure(format!(
            "invalid secp signature length {}",
            sig_bytes.len()
        )));
    }

    let msg_hash = blake2b_256(msg);
    let message = SecpMessage::parse(&msg_hash);
    let sig = SecpSignature::parse_standard_slice(&sig_bytes[..64])
        .map_err(|err| Error::VerificationFailure(err.to_string()))?;
    let recovery_id = RecoveryId::parse(sig_bytes[64])
        .map_err(|err| Error::VerificationFailure(err.to_string()))?;

    let public_key = recover(&message, &sig, &recovery_id)
        .map_err(|err| Error::VerificationFailure(err.to_string()))?;
    let recovered = Address::new_secp256k1(&public_key.serialize())
        .map_err(|err| Error::VerificationFailure(err.to_string()))?;

    if &recovered == addr {
        Ok(())
    } else {
        Err(Error::VerificationFailure(
            "secp signature does not match address".to_string(),
        ))
    }
}
