// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

// The Message Pool is the component that handles pending messages for
// inclusion in the chain. Messages are added either directly for locally
// published messages or through pubsub propagation.

use async_std::sync::RwLock;
use cid::Cid;
use fvm_shared::address::Address;
use std::collections::HashMap;
use tokio::sync::broadcast::{self, Receiver as Subscriber, Sender as Publisher};

use super::{Error, Provider};
use crate::key_management;
use crate::message::{Message, SignedMessage};
use crate::utils::encoding::Cbor;

const UPDATE_SINK_CAP: usize = 200;

/// Change to the set of pending messages.
#[derive(Clone, Debug)]
pub enum MpoolUpdate {
    Add(SignedMessage),
    Remove(SignedMessage),
}

/// The pending messages of a single sender, keyed by sequence.
#[derive(Clone, Default, Debug)]
pub struct MsgSet {
    pub(crate) msgs: HashMap<u64, SignedMessage>,
    next_sequence: u64,
}

impl MsgSet {
    /// Generate a new MsgSet, setting the initial sequence.
    pub fn new(sequence: u64) -> Self {
        MsgSet {
            msgs: HashMap::new(),
            next_sequence: sequence,
        }
    }

    /// Add a signed message to the MsgSet. Increase next_sequence if the
    /// message has a sequence greater than any existing message sequence.
    pub fn add(&mut self, m: SignedMessage) -> Result<(), Error> {
        if self.msgs.is_empty() || m.sequence() >= self.next_sequence {
            self.next_sequence = m.sequence() + 1;
        }
        if let Some(exms) = self.msgs.get(&m.sequence()) {
            if m.cid().map_err(|e| Error::Other(e.to_string()))?
                != exms.cid().map_err(|e| Error::Other(e.to_string()))?
            {
                return Err(Error::DuplicateSequence);
            }
        }
        self.msgs.insert(m.sequence(), m);
        Ok(())
    }

    /// Removes message with the given sequence, adjusting the next sequence
    /// if it rewinds state.
    pub fn rm(&mut self, sequence: u64) {
        if self.msgs.remove(&sequence).is_some() && sequence < self.next_sequence {
            self.next_sequence = sequence;
        }
    }
}

/// Keeps track of pending messages along with the context needed for
/// assigning sequences and verifying signatures. This is the node's
/// serialization point for per-sender nonces.
pub struct MessagePool<T> {
    /// A map of pending messages where the key is the sender address.
    pending: RwLock<HashMap<Address, MsgSet>>,
    /// The underlying provider of chain state.
    api: T,
    /// Publisher of pending set changes.
    publisher: Publisher<MpoolUpdate>,
    /// The network name, used for pubsub topics by the outer node.
    network_name: String,
}

impl<T> MessagePool<T>
where
    T: Provider,
{
    /// Creates a new MessagePool instance.
    pub fn new(api: T, network_name: String) -> Self {
        let (publisher, _) = broadcast::channel(UPDATE_SINK_CAP);
        Self {
            pending: RwLock::new(HashMap::new()),
            api,
            publisher,
            network_name,
        }
    }

    /// Returns the network name the pool was configured with.
    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    /// Get the next sequence to use for the given address: the maximum of
    /// the actor's on-chain sequence and one past the highest pending
    /// message.
    pub async fn get_sequence(&self, addr: &Address) -> Result<u64, Error> {
        let state_sequence = self.get_state_sequence(addr).await?;
        let pending = self.pending.read().await;
        match pending.get(addr) {
            Some(mset) => {
                if state_sequence > mset.next_sequence {
                    Ok(state_sequence)
                } else {
                    Ok(mset.next_sequence)
                }
            }
            None => Ok(state_sequence),
        }
    }

    /// Get the state of the sender's actor at the current heaviest tipset.
    async fn get_state_sequence(&self, addr: &Address) -> Result<u64, Error> {
        let heaviest = self
            .api
            .get_heaviest_tipset()
            .ok_or_else(|| Error::Other("Failed to retrieve heaviest tipset".to_string()))?;
        let actor = self.api.get_actor_at(addr, &heaviest)?;
        Ok(actor.sequence)
    }

    /// Verifies the message signature and adds it to the pending set,
    /// notifying subscribers.
    pub async fn add(&self, msg: SignedMessage) -> Result<(), Error> {
        self.verify_msg_sig(&msg)?;
        self.api.put_message(&msg)?;

        let from = *msg.from();
        let state_sequence = self.get_state_sequence(&from).await?;

        let mut pending = self.pending.write().await;
        let mset = pending
            .entry(from)
            .or_insert_with(|| MsgSet::new(state_sequence));
        mset.add(msg.clone())?;
        drop(pending);

        let _ = self.publisher.send(MpoolUpdate::Add(msg));
        Ok(())
    }

    /// Add a signed message to the pool, returning its cid.
    pub async fn push(&self, msg: SignedMessage) -> Result<Cid, Error> {
        let cid = msg.cid().map_err(|e| Error::Other(e.to_string()))?;
        self.add(msg).await?;
        Ok(cid)
    }

    /// Checks the signature of the message against its sender. Senders in
    /// the pool are always key-form addresses.
    fn verify_msg_sig(&self, msg: &SignedMessage) -> Result<(), Error> {
        let bz = msg
            .message()
            .cid()
            .map_err(|e| Error::Other(e.to_string()))?
            .to_bytes();
        key_management::verify(msg.signature(), msg.from(), &bz)
            .map_err(|e| Error::InvalidSignature(e.to_string()))
    }

    /// Return all pending messages, ordered by sender and sequence.
    pub async fn pending(&self) -> Result<Vec<SignedMessage>, Error> {
        let mut out = Vec::new();
        let pending = self.pending.read().await;
        for mset in pending.values() {
            let mut msgs: Vec<_> = mset.msgs.values().cloned().collect();
            msgs.sort_by_key(|m| m.sequence());
            out.append(&mut msgs);
        }
        Ok(out)
    }

    /// Removes a message from the pending set, notifying subscribers.
    pub async fn remove(&self, from: &Address, sequence: u64) -> Result<(), Error> {
        let mut pending = self.pending.write().await;
        let removed = pending.get_mut(from).and_then(|mset| {
            let removed = mset.msgs.get(&sequence).cloned();
            mset.rm(sequence);
            removed
        });
        if let Some(entry) = pending.get(from) {
            if entry.msgs.is_empty() {
                pending.remove(from);
            }
        }
        drop(pending);

        if let Some(msg) = removed {
            let _ = self.publisher.send(MpoolUpdate::Remove(msg));
        }
        Ok(())
    }

    /// Subscribes to pending set changes.
    pub fn subscribe(&self) -> Subscriber<MpoolUpdate> {
        self.publisher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorState, ACCOUNT_ACTOR_CODE_ID};
    use crate::blocks::{BlockHeader, Tipset};
    use crate::key_management::{generate, sign, KeyInfo};
    use crate::message::UnsignedMessage;
    use cid::Cid;
    use fvm_shared::crypto::signature::SignatureType;
    use fvm_shared::econ::TokenAmount;
    use num_traits::Zero;
    use std::sync::Arc;

    struct TestApi {
        state_sequence: u64,
    }

    impl Provider for TestApi {
        fn get_heaviest_tipset(&self) -> Option<Arc<Tipset>> {
            let genesis = BlockHeader::builder()
                .miner_address(Address::new_id(0))
                .build_and_validate()
                .unwrap();
            Some(Arc::new(Tipset::new(vec![genesis]).unwrap()))
        }

        fn get_actor_at(&self, _: &Address, _: &Tipset) -> Result<ActorState, Error> {
            Ok(ActorState::new(
                *ACCOUNT_ACTOR_CODE_ID,
                Cid::default(),
                TokenAmount::zero(),
                self.state_sequence,
            ))
        }

        fn put_message(&self, _: &SignedMessage) -> Result<Cid, Error> {
            Ok(Cid::default())
        }
    }

    fn signed_msg(key_info: &KeyInfo, from: Address, sequence: u64) -> SignedMessage {
        let message = UnsignedMessage::builder()
            .to(Address::new_id(1))
            .from(from)
            .sequence(sequence)
            .build()
            .unwrap();
        let sig = sign(
            *key_info.key_type(),
            key_info.private_key(),
            &message.cid().unwrap().to_bytes(),
        )
        .unwrap();
        SignedMessage::new_from_parts(message, sig)
    }

    fn test_key() -> (KeyInfo, Address) {
        let private_key = generate(SignatureType::Secp256k1).unwrap();
        let key_info = KeyInfo::new(SignatureType::Secp256k1, private_key);
        let key = crate::key_management::Key::try_from(key_info.clone()).unwrap();
        (key_info, key.address)
    }

    #[async_std::test]
    async fn sequences_increase_monotonically() {
        let pool = MessagePool::new(TestApi { state_sequence: 7 }, "test".to_string());
        let (key_info, from) = test_key();

        assert_eq!(pool.get_sequence(&from).await.unwrap(), 7);
        pool.add(signed_msg(&key_info, from, 7)).await.unwrap();
        assert_eq!(pool.get_sequence(&from).await.unwrap(), 8);
        pool.add(signed_msg(&key_info, from, 8)).await.unwrap();
        assert_eq!(pool.get_sequence(&from).await.unwrap(), 9);
        assert_eq!(pool.pending().await.unwrap().len(), 2);
    }

    #[async_std::test]
    async fn duplicate_sequence_rejected() {
        let pool = MessagePool::new(TestApi { state_sequence: 0 }, "test".to_string());
        let (key_info, from) = test_key();

        pool.add(signed_msg(&key_info, from, 0)).await.unwrap();
        // a different payload at the same sequence is rejected
        let mut conflicting = UnsignedMessage::builder()
            .to(Address::new_id(2))
            .from(from)
            .sequence(0)
            .build()
            .unwrap();
        conflicting.gas_limit = 1;
        let sig = sign(
            *key_info.key_type(),
            key_info.private_key(),
            &conflicting.cid().unwrap().to_bytes(),
        )
        .unwrap();
        let result = pool
            .add(SignedMessage::new_from_parts(conflicting, sig))
            .await;
        assert_eq!(result, Err(Error::DuplicateSequence));
    }

    #[async_std::test]
    async fn bad_signature_rejected() {
        let pool = MessagePool::new(TestApi { state_sequence: 0 }, "test".to_string());
        let (_, from) = test_key();
        let (other_key, _) = test_key();

        let msg = signed_msg(&other_key, from, 0);
        assert!(matches!(
            pool.add(msg).await,
            Err(Error::InvalidSignature(_))
        ));
    }

    #[async_std::test]
    async fn updates_are_published() {
        let pool = MessagePool::new(TestApi { state_sequence: 0 }, "test".to_string());
        let (key_info, from) = test_key();
        let mut sub = pool.subscribe();

        pool.add(signed_msg(&key_info, from, 0)).await.unwrap();
        match sub.recv().await.unwrap() {
            MpoolUpdate::Add(msg) => assert_eq!(msg.sequence(), 0),
            other => panic!("unexpected update: {:?}", other),
        }
    }
}
