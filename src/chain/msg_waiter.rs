// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use async_std::channel::{bounded, Receiver};
use async_std::task;
use cid::Cid;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast::{self, Sender as Publisher};

use crate::blocks::TipsetKeys;
use crate::message::MessageReceipt;

const RESULT_SINK_CAP: usize = 200;

/// Watches for message inclusion receipts. The sync process notifies the
/// waiter when messages land on chain; API consumers either poll
/// [`MsgWaiter::result_of`] or subscribe with [`MsgWaiter::wait`].
pub struct MsgWaiter {
    results: RwLock<HashMap<Cid, (MessageReceipt, TipsetKeys)>>,
    publisher: Publisher<(Cid, MessageReceipt, TipsetKeys)>,
}

impl Default for MsgWaiter {
    fn default() -> Self {
        Self::new()
    }
}

impl MsgWaiter {
    pub fn new() -> Self {
        let (publisher, _) = broadcast::channel(RESULT_SINK_CAP);
        Self {
            results: RwLock::new(HashMap::new()),
            publisher,
        }
    }

    /// Known result of a message, with the key of the tipset whose parent
    /// execution produced the receipt.
    pub fn result_of(&self, cid: &Cid) -> Option<(MessageReceipt, TipsetKeys)> {
        self.results.read().get(cid).cloned()
    }

    /// Records the receipt for an executed message and wakes waiters.
    pub fn notify(&self, cid: Cid, receipt: MessageReceipt, key: TipsetKeys) {
        self.results
            .write()
            .insert(cid, (receipt.clone(), key.clone()));
        let _ = self.publisher.send((cid, receipt, key));
    }

    /// Returns a single-shot channel that yields the message result, either
    /// immediately when it is already known or once `notify` records it.
    pub fn wait(&self, cid: Cid) -> Receiver<(MessageReceipt, TipsetKeys)> {
        let (sender, receiver) = bounded(1);

        // subscribe before consulting the map, so a concurrent notify is
        // observed on one path or the other
        let mut subscriber = self.publisher.subscribe();
        if let Some((receipt, key)) = self.result_of(&cid) {
            let _ = sender.try_send((receipt, key));
            return receiver;
        }

        task::spawn(async move {
            while let Ok((done, receipt, key)) = subscriber.recv().await {
                if done == cid {
                    let _ = sender.try_send((receipt, key));
                    break;
                }
            }
        });
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fvm_ipld_encoding::RawBytes;
    use fvm_shared::error::ExitCode;

    fn receipt() -> MessageReceipt {
        MessageReceipt {
            exit_code: ExitCode::OK,
            return_data: RawBytes::default(),
            gas_used: 0,
        }
    }

    #[async_std::test]
    async fn wait_resolves_after_notify() {
        let waiter = MsgWaiter::new();
        let cid = crate::utils::encoding::cid_from_cbor_blake2b256(b"msg");

        let rx = waiter.wait(cid);
        waiter.notify(cid, receipt(), TipsetKeys::default());

        let (rec, key) = rx.recv().await.unwrap();
        assert_eq!(rec, receipt());
        assert_eq!(key, TipsetKeys::default());
    }

    #[async_std::test]
    async fn wait_resolves_immediately_when_known() {
        let waiter = MsgWaiter::new();
        let cid = crate::utils::encoding::cid_from_cbor_blake2b256(b"msg");
        waiter.notify(cid, receipt(), TipsetKeys::default());

        let rx = waiter.wait(cid);
        assert!(rx.recv().await.is_ok());
        assert!(waiter.result_of(&cid).is_some());
    }
}
