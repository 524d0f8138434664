use crate::domain::proposal::CommitNotice;
use crate::foundation::{PeerName, TransactionId};
use crate::infrastructure::rpc::CommitSubscription;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Shared commit-event fan-out for the simulated network.
///
/// Subscriptions are keyed by transaction id and are single-use; the
/// disconnect hook handed to each [`CommitSubscription`] unregisters the
/// waiter so leak assertions can count open subscriptions.
#[derive(Default)]
pub struct SimEventHub {
    waiters: Mutex<HashMap<TransactionId, Vec<oneshot::Sender<CommitNotice>>>>,
    open: Arc<AtomicUsize>,
}

impl SimEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(self: &Arc<Self>, peer: PeerName, transaction_id: TransactionId) -> CommitSubscription {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut waiters) = self.waiters.lock() {
            waiters.entry(transaction_id).or_default().push(tx);
        }
        self.open.fetch_add(1, Ordering::SeqCst);

        let hub = Arc::clone(self);
        let hook = Box::new(move || {
            hub.open.fetch_sub(1, Ordering::SeqCst);
            if let Ok(mut waiters) = hub.waiters.lock() {
                waiters.remove(&transaction_id);
            }
        });
        CommitSubscription::new(peer, transaction_id, rx, Some(hook))
    }

    pub fn emit(&self, notice: CommitNotice) {
        let senders = self
            .waiters
            .lock()
            .ok()
            .and_then(|mut waiters| waiters.remove(&notice.transaction_id))
            .unwrap_or_default();
        for sender in senders {
            // A receiver that already went away is not an error.
            let _ = sender.send(notice);
        }
    }

    /// Number of subscriptions that have not yet been torn down.
    pub fn open_subscriptions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::proposal::ValidationCode;
    use std::time::Duration;

    fn notice(id: TransactionId) -> CommitNotice {
        CommitNotice { transaction_id: id, code: ValidationCode::Valid, block_number: 1 }
    }

    #[tokio::test]
    async fn emit_reaches_a_prior_subscriber() {
        let hub = Arc::new(SimEventHub::new());
        let id = TransactionId::new([9; 32]);
        let sub = hub.subscribe(PeerName::new("p1"), id);
        hub.emit(notice(id));
        let got = sub.await_commit(Duration::from_secs(1)).await.unwrap();
        assert_eq!(got.transaction_id, id);
        assert_eq!(hub.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn emit_before_subscribe_is_lost() {
        // The protocol engine must subscribe before broadcasting; this is the
        // race that rule exists for.
        let hub = Arc::new(SimEventHub::new());
        let id = TransactionId::new([8; 32]);
        hub.emit(notice(id));
        let sub = hub.subscribe(PeerName::new("p1"), id);
        assert!(sub.await_commit(Duration::from_millis(20)).await.is_err());
    }

    #[tokio::test]
    async fn disconnect_unregisters_the_waiter() {
        let hub = Arc::new(SimEventHub::new());
        let id = TransactionId::new([7; 32]);
        let sub = hub.subscribe(PeerName::new("p1"), id);
        assert_eq!(hub.open_subscriptions(), 1);
        sub.disconnect();
        assert_eq!(hub.open_subscriptions(), 0);
        assert!(hub.waiters.lock().unwrap().is_empty());
    }
}
