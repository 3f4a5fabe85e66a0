use crate::import::notice::ImportNotice;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::info;

type SubscriptionId = u64;

/// Filter criteria for notice subscriptions
#[derive(Debug, Clone)]
enum SubscriptionFilter {
    Job { job_id: String },
    All,
}

impl SubscriptionFilter {
    fn matches(&self, notice: &ImportNotice) -> bool {
        match self {
            SubscriptionFilter::Job { job_id } => notice.job_id() == job_id,
            SubscriptionFilter::All => true,
        }
    }
}

struct Subscription {
    filter: SubscriptionFilter,
    tx: tokio_mpsc::UnboundedSender<ImportNotice>,
}

/// Handle for subscribing to import status notices.
///
/// All trackers feed one channel; a single background task drains it and
/// fans notices out to subscribers, so delivery order always equals the
/// order events were applied.
#[derive(Clone)]
pub struct ImportNoticeHandle {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl ImportNoticeHandle {
    /// Create a new notice handle and spawn the background dispatch task
    pub fn new(
        mut notice_rx: tokio_mpsc::UnboundedReceiver<ImportNotice>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_clone = subscriptions.clone();

        // Single consumer: notices are dispatched strictly in arrival order
        runtime_handle.spawn(async move {
            loop {
                match notice_rx.recv().await {
                    Some(notice) => {
                        let mut subs = subscriptions_clone.lock().unwrap();
                        let mut to_remove = Vec::new();

                        for (id, subscription) in subs.iter() {
                            if subscription.filter.matches(&notice) {
                                // If send fails, receiver was dropped - mark for removal
                                if subscription.tx.send(notice.clone()).is_err() {
                                    to_remove.push(*id);
                                }
                            }
                        }

                        for id in to_remove {
                            subs.remove(&id);
                        }
                    }
                    None => {
                        info!("Notice channel closed, exiting dispatch");
                        break;
                    }
                }
            }
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to notices for a specific job
    /// Returns a receiver that yields only notices for the specified job
    /// Subscription is automatically removed when receiver is dropped
    pub fn subscribe_job(&self, job_id: String) -> tokio_mpsc::UnboundedReceiver<ImportNotice> {
        self.subscribe(SubscriptionFilter::Job { job_id })
    }

    /// Subscribe to notices for every job
    pub fn subscribe_all(&self) -> tokio_mpsc::UnboundedReceiver<ImportNotice> {
        self.subscribe(SubscriptionFilter::All)
    }

    fn subscribe(&self, filter: SubscriptionFilter) -> tokio_mpsc::UnboundedReceiver<ImportNotice> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let subscription = Subscription { filter, tx };

        self.subscriptions.lock().unwrap().insert(id, subscription);
        rx
    }
}
