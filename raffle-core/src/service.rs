use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::events::RaffleEvent;
use crate::oracle::RequestId;
use crate::raffle::Raffle;
use crate::types::{Participant, RaffleInfo};
use crate::upkeep::UpkeepCheck;

/// Clonable handle serializing all round-mutating operations behind one
/// lock. In a concurrent host every entry, upkeep trigger and oracle
/// delivery must go through the same handle; the lock is async because the
/// guarded transitions await oracle and payout calls.
#[derive(Clone)]
pub struct RaffleHandle {
    inner: Arc<Mutex<Raffle>>,
}

impl RaffleHandle {
    pub fn new(raffle: Raffle) -> Self {
        Self {
            inner: Arc::new(Mutex::new(raffle)),
        }
    }

    pub async fn enter(&self, participant: Participant, paid: u64) -> Result<()> {
        self.inner.lock().await.enter(participant, paid)
    }

    pub async fn check_upkeep(&self) -> UpkeepCheck {
        self.inner.lock().await.check_upkeep()
    }

    pub async fn perform_upkeep(&self) -> Result<RequestId> {
        self.inner.lock().await.perform_upkeep().await
    }

    pub async fn fulfill_random_words(
        &self,
        request_id: RequestId,
        words: &[u64],
    ) -> Result<Participant> {
        self.inner
            .lock()
            .await
            .fulfill_random_words(request_id, words)
            .await
    }

    pub async fn cancel_pending_request(&self) -> Result<RequestId> {
        self.inner.lock().await.cancel_pending_request()
    }

    pub async fn info(&self) -> RaffleInfo {
        self.inner.lock().await.info()
    }

    pub async fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RaffleEvent> {
        self.inner.lock().await.subscribe()
    }
}
