use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::oracle::RequestId;
use crate::types::Participant;

/// Notifications emitted for observers and indexers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RaffleEvent {
    EntryRecorded {
        participant: Participant,
        paid: u64,
    },
    RequestSubmitted {
        request_id: RequestId,
    },
    WinnerSelected {
        winner: Participant,
        amount: u64,
        request_id: RequestId,
    },
    RoundCancelled {
        request_id: RequestId,
    },
}

/// Broadcast fan-out for raffle events. Emission never fails the emitting
/// operation: with no live subscribers the event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RaffleEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RaffleEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: RaffleEvent) {
        tracing::debug!("Event: {:?}", event);
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
