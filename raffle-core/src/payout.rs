use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::types::Participant;

/// Value-transfer boundary for paying out the pool.
///
/// Reports success or failure instead of erroring so the state machine
/// decides propagation policy. Implementations never retry internally;
/// retry, if any, is the caller's or an operator's responsibility.
#[async_trait]
pub trait PayoutExecutor: Send + Sync {
    async fn transfer(&self, recipient: &Participant, amount: u64) -> bool;
}

/// In-memory settlement used by tests and the simulation CLI.
#[derive(Debug, Default)]
pub struct InMemoryBank {
    accounts: RwLock<HashMap<Participant, u64>>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, participant: &Participant) -> u64 {
        self.accounts
            .read()
            .get(participant)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PayoutExecutor for InMemoryBank {
    async fn transfer(&self, recipient: &Participant, amount: u64) -> bool {
        let mut accounts = self.accounts.write();
        *accounts.entry(recipient.clone()).or_insert(0) += amount;

        tracing::info!("Paid {} units to {}", amount, recipient);
        true
    }
}
