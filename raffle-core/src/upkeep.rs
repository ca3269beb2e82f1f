use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::RaffleState;

/// Result of the public read-only upkeep check. The payload is opaque to
/// callers and always empty in this design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpkeepCheck {
    pub needed: bool,
    pub payload: Vec<u8>,
}

impl UpkeepCheck {
    pub fn new(needed: bool) -> Self {
        Self {
            needed,
            payload: Vec::new(),
        }
    }
}

/// Whether a round may transition to calculating.
///
/// All four conjuncts are independently necessary: the round is open, the
/// configured interval has elapsed, the pool holds funds, and at least one
/// ticket exists. Pure and side-effect free, safe to poll repeatedly.
pub fn is_upkeep_needed(
    state: RaffleState,
    elapsed: Duration,
    interval: Duration,
    pool_balance: u64,
    participant_count: usize,
) -> bool {
    state == RaffleState::Open
        && elapsed >= interval
        && pool_balance > 0
        && participant_count > 0
}
