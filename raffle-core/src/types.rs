use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::oracle::RequestId;

/// Round state. Entries are accepted only while `Open`; exactly one
/// randomness request is outstanding iff the round is `Calculating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaffleState {
    Open,
    Calculating,
}

impl fmt::Display for RaffleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaffleState::Open => write!(f, "open"),
            RaffleState::Calculating => write!(f, "calculating"),
        }
    }
}

/// Participant address. Insertion order in the ledger is meaningful and one
/// address may appear multiple times — each entry is a separate ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant(String);

impl Participant {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Participant {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

/// Winner of a completed round, recorded only after the payout succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub participant: Participant,
    pub amount: u64,
    pub request_id: RequestId,
    pub paid_at: DateTime<Utc>,
}

/// Read-only snapshot of a raffle for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleInfo {
    pub id: Uuid,
    pub state: RaffleState,
    pub entry_fee: u64,
    pub pool_balance: u64,
    pub participant_count: usize,
    pub last_round_at: DateTime<Utc>,
    pub pending_request: Option<RequestId>,
    pub recent_winner: Option<WinnerRecord>,
}
