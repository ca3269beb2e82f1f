use thiserror::Error;

use crate::oracle::RequestId;
use crate::types::{Participant, RaffleState};

pub type Result<T> = std::result::Result<T, RaffleError>;

#[derive(Error, Debug)]
pub enum RaffleError {
    #[error("Insufficient payment: paid {paid}, entry fee is {required}")]
    InsufficientPayment { paid: u64, required: u64 },

    #[error("Round is not open for entries")]
    RoundNotOpen,

    #[error(
        "Upkeep not needed: balance {pool_balance}, participants {participant_count}, state {state}"
    )]
    UpkeepNotNeeded {
        pool_balance: u64,
        participant_count: usize,
        state: RaffleState,
    },

    #[error("No pending randomness request")]
    NoPendingRequest,

    #[error("Oracle rejected randomness request: {0}")]
    OracleRequestRejected(String),

    #[error("Unknown or already completed randomness request: {request_id}")]
    UnknownOrCompletedRequest { request_id: RequestId },

    #[error("Randomness delivery for request {request_id} carried no words")]
    EmptyDelivery { request_id: RequestId },

    #[error("Payout of {amount} to {recipient} failed")]
    PayoutTransferFailed { recipient: Participant, amount: u64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RaffleError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn oracle_rejected(msg: impl Into<String>) -> Self {
        Self::OracleRequestRejected(msg.into())
    }
}
