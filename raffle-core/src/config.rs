use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RaffleError, Result};

/// How the oracle bills for a randomness request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    /// Fees are drawn from a pre-funded subscription account.
    Subscription,
    /// Fees are paid in the native unit at request time.
    Native,
}

/// Routing parameters for the randomness oracle, fixed per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Key/lane identifier selecting the oracle fee lane.
    pub routing_key: String,
    /// Subscription the request is billed against.
    pub subscription_id: u64,
    /// Confirmations the oracle waits for before responding.
    pub confirmation_depth: u16,
    /// Gas budget for the delivery callback.
    pub callback_gas_limit: u32,
    /// Number of random words requested per round.
    pub word_count: u32,
    pub payment_mode: PaymentMode,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            routing_key: "default-lane".to_string(),
            subscription_id: 1,
            confirmation_depth: 3,
            callback_gas_limit: 100_000,
            word_count: 1,
            payment_mode: PaymentMode::Subscription,
        }
    }
}

/// Raffle configuration, immutable once the raffle is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleConfig {
    /// Minimum payment per ticket, in base units.
    pub entry_fee: u64,
    /// Minimum time a round stays open before upkeep becomes eligible.
    pub interval: Duration,
    pub oracle: OracleConfig,
}

impl RaffleConfig {
    pub fn new(entry_fee: u64, interval: Duration, oracle: OracleConfig) -> Self {
        Self {
            entry_fee,
            interval,
            oracle,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.entry_fee == 0 {
            return Err(RaffleError::config("Entry fee must be greater than 0"));
        }

        if self.oracle.routing_key.is_empty() {
            return Err(RaffleError::config("Oracle routing key cannot be empty"));
        }

        if self.oracle.word_count == 0 {
            return Err(RaffleError::config(
                "Oracle word count must be greater than 0",
            ));
        }

        if self.oracle.callback_gas_limit == 0 {
            return Err(RaffleError::config(
                "Callback gas limit must be greater than 0",
            ));
        }

        Ok(())
    }
}
