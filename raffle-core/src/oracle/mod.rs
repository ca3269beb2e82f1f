pub mod simulated;

pub use simulated::SimulatedOracle;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{OracleConfig, PaymentMode};
use crate::error::Result;

/// Opaque randomness request identifier. Always greater than zero.
pub type RequestId = u64;

/// Parameters submitted with a randomness request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub routing_key: String,
    pub subscription_id: u64,
    pub confirmation_depth: u16,
    pub callback_gas_limit: u32,
    pub word_count: u32,
    pub payment_mode: PaymentMode,
}

impl RandomnessRequest {
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            routing_key: config.routing_key.clone(),
            subscription_id: config.subscription_id,
            confirmation_depth: config.confirmation_depth,
            callback_gas_limit: config.callback_gas_limit,
            word_count: config.word_count,
            payment_mode: config.payment_mode,
        }
    }
}

/// Client boundary to the external randomness oracle.
///
/// Submission is fire-and-forget: the oracle computes and confirms its
/// random values out of band and delivers them later through the state
/// machine's fulfillment entry point, tagged with the returned id. A
/// submission rejected here (unfunded subscription, unregistered consumer)
/// must abort the caller's transition with no state change.
#[async_trait]
pub trait RandomnessOracle: Send + Sync {
    async fn request_random_words(&self, request: &RandomnessRequest) -> Result<RequestId>;
}
