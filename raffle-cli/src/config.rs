use serde::{Deserialize, Serialize};
use std::time::Duration;

use raffle_core::{OracleConfig, PaymentMode, RaffleConfig};

/// Per-deployment-target raffle parameters: entry fee, round interval and
/// oracle routing. Selected by name when starting a simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub name: String,
    pub entry_fee: u64,
    pub interval_secs: u64,
    pub routing_key: String,
    pub subscription_id: u64,
    pub confirmation_depth: u16,
    pub callback_gas_limit: u32,
}

impl NetworkProfile {
    pub fn raffle_config(&self) -> RaffleConfig {
        RaffleConfig::new(
            self.entry_fee,
            Duration::from_secs(self.interval_secs),
            OracleConfig {
                routing_key: self.routing_key.clone(),
                subscription_id: self.subscription_id,
                confirmation_depth: self.confirmation_depth,
                callback_gas_limit: self.callback_gas_limit,
                word_count: 1,
                payment_mode: PaymentMode::Subscription,
            },
        )
    }
}

pub fn builtin_profiles() -> Vec<NetworkProfile> {
    vec![
        NetworkProfile {
            name: "local".to_string(),
            entry_fee: 1_000,
            interval_secs: 30,
            routing_key: "local-lane".to_string(),
            subscription_id: 1,
            confirmation_depth: 1,
            callback_gas_limit: 100_000,
        },
        NetworkProfile {
            name: "testnet".to_string(),
            entry_fee: 10_000,
            interval_secs: 300,
            routing_key: "testnet-lane-150gwei".to_string(),
            subscription_id: 4_512,
            confirmation_depth: 3,
            callback_gas_limit: 500_000,
        },
        NetworkProfile {
            name: "mainnet".to_string(),
            entry_fee: 100_000,
            interval_secs: 86_400,
            routing_key: "mainnet-lane-200gwei".to_string(),
            subscription_id: 77,
            confirmation_depth: 6,
            callback_gas_limit: 500_000,
        },
    ]
}

pub fn profile(name: &str) -> Option<NetworkProfile> {
    builtin_profiles().into_iter().find(|p| p.name == name)
}
