//! Time-gated, verifiably-random prize raffle.
//!
//! Participants pay a fixed entry fee into a pool while a round is open.
//! Once the configured interval has elapsed and the round holds funded
//! tickets, anyone may trigger upkeep: the round closes, a randomness
//! request is submitted to an external oracle, and the asynchronous
//! delivery of the random words selects the winner, pays out the pool, and
//! reopens the round.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod oracle;
pub mod payout;
pub mod raffle;
pub mod service;
pub mod types;
pub mod upkeep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{OracleConfig, PaymentMode, RaffleConfig};
pub use error::{RaffleError, Result};
pub use events::{EventBus, RaffleEvent};
pub use ledger::EntryLedger;
pub use oracle::{RandomnessOracle, RandomnessRequest, RequestId, SimulatedOracle};
pub use payout::{InMemoryBank, PayoutExecutor};
pub use raffle::Raffle;
pub use service::RaffleHandle;
pub use types::{Participant, RaffleInfo, RaffleState, WinnerRecord};
pub use upkeep::{is_upkeep_needed, UpkeepCheck};
