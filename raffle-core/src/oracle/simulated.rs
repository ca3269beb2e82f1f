use async_trait::async_trait;
use parking_lot::Mutex;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::{RandomnessOracle, RandomnessRequest, RequestId};
use crate::error::{RaffleError, Result};

/// In-process oracle for tests and local simulation.
///
/// Ids are handed out from 1 and increase monotonically. Random words are
/// derived by hashing the oracle seed with the request id and word index,
/// so a seeded oracle replays identical deliveries. `draw_words` consumes
/// the pending entry: a request can be drawn exactly once.
pub struct SimulatedOracle {
    seed: [u8; 32],
    next_id: AtomicU64,
    refuse_requests: AtomicBool,
    pending: Mutex<HashMap<RequestId, RandomnessRequest>>,
}

impl SimulatedOracle {
    pub fn new() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::with_seed(seed)
    }

    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            seed,
            next_id: AtomicU64::new(1),
            refuse_requests: AtomicBool::new(false),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Simulate an unfunded subscription or unregistered consumer: while
    /// set, every submission fails.
    pub fn set_refuse_requests(&self, refuse: bool) {
        self.refuse_requests.store(refuse, Ordering::SeqCst);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Produce the random words for an outstanding request, consuming it.
    pub fn draw_words(&self, request_id: RequestId) -> Result<Vec<u64>> {
        let request = self
            .pending
            .lock()
            .remove(&request_id)
            .ok_or(RaffleError::UnknownOrCompletedRequest { request_id })?;

        let words = (0..request.word_count)
            .map(|index| self.derive_word(request_id, index))
            .collect();
        Ok(words)
    }

    fn derive_word(&self, request_id: RequestId, index: u32) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(request_id.to_le_bytes());
        hasher.update(index.to_le_bytes());
        let digest = hasher.finalize();

        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(word)
    }
}

impl Default for SimulatedOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RandomnessOracle for SimulatedOracle {
    async fn request_random_words(&self, request: &RandomnessRequest) -> Result<RequestId> {
        if self.refuse_requests.load(Ordering::SeqCst) {
            return Err(RaffleError::oracle_rejected(format!(
                "subscription {} cannot cover the request",
                request.subscription_id
            )));
        }

        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().insert(request_id, request.clone());

        tracing::debug!(
            "Oracle accepted request {} on lane {} ({} words)",
            request_id,
            request.routing_key,
            request.word_count
        );
        Ok(request_id)
    }
}
