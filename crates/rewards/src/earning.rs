//! Passive silver earning from chat activity and poll participation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::config::EarningConfig;
use crate::ledger::BalanceLedger;

#[derive(Debug)]
struct EarningState {
    config: EarningConfig,
    last_chat_award: HashMap<String, Instant>,
}

/// Awards silver for chat messages (cooldown-gated per user) and poll votes.
#[derive(Debug)]
pub struct EarningPolicy {
    ledger: Arc<BalanceLedger>,
    state: Mutex<EarningState>,
}

impl EarningPolicy {
    pub fn new(ledger: Arc<BalanceLedger>, config: EarningConfig) -> Self {
        Self {
            ledger,
            state: Mutex::new(EarningState {
                config: config.clamped(),
                last_chat_award: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EarningState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Awards silver for a chat message if the user is off cooldown.
    ///
    /// Returns the amount awarded. The cooldown timer advances only when an
    /// award actually happens, so suppressed messages do not push the next
    /// award further out.
    pub fn on_chat_message(&self, user: &str) -> i64 {
        let key = user.trim().to_lowercase();
        if key.is_empty() {
            return 0;
        }

        let mut state = self.lock();
        let amount = state.config.silver_per_chat_message;
        if amount <= 0 {
            return 0;
        }

        let now = Instant::now();
        let cooldown = state.config.chat_cooldown_seconds;
        if let Some(last) = state.last_chat_award.get(&key) {
            if now.duration_since(*last).as_secs_f64() < cooldown {
                return 0;
            }
        }
        state.last_chat_award.insert(key.clone(), now);
        drop(state);

        self.ledger.add_silver(&key, amount);
        amount
    }

    /// Awards silver for a poll vote. Votes are never cooldown-gated.
    pub fn on_poll_vote(&self, user: &str) -> i64 {
        let key = user.trim().to_lowercase();
        if key.is_empty() {
            return 0;
        }

        let amount = self.lock().config.silver_per_poll_vote;
        if amount <= 0 {
            return 0;
        }
        self.ledger.add_silver(&key, amount);
        amount
    }

    /// Replaces the earning configuration at runtime.
    pub fn set_config(&self, config: EarningConfig) {
        self.lock().config = config.clamped();
    }

    /// Snapshot of the current earning configuration.
    pub fn config(&self) -> EarningConfig {
        self.lock().config.clone()
    }
}
