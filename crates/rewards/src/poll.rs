//! Chat polls over candidate events.
//!
//! One poll at a time. Votes are plain chat messages "1" through "4";
//! each user holds at most one vote and may change it until the poll stops.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use game_events::GameEvent;

const MAX_OPTIONS: usize = 4;
const RECENT_VOTERS: usize = 3;

#[derive(Debug, Default)]
struct PollState {
    options: Vec<String>,
    events: Vec<GameEvent>,
    counts: Vec<usize>,
    /// Current vote per user; re-voting replaces the old ballot.
    ballots: HashMap<String, usize>,
    /// Most recent distinct voters, newest first.
    recent_voters: Vec<String>,
}

/// Runs chat polls and tallies votes.
#[derive(Debug, Default)]
pub struct PollEngine {
    state: Mutex<PollState>,
}

impl PollEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PollState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a poll over the given events (first four are used).
    ///
    /// With no events the poll still runs, with placeholder option labels
    /// and no winner payload.
    pub fn start_poll_with_events(&self, events: &[GameEvent]) {
        let mut guard = self.lock();
        let state = &mut *guard;

        if events.is_empty() {
            state.events = Vec::new();
            state.options = (1..=MAX_OPTIONS)
                .map(|number| format!("Option {}", number))
                .collect();
        } else {
            state.events = events.iter().take(MAX_OPTIONS).cloned().collect();
            state.options = state
                .events
                .iter()
                .map(|definition| definition.option_text().to_string())
                .collect();
        }

        state.counts = vec![0; state.options.len()];
        state.ballots.clear();
        state.recent_voters.clear();
    }

    /// Stops the poll and clears all state.
    pub fn stop_poll(&self) {
        let mut state = self.lock();
        *state = PollState::default();
    }

    /// Feeds one chat message into the poll. Non-votes are ignored.
    pub fn handle_chat(&self, user: &str, content: &str) {
        let trimmed_user = user.trim();
        if trimmed_user.is_empty() {
            return;
        }

        let choice = content.trim();
        let index = match choice {
            "1" => 0,
            "2" => 1,
            "3" => 2,
            "4" => 3,
            _ => return,
        };

        let mut state = self.lock();
        if state.options.is_empty() || index >= state.counts.len() {
            return;
        }

        state.ballots.insert(trimmed_user.to_string(), index);

        // Move-to-front, capped.
        state.recent_voters.retain(|name| name != trimmed_user);
        state.recent_voters.insert(0, trimmed_user.to_string());
        state.recent_voters.truncate(RECENT_VOTERS);

        // Full recount from the ballots keeps the tally correct under
        // re-votes.
        let mut counts = vec![0; state.options.len()];
        for ballot in state.ballots.values() {
            if *ballot < counts.len() {
                counts[*ballot] += 1;
            }
        }
        state.counts = counts;
    }

    /// Index of the winning option; `None` when nobody voted.
    ///
    /// Ties go to the lowest index.
    pub fn winner_index(&self) -> Option<usize> {
        let state = self.lock();
        let max = state.counts.iter().copied().max()?;
        if max == 0 {
            return None;
        }
        state.counts.iter().position(|count| *count == max)
    }

    /// The event behind the winning option, if the poll had events.
    pub fn winner_event(&self) -> Option<GameEvent> {
        let index = self.winner_index()?;
        self.lock().events.get(index).cloned()
    }

    pub fn is_active(&self) -> bool {
        !self.lock().options.is_empty()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.lock().counts.clone()
    }

    pub fn options(&self) -> Vec<String> {
        self.lock().options.clone()
    }

    pub fn active_events(&self) -> Vec<GameEvent> {
        self.lock().events.clone()
    }

    /// Most recent distinct voters, newest first, at most three.
    pub fn recent_voters(&self) -> Vec<String> {
        self.lock().recent_voters.clone()
    }
}
