//! Purchases: spend silver to trigger a game event.
//!
//! The flow is deduct-then-execute with a compensating refund: the deduction
//! is atomic against the ledger, and an execution failure credits the cost
//! back. The refund is best-effort compensation, not a transaction; the REST
//! call itself may have partially applied.

use std::sync::Arc;

use game_events::{EventCatalog, EventExecutor, GameEvent};

use crate::ledger::BalanceLedger;

/// Typed result of a purchase attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    Success {
        label: String,
        cost: i64,
        new_balance: i64,
    },
    InsufficientFunds {
        label: String,
        cost: i64,
        balance: i64,
    },
    NotFound {
        identifier: String,
    },
    ExecutionFailed {
        label: String,
        reason: String,
    },
}

impl PurchaseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PurchaseOutcome::Success { .. })
    }

    /// User-facing message for chat feedback.
    pub fn message(&self) -> String {
        match self {
            PurchaseOutcome::Success {
                label,
                cost,
                new_balance,
            } => format!(
                "Purchased '{}' for {} silver. Remaining: {}",
                label, cost, new_balance
            ),
            PurchaseOutcome::InsufficientFunds {
                label,
                cost,
                balance,
            } => format!(
                "Not enough silver for '{}'. Need {}, have {}.",
                label, cost, balance
            ),
            PurchaseOutcome::NotFound { identifier } => {
                format!("Event '{}' not found.", identifier)
            }
            PurchaseOutcome::ExecutionFailed { label, reason } => {
                format!("Failed to trigger '{}': {}", label, reason)
            }
        }
    }
}

/// Orchestrates event purchases against the ledger, catalog and executor.
pub struct PurchaseService {
    ledger: Arc<BalanceLedger>,
    catalog: Arc<EventCatalog>,
    executor: EventExecutor,
    api_host: String,
    api_port: u16,
}

impl PurchaseService {
    pub fn new(
        ledger: Arc<BalanceLedger>,
        catalog: Arc<EventCatalog>,
        executor: EventExecutor,
        api_host: impl Into<String>,
        api_port: u16,
    ) -> Self {
        Self {
            ledger,
            catalog,
            executor,
            api_host: api_host.into(),
            api_port,
        }
    }

    /// Attempts to purchase and trigger an event by id or label.
    pub fn attempt_purchase(&self, user: &str, identifier: &str) -> PurchaseOutcome {
        let Some(definition) = self.find_event(identifier) else {
            return PurchaseOutcome::NotFound {
                identifier: identifier.trim().to_string(),
            };
        };

        let cost = definition.cost;
        let balance = self.ledger.balance(user);
        if balance < cost {
            return PurchaseOutcome::InsufficientFunds {
                label: definition.label.clone(),
                cost,
                balance,
            };
        }

        // Atomic re-check: another purchase may have drained the balance
        // between the read above and this deduction. The outcome reports
        // the balance captured before deduction either way.
        if !self.ledger.deduct_silver(user, cost) {
            return PurchaseOutcome::InsufficientFunds {
                label: definition.label.clone(),
                cost,
                balance,
            };
        }

        if let Err(reason) = self.execute_event(&definition) {
            self.ledger.add_silver(user, cost);
            tracing::warn!(event = %definition.id, %user, "event execution failed, cost refunded");
            return PurchaseOutcome::ExecutionFailed {
                label: definition.label.clone(),
                reason,
            };
        }

        let new_balance = self.ledger.balance(user);
        self.ledger.persist();
        tracing::info!(event = %definition.id, %user, cost, new_balance, "purchase completed");

        PurchaseOutcome::Success {
            label: definition.label,
            cost,
            new_balance,
        }
    }

    /// All events a user can buy: visible definitions with a positive cost.
    pub fn purchasable_events(&self) -> Vec<GameEvent> {
        self.catalog
            .all()
            .into_iter()
            .filter(|definition| definition.cost > 0 && !definition.hidden)
            .collect()
    }

    /// Finds an event by id first, then by label, case-insensitively.
    fn find_event(&self, identifier: &str) -> Option<GameEvent> {
        let normalized = identifier.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        let all = self.catalog.all();
        all.iter()
            .find(|definition| definition.id.to_lowercase() == normalized)
            .or_else(|| {
                all.iter()
                    .find(|definition| definition.label.to_lowercase() == normalized)
            })
            .cloned()
    }

    /// Runs the definition's requests; Err carries the joined failure text.
    fn execute_event(&self, definition: &GameEvent) -> Result<(), String> {
        let outcomes = self
            .executor
            .execute_detailed(&self.api_host, self.api_port, definition);

        let summaries: Vec<String> = outcomes.iter().map(|outcome| outcome.display()).collect();
        let failed = outcomes.iter().any(|outcome| !outcome.ok)
            || summaries.iter().any(|summary| {
                let lowered = summary.to_lowercase();
                lowered.contains("error") || lowered.contains("failed")
            });

        if failed {
            Err(summaries.join("; "))
        } else {
            Ok(())
        }
    }
}
