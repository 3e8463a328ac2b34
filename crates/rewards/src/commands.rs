//! Chat command parsing for balance queries and purchases.

use std::sync::Arc;

use crate::ledger::BalanceLedger;
use crate::purchase::{PurchaseOutcome, PurchaseService};

const COMMAND_PREFIX: &str = "!";
const BALANCE_COMMANDS: &[&str] = &["silver", "balance", "money"];
const BUY_COMMANDS: &[&str] = &["buy", "purchase", "trigger", "event"];
const HELP_COMMANDS: &[&str] = &["shophelp", "buyhelp"];

/// Reply generated for a recognized chat command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReply {
    /// Canonical command name ("balance", "buy" or "help").
    pub command: String,
    pub success: bool,
    /// Text to send back to chat.
    pub response: String,
}

impl CommandReply {
    fn balance_query(user: &str, balance: i64) -> Self {
        Self {
            command: "balance".to_string(),
            success: true,
            response: format!("@{}, you have {} silver.", user, balance),
        }
    }

    fn purchase_success(user: &str, label: &str, cost: i64, new_balance: i64) -> Self {
        Self {
            command: "buy".to_string(),
            success: true,
            response: format!(
                "@{} triggered '{}' for {} silver! Remaining: {}",
                user, label, cost, new_balance
            ),
        }
    }

    fn purchase_failed(user: &str, reason: &str) -> Self {
        Self {
            command: "buy".to_string(),
            success: false,
            response: format!("@{}, purchase failed: {}", user, reason),
        }
    }

    fn help() -> Self {
        Self {
            command: "help".to_string(),
            success: true,
            response: "Commands: !silver (balance), !buy <event> (purchase event)".to_string(),
        }
    }
}

/// Routes `!`-prefixed chat messages to the ledger and purchase service.
///
/// Anything that is not a recognized command returns `None` so ordinary chat
/// flows through untouched.
pub struct ChatCommandHandler {
    ledger: Arc<BalanceLedger>,
    purchases: Arc<PurchaseService>,
    purchases_enabled: bool,
}

impl ChatCommandHandler {
    pub fn new(
        ledger: Arc<BalanceLedger>,
        purchases: Arc<PurchaseService>,
        purchases_enabled: bool,
    ) -> Self {
        Self {
            ledger,
            purchases,
            purchases_enabled,
        }
    }

    /// Processes one chat message; `None` when it is not a command.
    pub fn handle_message(&self, user: &str, content: &str) -> Option<CommandReply> {
        let trimmed = content.trim();
        let command_text = trimmed.strip_prefix(COMMAND_PREFIX)?.trim();
        if command_text.is_empty() {
            return None;
        }

        let (name, argument) = match command_text.split_once(char::is_whitespace) {
            Some((name, rest)) => (name.to_lowercase(), rest.trim()),
            None => (command_text.to_lowercase(), ""),
        };

        if BALANCE_COMMANDS.contains(&name.as_str()) {
            return Some(CommandReply::balance_query(user, self.ledger.balance(user)));
        }

        if BUY_COMMANDS.contains(&name.as_str()) {
            return Some(self.handle_buy(user, argument));
        }

        if HELP_COMMANDS.contains(&name.as_str()) {
            return Some(CommandReply::help());
        }

        None
    }

    fn handle_buy(&self, user: &str, identifier: &str) -> CommandReply {
        if !self.purchases_enabled {
            return CommandReply::purchase_failed(user, "Purchases are currently disabled.");
        }
        if identifier.is_empty() {
            return CommandReply::purchase_failed(
                user,
                "Please specify an event. Usage: !buy <event_name>",
            );
        }

        let outcome = self.purchases.attempt_purchase(user, identifier);
        match &outcome {
            PurchaseOutcome::Success {
                label,
                cost,
                new_balance,
            } => CommandReply::purchase_success(user, label, *cost, *new_balance),
            _ => CommandReply::purchase_failed(user, &outcome.message()),
        }
    }
}
