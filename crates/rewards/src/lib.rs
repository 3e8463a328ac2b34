//! Chat-driven reward engine.
//!
//! Viewers earn silver by chatting and voting, and spend it to trigger
//! in-game events through the REST API. This crate owns the economy side:
//! the balance ledger, earning rules, the purchase flow with its refund
//! compensation, chat command parsing and the poll engine. Event
//! definitions, templates and HTTP execution live in `game-events`.

pub mod commands;
pub mod config;
pub mod earning;
pub mod ledger;
pub mod poll;
pub mod purchase;

pub use commands::{ChatCommandHandler, CommandReply};
pub use config::{default_config_toml, ApiConfig, ConfigError, EarningConfig, PurchaseConfig, RewardsConfig};
pub use earning::EarningPolicy;
pub use ledger::{BalanceLedger, BalanceStore};
pub use poll::PollEngine;
pub use purchase::{PurchaseOutcome, PurchaseService};
