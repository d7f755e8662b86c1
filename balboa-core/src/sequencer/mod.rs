//! Command sequencing
//!
//! Queues requested changes, hands out one frame per clear-to-send and
//! tracks each command until a status broadcast confirms it.

pub mod command;
pub mod queue;

pub use command::{Command, CommandTarget, PendingCommand};
pub use queue::{CommandOutcome, CommandSequencer, Outcomes, MAX_PENDING};
