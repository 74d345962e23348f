//! Process execution for the infrastructure binary.
//!
//! Argument formatting per subcommand, a single captured invocation, and the
//! retrying executor on top of it.

pub mod args;
mod command;
pub mod executor;

pub use command::{CommandOutput, Invocation, InvocationBuilder};
