//! Core types: run configuration, variables, environment, retry policy and
//! errors.

pub mod environment;
pub mod error;
pub mod options;
pub mod retry;
pub mod types;
pub mod vars;
