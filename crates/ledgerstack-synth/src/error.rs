//! Synthesis error types.

use thiserror::Error;

use ledgerstack_core::ConfigError;

/// Errors from the relay IP-range lookup collaborator.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("ip-ranges document unreachable: {0}")]
    Unreachable(String),

    #[error("ip-ranges document malformed: {0}")]
    Malformed(String),

    #[error("no relay ip range published for region: {0}")]
    NoRangeForRegion(String),
}

/// Errors that abort synthesis. No partial resource graph survives any of
/// these; the graph value is only constructed after every fallible step.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("relay range lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error(
        "backup retention of {expiration_days} days does not cover three \
         {interval_days}-day backup cycles"
    )]
    Retention {
        expiration_days: u32,
        interval_days: u32,
    },
}

pub type SynthResult<T> = Result<T, SynthError>;
