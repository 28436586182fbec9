//! Operator error types

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Operator error type
#[derive(Error, Debug)]
pub enum OpsError {
    /// No owned position overlaps the requested bin range
    #[error("no position found in bin range [{lower}, {upper}]")]
    NoPositionsInRange { lower: i32, upper: i32 },

    /// Failure signing, sending, or confirming a transaction unit
    #[error("network submission error: {0}")]
    NetworkSubmission(String),

    /// The quote collaborator rejected the request
    #[error("quote computation error: {0}")]
    QuoteComputation(String),

    /// Transient failure fetching account or pool metadata
    #[error("metadata fetch error: {0}")]
    MetadataFetch(String),

    /// Account data did not match the expected layout
    #[error("malformed account {account}: {reason}")]
    MetadataShape { account: Pubkey, reason: String },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<solana_client::client_error::ClientError> for OpsError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        OpsError::NetworkSubmission(err.to_string())
    }
}

pub type OpsResult<T> = Result<T, OpsError>;
