//! Operator toolkit for a bin-based DLMM on Solana.
//!
//! Provides the building blocks the one-shot operator binaries drive:
//! - position range resolution over bin intervals
//! - fixed-point slippage and quote conversion
//! - batched transaction assembly for ranged liquidity removal
//! - strictly sequential signing, sending, and confirmation
//! - a new-pool watcher filtering by a target base asset

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod instructions;
pub mod quote;
pub mod range;
pub mod slippage;
pub mod state;
pub mod submit;
pub mod watcher;

pub use batch::{
    build_removal_batch, BatchPlan, BatchRole, RemovalPlanner, TransactionBatch, WithdrawPlanner,
};
pub use client::PairClient;
pub use config::OpsConfig;
pub use error::{OpsError, OpsResult};
pub use quote::{QuoteRequest, QuoteSource, SpotQuoteSource};
pub use range::{resolve, BinRange, ClippedPosition};
pub use slippage::{apply_tolerance, to_scaled_tolerance, Quote, SLIPPAGE_PRECISION};
pub use state::{PairAccount, Position};
pub use submit::{ConfirmingSender, SequentialSubmitter};
pub use watcher::{
    spawn_pair_scanner, LogNotifier, MetadataSource, Notifier, PoolMetadata, PoolSubscription,
    PoolWatcher,
};
