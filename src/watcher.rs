//! Pool-creation watcher.
//!
//! New-pool discovery is modeled as a bounded single-consumer channel: a
//! producer task pushes pair addresses, the watcher drains them strictly in
//! arrival order, filters by the configured base mint, and hands matches to
//! a notifier keyed by pool address. A metadata failure for one pool is
//! logged and skipped; the loop keeps serving later events.

use std::collections::HashSet;

use solana_sdk::pubkey::Pubkey;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::client::PairClient;
use crate::error::OpsResult;

/// Normalized record for a newly created pool
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolMetadata {
    pub address: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub bin_step: u16,
}

/// Collaborator resolving a pool address to validated metadata
#[allow(async_fn_in_trait)]
pub trait MetadataSource {
    async fn pool_metadata(&self, address: &Pubkey) -> OpsResult<PoolMetadata>;
}

impl MetadataSource for PairClient {
    async fn pool_metadata(&self, address: &Pubkey) -> OpsResult<PoolMetadata> {
        let pair = self.get_pair(address).await?;
        Ok(PoolMetadata {
            address: *address,
            base_mint: pair.token_mint_x,
            quote_mint: pair.token_mint_y,
            bin_step: pair.bin_step,
        })
    }
}

/// Alerting collaborator; `dedup_key` is the pool address
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, dedup_key: &Pubkey, pool: &PoolMetadata) -> OpsResult<()>;
}

/// Notifier that writes matches to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, dedup_key: &Pubkey, pool: &PoolMetadata) -> OpsResult<()> {
        let payload = serde_json::json!({
            "pool": pool.address.to_string(),
            "base_mint": pool.base_mint.to_string(),
            "quote_mint": pool.quote_mint.to_string(),
            "bin_step": pool.bin_step,
        });
        log::info!("pool match [{dedup_key}]: {payload}");
        Ok(())
    }
}

/// Handle over a new-pool event stream; dropping it cancels the producer
pub struct PoolSubscription {
    events: mpsc::Receiver<Pubkey>,
    producer: Option<JoinHandle<()>>,
}

impl PoolSubscription {
    /// Channel-backed subscription with no producer task, for wiring custom
    /// event sources (and tests)
    pub fn channel(capacity: usize) -> (mpsc::Sender<Pubkey>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            tx,
            Self {
                events: rx,
                producer: None,
            },
        )
    }

    /// Next pool address, `None` once the producer is gone
    pub async fn recv(&mut self) -> Option<Pubkey> {
        self.events.recv().await
    }

    pub fn cancel(mut self) {
        if let Some(handle) = self.producer.take() {
            handle.abort();
        }
    }
}

impl Drop for PoolSubscription {
    fn drop(&mut self) {
        if let Some(handle) = self.producer.take() {
            handle.abort();
        }
    }
}

/// Spawn a producer that polls the program's pair accounts and emits any
/// address not seen on a previous sweep. The first sweep only records a
/// baseline so pre-existing pools are not reported.
pub fn spawn_pair_scanner(
    client: PairClient,
    poll_interval: Duration,
    capacity: usize,
) -> PoolSubscription {
    let (tx, rx) = mpsc::channel(capacity);
    let producer = tokio::spawn(async move {
        let mut known: HashSet<Pubkey> = HashSet::new();
        let mut baseline = true;
        let mut ticker = interval(poll_interval);
        loop {
            ticker.tick().await;
            match client.get_all_pairs().await {
                Ok(pairs) => {
                    for pair in pairs {
                        if known.insert(pair) && !baseline && tx.send(pair).await.is_err() {
                            // Consumer went away
                            return;
                        }
                    }
                    baseline = false;
                }
                Err(e) => log::warn!("pair scan failed: {e}"),
            }
        }
    });
    PoolSubscription {
        events: rx,
        producer: Some(producer),
    }
}

/// Consumer loop matching new pools against a target base asset
pub struct PoolWatcher<M: MetadataSource, N: Notifier> {
    target_base_mint: Pubkey,
    metadata: M,
    notifier: N,
    seen: HashSet<Pubkey>,
}

impl<M: MetadataSource, N: Notifier> PoolWatcher<M, N> {
    pub fn new(target_base_mint: Pubkey, metadata: M, notifier: N) -> Self {
        Self {
            target_base_mint,
            metadata,
            notifier,
            seen: HashSet::new(),
        }
    }

    /// Drain the subscription until its producer shuts down
    pub async fn run(&mut self, subscription: &mut PoolSubscription) {
        while let Some(address) = subscription.recv().await {
            self.process(address).await;
        }
        log::info!("pool subscription closed, watcher stopping");
    }

    async fn process(&mut self, address: Pubkey) {
        if !self.seen.insert(address) {
            log::debug!("pool {address} already handled");
            return;
        }

        let pool = match self.metadata.pool_metadata(&address).await {
            Ok(pool) => pool,
            Err(e) => {
                // Local recovery: one bad pool must not stop the listener
                log::warn!("skipping pool {address}: {e}");
                return;
            }
        };

        if pool.base_mint != self.target_base_mint {
            log::debug!("pool {address} base mint {} is not a match", pool.base_mint);
            return;
        }

        if let Err(e) = self.notifier.notify(&address, &pool).await {
            log::warn!("notification failed for pool {address}: {e}");
        }
    }
}
