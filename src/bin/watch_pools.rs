//! Watch for newly created pools whose base asset matches a target mint.
//!
//! Runs until killed. Pools that exist before startup form the baseline and
//! are not reported.

use std::time::Duration;

use dlmm_ops::watcher::{spawn_pair_scanner, LogNotifier, PoolWatcher};
use dlmm_ops::OpsConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = OpsConfig::from_env()?;
    let target_base_mint = config.require_target_base_mint()?;
    let client = config.client()?;

    log::info!(
        "watching program {} for pools with base mint {target_base_mint} (poll every {}s)",
        config.program_id,
        config.scan_interval_secs
    );

    let mut subscription = spawn_pair_scanner(
        client.clone(),
        Duration::from_secs(config.scan_interval_secs),
        64,
    );
    let mut watcher = PoolWatcher::new(target_base_mint, client, LogNotifier);
    watcher.run(&mut subscription).await;
    Ok(())
}
