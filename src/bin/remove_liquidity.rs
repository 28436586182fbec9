//! Remove liquidity across a bin range around the active bin.
//!
//! Fetches the pair and the wallet's positions, clips each position to
//! `[active_id - radius, active_id + radius]`, and submits the resulting
//! setup / transfer / teardown batch strictly in order.

use dlmm_ops::batch::{build_removal_batch, WithdrawPlanner};
use dlmm_ops::range::{resolve, BinRange};
use dlmm_ops::submit::SequentialSubmitter;
use dlmm_ops::OpsConfig;
use solana_sdk::signer::Signer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = OpsConfig::from_env()?;
    let pair_address = config.require_pair()?;
    let payer = config.load_keypair()?;
    let owner = payer.pubkey();
    let client = config.client()?;

    let pair = client.get_pair(&pair_address).await?;
    let query = BinRange::around(pair.active_id, config.bin_range_radius)?;
    log::info!(
        "removing liquidity from {pair_address} in bins [{}, {}] (active {})",
        query.lower,
        query.upper,
        pair.active_id
    );

    let positions = client.get_user_positions(&owner, &pair_address).await?;
    log::info!("wallet holds {} position(s) in pair", positions.len());

    let clipped = resolve(&positions, query);
    for clip in &clipped {
        log::info!(
            "position {} [{}, {}] clipped to [{}, {}]",
            clip.position.address,
            clip.position.lower_bin_id,
            clip.position.upper_bin_id,
            clip.range.lower,
            clip.range.upper
        );
    }

    let planner = WithdrawPlanner {
        client: &client,
        pair,
        owner,
    };
    let batch = build_removal_batch(&clipped, query, &planner).await?;
    log::info!("submitting {} transaction unit(s)", batch.len());

    let signatures = SequentialSubmitter::new(&client, &payer).submit(&batch).await?;
    for signature in &signatures {
        log::info!("confirmed: {signature}");
    }
    Ok(())
}
