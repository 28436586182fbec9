//! Create a new DLMM pair for a configured mint pair.

use dlmm_ops::batch::TransactionBatch;
use dlmm_ops::instructions;
use dlmm_ops::state::find_pair_address;
use dlmm_ops::submit::SequentialSubmitter;
use dlmm_ops::OpsConfig;
use solana_sdk::signer::Signer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = OpsConfig::from_env()?;
    let (token_mint_x, token_mint_y) = config.require_mints()?;
    let payer = config.load_keypair()?;
    let client = config.client()?;

    let (pair, _) = find_pair_address(
        &token_mint_x,
        &token_mint_y,
        config.bin_step,
        &config.program_id,
    );
    log::info!(
        "creating pair {pair} ({token_mint_x} / {token_mint_y}, bin step {}, active bin {})",
        config.bin_step,
        config.active_id
    );

    let ix = instructions::initialize_pair(
        &config.program_id,
        &payer.pubkey(),
        &token_mint_x,
        &token_mint_y,
        config.bin_step,
        config.active_id,
    );
    let batch = TransactionBatch::single(vec![ix]);

    let signatures = SequentialSubmitter::new(&client, &payer).submit(&batch).await?;
    log::info!("pair {pair} created: {}", signatures[0]);
    Ok(())
}
