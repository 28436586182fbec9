//! Quote and execute a swap against a configured pair.

use dlmm_ops::batch::TransactionBatch;
use dlmm_ops::instructions::{self, SwapArgs};
use dlmm_ops::quote::{QuoteRequest, QuoteSource, SpotQuoteSource};
use dlmm_ops::state::find_vault_address;
use dlmm_ops::submit::SequentialSubmitter;
use dlmm_ops::{OpsConfig, OpsError};
use solana_sdk::signer::Signer;
use spl_associated_token_account::get_associated_token_address;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = OpsConfig::from_env()?;
    let pair_address = config.require_pair()?;
    if config.amount == 0 {
        return Err(OpsError::Config("amount (DLMM_AMOUNT) is required".into()).into());
    }
    let payer = config.load_keypair()?;
    let client = config.client()?;

    let pair = client.get_pair(&pair_address).await?;
    log::info!(
        "pair {pair_address}: active bin {}, bin step {}",
        pair.active_id,
        pair.bin_step
    );

    let quote = SpotQuoteSource { client: &client }
        .quote(&QuoteRequest {
            pair: pair_address,
            amount: config.amount,
            swap_for_y: config.swap_for_y,
            is_exact_input: config.is_exact_input,
            slippage_percent: config.slippage_percent,
        })
        .await?;
    log::info!(
        "quote: amount {} with bound {} ({}% slippage)",
        quote.amount,
        quote.other_amount_offset,
        config.slippage_percent
    );

    let (source_mint, destination_mint) = if config.swap_for_y {
        (pair.token_mint_x, pair.token_mint_y)
    } else {
        (pair.token_mint_y, pair.token_mint_x)
    };
    let user = payer.pubkey();
    let (vault_x, _) = find_vault_address(&pair_address, &pair.token_mint_x, &config.program_id);
    let (vault_y, _) = find_vault_address(&pair_address, &pair.token_mint_y, &config.program_id);

    let ix = instructions::swap(
        &config.program_id,
        &pair_address,
        &user,
        &get_associated_token_address(&user, &source_mint),
        &get_associated_token_address(&user, &destination_mint),
        &vault_x,
        &vault_y,
        SwapArgs {
            amount: quote.amount,
            other_amount_offset: quote.other_amount_offset,
            swap_for_y: config.swap_for_y,
            is_exact_input: config.is_exact_input,
        },
    );

    let signatures = SequentialSubmitter::new(&client, &payer)
        .submit(&TransactionBatch::single(vec![ix]))
        .await?;
    log::info!("swap confirmed: {}", signatures[0]);
    Ok(())
}
