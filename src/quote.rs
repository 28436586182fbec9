//! Quote collaborator contract and a spot-price implementation.
//!
//! Real deployments point [`QuoteSource`] at a routing service; the bundled
//! [`SpotQuoteSource`] prices at the active bin only, which is enough to
//! parameterize the demo swap flow.

use solana_sdk::pubkey::Pubkey;

use crate::client::PairClient;
use crate::error::{OpsError, OpsResult};
use crate::slippage::Quote;

/// Parameters for a quote request
#[derive(Clone, Copy, Debug)]
pub struct QuoteRequest {
    pub pair: Pubkey,
    /// Amount on the exact side of the trade
    pub amount: u64,
    /// True when selling token X for token Y
    pub swap_for_y: bool,
    /// True when `amount` fixes the input side
    pub is_exact_input: bool,
    pub slippage_percent: f64,
}

/// Collaborator producing executable quotes
#[allow(async_fn_in_trait)]
pub trait QuoteSource {
    async fn quote(&self, request: &QuoteRequest) -> OpsResult<Quote>;
}

/// Price of one bin: `(1 + bin_step/10_000)^active_id`, token Y per token X
pub fn bin_price(bin_step: u16, active_id: i32) -> f64 {
    (1.0 + bin_step as f64 / 10_000.0).powi(active_id)
}

/// Expected amount on the non-exact side at the current spot price
pub fn spot_expected(
    amount: u64,
    bin_step: u16,
    active_id: i32,
    swap_for_y: bool,
    is_exact_input: bool,
) -> OpsResult<u64> {
    if amount == 0 {
        return Err(OpsError::QuoteComputation("zero trade amount".into()));
    }
    let price = bin_price(bin_step, active_id);
    // Exact-in selling X receives Y at `price`; the other three cases mirror
    let expected = match (swap_for_y, is_exact_input) {
        (true, true) | (false, false) => amount as f64 * price,
        (true, false) | (false, true) => amount as f64 / price,
    };
    if !expected.is_finite() || expected < 0.0 || expected > u64::MAX as f64 {
        return Err(OpsError::QuoteComputation(format!(
            "expected amount out of range at bin {active_id}"
        )));
    }
    Ok(expected.round() as u64)
}

/// Quotes at the current active bin without walking liquidity
pub struct SpotQuoteSource<'a> {
    pub client: &'a PairClient,
}

impl QuoteSource for SpotQuoteSource<'_> {
    async fn quote(&self, request: &QuoteRequest) -> OpsResult<Quote> {
        let pair = self.client.get_pair(&request.pair).await?;
        let expected = spot_expected(
            request.amount,
            pair.bin_step,
            pair.active_id,
            request.swap_for_y,
            request.is_exact_input,
        )?;
        Quote::with_slippage(
            request.amount,
            expected,
            request.slippage_percent,
            request.is_exact_input,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_is_unit_at_bin_zero() {
        assert_eq!(bin_price(20, 0), 1.0);
    }

    #[test]
    fn price_compounds_per_bin() {
        let price = bin_price(100, 2); // 1% per bin, two bins up
        assert!((price - 1.0201).abs() < 1e-12);
        let inverse = bin_price(100, -2);
        assert!((inverse - 1.0 / 1.0201).abs() < 1e-12);
    }

    #[test]
    fn exact_input_sell_x_uses_spot_price() {
        // 1% per bin, one bin above parity: 1000 X -> 1010 Y expected
        assert_eq!(spot_expected(1000, 100, 1, true, true).unwrap(), 1010);
        // buying X with exact input divides by price
        assert_eq!(spot_expected(1010, 100, 1, false, true).unwrap(), 1000);
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = spot_expected(0, 20, 0, true, true).unwrap_err();
        assert!(matches!(err, OpsError::QuoteComputation(_)));
    }
}
