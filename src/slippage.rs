//! Fixed-point slippage conversion.
//!
//! Slippage arrives as a human percentage (two decimals) and the program
//! wants an integer tolerance against a 10^9 precision base. The canonical
//! derivation rounds the percentage to whole basis points first and then
//! scales; the direct fraction derivation agrees for every representable
//! input and lives only in the tests as an oracle.

use crate::error::{OpsError, OpsResult};

/// Precision base for scaled slippage tolerances (one part in 10^9)
pub const SLIPPAGE_PRECISION: u64 = 1_000_000_000;

const BPS_DENOMINATOR: u128 = 10_000;

/// Convert a percentage slippage into a scaled integer tolerance.
///
/// `0.5%` at base `10^9` yields `5_000_000`.
pub fn to_scaled_tolerance(slippage_percent: f64, precision_base: u64) -> OpsResult<u64> {
    if !slippage_percent.is_finite() || !(0.0..=100.0).contains(&slippage_percent) {
        return Err(OpsError::InvalidParameters(format!(
            "slippage {slippage_percent} outside [0, 100]"
        )));
    }
    let basis_points = (slippage_percent * 100.0).round() as u128;
    Ok((basis_points * precision_base as u128 / BPS_DENOMINATOR) as u64)
}

/// Derive the adverse-movement bound for a quote.
///
/// Exact input: the minimum acceptable output, rounded down. Exact output:
/// the maximum acceptable input, rounded up.
pub fn apply_tolerance(amount: u64, tolerance: u64, precision_base: u64, is_exact_input: bool) -> u64 {
    let amount = amount as u128;
    let tolerance = tolerance as u128;
    let base = precision_base as u128;
    if is_exact_input {
        (amount * (base - tolerance) / base) as u64
    } else {
        (amount * (base + tolerance)).div_ceil(base) as u64
    }
}

/// Execution amount and its tolerance bound, ready to parameterize a swap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    /// Amount on the exact side of the trade
    pub amount: u64,
    /// Bound on the other side: minimum out for exact input, maximum in
    /// for exact output
    pub other_amount_offset: u64,
}

impl Quote {
    pub fn with_slippage(
        amount: u64,
        expected_other_amount: u64,
        slippage_percent: f64,
        is_exact_input: bool,
    ) -> OpsResult<Self> {
        let tolerance = to_scaled_tolerance(slippage_percent, SLIPPAGE_PRECISION)?;
        Ok(Self {
            amount,
            other_amount_offset: apply_tolerance(
                expected_other_amount,
                tolerance,
                SLIPPAGE_PRECISION,
                is_exact_input,
            ),
        })
    }
}
