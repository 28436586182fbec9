//! Instruction builders for the DLMM program.
//!
//! Instruction data is the anchor wire format built by hand: an 8-byte
//! `sha256("global:<name>")[..8]` discriminator followed by little-endian
//! arguments.

use solana_sdk::{
    hash::hashv,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::range::BinRange;
use crate::state::{find_pair_address, find_vault_address};

/// Anchor-style instruction discriminator: `sha256("global:<name>")[..8]`
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let preimage = format!("global:{name}");
    let hash = hashv(&[preimage.as_bytes()]);
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash.to_bytes()[..8]);
    disc
}

/// Build the `initialize_pair` instruction.
///
/// Creates the pair account and its two reserve vaults.
pub fn initialize_pair(
    program_id: &Pubkey,
    payer: &Pubkey,
    token_mint_x: &Pubkey,
    token_mint_y: &Pubkey,
    bin_step: u16,
    active_id: i32,
) -> Instruction {
    let (pair, _) = find_pair_address(token_mint_x, token_mint_y, bin_step, program_id);
    let (vault_x, _) = find_vault_address(&pair, token_mint_x, program_id);
    let (vault_y, _) = find_vault_address(&pair, token_mint_y, program_id);

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(pair, false),
        AccountMeta::new_readonly(*token_mint_x, false),
        AccountMeta::new_readonly(*token_mint_y, false),
        AccountMeta::new(vault_x, false),
        AccountMeta::new(vault_y, false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    let mut data = Vec::with_capacity(8 + 2 + 4);
    data.extend_from_slice(&instruction_discriminator("initialize_pair"));
    data.extend_from_slice(&bin_step.to_le_bytes());
    data.extend_from_slice(&active_id.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Parameters for the `swap` instruction
#[derive(Clone, Copy, Debug)]
pub struct SwapArgs {
    /// Amount on the exact side of the trade
    pub amount: u64,
    /// Minimum out (exact input) or maximum in (exact output)
    pub other_amount_offset: u64,
    /// True when selling token X for token Y
    pub swap_for_y: bool,
    /// True when `amount` fixes the input side
    pub is_exact_input: bool,
}

/// Build the `swap` instruction
#[allow(clippy::too_many_arguments)]
pub fn swap(
    program_id: &Pubkey,
    pair: &Pubkey,
    user: &Pubkey,
    user_source: &Pubkey,
    user_destination: &Pubkey,
    vault_x: &Pubkey,
    vault_y: &Pubkey,
    args: SwapArgs,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*pair, false),
        AccountMeta::new(*user, true),
        AccountMeta::new(*user_source, false),
        AccountMeta::new(*user_destination, false),
        AccountMeta::new(*vault_x, false),
        AccountMeta::new(*vault_y, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    let mut data = Vec::with_capacity(8 + 8 + 8 + 1 + 1);
    data.extend_from_slice(&instruction_discriminator("swap"));
    data.extend_from_slice(&args.amount.to_le_bytes());
    data.extend_from_slice(&args.other_amount_offset.to_le_bytes());
    data.push(args.swap_for_y as u8);
    data.push(args.is_exact_input as u8);

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Build the `decrease_position` instruction removing all liquidity the
/// position holds inside `range`.
#[allow(clippy::too_many_arguments)]
pub fn decrease_position(
    program_id: &Pubkey,
    pair: &Pubkey,
    position: &Pubkey,
    owner: &Pubkey,
    user_token_x: &Pubkey,
    user_token_y: &Pubkey,
    vault_x: &Pubkey,
    vault_y: &Pubkey,
    range: BinRange,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*pair, false),
        AccountMeta::new(*position, false),
        AccountMeta::new(*owner, true),
        AccountMeta::new(*user_token_x, false),
        AccountMeta::new(*user_token_y, false),
        AccountMeta::new(*vault_x, false),
        AccountMeta::new(*vault_y, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    let mut data = Vec::with_capacity(8 + 4 + 4);
    data.extend_from_slice(&instruction_discriminator("decrease_position"));
    data.extend_from_slice(&range.lower.to_le_bytes());
    data.extend_from_slice(&range.upper.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_pair_signs_only_payer() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let ix = initialize_pair(
            &program_id,
            &payer,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            20,
            0,
        );

        assert_eq!(ix.program_id, program_id);
        let signers: Vec<_> = ix.accounts.iter().filter(|m| m.is_signer).collect();
        assert_eq!(signers.len(), 1);
        assert_eq!(signers[0].pubkey, payer);
        assert_eq!(&ix.data[..8], &instruction_discriminator("initialize_pair"));
    }

    #[test]
    fn swap_data_encodes_direction_flags() {
        let ix = swap(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            SwapArgs {
                amount: 1_000_000,
                other_amount_offset: 990_000,
                swap_for_y: true,
                is_exact_input: true,
            },
        );

        assert_eq!(ix.data.len(), 8 + 8 + 8 + 1 + 1);
        assert_eq!(u64::from_le_bytes(ix.data[8..16].try_into().unwrap()), 1_000_000);
        assert_eq!(u64::from_le_bytes(ix.data[16..24].try_into().unwrap()), 990_000);
        assert_eq!(ix.data[24], 1);
        assert_eq!(ix.data[25], 1);
    }

    #[test]
    fn decrease_position_encodes_clipped_range() {
        let ix = decrease_position(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            BinRange { lower: -64, upper: 63 },
        );

        assert_eq!(i32::from_le_bytes(ix.data[8..12].try_into().unwrap()), -64);
        assert_eq!(i32::from_le_bytes(ix.data[12..16].try_into().unwrap()), 63);
    }
}
