//! On-chain account layouts and address derivation for the DLMM program.
//!
//! Accounts follow the anchor convention of an 8-byte discriminator
//! (`sha256("account:<Name>")[..8]`) followed by fixed-offset fields, so
//! parsing is plain little-endian reads against known offsets.

use solana_sdk::{hash::hashv, pubkey::Pubkey};

use crate::error::{OpsError, OpsResult};

/// PDA seeds used by the DLMM program
pub mod seeds {
    pub const PAIR: &[u8] = b"pair";
    pub const VAULT: &[u8] = b"vault";
    pub const POSITION: &[u8] = b"position";
}

/// Anchor-style account discriminator: `sha256("account:<name>")[..8]`
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let preimage = format!("account:{name}");
    let hash = hashv(&[preimage.as_bytes()]);
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash.to_bytes()[..8]);
    disc
}

fn read_pubkey(account: &Pubkey, data: &[u8], offset: usize) -> OpsResult<Pubkey> {
    Pubkey::try_from(&data[offset..offset + 32]).map_err(|_| OpsError::MetadataShape {
        account: *account,
        reason: format!("invalid pubkey at offset {offset}"),
    })
}

fn check_layout(
    account: &Pubkey,
    data: &[u8],
    expected_len: usize,
    expected_disc: &[u8; 8],
    name: &str,
) -> OpsResult<()> {
    if data.len() < expected_len {
        return Err(OpsError::MetadataShape {
            account: *account,
            reason: format!("expected at least {expected_len} bytes, got {}", data.len()),
        });
    }
    if &data[..8] != expected_disc {
        return Err(OpsError::MetadataShape {
            account: *account,
            reason: format!("discriminator does not match {name}"),
        });
    }
    Ok(())
}

/// A two-asset liquidity pool account
#[derive(Clone, Copy, Debug)]
pub struct PairAccount {
    pub address: Pubkey,
    pub token_mint_x: Pubkey,
    pub token_mint_y: Pubkey,
    pub bin_step: u16,
    pub active_id: i32,
}

impl PairAccount {
    pub const LEN: usize = 8 + 32 + 32 + 2 + 4;

    pub fn deserialize(address: &Pubkey, data: &[u8]) -> OpsResult<Self> {
        check_layout(address, data, Self::LEN, &account_discriminator("Pair"), "Pair")?;
        Ok(Self {
            address: *address,
            token_mint_x: read_pubkey(address, data, 8)?,
            token_mint_y: read_pubkey(address, data, 40)?,
            bin_step: u16::from_le_bytes(data[72..74].try_into().unwrap()),
            active_id: i32::from_le_bytes(data[74..78].try_into().unwrap()),
        })
    }
}

/// A user's liquidity position spanning a contiguous bin range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub address: Pubkey,
    pub pair: Pubkey,
    pub owner: Pubkey,
    pub position_mint: Pubkey,
    pub lower_bin_id: i32,
    pub upper_bin_id: i32,
}

impl Position {
    pub const LEN: usize = 8 + 32 + 32 + 32 + 4 + 4;

    /// Byte offset of the `pair` field, used as a memcmp filter
    pub const PAIR_OFFSET: usize = 8;
    /// Byte offset of the `owner` field, used as a memcmp filter
    pub const OWNER_OFFSET: usize = 40;

    pub fn deserialize(address: &Pubkey, data: &[u8]) -> OpsResult<Self> {
        check_layout(
            address,
            data,
            Self::LEN,
            &account_discriminator("Position"),
            "Position",
        )?;
        Ok(Self {
            address: *address,
            pair: read_pubkey(address, data, 8)?,
            owner: read_pubkey(address, data, 40)?,
            position_mint: read_pubkey(address, data, 72)?,
            lower_bin_id: i32::from_le_bytes(data[104..108].try_into().unwrap()),
            upper_bin_id: i32::from_le_bytes(data[108..112].try_into().unwrap()),
        })
    }
}

/// Derive the pair PDA for a mint pair and bin step
pub fn find_pair_address(
    token_mint_x: &Pubkey,
    token_mint_y: &Pubkey,
    bin_step: u16,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            seeds::PAIR,
            token_mint_x.as_ref(),
            token_mint_y.as_ref(),
            &bin_step.to_le_bytes(),
        ],
        program_id,
    )
}

/// Derive the vault PDA holding one side of a pair's reserves
pub fn find_vault_address(pair: &Pubkey, mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::VAULT, pair.as_ref(), mint.as_ref()], program_id)
}

/// Derive the position PDA for a pair and position mint
pub fn find_position_address(
    pair: &Pubkey,
    position_mint: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[seeds::POSITION, pair.as_ref(), position_mint.as_ref()],
        program_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_bytes(mint_x: &Pubkey, mint_y: &Pubkey, bin_step: u16, active_id: i32) -> Vec<u8> {
        let mut data = Vec::with_capacity(PairAccount::LEN);
        data.extend_from_slice(&account_discriminator("Pair"));
        data.extend_from_slice(mint_x.as_ref());
        data.extend_from_slice(mint_y.as_ref());
        data.extend_from_slice(&bin_step.to_le_bytes());
        data.extend_from_slice(&active_id.to_le_bytes());
        data
    }

    #[test]
    fn parses_pair_account() {
        let address = Pubkey::new_unique();
        let mint_x = Pubkey::new_unique();
        let mint_y = Pubkey::new_unique();
        let data = pair_bytes(&mint_x, &mint_y, 20, -113);

        let pair = PairAccount::deserialize(&address, &data).unwrap();
        assert_eq!(pair.token_mint_x, mint_x);
        assert_eq!(pair.token_mint_y, mint_y);
        assert_eq!(pair.bin_step, 20);
        assert_eq!(pair.active_id, -113);
    }

    #[test]
    fn rejects_wrong_discriminator() {
        let address = Pubkey::new_unique();
        let mut data = pair_bytes(&Pubkey::new_unique(), &Pubkey::new_unique(), 1, 0);
        data[..8].copy_from_slice(&account_discriminator("Position"));

        let err = PairAccount::deserialize(&address, &data).unwrap_err();
        assert!(matches!(err, OpsError::MetadataShape { account, .. } if account == address));
    }

    #[test]
    fn rejects_truncated_position() {
        let address = Pubkey::new_unique();
        let mut data = account_discriminator("Position").to_vec();
        data.extend_from_slice(&[0u8; 40]);

        assert!(Position::deserialize(&address, &data).is_err());
    }
}
