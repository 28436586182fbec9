//! Operator configuration.
//!
//! The one-shot binaries take no CLI flags: configuration comes from a TOML
//! file named by `DLMM_OPS_CONFIG`, or directly from `DLMM_*` environment
//! variables.

use std::str::FromStr;
use std::{env, fs};

use serde::{Deserialize, Serialize};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
};

use crate::client::PairClient;
use crate::error::{OpsError, OpsResult};

/// Serde helpers for pubkeys as base58 strings
mod pubkey_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let value = String::deserialize(deserializer)?;
        Pubkey::from_str(&value).map_err(serde::de::Error::custom)
    }
}

mod opt_pubkey_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(
        pubkey: &Option<Pubkey>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match pubkey {
            Some(pubkey) => serializer.serialize_some(&pubkey.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Pubkey>, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        value
            .map(|v| Pubkey::from_str(&v).map_err(serde::de::Error::custom))
            .transpose()
    }
}

fn default_rpc_url() -> String {
    "https://api.devnet.solana.com".to_string()
}

fn default_keypair_path() -> String {
    let home = env::var("HOME").unwrap_or_default();
    format!("{home}/.config/solana/id.json")
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_bin_step() -> u16 {
    20
}

fn default_radius() -> i32 {
    10
}

fn default_slippage() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

fn default_scan_interval() -> u64 {
    10
}

/// Configuration shared by the operator binaries
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpsConfig {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// DLMM program id
    #[serde(with = "pubkey_serde")]
    pub program_id: Pubkey,

    /// Target pair, required by swap and remove-liquidity
    #[serde(default, with = "opt_pubkey_serde")]
    pub pair: Option<Pubkey>,

    /// Mint pair, required by create-pool
    #[serde(default, with = "opt_pubkey_serde")]
    pub token_mint_x: Option<Pubkey>,
    #[serde(default, with = "opt_pubkey_serde")]
    pub token_mint_y: Option<Pubkey>,

    /// Base asset the watcher matches new pools against
    #[serde(default, with = "opt_pubkey_serde")]
    pub target_base_mint: Option<Pubkey>,

    /// Payer keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,

    /// Transaction commitment level
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Bin step for pool creation (basis points per bin)
    #[serde(default = "default_bin_step")]
    pub bin_step: u16,

    /// Initial active bin for pool creation
    #[serde(default)]
    pub active_id: i32,

    /// Half-width of the removal query range around the active bin
    #[serde(default = "default_radius")]
    pub bin_range_radius: i32,

    /// Trade amount in smallest units
    #[serde(default)]
    pub amount: u64,

    /// Maximum tolerated adverse price movement, percent
    #[serde(default = "default_slippage")]
    pub slippage_percent: f64,

    /// Trade direction: sell token X for token Y
    #[serde(default = "default_true")]
    pub swap_for_y: bool,

    /// Whether `amount` fixes the input side
    #[serde(default = "default_true")]
    pub is_exact_input: bool,

    /// Watcher poll interval in seconds
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_pubkey(key: &str) -> OpsResult<Option<Pubkey>> {
    env_var(key)
        .map(|v| {
            Pubkey::from_str(&v).map_err(|e| OpsError::Config(format!("{key} is not a pubkey: {e}")))
        })
        .transpose()
}

fn env_parse<T: FromStr>(key: &str, default: T) -> OpsResult<T> {
    match env_var(key) {
        Some(v) => v
            .parse()
            .map_err(|_| OpsError::Config(format!("{key} has invalid value {v:?}"))),
        None => Ok(default),
    }
}

impl OpsConfig {
    /// Load from the file named by `DLMM_OPS_CONFIG`, else from `DLMM_*`
    /// environment variables
    pub fn from_env() -> OpsResult<Self> {
        if let Some(path) = env_var("DLMM_OPS_CONFIG") {
            return Self::load(&path);
        }

        let program_id = env_pubkey("DLMM_PROGRAM_ID")?
            .ok_or_else(|| OpsError::Config("DLMM_PROGRAM_ID is required".into()))?;

        let config = Self {
            rpc_url: env_var("DLMM_RPC_URL").unwrap_or_else(default_rpc_url),
            program_id,
            pair: env_pubkey("DLMM_PAIR")?,
            token_mint_x: env_pubkey("DLMM_TOKEN_MINT_X")?,
            token_mint_y: env_pubkey("DLMM_TOKEN_MINT_Y")?,
            target_base_mint: env_pubkey("DLMM_TARGET_BASE_MINT")?,
            keypair_path: env_var("DLMM_KEYPAIR").unwrap_or_else(default_keypair_path),
            commitment: env_var("DLMM_COMMITMENT").unwrap_or_else(default_commitment),
            bin_step: env_parse("DLMM_BIN_STEP", default_bin_step())?,
            active_id: env_parse("DLMM_ACTIVE_ID", 0)?,
            bin_range_radius: env_parse("DLMM_RANGE_RADIUS", default_radius())?,
            amount: env_parse("DLMM_AMOUNT", 0)?,
            slippage_percent: env_parse("DLMM_SLIPPAGE_PCT", default_slippage())?,
            swap_for_y: env_parse("DLMM_SWAP_FOR_Y", true)?,
            is_exact_input: env_parse("DLMM_EXACT_INPUT", true)?,
            scan_interval_secs: env_parse("DLMM_SCAN_INTERVAL_SECS", default_scan_interval())?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &str) -> OpsResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| OpsError::Config(format!("failed to read {path}: {e}")))?;
        let config: OpsConfig = toml::from_str(&content)
            .map_err(|e| OpsError::Config(format!("failed to parse {path}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> OpsResult<()> {
        if !(0.0..=100.0).contains(&self.slippage_percent) {
            return Err(OpsError::Config(format!(
                "slippage_percent {} outside [0, 100]",
                self.slippage_percent
            )));
        }
        if self.bin_range_radius < 0 {
            return Err(OpsError::Config(format!(
                "bin_range_radius {} is negative",
                self.bin_range_radius
            )));
        }
        if self.bin_step == 0 {
            return Err(OpsError::Config("bin_step must be nonzero".into()));
        }
        if self.scan_interval_secs == 0 {
            return Err(OpsError::Config("scan_interval_secs must be nonzero".into()));
        }
        Ok(())
    }

    pub fn commitment(&self) -> OpsResult<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|e| OpsError::Config(format!("invalid commitment {:?}: {e}", self.commitment)))
    }

    pub fn load_keypair(&self) -> OpsResult<Keypair> {
        read_keypair_file(&self.keypair_path)
            .map_err(|e| OpsError::Config(format!("failed to read keypair {}: {e}", self.keypair_path)))
    }

    pub fn client(&self) -> OpsResult<PairClient> {
        Ok(PairClient::new(
            self.rpc_url.clone(),
            self.program_id,
            self.commitment()?,
        ))
    }

    pub fn require_pair(&self) -> OpsResult<Pubkey> {
        self.pair
            .ok_or_else(|| OpsError::Config("pair (DLMM_PAIR) is required for this operation".into()))
    }

    pub fn require_mints(&self) -> OpsResult<(Pubkey, Pubkey)> {
        match (self.token_mint_x, self.token_mint_y) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(OpsError::Config(
                "token_mint_x and token_mint_y (DLMM_TOKEN_MINT_X/Y) are required".into(),
            )),
        }
    }

    pub fn require_target_base_mint(&self) -> OpsResult<Pubkey> {
        self.target_base_mint.ok_or_else(|| {
            OpsError::Config("target_base_mint (DLMM_TARGET_BASE_MINT) is required".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let program_id = Pubkey::new_unique();
        let pair = Pubkey::new_unique();
        let toml = format!(
            "program_id = \"{program_id}\"\npair = \"{pair}\"\namount = 1000000\n"
        );

        let config: OpsConfig = toml::from_str(&toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.program_id, program_id);
        assert_eq!(config.pair, Some(pair));
        assert_eq!(config.amount, 1_000_000);
        assert_eq!(config.slippage_percent, 0.5);
        assert_eq!(config.commitment, "confirmed");
        assert!(config.token_mint_x.is_none());
    }

    #[test]
    fn rejects_out_of_range_slippage() {
        let toml = format!(
            "program_id = \"{}\"\nslippage_percent = 250.0\n",
            Pubkey::new_unique()
        );
        let config: OpsConfig = toml::from_str(&toml).unwrap();
        assert!(matches!(config.validate(), Err(OpsError::Config(_))));
    }

    #[test]
    fn missing_operation_inputs_error_cleanly() {
        let toml = format!("program_id = \"{}\"\n", Pubkey::new_unique());
        let config: OpsConfig = toml::from_str(&toml).unwrap();
        assert!(config.require_pair().is_err());
        assert!(config.require_mints().is_err());
        assert!(config.require_target_base_mint().is_err());
    }
}
