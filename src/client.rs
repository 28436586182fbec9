//! RPC client wrapper for pair and position access.

use std::sync::Arc;

use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, RpcFilterType},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};

use crate::error::{OpsError, OpsResult};
use crate::state::{PairAccount, Position};
use crate::submit::ConfirmingSender;

/// Shared RPC wrapper; read-mostly, passed by reference into each component
#[derive(Clone)]
pub struct PairClient {
    rpc: Arc<RpcClient>,
    program_id: Pubkey,
    commitment: CommitmentConfig,
}

impl PairClient {
    pub fn new(rpc_url: String, program_id: Pubkey, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: Arc::new(RpcClient::new_with_commitment(rpc_url, commitment)),
            program_id,
            commitment,
        }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Fetch and parse a pair account
    pub async fn get_pair(&self, pair: &Pubkey) -> OpsResult<PairAccount> {
        let account = self
            .rpc
            .get_account(pair)
            .await
            .map_err(|e| OpsError::MetadataFetch(format!("pair {pair}: {e}")))?;
        PairAccount::deserialize(pair, &account.data)
    }

    /// Fetch every position `owner` holds in `pair`
    pub async fn get_user_positions(
        &self,
        owner: &Pubkey,
        pair: &Pubkey,
    ) -> OpsResult<Vec<Position>> {
        let filters = vec![
            RpcFilterType::DataSize(Position::LEN as u64),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                Position::PAIR_OFFSET,
                pair.to_bytes().to_vec(),
            )),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                Position::OWNER_OFFSET,
                owner.to_bytes().to_vec(),
            )),
        ];
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..Default::default()
            },
            ..Default::default()
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(&self.program_id, config)
            .await
            .map_err(|e| OpsError::MetadataFetch(format!("positions for {owner}: {e}")))?;

        accounts
            .iter()
            .map(|(address, account)| Position::deserialize(address, &account.data))
            .collect()
    }

    /// List every pair account owned by the program
    pub async fn get_all_pairs(&self) -> OpsResult<Vec<Pubkey>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::DataSize(PairAccount::LEN as u64)]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                data_slice: None,
                min_context_slot: None,
            },
            ..Default::default()
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(&self.program_id, config)
            .await
            .map_err(|e| OpsError::MetadataFetch(format!("pair scan: {e}")))?;

        Ok(accounts.into_iter().map(|(address, _)| address).collect())
    }

    /// Whether an account exists at `address`
    pub async fn account_exists(&self, address: &Pubkey) -> OpsResult<bool> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| OpsError::MetadataFetch(format!("account {address}: {e}")))?;
        Ok(response.value.is_some())
    }
}

impl ConfirmingSender for PairClient {
    async fn latest_blockhash(&self) -> OpsResult<Hash> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> OpsResult<Signature> {
        Ok(self.rpc.send_and_confirm_transaction(transaction).await?)
    }
}
