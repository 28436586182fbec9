//! Batched transaction assembly for ranged liquidity removal.
//!
//! A batch carries three ordered roles: an optional account-setup unit, one
//! or more transfer units, and an optional account-teardown unit. Execution
//! order is exactly setup, then transfers, then teardown; anything else can
//! fund an uninitialized account or close one still holding value.

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};

use crate::client::PairClient;
use crate::error::{OpsError, OpsResult};
use crate::instructions;
use crate::range::{BinRange, ClippedPosition};
use crate::state::{find_vault_address, PairAccount};

/// Logical role of one transaction unit within a batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchRole {
    Setup,
    Transfer,
    Teardown,
}

/// The three transaction roles a removal collaborator reports back
#[derive(Clone, Debug, Default)]
pub struct BatchPlan {
    pub setup: Option<Vec<Instruction>>,
    pub transfers: Vec<Vec<Instruction>>,
    pub teardown: Option<Vec<Instruction>>,
}

/// An ordered, immutable sequence of transaction units
#[derive(Clone, Debug)]
pub struct TransactionBatch {
    setup: Option<Vec<Instruction>>,
    transfers: Vec<Vec<Instruction>>,
    teardown: Option<Vec<Instruction>>,
}

impl TransactionBatch {
    /// Build the batch once from the collaborator's response; roles the
    /// collaborator reported as unnecessary are simply absent.
    pub fn assemble(plan: BatchPlan) -> Self {
        Self {
            setup: plan.setup.filter(|ixs| !ixs.is_empty()),
            transfers: plan.transfers,
            teardown: plan.teardown.filter(|ixs| !ixs.is_empty()),
        }
    }

    /// Batch holding one transfer-role unit, for single-transaction ops
    pub fn single(instructions: Vec<Instruction>) -> Self {
        Self::assemble(BatchPlan {
            transfers: vec![instructions],
            ..BatchPlan::default()
        })
    }

    /// Units in execution order
    pub fn units(&self) -> impl Iterator<Item = (BatchRole, &[Instruction])> {
        self.setup
            .iter()
            .map(|ixs| (BatchRole::Setup, ixs.as_slice()))
            .chain(
                self.transfers
                    .iter()
                    .map(|ixs| (BatchRole::Transfer, ixs.as_slice())),
            )
            .chain(
                self.teardown
                    .iter()
                    .map(|ixs| (BatchRole::Teardown, ixs.as_slice())),
            )
    }

    pub fn len(&self) -> usize {
        self.setup.iter().count() + self.transfers.len() + self.teardown.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collaborator that turns clipped ranges into the three transaction roles
#[allow(async_fn_in_trait)]
pub trait RemovalPlanner {
    async fn plan(&self, clipped: &[ClippedPosition]) -> OpsResult<BatchPlan>;
}

/// Assemble a removal batch for the given clipped ranges.
///
/// Fails with [`OpsError::NoPositionsInRange`] before touching the planner
/// when `clipped` is empty, so the no-match case costs no network round-trip.
pub async fn build_removal_batch<P: RemovalPlanner>(
    clipped: &[ClippedPosition],
    query: BinRange,
    planner: &P,
) -> OpsResult<TransactionBatch> {
    if clipped.is_empty() {
        return Err(OpsError::NoPositionsInRange {
            lower: query.lower,
            upper: query.upper,
        });
    }
    let plan = planner.plan(clipped).await?;
    Ok(TransactionBatch::assemble(plan))
}

/// Concrete planner: setup creates any missing associated token accounts,
/// each transfer drains one clipped range, teardown closes the wrapped-SOL
/// account so withdrawn lamports land back in the wallet.
pub struct WithdrawPlanner<'a> {
    pub client: &'a PairClient,
    pub pair: PairAccount,
    pub owner: Pubkey,
}

impl WithdrawPlanner<'_> {
    fn user_token_accounts(&self) -> (Pubkey, Pubkey) {
        (
            get_associated_token_address(&self.owner, &self.pair.token_mint_x),
            get_associated_token_address(&self.owner, &self.pair.token_mint_y),
        )
    }
}

impl RemovalPlanner for WithdrawPlanner<'_> {
    async fn plan(&self, clipped: &[ClippedPosition]) -> OpsResult<BatchPlan> {
        let program_id = self.client.program_id();
        let pair = self.pair.address;
        let (user_token_x, user_token_y) = self.user_token_accounts();
        let (vault_x, _) = find_vault_address(&pair, &self.pair.token_mint_x, &program_id);
        let (vault_y, _) = find_vault_address(&pair, &self.pair.token_mint_y, &program_id);

        let mut setup = Vec::new();
        for (token_account, mint) in [
            (user_token_x, self.pair.token_mint_x),
            (user_token_y, self.pair.token_mint_y),
        ] {
            if !self.client.account_exists(&token_account).await? {
                setup.push(create_associated_token_account(
                    &self.owner,
                    &self.owner,
                    &mint,
                    &spl_token::id(),
                ));
            }
        }

        let transfers = clipped
            .iter()
            .map(|clip| {
                vec![instructions::decrease_position(
                    &program_id,
                    &pair,
                    &clip.position.address,
                    &self.owner,
                    &user_token_x,
                    &user_token_y,
                    &vault_x,
                    &vault_y,
                    clip.range,
                )]
            })
            .collect();

        // Unwrap withdrawn SOL when one side of the pair is the native mint
        let mut teardown = Vec::new();
        for (token_account, mint) in [
            (user_token_x, self.pair.token_mint_x),
            (user_token_y, self.pair.token_mint_y),
        ] {
            if mint == spl_token::native_mint::id() {
                let close = spl_token::instruction::close_account(
                    &spl_token::id(),
                    &token_account,
                    &self.owner,
                    &self.owner,
                    &[],
                )
                .map_err(|e| OpsError::InvalidParameters(e.to_string()))?;
                teardown.push(close);
            }
        }

        Ok(BatchPlan {
            setup: (!setup.is_empty()).then_some(setup),
            transfers,
            teardown: (!teardown.is_empty()).then_some(teardown),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Position;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn marker(tag: u8) -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![],
            data: vec![tag],
        }
    }

    struct RecordingPlanner {
        invoked: AtomicBool,
        plan: BatchPlan,
    }

    impl RemovalPlanner for RecordingPlanner {
        async fn plan(&self, _clipped: &[ClippedPosition]) -> OpsResult<BatchPlan> {
            self.invoked.store(true, Ordering::SeqCst);
            Ok(self.plan.clone())
        }
    }

    fn clipped_position() -> ClippedPosition {
        ClippedPosition {
            position: Position {
                address: Pubkey::new_unique(),
                pair: Pubkey::new_unique(),
                owner: Pubkey::new_unique(),
                position_mint: Pubkey::new_unique(),
                lower_bin_id: 0,
                upper_bin_id: 10,
            },
            range: BinRange { lower: 0, upper: 10 },
        }
    }

    #[tokio::test]
    async fn empty_ranges_fail_before_planner_runs() {
        let planner = RecordingPlanner {
            invoked: AtomicBool::new(false),
            plan: BatchPlan::default(),
        };
        let query = BinRange { lower: 90, upper: 110 };

        let err = build_removal_batch(&[], query, &planner).await.unwrap_err();
        assert!(matches!(
            err,
            OpsError::NoPositionsInRange { lower: 90, upper: 110 }
        ));
        assert!(!planner.invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn units_iterate_setup_transfers_teardown() {
        let planner = RecordingPlanner {
            invoked: AtomicBool::new(false),
            plan: BatchPlan {
                setup: Some(vec![marker(0)]),
                transfers: vec![vec![marker(1)], vec![marker(2)]],
                teardown: Some(vec![marker(3)]),
            },
        };
        let query = BinRange { lower: 0, upper: 10 };

        let batch = build_removal_batch(&[clipped_position()], query, &planner)
            .await
            .unwrap();
        assert!(planner.invoked.load(Ordering::SeqCst));
        assert_eq!(batch.len(), 4);

        let order: Vec<_> = batch
            .units()
            .map(|(role, ixs)| (role, ixs[0].data[0]))
            .collect();
        assert_eq!(
            order,
            vec![
                (BatchRole::Setup, 0),
                (BatchRole::Transfer, 1),
                (BatchRole::Transfer, 2),
                (BatchRole::Teardown, 3),
            ]
        );
    }

    #[tokio::test]
    async fn absent_roles_are_omitted() {
        let planner = RecordingPlanner {
            invoked: AtomicBool::new(false),
            plan: BatchPlan {
                setup: None,
                transfers: vec![vec![marker(1)]],
                teardown: Some(vec![]),
            },
        };
        let query = BinRange { lower: 0, upper: 10 };

        let batch = build_removal_batch(&[clipped_position()], query, &planner)
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch
            .units()
            .all(|(role, _)| role == BatchRole::Transfer));
    }
}
