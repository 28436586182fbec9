//! Sequential signing and confirmation of a transaction batch.

use solana_sdk::{
    hash::Hash,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};

use crate::batch::TransactionBatch;
use crate::error::OpsResult;

/// Network seam for the submitter: blockhash lookup plus confirmed sends
#[allow(async_fn_in_trait)]
pub trait ConfirmingSender {
    async fn latest_blockhash(&self) -> OpsResult<Hash>;
    async fn send_and_confirm(&self, transaction: &Transaction) -> OpsResult<Signature>;
}

/// Signs, sends, and confirms each batch unit strictly in order.
///
/// Unit *n+1* is not signed until unit *n* is confirmed: transfers fund
/// accounts the setup unit creates, and teardown closes accounts the
/// transfers must have drained first. A failed unit aborts the remainder of
/// the batch with no retry; recovery belongs to the operator.
pub struct SequentialSubmitter<'a, S: ConfirmingSender> {
    sender: &'a S,
    payer: &'a Keypair,
}

impl<'a, S: ConfirmingSender> SequentialSubmitter<'a, S> {
    pub fn new(sender: &'a S, payer: &'a Keypair) -> Self {
        Self { sender, payer }
    }

    /// Submit the whole batch, returning one signature per confirmed unit
    pub async fn submit(&self, batch: &TransactionBatch) -> OpsResult<Vec<Signature>> {
        let total = batch.len();
        let mut signatures = Vec::with_capacity(total);

        for (index, (role, instructions)) in batch.units().enumerate() {
            // A fresh blockhash per unit keeps long batches valid at send time
            let blockhash = self.sender.latest_blockhash().await?;
            let transaction = Transaction::new_signed_with_payer(
                instructions,
                Some(&self.payer.pubkey()),
                &[self.payer],
                blockhash,
            );

            log::info!("sending {:?} unit {}/{}", role, index + 1, total);
            let signature = self.sender.send_and_confirm(&transaction).await?;
            log::info!("confirmed {:?} unit {}/{}: {}", role, index + 1, total, signature);
            signatures.push(signature);
        }

        Ok(signatures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchPlan, TransactionBatch};
    use crate::error::OpsError;
    use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
    use std::sync::Mutex;

    struct MockSender {
        sent: Mutex<Vec<u8>>,
        fail_at: Option<usize>,
    }

    impl MockSender {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_at,
            }
        }

        fn sent_tags(&self) -> Vec<u8> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl ConfirmingSender for MockSender {
        async fn latest_blockhash(&self) -> OpsResult<Hash> {
            Ok(Hash::new_unique())
        }

        async fn send_and_confirm(&self, transaction: &Transaction) -> OpsResult<Signature> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_at == Some(sent.len()) {
                return Err(OpsError::NetworkSubmission("unit rejected".into()));
            }
            // First byte of the first instruction tags the unit
            sent.push(transaction.message.instructions[0].data[0]);
            Ok(Signature::new_unique())
        }
    }

    fn marker(tag: u8) -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![],
            data: vec![tag],
        }
    }

    fn four_unit_batch() -> TransactionBatch {
        TransactionBatch::assemble(BatchPlan {
            setup: Some(vec![marker(0)]),
            transfers: vec![vec![marker(1)], vec![marker(2)]],
            teardown: Some(vec![marker(3)]),
        })
    }

    #[tokio::test]
    async fn submits_units_in_role_order() {
        let sender = MockSender::new(None);
        let payer = Keypair::new();
        let submitter = SequentialSubmitter::new(&sender, &payer);

        let signatures = submitter.submit(&four_unit_batch()).await.unwrap();
        assert_eq!(signatures.len(), 4);
        // Setup is sent before any transfer, teardown after every transfer
        assert_eq!(sender.sent_tags(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn failed_unit_aborts_the_rest() {
        // Second unit (first transfer) fails
        let sender = MockSender::new(Some(1));
        let payer = Keypair::new();
        let submitter = SequentialSubmitter::new(&sender, &payer);

        let err = submitter.submit(&four_unit_batch()).await.unwrap_err();
        assert!(matches!(err, OpsError::NetworkSubmission(_)));
        // Only the setup unit ever reached the network
        assert_eq!(sender.sent_tags(), vec![0]);
    }

    #[tokio::test]
    async fn empty_batch_submits_nothing() {
        let sender = MockSender::new(None);
        let payer = Keypair::new();
        let submitter = SequentialSubmitter::new(&sender, &payer);

        let batch = TransactionBatch::assemble(BatchPlan::default());
        let signatures = submitter.submit(&batch).await.unwrap();
        assert!(signatures.is_empty());
        assert!(sender.sent_tags().is_empty());
    }
}
