//! Donations: debit donor, credit project, append a transaction

use healchain_core::{Amount, HealchainError, HealchainResult, Record, StateChange, Status, Timestamp};
use healchain_crypto::record_digest;
use healchain_state::{LedgerStore, Selector};
use tracing::{info, warn};
use uuid::Uuid;

use crate::ledger::FundLedger;
use crate::record::{RaiseProject, Transaction, User, TX_TYPE_DONATION};

/// Content digest stored in `Transaction::blockchain_hash`
pub fn transaction_digest(
    id: &str,
    raise_project_id: &str,
    donor_id: &str,
    amount: Amount,
    timestamp: Timestamp,
) -> String {
    record_digest(&[
        id.as_bytes(),
        raise_project_id.as_bytes(),
        donor_id.as_bytes(),
        &amount.value().to_le_bytes(),
        &timestamp.as_secs().to_le_bytes(),
    ])
}

impl<S: LedgerStore + ?Sized> FundLedger<S> {
    /// Move `amount` from a donor's balance into a raise project.
    ///
    /// Donor, project and transaction are committed together; a rejected
    /// donation leaves the store untouched.
    pub async fn donate(
        &self,
        donor_id: &str,
        project_id: &str,
        amount: Amount,
    ) -> HealchainResult<Transaction> {
        if !amount.is_positive() {
            return Err(HealchainError::InvalidArgument(format!(
                "donation amount must be positive, got {}",
                amount
            )));
        }

        let mut donor: User = self.require(donor_id).await?;
        if donor.balance < amount {
            warn!(donor = donor_id, %amount, balance = %donor.balance, "Donation rejected");
            return Err(HealchainError::InsufficientFunds {
                required: amount.value(),
                available: donor.balance.value(),
            });
        }

        let mut project: RaiseProject = self.require(project_id).await?;

        let now = Timestamp::now();
        donor.balance = donor
            .balance
            .checked_sub(amount)
            .ok_or_else(|| HealchainError::InvalidArgument(format!("amount {} underflows", amount)))?;
        donor.updated_at = now;

        project.current_amount = project
            .current_amount
            .checked_add(amount)
            .ok_or_else(|| HealchainError::InvalidArgument(format!("amount {} overflows", amount)))?;
        if project.is_funded() {
            project.status = Status::Completed;
        }
        project.updated_at = now;

        let id = Uuid::new_v4().to_string();
        let tx = Transaction {
            doc_type: Transaction::DOC_TYPE.to_string(),
            blockchain_hash: transaction_digest(&id, project_id, donor_id, amount, now),
            id,
            raise_project_id: project_id.to_string(),
            donor_id: donor_id.to_string(),
            amount,
            tx_type: TX_TYPE_DONATION.to_string(),
            timestamp: now,
        };

        self.commit(vec![
            StateChange::record(&donor)?,
            StateChange::record(&project)?,
            StateChange::record(&tx)?,
        ])
        .await?;

        info!(
            tx = %tx.id,
            donor = donor_id,
            project = project_id,
            %amount,
            raised = %project.current_amount,
            status = %project.status,
            "Donation committed"
        );
        Ok(tx)
    }

    /// Donations made by a user
    pub async fn get_tx_by_uid(&self, user_id: &str) -> HealchainResult<Vec<Transaction>> {
        let selector = Selector::doc_type(Transaction::DOC_TYPE).eq("donor_id", user_id);
        self.query(&selector).await
    }

    /// Donations received by a project
    pub async fn get_tx_by_pid(&self, project_id: &str) -> HealchainResult<Vec<Transaction>> {
        let selector = Selector::doc_type(Transaction::DOC_TYPE).eq("raise_project_id", project_id);
        self.query(&selector).await
    }
}
