//! Examination (audit) decisions

use healchain_core::{CallerId, HealchainError, HealchainResult, Record, StateChange, TargetType, Timestamp};
use healchain_state::{LedgerStore, Selector};
use tracing::info;
use uuid::Uuid;

use crate::ledger::FundLedger;
use crate::record::ExamineLog;

impl<S: LedgerStore + ?Sized> FundLedger<S> {
    /// Append an audit decision attributed to `caller`.
    ///
    /// The examined record itself is left as is.
    pub async fn examine(
        &self,
        caller: &CallerId,
        target_id: &str,
        target_type: TargetType,
        comments: &str,
        decision: bool,
    ) -> HealchainResult<ExamineLog> {
        if caller.as_str().is_empty() {
            return Err(HealchainError::InvalidArgument("caller identity is empty".into()));
        }

        let now = Timestamp::now();
        let log = ExamineLog {
            doc_type: ExamineLog::DOC_TYPE.to_string(),
            id: Uuid::new_v4().to_string(),
            target_type,
            target_id: target_id.to_string(),
            auditor_id: caller.as_str().to_string(),
            decision,
            comments: comments.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.commit(vec![StateChange::record(&log)?]).await?;
        info!(
            log = %log.id,
            auditor = %caller,
            target = target_id,
            target_type = %target_type,
            decision,
            "Recorded examination"
        );
        Ok(log)
    }

    /// Decisions recorded against a target
    pub async fn get_examine_logs(&self, target_id: &str) -> HealchainResult<Vec<ExamineLog>> {
        let selector = Selector::doc_type(ExamineLog::DOC_TYPE).eq("target_id", target_id);
        self.query(&selector).await
    }
}
