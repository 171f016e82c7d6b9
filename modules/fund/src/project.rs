//! Raise projects and medical bills

use healchain_core::{Amount, HealchainError, HealchainResult, Record, StateChange, Status, Timestamp};
use healchain_state::{decode_records, LedgerStore, Selector};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::ledger::FundLedger;
use crate::record::{MedicalBill, RaiseProject};

/// One page of raise projects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPage {
    pub records: Vec<RaiseProject>,
    pub fetched_count: usize,
    /// Pass back to continue after the last record
    pub bookmark: String,
}

/// Fields supplied when opening a raise project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRaiseProject {
    pub beneficiary_id: String,
    pub target_amount: Amount,
    pub medical_proof: String,
    pub deadline: Timestamp,
    #[serde(default)]
    pub medical_bill_id: Option<String>,
}

impl<S: LedgerStore + ?Sized> FundLedger<S> {
    /// Open a pending raise project under a fresh id
    pub async fn create_raise_project(&self, project: NewRaiseProject) -> HealchainResult<RaiseProject> {
        let id = Uuid::new_v4().to_string();
        self.create_raise_project_with_id(&id, project).await
    }

    pub(crate) async fn create_raise_project_with_id(
        &self,
        id: &str,
        project: NewRaiseProject,
    ) -> HealchainResult<RaiseProject> {
        if !project.target_amount.is_positive() {
            return Err(HealchainError::InvalidArgument(format!(
                "target amount must be positive, got {}",
                project.target_amount
            )));
        }
        if let Some(bill_id) = &project.medical_bill_id {
            self.require::<MedicalBill>(bill_id).await?;
        }
        self.ensure_absent::<RaiseProject>(id).await?;

        let now = Timestamp::now();
        let record = RaiseProject {
            doc_type: RaiseProject::DOC_TYPE.to_string(),
            id: id.to_string(),
            beneficiary_id: project.beneficiary_id,
            target_amount: project.target_amount,
            current_amount: Amount::ZERO,
            medical_proof: project.medical_proof,
            status: Status::Pending,
            created_at: now,
            updated_at: now,
            deadline: project.deadline,
            medical_bill_id: project.medical_bill_id,
        };

        self.commit(vec![StateChange::record(&record)?]).await?;
        info!(
            project = %record.id,
            beneficiary = %record.beneficiary_id,
            target = %record.target_amount,
            "Created raise project"
        );
        Ok(record)
    }

    /// Record a pending bill issued by an institution
    pub async fn create_medical_bill(
        &self,
        patient_id: &str,
        institution_id: &str,
        amount: Amount,
        file_path: &str,
    ) -> HealchainResult<MedicalBill> {
        if amount.is_negative() {
            return Err(HealchainError::InvalidArgument(format!(
                "bill amount must not be negative, got {}",
                amount
            )));
        }

        let now = Timestamp::now();
        let bill = MedicalBill {
            doc_type: MedicalBill::DOC_TYPE.to_string(),
            bill_id: Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            institution_id: institution_id.to_string(),
            amount,
            file_path: file_path.to_string(),
            status: Status::Pending,
            created_at: now,
            updated_at: now,
        };

        self.commit(vec![StateChange::record(&bill)?]).await?;
        info!(bill = %bill.bill_id, patient = patient_id, %amount, "Created medical bill");
        Ok(bill)
    }

    pub async fn get_medical_bill(&self, bill_id: &str) -> HealchainResult<MedicalBill> {
        self.require(bill_id).await
    }

    pub async fn get_raise_project_by_pid(&self, project_id: &str) -> HealchainResult<RaiseProject> {
        self.require(project_id).await
    }

    /// Projects raised for a beneficiary
    pub async fn get_raise_project_by_uid(&self, user_id: &str) -> HealchainResult<Vec<RaiseProject>> {
        let selector = Selector::doc_type(RaiseProject::DOC_TYPE).eq("beneficiary_id", user_id);
        self.query(&selector).await
    }

    pub async fn get_raise_projects(&self) -> HealchainResult<Vec<RaiseProject>> {
        self.query(&Selector::doc_type(RaiseProject::DOC_TYPE)).await
    }

    pub async fn query_raise_projects_with_pagination(
        &self,
        page_size: usize,
        bookmark: &str,
    ) -> HealchainResult<ProjectPage> {
        let (entries, metadata) = self
            .store()
            .get_query_result_with_pagination(
                &Selector::doc_type(RaiseProject::DOC_TYPE),
                page_size,
                bookmark,
            )
            .await?;

        Ok(ProjectPage {
            records: decode_records(entries)?,
            fetched_count: metadata.fetched_records_count,
            bookmark: metadata.bookmark,
        })
    }
}
