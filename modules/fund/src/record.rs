//! Ledger records and their document encoding
//!
//! Field names follow the stored document schema so that selectors written
//! against the state database (`beneficiary_id`, `donor_id`, ...) keep working.

use healchain_core::{Amount, HealchainResult, Record, Role, Status, TargetType, Timestamp};
use healchain_state::create_composite_key;
use serde::{Deserialize, Serialize};

/// Type tag carried by donation transactions
pub const TX_TYPE_DONATION: &str = "donation";

macro_rules! impl_record {
    ($ty:ty, $doc_type:expr, $key:ident) => {
        impl Record for $ty {
            const DOC_TYPE: &'static str = $doc_type;

            fn key(&self) -> &str {
                &self.$key
            }

            fn doc_type(&self) -> &str {
                &self.doc_type
            }
        }
    };
}

/// Registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "docType")]
    pub doc_type: String,
    /// National identity number, also the state key
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: Role,
    pub balance: Amount,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl_record!(User, "user", id);

/// Fundraising campaign for a beneficiary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaiseProject {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub id: String,
    pub beneficiary_id: String,
    pub target_amount: Amount,
    pub current_amount: Amount,
    pub medical_proof: String,
    pub status: Status,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deadline: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_bill_id: Option<String>,
}

impl_record!(RaiseProject, "raise_project", id);

impl RaiseProject {
    pub fn remaining(&self) -> Amount {
        self.target_amount
            .checked_sub(self.current_amount)
            .filter(|a| !a.is_negative())
            .unwrap_or(Amount::ZERO)
    }

    pub fn is_funded(&self) -> bool {
        self.current_amount >= self.target_amount
    }
}

/// Bill issued by a medical institution for a patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalBill {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub bill_id: String,
    pub patient_id: String,
    pub institution_id: String,
    pub amount: Amount,
    /// Reference to the proof document
    pub file_path: String,
    pub status: Status,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl_record!(MedicalBill, "medical_bill", bill_id);

/// Immutable donation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub id: String,
    pub raise_project_id: String,
    pub donor_id: String,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub tx_type: String,
    /// Content digest over the other fields
    pub blockchain_hash: String,
    pub timestamp: Timestamp,
}

impl_record!(Transaction, "transaction", id);

/// Audit record of an approval decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamineLog {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub id: String,
    pub target_type: TargetType,
    pub target_id: String,
    pub auditor_id: String,
    /// true approves, false rejects
    pub decision: bool,
    pub comments: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl_record!(ExamineLog, "examine_log", id);

/// Fundraising milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub id: String,
    /// Amount that triggers the milestone
    pub threshold: Amount,
    pub description: String,
}

impl_record!(Milestone, "milestone", id);

/// Donor honour certificate metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftCertificate {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub id: String,
    pub donor_id: String,
    pub metadata_url: String,
    pub contract_address: String,
    pub minted_at: Timestamp,
}

impl_record!(NftCertificate, "nft", id);

/// Index entry listing every registered user
pub fn user_index_key(user_id: &str) -> HealchainResult<String> {
    create_composite_key(User::DOC_TYPE, &[user_id])
}

/// Index entry linking a donor to a certificate
pub fn nft_donor_index_key(donor_id: &str, nft_id: &str) -> HealchainResult<String> {
    create_composite_key(NftCertificate::DOC_TYPE, &[donor_id, nft_id])
}
