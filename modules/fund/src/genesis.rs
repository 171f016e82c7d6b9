//! Genesis seeding for HEALCHAIN

use healchain_core::{Amount, HealchainError, HealchainResult, Timestamp};
use healchain_state::LedgerStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::ledger::FundLedger;
use crate::project::NewRaiseProject;

/// Account created at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisUser {
    pub id: String,
    pub username: String,
    /// Plaintext; only its digest is stored
    pub password: String,
    pub email: String,
    pub balance: Amount,
}

/// Raise project created at genesis under a fixed id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisProject {
    pub id: String,
    pub beneficiary_id: String,
    pub target_amount: Amount,
    pub medical_proof: String,
    pub deadline: Timestamp,
}

/// Genesis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub chain_name: String,
    #[serde(default)]
    pub users: Vec<GenesisUser>,
    #[serde(default)]
    pub projects: Vec<GenesisProject>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            chain_name: "HEALCHAIN".to_string(),
            users: vec![],
            projects: vec![],
        }
    }
}

impl GenesisConfig {
    /// Devnet with a donor, a beneficiary and one open project
    pub fn devnet() -> Self {
        Self {
            chain_name: "HEALCHAIN Devnet".to_string(),
            ..Default::default()
        }
        .add_user("donor-1", "donor", "donor", "donor@healchain.local", 1000)
        .add_user("patient-1", "patient", "patient", "patient@healchain.local", 0)
        .add_project(GenesisProject {
            id: "project-1".to_string(),
            beneficiary_id: "patient-1".to_string(),
            target_amount: Amount::new(5000),
            medical_proof: "devnet-proof".to_string(),
            deadline: Timestamp::from_secs(4_102_444_800),
        })
    }

    pub fn add_user(mut self, id: &str, username: &str, password: &str, email: &str, balance: i64) -> Self {
        self.users.push(GenesisUser {
            id: id.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
            balance: Amount::new(balance),
        });
        self
    }

    pub fn add_project(mut self, project: GenesisProject) -> Self {
        self.projects.push(project);
        self
    }

    pub fn validate(&self) -> HealchainResult<()> {
        if let Some(user) = self.users.iter().find(|u| u.balance.is_negative()) {
            return Err(HealchainError::Config(format!(
                "genesis user {} has a negative balance",
                user.id
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> HealchainResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> HealchainResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| HealchainError::Config(format!("invalid genesis: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

/// Seeds a ledger from a [`GenesisConfig`]
pub struct GenesisInitializer<S: LedgerStore + ?Sized> {
    ledger: Arc<FundLedger<S>>,
    config: GenesisConfig,
}

impl<S: LedgerStore + ?Sized> GenesisInitializer<S> {
    pub fn new(ledger: Arc<FundLedger<S>>, config: GenesisConfig) -> Self {
        Self { ledger, config }
    }

    /// Create configured records that do not exist yet.
    ///
    /// Returns the number of users and projects created.
    pub async fn initialize(&self) -> HealchainResult<(usize, usize)> {
        info!(chain = %self.config.chain_name, "Initializing genesis");
        self.config.validate()?;

        let store = self.ledger.store();
        let mut users = 0;
        for user in &self.config.users {
            if store.exists(&user.id).await? {
                continue;
            }
            let created = self
                .ledger
                .register(&user.id, &user.username, &user.password, &user.email)
                .await?;
            let delta = user
                .balance
                .checked_sub(created.balance)
                .ok_or_else(|| HealchainError::Config(format!("balance of {} overflows", user.id)))?;
            if delta != Amount::ZERO {
                self.ledger.recharge(&user.id, delta).await?;
            }
            info!(user = %user.id, balance = %user.balance, "Genesis user");
            users += 1;
        }

        let mut projects = 0;
        for project in &self.config.projects {
            if store.exists(&project.id).await? {
                continue;
            }
            self.ledger
                .create_raise_project_with_id(
                    &project.id,
                    NewRaiseProject {
                        beneficiary_id: project.beneficiary_id.clone(),
                        target_amount: project.target_amount,
                        medical_proof: project.medical_proof.clone(),
                        deadline: project.deadline,
                        medical_bill_id: None,
                    },
                )
                .await?;
            projects += 1;
        }

        info!(users, projects, "Genesis complete");
        Ok((users, projects))
    }
}
