//! Node runtime: store, ledger and invocation serialization

use healchain_core::{
    CallerId, HealchainError, HealchainResult, NodeConfig, StateVersion, StorageBackend,
};
use healchain_fund::{
    FundContract, FundLedger, GenesisConfig, GenesisInitializer, TxHistory, FUNCTIONS,
};
use healchain_state::{create_memory_store, create_persistent_store, LedgerStore, SharedLedgerStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Runtime shared by the API handlers
pub struct NodeRuntime {
    config: NodeConfig,
    store: SharedLedgerStore,
    /// One invocation at a time
    contract: Mutex<FundContract<dyn LedgerStore>>,
}

impl NodeRuntime {
    /// Open the configured store and build the contract over it
    pub fn open(config: NodeConfig) -> HealchainResult<Self> {
        let store: SharedLedgerStore = match config.storage.backend {
            StorageBackend::Memory => create_memory_store(),
            StorageBackend::Sled => {
                let path = config.state_path();
                std::fs::create_dir_all(&path)?;
                create_persistent_store(&path)?
            }
        };
        info!(node = %config.name, backend = ?config.storage.backend, "Opened store");
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: NodeConfig, store: SharedLedgerStore) -> Self {
        let ledger = FundLedger::new(store.clone(), config.ledger.clone());
        Self {
            config,
            store,
            contract: Mutex::new(FundContract::new(ledger)),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Seed records from genesis, skipping those already present
    pub async fn initialize_genesis(&self, genesis: GenesisConfig) -> HealchainResult<()> {
        let _guard = self.contract.lock().await;
        let ledger = Arc::new(FundLedger::new(self.store.clone(), self.config.ledger.clone()));
        let (users, projects) = GenesisInitializer::new(ledger, genesis).initialize().await?;
        info!(users, projects, version = %self.state_version().await, "Genesis applied");
        Ok(())
    }

    /// Run a named operation
    pub async fn invoke(
        &self,
        caller: &CallerId,
        function: &str,
        args: &[String],
    ) -> HealchainResult<Vec<u8>> {
        if !FUNCTIONS.contains(&function) {
            return Err(HealchainError::UnknownFunction(function.to_string()));
        }
        let contract = self.contract.lock().await;
        contract.invoke(caller, function, args).await
    }

    pub async fn history(&self, key: &str) -> HealchainResult<Vec<TxHistory>> {
        let history = self.store.get_history_for_key(key).await?;
        Ok(history.into_iter().map(TxHistory::from).collect())
    }

    pub async fn state_version(&self) -> StateVersion {
        self.store.version().await
    }
}
