//! Fund ledger - user accounts and shared record plumbing

use healchain_core::{
    Amount, HealchainError, HealchainResult, LedgerConfig, Record, StateChange, StateVersion,
    Timestamp,
};
use healchain_crypto::{hash_credential, verify_credential};
use healchain_state::{
    decode_records, is_composite_key, read_record, split_composite_key, LedgerStore, Selector,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::record::{user_index_key, User};

/// Plain record keys must stay out of the composite index namespace
fn check_record_key(key: &str) -> HealchainResult<()> {
    if is_composite_key(key) {
        return Err(HealchainError::InvalidKey(format!(
            "{:?} collides with the composite key namespace",
            key
        )));
    }
    Ok(())
}

/// Record handlers over a ledger store.
///
/// Every operation re-reads its inputs from the store, validates, and commits
/// all of its writes as one batch. Nothing is cached between calls.
pub struct FundLedger<S: LedgerStore + ?Sized> {
    store: Arc<S>,
    config: LedgerConfig,
}

impl<S: LedgerStore + ?Sized> FundLedger<S> {
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ============ Record plumbing ============

    pub(crate) async fn load<R: Record>(&self, key: &str) -> HealchainResult<Option<R>> {
        check_record_key(key)?;
        read_record(self.store.as_ref(), key).await
    }

    pub(crate) async fn require<R: Record>(&self, key: &str) -> HealchainResult<R> {
        self.load(key)
            .await?
            .ok_or_else(|| HealchainError::not_found(R::DOC_TYPE, key))
    }

    pub(crate) async fn ensure_absent<R: Record>(&self, key: &str) -> HealchainResult<()> {
        check_record_key(key)?;
        if self.store.exists(key).await? {
            return Err(HealchainError::already_exists(R::DOC_TYPE, key));
        }
        Ok(())
    }

    pub(crate) async fn commit(&self, changes: Vec<StateChange>) -> HealchainResult<StateVersion> {
        let count = changes.len();
        let version = self.store.apply_batch(changes).await?;
        debug!(%version, count, "Committed changes");
        Ok(version)
    }

    pub(crate) async fn query<R: Record>(&self, selector: &Selector) -> HealchainResult<Vec<R>> {
        let entries = self.store.get_query_result(selector).await?;
        decode_records(entries)
    }

    // ============ Users ============

    /// Create an account with the configured starting balance
    pub async fn register(
        &self,
        id: &str,
        username: &str,
        password: &str,
        email: &str,
    ) -> HealchainResult<User> {
        if id.is_empty() {
            return Err(HealchainError::InvalidArgument("user id is empty".into()));
        }
        if let Err(e) = self.ensure_absent::<User>(id).await {
            warn!(user = id, error = %e, "Registration rejected");
            return Err(e);
        }

        let now = Timestamp::now();
        let user = User {
            doc_type: User::DOC_TYPE.to_string(),
            id: id.to_string(),
            username: username.to_string(),
            password_hash: hash_credential(password),
            email: email.to_string(),
            role: self.config.default_role,
            balance: self.config.initial_balance,
            created_at: now,
            updated_at: now,
        };

        self.commit(vec![
            StateChange::record(&user)?,
            StateChange::put(user_index_key(id)?, vec![0]),
        ])
        .await?;

        info!(user = id, balance = %user.balance, "Registered user");
        Ok(user)
    }

    /// Check a password against the stored digest
    pub async fn login(&self, id: &str, password: &str) -> HealchainResult<bool> {
        let user: User = self.require(id).await?;
        let ok = verify_credential(password, &user.password_hash);
        if !ok {
            warn!(user = id, "Login failed: credential mismatch");
        }
        Ok(ok)
    }

    pub async fn get_user_info(&self, id: &str) -> HealchainResult<User> {
        self.require(id).await
    }

    pub async fn update_user_info(
        &self,
        id: &str,
        username: &str,
        email: &str,
    ) -> HealchainResult<User> {
        let mut user: User = self.require(id).await?;
        user.username = username.to_string();
        user.email = email.to_string();
        user.updated_at = Timestamp::now();

        self.commit(vec![StateChange::record(&user)?]).await?;
        Ok(user)
    }

    /// All registered users, in index order
    pub async fn get_users(&self) -> HealchainResult<Vec<User>> {
        let entries = self
            .store
            .get_state_by_partial_composite_key(User::DOC_TYPE, &[])
            .await?;

        let mut users = Vec::with_capacity(entries.len());
        for entry in entries {
            let (_, attributes) = split_composite_key(&entry.key)?;
            let Some(id) = attributes.first() else {
                return Err(HealchainError::CorruptRecord(format!(
                    "user index entry without id: {:?}",
                    entry.key
                )));
            };
            users.push(self.require::<User>(id).await?);
        }
        Ok(users)
    }

    /// Add `amount` to a balance; a negative amount debits
    pub async fn recharge(&self, id: &str, amount: Amount) -> HealchainResult<User> {
        let mut user: User = self.require(id).await?;

        let balance = user
            .balance
            .checked_add(amount)
            .ok_or_else(|| HealchainError::InvalidArgument(format!("amount {} overflows", amount)))?;
        if balance.is_negative() {
            warn!(user = id, %amount, balance = %user.balance, "Recharge rejected");
            return Err(HealchainError::InsufficientFunds {
                required: amount.value().saturating_neg(),
                available: user.balance.value(),
            });
        }

        user.balance = balance;
        user.updated_at = Timestamp::now();
        self.commit(vec![StateChange::record(&user)?]).await?;

        info!(user = id, %amount, balance = %user.balance, "Recharged");
        Ok(user)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use healchain_core::Role;
    use healchain_state::MemoryLedgerStore;

    pub(crate) fn test_ledger() -> FundLedger<MemoryLedgerStore> {
        FundLedger::new(Arc::new(MemoryLedgerStore::new()), LedgerConfig::default())
    }

    #[tokio::test]
    async fn test_register() {
        let ledger = test_ledger();
        let user = ledger
            .register("u1", "alice", "secret", "alice@example.com")
            .await
            .unwrap();

        assert_eq!(user.balance, Amount::new(1000));
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "secret");
        assert_eq!(user.password_hash.len(), 64);

        let stored = ledger.get_user_info("u1").await.unwrap();
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let ledger = test_ledger();
        ledger.register("u1", "alice", "pw", "a@x").await.unwrap();
        ledger.recharge("u1", Amount::new(5)).await.unwrap();

        let result = ledger.register("u1", "mallory", "pw2", "m@x").await;
        assert!(matches!(result, Err(HealchainError::AlreadyExists { .. })));

        // the existing account is untouched
        let user = ledger.get_user_info("u1").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.balance, Amount::new(1005));
    }

    #[tokio::test]
    async fn test_register_uses_configured_balance() {
        let config = LedgerConfig {
            initial_balance: Amount::new(0),
            ..LedgerConfig::default()
        };
        let ledger = FundLedger::new(Arc::new(MemoryLedgerStore::new()), config);
        let user = ledger.register("u1", "alice", "pw", "a@x").await.unwrap();
        assert_eq!(user.balance, Amount::ZERO);
    }

    #[tokio::test]
    async fn test_login() {
        let ledger = test_ledger();
        ledger.register("u1", "alice", "pw", "a@x").await.unwrap();

        assert!(ledger.login("u1", "pw").await.unwrap());
        assert!(!ledger.login("u1", "wrong").await.unwrap());
        assert!(matches!(
            ledger.login("nobody", "pw").await,
            Err(HealchainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_user_info() {
        let ledger = test_ledger();
        ledger.register("u1", "alice", "pw", "a@x").await.unwrap();

        let updated = ledger
            .update_user_info("u1", "alice2", "new@x")
            .await
            .unwrap();
        assert_eq!(updated.username, "alice2");
        assert_eq!(ledger.get_user_info("u1").await.unwrap().email, "new@x");

        assert!(ledger.update_user_info("u2", "x", "y").await.is_err());
    }

    #[tokio::test]
    async fn test_get_users() {
        let ledger = test_ledger();
        assert!(ledger.get_users().await.unwrap().is_empty());

        ledger.register("u2", "bob", "pw", "b@x").await.unwrap();
        ledger.register("u1", "alice", "pw", "a@x").await.unwrap();

        let users = ledger.get_users().await.unwrap();
        let ids: Vec<_> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);

        // index entries stay out of plain range scans
        let plain = ledger.store().get_state_by_range("", "").await.unwrap();
        assert_eq!(plain.len(), 2);
    }

    #[tokio::test]
    async fn test_index_keys_are_not_records() {
        let ledger = test_ledger();
        ledger.register("u1", "alice", "pw", "a@x").await.unwrap();

        let index_key = user_index_key("u1").unwrap();
        assert!(matches!(
            ledger.register(&index_key, "mallory", "pw", "m@x").await,
            Err(HealchainError::InvalidKey(_))
        ));
        assert!(matches!(
            ledger.get_user_info(&index_key).await,
            Err(HealchainError::InvalidKey(_))
        ));
        assert_eq!(ledger.get_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recharge() {
        let ledger = test_ledger();
        ledger.register("u1", "alice", "pw", "a@x").await.unwrap();

        let user = ledger.recharge("u1", Amount::new(250)).await.unwrap();
        assert_eq!(user.balance, Amount::new(1250));

        let user = ledger.recharge("u1", Amount::new(-1250)).await.unwrap();
        assert_eq!(user.balance, Amount::ZERO);

        let result = ledger.recharge("u1", Amount::new(-1)).await;
        assert!(matches!(
            result,
            Err(HealchainError::InsufficientFunds {
                required: 1,
                available: 0
            })
        ));
        assert_eq!(ledger.get_user_info("u1").await.unwrap().balance, Amount::ZERO);

        assert!(matches!(
            ledger.recharge("ghost", Amount::new(1)).await,
            Err(HealchainError::NotFound { kind: "user", .. })
        ));
    }
}
