//! Milestones and donor NFT certificates

use healchain_core::{Amount, HealchainError, HealchainResult, Record, StateChange, Timestamp};
use healchain_state::{split_composite_key, LedgerStore};
use tracing::info;

use crate::ledger::FundLedger;
use crate::record::{nft_donor_index_key, Milestone, NftCertificate, User};

impl<S: LedgerStore + ?Sized> FundLedger<S> {
    pub async fn create_milestone(
        &self,
        id: &str,
        threshold: Amount,
        description: &str,
    ) -> HealchainResult<Milestone> {
        if id.is_empty() {
            return Err(HealchainError::InvalidArgument("milestone id is empty".into()));
        }
        if threshold.is_negative() {
            return Err(HealchainError::InvalidArgument(format!(
                "milestone threshold must not be negative, got {}",
                threshold
            )));
        }
        self.ensure_absent::<Milestone>(id).await?;

        let milestone = Milestone {
            doc_type: Milestone::DOC_TYPE.to_string(),
            id: id.to_string(),
            threshold,
            description: description.to_string(),
        };
        self.commit(vec![StateChange::record(&milestone)?]).await?;

        info!(milestone = id, %threshold, "Created milestone");
        Ok(milestone)
    }

    pub async fn get_milestone(&self, id: &str) -> HealchainResult<Milestone> {
        self.require(id).await
    }

    /// Record certificate metadata for a donor
    pub async fn mint_nft_certificate(
        &self,
        id: &str,
        donor_id: &str,
        metadata_url: &str,
        contract_address: &str,
    ) -> HealchainResult<NftCertificate> {
        if id.is_empty() {
            return Err(HealchainError::InvalidArgument("certificate id is empty".into()));
        }
        self.require::<User>(donor_id).await?;
        self.ensure_absent::<NftCertificate>(id).await?;

        let nft = NftCertificate {
            doc_type: NftCertificate::DOC_TYPE.to_string(),
            id: id.to_string(),
            donor_id: donor_id.to_string(),
            metadata_url: metadata_url.to_string(),
            contract_address: contract_address.to_string(),
            minted_at: Timestamp::now(),
        };

        self.commit(vec![
            StateChange::record(&nft)?,
            StateChange::put(nft_donor_index_key(donor_id, id)?, vec![0]),
        ])
        .await?;

        info!(nft = id, donor = donor_id, "Minted certificate");
        Ok(nft)
    }

    pub async fn get_nfts_by_donor(&self, donor_id: &str) -> HealchainResult<Vec<NftCertificate>> {
        let entries = self
            .store()
            .get_state_by_partial_composite_key(NftCertificate::DOC_TYPE, &[donor_id])
            .await?;

        let mut nfts = Vec::with_capacity(entries.len());
        for entry in entries {
            let (_, attributes) = split_composite_key(&entry.key)?;
            let [_, nft_id] = attributes.as_slice() else {
                return Err(HealchainError::CorruptRecord(format!(
                    "certificate index entry {:?}",
                    entry.key
                )));
            };
            nfts.push(self.require::<NftCertificate>(nft_id).await?);
        }
        Ok(nfts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::test_ledger;

    #[tokio::test]
    async fn test_milestone_write_once() {
        let ledger = test_ledger();
        let milestone = ledger
            .create_milestone("m1", Amount::new(1000), "first thousand")
            .await
            .unwrap();
        assert_eq!(ledger.get_milestone("m1").await.unwrap(), milestone);

        let again = ledger.create_milestone("m1", Amount::new(5), "other").await;
        assert!(matches!(again, Err(HealchainError::AlreadyExists { .. })));
        assert_eq!(
            ledger.get_milestone("m1").await.unwrap().description,
            "first thousand"
        );

        assert!(matches!(
            ledger.get_milestone("m2").await,
            Err(HealchainError::NotFound { kind: "milestone", .. })
        ));
    }

    #[tokio::test]
    async fn test_mint_and_list_by_donor() {
        let ledger = test_ledger();
        ledger.register("d1", "dana", "pw", "d@x").await.unwrap();
        ledger.register("d2", "dave", "pw", "v@x").await.unwrap();

        ledger
            .mint_nft_certificate("nft-2", "d1", "ipfs://b", "0xabc")
            .await
            .unwrap();
        ledger
            .mint_nft_certificate("nft-1", "d1", "ipfs://a", "0xabc")
            .await
            .unwrap();
        ledger
            .mint_nft_certificate("nft-3", "d2", "ipfs://c", "0xabc")
            .await
            .unwrap();

        let mine = ledger.get_nfts_by_donor("d1").await.unwrap();
        let ids: Vec<_> = mine.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["nft-1", "nft-2"]);

        assert!(ledger.get_nfts_by_donor("d3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mint_rejects_duplicates_and_unknown_donor() {
        let ledger = test_ledger();
        ledger.register("d1", "dana", "pw", "d@x").await.unwrap();

        assert!(matches!(
            ledger.mint_nft_certificate("n", "ghost", "u", "c").await,
            Err(HealchainError::NotFound { kind: "user", .. })
        ));

        ledger.mint_nft_certificate("n", "d1", "u", "c").await.unwrap();
        assert!(matches!(
            ledger.mint_nft_certificate("n", "d1", "u2", "c").await,
            Err(HealchainError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_ids_in_index_namespace_rejected() {
        let ledger = test_ledger();
        ledger.register("alice", "alice", "pw", "a@x").await.unwrap();

        let result = ledger
            .create_milestone("\u{0}user\u{0}ghost\u{0}", Amount::new(1), "x")
            .await;
        assert!(matches!(result, Err(HealchainError::InvalidKey(_))));
        assert!(matches!(
            ledger
                .mint_nft_certificate("\u{0}nft\u{0}alice\u{0}n1\u{0}", "alice", "u", "c")
                .await,
            Err(HealchainError::InvalidKey(_))
        ));

        let users = ledger.get_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "alice");
        assert!(ledger.get_nfts_by_donor("alice").await.unwrap().is_empty());
    }
}
