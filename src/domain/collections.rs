//! The in-process document store shared by all services.

use std::collections::{HashMap, HashSet};

use tokio::sync::{Mutex, RwLock};

use super::registry::{Document, Registry};
use super::{
    Account, CommissionRecord, Lead, LeadId, Proposal, ProposalId, UserId, Withdrawal,
    WithdrawalId,
};
use crate::error::LedgerError;

impl Document for Account {
    type Id = UserId;
    const COLLECTION: &'static str = "accounts";

    fn id(&self) -> UserId {
        self.id
    }

    fn not_found(id: UserId) -> LedgerError {
        LedgerError::UserNotFound(id)
    }
}

impl Document for Lead {
    type Id = LeadId;
    const COLLECTION: &'static str = "leads";

    fn id(&self) -> LeadId {
        self.id
    }

    fn not_found(id: LeadId) -> LedgerError {
        LedgerError::LeadNotFound(id)
    }
}

impl Document for Withdrawal {
    type Id = WithdrawalId;
    const COLLECTION: &'static str = "withdrawals";

    fn id(&self) -> WithdrawalId {
        self.id
    }

    fn not_found(id: WithdrawalId) -> LedgerError {
        LedgerError::WithdrawalNotFound(id)
    }
}

impl Document for Proposal {
    type Id = ProposalId;
    const COLLECTION: &'static str = "proposals";

    fn id(&self) -> ProposalId {
        self.id
    }

    fn not_found(id: ProposalId) -> LedgerError {
        LedgerError::ProposalNotFound(id)
    }
}

/// Every collection the service keeps.
#[derive(Debug, Default)]
pub struct Collections {
    /// User records.
    pub accounts: Registry<Account>,
    /// Sales leads.
    pub leads: Registry<Lead>,
    /// Withdrawal requests.
    pub withdrawals: Registry<Withdrawal>,
    /// Proposals.
    pub proposals: Registry<Proposal>,
    /// Append-only commission audit log.
    pub commissions: RwLock<Vec<CommissionRecord>>,
    /// Payment ids already applied to the ledger.
    pub processed_payments: Mutex<HashSet<String>>,
    /// Referral code to owner. Codes are unique across accounts.
    referral_codes: Mutex<HashMap<String, UserId>>,
}

impl Collections {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `code` for `owner`. Returns `false` if another account
    /// already holds it.
    pub async fn claim_referral_code(&self, code: &str, owner: UserId) -> bool {
        let mut codes = self.referral_codes.lock().await;
        match codes.get(code) {
            Some(holder) => *holder == owner,
            None => {
                codes.insert(code.to_string(), owner);
                true
            }
        }
    }

    /// Drops a reservation made by [`Self::claim_referral_code`].
    pub async fn release_referral_code(&self, code: &str) {
        self.referral_codes.lock().await.remove(code);
    }

    /// Owner of `code`, if any.
    pub async fn referrer_for(&self, code: &str) -> Option<UserId> {
        self.referral_codes.lock().await.get(code).copied()
    }

    /// Rebuilds the code index from the account collection. When restored
    /// data holds the same code twice, the older account keeps it.
    ///
    /// Returns the number of indexed codes.
    pub async fn reindex_referral_codes(&self) -> usize {
        let mut accounts = self.accounts.snapshot().await;
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut codes = HashMap::with_capacity(accounts.len());
        for account in accounts {
            if let Some(holder) = codes.get(&account.referral_code) {
                tracing::warn!(
                    code = %account.referral_code,
                    %holder,
                    shadowed = %account.id,
                    "duplicate referral code in stored accounts"
                );
                continue;
            }
            codes.insert(account.referral_code, account.id);
        }
        let count = codes.len();
        *self.referral_codes.lock().await = codes;
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn account(name: &str) -> Account {
        Account::new(
            name.to_string(),
            format!("{name}@example.com"),
            Role::Seller,
            None,
        )
    }

    #[tokio::test]
    async fn code_can_be_claimed_once() {
        let collections = Collections::new();
        let (first, second) = (UserId::new(), UserId::new());
        assert!(collections.claim_referral_code("ABCD1234", first).await);
        assert!(!collections.claim_referral_code("ABCD1234", second).await);
        assert_eq!(collections.referrer_for("ABCD1234").await, Some(first));

        collections.release_referral_code("ABCD1234").await;
        assert!(collections.claim_referral_code("ABCD1234", second).await);
    }

    #[tokio::test]
    async fn reindex_keeps_oldest_holder_of_a_duplicate_code() {
        let collections = Collections::new();
        let older = account("ana");
        let mut newer = account("bruno");
        newer.referral_code = older.referral_code.clone();
        newer.created_at = older.created_at + chrono::TimeDelta::seconds(1);
        let unique = account("carla");
        collections
            .accounts
            .replace_all(vec![newer, older.clone(), unique.clone()])
            .await;

        assert_eq!(collections.reindex_referral_codes().await, 2);
        assert_eq!(collections.referrer_for(&older.referral_code).await, Some(older.id));
        assert_eq!(collections.referrer_for(&unique.referral_code).await, Some(unique.id));
    }
}
