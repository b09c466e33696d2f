//! Per-account usage quota

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;
use veriscan_core::{Error, Result};

/// Atomic token debit against an account
#[async_trait]
pub trait QuotaGate: Send + Sync {
    /// Take one token in a single check-and-decrement step and return the
    /// balance before the debit.
    ///
    /// Fails with `AccountNotFound` for unknown accounts and
    /// `QuotaExhausted` when the balance is zero.
    async fn debit_one_token(&self, user_id: &str) -> Result<u64>;
}

/// Process-local balances
#[derive(Debug, Default)]
pub struct InMemoryQuotaGate {
    balances: Mutex<HashMap<String, u64>>,
}

impl InMemoryQuotaGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style account creation
    pub fn with_account(self, user_id: impl Into<String>, tokens: u64) -> Self {
        self.set_tokens(user_id, tokens);
        self
    }

    /// Create or overwrite an account balance
    pub fn set_tokens(&self, user_id: impl Into<String>, tokens: u64) {
        self.balances.lock().insert(user_id.into(), tokens);
    }

    pub fn balance(&self, user_id: &str) -> Option<u64> {
        self.balances.lock().get(user_id).copied()
    }
}

#[async_trait]
impl QuotaGate for InMemoryQuotaGate {
    async fn debit_one_token(&self, user_id: &str) -> Result<u64> {
        let mut balances = self.balances.lock();
        let balance = balances
            .get_mut(user_id)
            .ok_or_else(|| Error::AccountNotFound(user_id.to_string()))?;

        if *balance == 0 {
            return Err(Error::QuotaExhausted);
        }

        let before = *balance;
        *balance -= 1;
        debug!(user_id, remaining = *balance, "Quota token debited");
        Ok(before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_debit_returns_balance_before() {
        let gate = InMemoryQuotaGate::new().with_account("alice", 2);

        assert_eq!(gate.debit_one_token("alice").await.unwrap(), 2);
        assert_eq!(gate.debit_one_token("alice").await.unwrap(), 1);
        assert!(matches!(
            gate.debit_one_token("alice").await,
            Err(Error::QuotaExhausted)
        ));
        assert_eq!(gate.balance("alice"), Some(0));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let gate = InMemoryQuotaGate::new();
        let err = gate.debit_one_token("ghost").await.unwrap_err();
        assert_eq!(err.code(), "USER_NOT_FOUND");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debits_never_overdraw() {
        let gate = Arc::new(InMemoryQuotaGate::new().with_account("alice", 10));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let gate = gate.clone();
            handles.push(tokio::spawn(
                async move { gate.debit_one_token("alice").await },
            ));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                granted += 1;
            }
        }

        assert_eq!(granted, 10);
        assert_eq!(gate.balance("alice"), Some(0));
    }
}
