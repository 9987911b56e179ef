//! In-memory cache of chat-identity -> wallet-address bindings, kept in sync
//! with the authoritative on-chain ledger.
//!
//! The cache is seeded with a full pull at startup and refreshed on a fixed
//! timer. Refreshes merge per key instead of replacing the map, so a
//! verification added between ticks survives the next bulk pull.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::AccountAddress,
    errors::UserError,
    ports::VerifiedAccountsLedger,
    Result,
};

pub struct VerifiedAccounts {
    ledger: Arc<dyn VerifiedAccountsLedger>,
    refresh_interval: Duration,
    accounts: tokio::sync::Mutex<HashMap<String, AccountAddress>>,
    refresh: tokio::sync::Mutex<Option<RefreshTask>>,
}

struct RefreshTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl VerifiedAccounts {
    pub fn new(ledger: Arc<dyn VerifiedAccountsLedger>, refresh_interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            refresh_interval,
            accounts: tokio::sync::Mutex::new(HashMap::new()),
            refresh: tokio::sync::Mutex::new(None),
        })
    }

    /// Seed the cache with a full pull and start the periodic refresh task.
    pub async fn init(self: &Arc<Self>) -> Result<()> {
        self.refresh_once().await?;

        let cancel = CancellationToken::new();
        let cache = Arc::clone(self);
        let token = cancel.clone();
        let interval = self.refresh_interval;
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.tick().await; // skip the immediate first tick
            loop {
                tokio::select! {
                  _ = token.cancelled() => break,
                  _ = tick.tick() => {
                    if let Err(e) = cache.refresh_once().await {
                        tracing::warn!(error = %e, "verified accounts refresh failed");
                    }
                  }
                }
            }
        });

        let mut refresh = self.refresh.lock().await;
        if let Some(previous) = refresh.take() {
            previous.cancel.cancel();
            previous.handle.abort();
        }
        *refresh = Some(RefreshTask { cancel, handle });
        Ok(())
    }

    pub async fn shutdown(&self) {
        let mut refresh = self.refresh.lock().await;
        if let Some(task) = refresh.take() {
            task.cancel.cancel();
            task.handle.abort();
        }
    }

    async fn refresh_once(&self) -> Result<()> {
        let pulled = self.ledger.all_verified_accounts().await?;
        let count = pulled.len();

        let mut accounts = self.accounts.lock().await;
        for (identity, address) in pulled {
            accounts.insert(identity, address);
        }
        tracing::debug!(count, total = accounts.len(), "verified accounts refreshed");
        Ok(())
    }

    /// Accept `claimed` only if the ledger's authoritative value for
    /// `chat_identity` matches it exactly. Returns whether the cache changed.
    pub async fn verify_and_add(
        &self,
        chat_identity: &str,
        claimed: &AccountAddress,
    ) -> Result<bool> {
        let authoritative = self.ledger.verified_account(chat_identity).await?;
        match authoritative {
            Some(address) if &address == claimed => {
                let mut accounts = self.accounts.lock().await;
                accounts.insert(chat_identity.to_string(), address);
                Ok(true)
            }
            _ => {
                tracing::warn!(chat_identity, "claimed address does not match the ledger");
                Ok(false)
            }
        }
    }

    pub async fn resolve(&self, chat_identity: &str) -> Option<AccountAddress> {
        let accounts = self.accounts.lock().await;
        accounts.get(chat_identity).cloned()
    }

    pub async fn resolve_or_fail(&self, chat_identity: &str) -> Result<AccountAddress> {
        self.resolve(chat_identity)
            .await
            .ok_or_else(|| UserError::NoVerifiedAccount.into())
    }

    pub async fn remove(&self, chat_identity: &str) {
        let mut accounts = self.accounts.lock().await;
        accounts.remove(chat_identity);
    }

    /// Current bindings, optionally narrowed to the given identities.
    pub async fn snapshot(&self, filter: &[String]) -> HashMap<String, AccountAddress> {
        let accounts = self.accounts.lock().await;
        if filter.is_empty() {
            return accounts.clone();
        }
        accounts
            .iter()
            .filter(|(identity, _)| filter.contains(identity))
            .map(|(identity, address)| (identity.clone(), address.clone()))
            .collect()
    }
}
