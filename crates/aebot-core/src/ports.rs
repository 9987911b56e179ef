//! Seams to the outside world: chat platforms, the chain, price feeds.
//!
//! Concrete HTTP implementations live in `aebot-chain`; tests supply fakes.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{AccountAddress, ChatId, ContractAddress},
    Result,
};

/// Outbound side of a chat platform connection.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Deliver a message to a chat outside the request/reply cycle, e.g. after
    /// a wallet confirmation callback fires.
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<()>;

    /// Toggle the "composing" indicator while a command is being handled.
    async fn set_typing(&self, chat_id: &ChatId, typing: bool) -> Result<()>;
}

/// Authoritative registry of chat-identity -> account-address bindings.
#[async_trait]
pub trait VerifiedAccountsLedger: Send + Sync {
    async fn all_verified_accounts(&self) -> Result<HashMap<String, AccountAddress>>;

    async fn verified_account(&self, chat_identity: &str) -> Result<Option<AccountAddress>>;
}

/// Direct node queries.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Spendable coin balance, already shifted out of the smallest unit.
    async fn balance(&self, address: &AccountAddress) -> Result<Decimal>;
}

/// One fungible-token position of an account, amounts in the token's
/// smallest unit.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenBalance {
    pub contract_id: ContractAddress,
    pub symbol: String,
    pub amount: Decimal,
    pub decimals: u32,
}

/// Indexer-backed scan of every fungible-token balance an account holds.
#[async_trait]
pub trait TokenScanner: Send + Sync {
    async fn account_token_balances(&self, address: &AccountAddress) -> Result<Vec<TokenBalance>>;
}

/// A serialized unsigned transaction, ready to hand to a wallet for signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTx(pub String);

impl RawTx {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Builds unsigned transactions for the flows the bot initiates. Signing is
/// always left to the user's wallet.
#[async_trait]
pub trait TxBuilder: Send + Sync {
    /// Plain coin transfer, `amount` in the smallest unit.
    async fn spend_tx(
        &self,
        sender: &AccountAddress,
        recipient: &AccountAddress,
        amount: Decimal,
    ) -> Result<RawTx>;

    /// Fungible-token `transfer` call, `amount` in the token's smallest unit.
    async fn token_transfer_tx(
        &self,
        caller: &AccountAddress,
        token: &ContractAddress,
        recipient: &AccountAddress,
        amount: Decimal,
    ) -> Result<RawTx>;

    /// Registry call binding `chat_identity` to the calling account.
    async fn verify_account_tx(
        &self,
        caller: &AccountAddress,
        chat_identity: &str,
    ) -> Result<RawTx>;

    /// Registry call removing the caller's binding for `chat_identity`.
    async fn remove_verified_account_tx(
        &self,
        caller: &AccountAddress,
        chat_identity: &str,
    ) -> Result<RawTx>;
}

/// Fiat exchange rates for one coin, keyed by lowercase currency code.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn coin_rates(&self, protocol: &str) -> Result<HashMap<String, f64>>;
}
