//! Shared fakes for this crate's tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use rust_decimal::Decimal;

use aebot_core::{
    config::Config,
    dispatcher::BotContext,
    domain::{AccountAddress, ChatId, ContractAddress, Sender, SenderId},
    ports::{
        ChatAdapter, NodeClient, RateSource, RawTx, TokenBalance, TokenScanner, TxBuilder,
        VerifiedAccountsLedger,
    },
    rates::PriceRates,
    storage::{MemoryStore, TypedStore},
    verified::VerifiedAccounts,
    Result,
};

pub const ADDRESS: &str = "ak_2dATVcZ9KJU5a8hdsVtTv21pYiGWiPbmVcU1Pz72FFqpk9pSRR";
pub const OTHER_ADDRESS: &str = "ak_2dATVcZ9KJU5a8hdsVtTv21pYiGWiPbmVcU1Pz72FFqpk9pSRS";

/// Everything the fakes answer with, given per test.
pub struct World {
    pub verified: Vec<(&'static str, &'static str)>,
    pub coin_balance: Decimal,
    pub tokens: Vec<TokenBalance>,
    pub rates: HashMap<String, f64>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            verified: Vec::new(),
            coin_balance: Decimal::ZERO,
            tokens: Vec::new(),
            rates: HashMap::new(),
        }
    }
}

pub struct FakeLedger {
    pub entries: Mutex<HashMap<String, AccountAddress>>,
}

impl FakeLedger {
    pub fn with(entries: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(
                entries
                    .iter()
                    .map(|(identity, address)| {
                        (identity.to_string(), AccountAddress(address.to_string()))
                    })
                    .collect(),
            ),
        })
    }
}

#[async_trait]
impl VerifiedAccountsLedger for FakeLedger {
    async fn all_verified_accounts(&self) -> Result<HashMap<String, AccountAddress>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn verified_account(&self, chat_identity: &str) -> Result<Option<AccountAddress>> {
        Ok(self.entries.lock().unwrap().get(chat_identity).cloned())
    }
}

struct FakeNode {
    balance: Decimal,
}

#[async_trait]
impl NodeClient for FakeNode {
    async fn balance(&self, _address: &AccountAddress) -> Result<Decimal> {
        Ok(self.balance)
    }
}

struct FakeScanner {
    tokens: Vec<TokenBalance>,
}

#[async_trait]
impl TokenScanner for FakeScanner {
    async fn account_token_balances(&self, _address: &AccountAddress) -> Result<Vec<TokenBalance>> {
        Ok(self.tokens.clone())
    }
}

struct FakeTxBuilder;

#[async_trait]
impl TxBuilder for FakeTxBuilder {
    async fn spend_tx(
        &self,
        _sender: &AccountAddress,
        _recipient: &AccountAddress,
        _amount: Decimal,
    ) -> Result<RawTx> {
        Ok(RawTx("tx_spend".to_string()))
    }

    async fn token_transfer_tx(
        &self,
        _caller: &AccountAddress,
        _token: &ContractAddress,
        _recipient: &AccountAddress,
        _amount: Decimal,
    ) -> Result<RawTx> {
        Ok(RawTx("tx_token".to_string()))
    }

    async fn verify_account_tx(
        &self,
        _caller: &AccountAddress,
        _chat_identity: &str,
    ) -> Result<RawTx> {
        Ok(RawTx("tx_verify".to_string()))
    }

    async fn remove_verified_account_tx(
        &self,
        _caller: &AccountAddress,
        _chat_identity: &str,
    ) -> Result<RawTx> {
        Ok(RawTx("tx_remove".to_string()))
    }
}

struct FakeRates {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateSource for FakeRates {
    async fn coin_rates(&self, _protocol: &str) -> Result<HashMap<String, f64>> {
        Ok(self.rates.clone())
    }
}

/// Adapter that records everything sent through it.
#[derive(Default)]
pub struct RecordingAdapter {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ChatAdapter for RecordingAdapter {
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn set_typing(&self, _chat_id: &ChatId, _typing: bool) -> Result<()> {
        Ok(())
    }
}

pub fn token(symbol: &str, contract: &str, amount: i64, decimals: u32) -> TokenBalance {
    TokenBalance {
        contract_id: ContractAddress(contract.to_string()),
        symbol: symbol.to_string(),
        amount: Decimal::from(amount),
        decimals,
    }
}

pub fn dm_sender(id: &str) -> Sender {
    Sender {
        id: SenderId(id.to_string()),
        display_name: id.to_string(),
        is_direct: true,
    }
}

pub async fn verified_cache(entries: &[(&str, &str)]) -> Arc<VerifiedAccounts> {
    let cache = VerifiedAccounts::new(FakeLedger::with(entries), Duration::from_secs(3600));
    cache.init().await.unwrap();
    cache
}

pub async fn context(world: World) -> Arc<BotContext> {
    std::env::set_var("MATRIX_BOT_HOME_SERVER_URL", "https://matrix.example.org");
    std::env::set_var("MATRIX_WALLET_BOT_USERNAME", "wallet-bot");
    std::env::set_var("BOT_STORAGE_FILE", "/tmp/aebot-wallet-test.json");
    std::env::set_var(
        "BACKEND_CALLBACK_BASE_URL",
        "https://bot.example.org/ae-wallet-bot",
    );
    let config = Arc::new(Config::load().unwrap());

    Arc::new(BotContext {
        config,
        store: TypedStore::new(Arc::new(MemoryStore::default())),
        verified: verified_cache(&world.verified).await,
        node: Arc::new(FakeNode {
            balance: world.coin_balance,
        }),
        scanner: Arc::new(FakeScanner {
            tokens: world.tokens,
        }),
        txs: Arc::new(FakeTxBuilder),
        rates: Arc::new(PriceRates::new(Arc::new(FakeRates {
            rates: world.rates,
        }))),
    })
}
