//! Middleware (chain indexer) client: paginated fungible-token balance scans.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use aebot_core::{
    domain::{AccountAddress, ContractAddress},
    errors::Error,
    ports::{TokenBalance, TokenScanner},
    Result,
};

#[derive(Clone)]
pub struct MiddlewareClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
struct Aex9AccountBalance {
    amount: Value,
    contract_id: String,
    token_symbol: String,
    #[serde(default)]
    decimals: Option<u32>,
}

impl MiddlewareClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Follow `next` links until the result set is exhausted, concatenating
    /// each page's `data`.
    async fn iterate(&self, first_path: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next = Some(first_path.to_string());

        while let Some(path) = next {
            let url = format!("{}{path}", self.base_url);
            let page: Page = self
                .http
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            items.extend(page.data);
            next = page.next.filter(|n| !n.is_empty());
        }

        Ok(items)
    }
}

#[async_trait]
impl TokenScanner for MiddlewareClient {
    async fn account_token_balances(&self, address: &AccountAddress) -> Result<Vec<TokenBalance>> {
        let items = self
            .iterate(&format!("/v2/aex9/account-balances/{address}"))
            .await?;

        items.iter().map(parse_token_balance).collect()
    }
}

fn parse_token_balance(item: &Value) -> Result<TokenBalance> {
    let entry: Aex9AccountBalance = serde_json::from_value(item.clone())?;

    let digits = match &entry.amount {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => {
            return Err(Error::External(format!(
                "unexpected token amount representation: {other}"
            )))
        }
    };
    let amount = Decimal::from_str(&digits)
        .map_err(|e| Error::External(format!("unparseable token amount \"{digits}\": {e}")))?;

    Ok(TokenBalance {
        contract_id: ContractAddress(entry.contract_id),
        symbol: entry.token_symbol,
        amount,
        decimals: entry.decimals.unwrap_or(18),
    })
}
