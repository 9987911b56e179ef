//! Thin client for the node's REST API.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use aebot_core::{
    domain::{AccountAddress, ContractAddress},
    errors::Error,
    ports::{NodeClient, RawTx},
    Result,
};

/// Coins are denominated in 1e-18 of the base unit.
pub const COIN_DECIMALS: u32 = 18;

/// Zero account accepted by the node for dry-run calls.
pub const DRY_RUN_ACCOUNT: &str = "ak_11111111111111111111111111111111273Yts";

const EMPTY_PAYLOAD: &str = "ba_Xfbg4g==";

#[derive(Clone)]
pub struct NodeHttpClient {
    http: reqwest::Client,
    base_url: String,
}

// Amounts can exceed u64, so request bodies are typed and serialized
// directly instead of going through a JSON `Value`.
#[derive(Serialize)]
struct SpendTxBody<'a> {
    sender_id: &'a str,
    recipient_id: &'a str,
    amount: u128,
    payload: &'a str,
}

#[derive(Serialize)]
struct ContractCallTxBody<'a> {
    caller_id: &'a str,
    contract_id: &'a str,
    call_data: &'a str,
    abi_version: u8,
    amount: u64,
    gas: u64,
    gas_price: u64,
}

#[derive(Serialize)]
struct DryRunBody<'a> {
    accounts: Vec<DryRunAccount<'a>>,
    txs: Vec<DryRunTx<'a>>,
}

#[derive(Serialize)]
struct DryRunAccount<'a> {
    pub_key: &'a str,
    amount: u128,
}

#[derive(Serialize)]
struct DryRunTx<'a> {
    tx: &'a str,
}

#[derive(Deserialize)]
struct AccountResponse {
    balance: Value,
}

#[derive(Deserialize)]
struct TxResponse {
    tx: String,
}

#[derive(Deserialize)]
struct DryRunResponse {
    results: Vec<DryRunResult>,
}

#[derive(Deserialize)]
struct DryRunResult {
    result: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    call_obj: Option<CallObject>,
}

#[derive(Deserialize)]
struct CallObject {
    return_value: String,
}

impl NodeHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    /// Unsigned spend transaction via the node's debug tx builder, `amount`
    /// in the smallest unit.
    pub async fn spend_tx(
        &self,
        sender: &AccountAddress,
        recipient: &AccountAddress,
        amount: u128,
    ) -> Result<RawTx> {
        let body = SpendTxBody {
            sender_id: sender.as_str(),
            recipient_id: recipient.as_str(),
            amount,
            payload: EMPTY_PAYLOAD,
        };
        let built: TxResponse = self.post_json("/v3/debug/transactions/spend", &body).await?;
        Ok(RawTx(built.tx))
    }

    /// Unsigned contract-call transaction with prepared calldata.
    pub async fn contract_call_tx(
        &self,
        caller: &AccountAddress,
        contract: &ContractAddress,
        call_data: &str,
    ) -> Result<RawTx> {
        let body = ContractCallTxBody {
            caller_id: caller.as_str(),
            contract_id: contract.as_str(),
            call_data,
            abi_version: 3,
            amount: 0,
            gas: 25_000,
            gas_price: 1_000_000_000,
        };
        let built: TxResponse = self
            .post_json("/v3/debug/transactions/contract-call", &body)
            .await?;
        Ok(RawTx(built.tx))
    }

    /// Execute a call transaction against current chain state without
    /// broadcasting, returning the raw encoded return value.
    pub async fn dry_run(&self, tx: &RawTx, caller: &str) -> Result<String> {
        let body = DryRunBody {
            accounts: vec![DryRunAccount {
                pub_key: caller,
                amount: 100_000_000_000_000_000_000,
            }],
            txs: vec![DryRunTx { tx: tx.as_str() }],
        };
        let response: DryRunResponse = self.post_json("/v3/dry-run", &body).await?;
        let outcome = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::External("dry-run returned no results".to_string()))?;

        if outcome.result != "ok" {
            return Err(Error::External(format!(
                "dry-run failed: {}",
                outcome.reason.unwrap_or(outcome.result)
            )));
        }
        outcome
            .call_obj
            .map(|call| call.return_value)
            .ok_or_else(|| Error::External("dry-run result carried no call object".to_string()))
    }
}

#[async_trait]
impl NodeClient for NodeHttpClient {
    async fn balance(&self, address: &AccountAddress) -> Result<Decimal> {
        let url = format!("{}/v3/accounts/{}", self.base_url, address);
        let account: AccountResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_coin_amount(&account.balance)
    }
}

/// Balances come back as (possibly very large) JSON numbers or strings;
/// shift them out of the smallest unit.
pub(crate) fn parse_coin_amount(raw: &Value) -> Result<Decimal> {
    let digits = match raw {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => {
            return Err(Error::External(format!(
                "unexpected balance representation: {other}"
            )))
        }
    };
    let amount = Decimal::from_str(&digits)
        .map_err(|e| Error::External(format!("unparseable balance \"{digits}\": {e}")))?;
    Ok(amount * Decimal::new(1, COIN_DECIMALS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coin_amounts_shift_out_of_aettos() {
        let amount = parse_coin_amount(&json!(1_500_000_000_000_000_000u64)).unwrap();
        assert_eq!(amount.normalize().to_string(), "1.5");

        let amount = parse_coin_amount(&json!("2000000000000000000")).unwrap();
        assert_eq!(amount.normalize().to_string(), "2");

        assert!(parse_coin_amount(&json!({"nested": true})).is_err());
    }

    #[test]
    fn spend_body_serializes_amounts_above_u64() {
        let body = SpendTxBody {
            sender_id: "ak_sender",
            recipient_id: "ak_recipient",
            amount: 100_000_000_000_000_000_000,
            payload: EMPTY_PAYLOAD,
        };
        let serialized = serde_json::to_string(&body).unwrap();
        assert!(serialized.contains("\"amount\":100000000000000000000"));
    }
}
