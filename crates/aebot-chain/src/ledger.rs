//! Verified-accounts ledger reads, executed as dry-run calls against the
//! account-verification registry contract.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use aebot_core::{
    domain::{AccountAddress, ContractAddress},
    errors::Error,
    ports::VerifiedAccountsLedger,
    Result,
};

use crate::{
    helper::ContractHelperClient,
    node::{NodeHttpClient, DRY_RUN_ACCOUNT},
};

pub const VERIFICATION_CONTRACT: &str = "AccountVerification";

pub struct ContractLedgerClient {
    node: NodeHttpClient,
    helper: ContractHelperClient,
    contract: ContractAddress,
}

impl ContractLedgerClient {
    pub fn new(
        node: NodeHttpClient,
        helper: ContractHelperClient,
        contract: ContractAddress,
    ) -> Self {
        Self {
            node,
            helper,
            contract,
        }
    }

    async fn call(&self, function: &str, arguments: Vec<Value>) -> Result<Value> {
        let call_data = self
            .helper
            .encode_calldata(VERIFICATION_CONTRACT, function, arguments)
            .await?;
        let caller = AccountAddress(DRY_RUN_ACCOUNT.to_string());
        let tx = self
            .node
            .contract_call_tx(&caller, &self.contract, &call_data)
            .await?;
        let return_value = self.node.dry_run(&tx, DRY_RUN_ACCOUNT).await?;
        self.helper
            .decode_call_result(VERIFICATION_CONTRACT, function, &return_value)
            .await
    }
}

#[async_trait]
impl VerifiedAccountsLedger for ContractLedgerClient {
    async fn all_verified_accounts(&self) -> Result<HashMap<String, AccountAddress>> {
        let decoded = self.call("verified_accounts", Vec::new()).await?;
        parse_account_map(&decoded)
    }

    async fn verified_account(&self, chat_identity: &str) -> Result<Option<AccountAddress>> {
        let decoded = self
            .call("get_verified_account", vec![Value::String(chat_identity.to_string())])
            .await?;
        parse_optional_address(&decoded)
    }
}

/// Contract maps decode either to a JSON object or to a list of
/// `[key, value]` pairs, depending on the decoder.
fn parse_account_map(decoded: &Value) -> Result<HashMap<String, AccountAddress>> {
    match decoded {
        Value::Object(entries) => entries
            .iter()
            .map(|(identity, address)| {
                let address = address.as_str().ok_or_else(|| {
                    Error::External(format!("non-string address for {identity}"))
                })?;
                Ok((identity.clone(), AccountAddress(address.to_string())))
            })
            .collect(),
        Value::Array(pairs) => pairs
            .iter()
            .map(|pair| {
                let (identity, address) = pair
                    .as_array()
                    .filter(|p| p.len() == 2)
                    .and_then(|p| Some((p[0].as_str()?, p[1].as_str()?)))
                    .ok_or_else(|| {
                        Error::External(format!("malformed ledger map entry: {pair}"))
                    })?;
                Ok((identity.to_string(), AccountAddress(address.to_string())))
            })
            .collect(),
        other => Err(Error::External(format!(
            "unexpected ledger map representation: {other}"
        ))),
    }
}

fn parse_optional_address(decoded: &Value) -> Result<Option<AccountAddress>> {
    match decoded {
        Value::Null => Ok(None),
        Value::String(address) => Ok(Some(AccountAddress(address.clone()))),
        other => Err(Error::External(format!(
            "unexpected ledger lookup representation: {other}"
        ))),
    }
}
