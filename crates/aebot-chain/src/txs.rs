//! Unsigned-transaction building for the flows the bot hands off to the
//! user's wallet.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use aebot_core::{
    domain::{AccountAddress, ContractAddress},
    errors::Error,
    ports::{RawTx, TxBuilder},
    Result,
};

use crate::{helper::ContractHelperClient, ledger::VERIFICATION_CONTRACT, node::NodeHttpClient};

pub const FUNGIBLE_TOKEN_CONTRACT: &str = "FungibleTokenFull";

pub struct ChainTxBuilder {
    node: NodeHttpClient,
    helper: ContractHelperClient,
    verification_contract: ContractAddress,
}

impl ChainTxBuilder {
    pub fn new(
        node: NodeHttpClient,
        helper: ContractHelperClient,
        verification_contract: ContractAddress,
    ) -> Self {
        Self {
            node,
            helper,
            verification_contract,
        }
    }

    async fn verification_call_tx(
        &self,
        caller: &AccountAddress,
        function: &str,
        arguments: Vec<Value>,
    ) -> Result<RawTx> {
        let call_data = self
            .helper
            .encode_calldata(VERIFICATION_CONTRACT, function, arguments)
            .await?;
        self.node
            .contract_call_tx(caller, &self.verification_contract, &call_data)
            .await
    }
}

fn to_integer_units(amount: Decimal) -> Result<u128> {
    amount
        .trunc()
        .to_u128()
        .ok_or_else(|| Error::External(format!("amount {amount} is not a valid integer quantity")))
}

#[async_trait]
impl TxBuilder for ChainTxBuilder {
    async fn spend_tx(
        &self,
        sender: &AccountAddress,
        recipient: &AccountAddress,
        amount: Decimal,
    ) -> Result<RawTx> {
        self.node
            .spend_tx(sender, recipient, to_integer_units(amount)?)
            .await
    }

    async fn token_transfer_tx(
        &self,
        caller: &AccountAddress,
        token: &ContractAddress,
        recipient: &AccountAddress,
        amount: Decimal,
    ) -> Result<RawTx> {
        let call_data = self
            .helper
            .encode_calldata(
                FUNGIBLE_TOKEN_CONTRACT,
                "transfer",
                vec![
                    Value::String(recipient.as_str().to_string()),
                    Value::String(to_integer_units(amount)?.to_string()),
                ],
            )
            .await?;
        self.node.contract_call_tx(caller, token, &call_data).await
    }

    async fn verify_account_tx(
        &self,
        caller: &AccountAddress,
        chat_identity: &str,
    ) -> Result<RawTx> {
        // The registry only accepts bindings countersigned by the bot.
        let signature = self
            .helper
            .sign_message(&format!("THE_BOT_VERIFIES_{chat_identity}"))
            .await?;
        self.verification_call_tx(
            caller,
            "verify_account",
            vec![
                Value::String(chat_identity.to_string()),
                Value::String(signature),
            ],
        )
        .await
    }

    async fn remove_verified_account_tx(
        &self,
        caller: &AccountAddress,
        chat_identity: &str,
    ) -> Result<RawTx> {
        self.verification_call_tx(
            caller,
            "remove_verified_account",
            vec![Value::String(chat_identity.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_units_reject_negative_amounts() {
        assert_eq!(to_integer_units(Decimal::from(5)).unwrap(), 5);
        assert!(to_integer_units(Decimal::from(-5)).is_err());
        // Fractional dust below one unit is truncated away.
        assert_eq!(
            to_integer_units(Decimal::new(15, 1)).unwrap(), // 1.5
            1
        );
    }
}
