//! Numeric disambiguation: when a lookup is ambiguous, park the candidates in
//! Conversation State and resolve them from the user's follow-up reply.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{AccountAddress, ContractAddress, SenderId},
    errors::{Error, UserError},
    ports::TokenScanner,
    storage::{ConversationState, Step, TypedStore},
    Result,
};

pub const NOT_A_NUMBER: &str =
    "Oops! It looks like you didn't enter a number. Please try again by entering the number of your choice";
pub const NOT_IN_LIST: &str =
    "Oops! It looks like you entered a number that is not in the list. Please try again by entering the number of your choice";

/// One token candidate offered during disambiguation. The balance is already
/// shifted out of the token's smallest unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectToken {
    pub symbol: String,
    pub balance: String,
    pub decimals: u32,
    #[serde(rename = "contractId")]
    pub contract_id: ContractAddress,
}

/// Interpret `reply` as a 1-based index into the parked `options` list.
pub fn resolve_selection<T: DeserializeOwned>(reply: &str, state: &ConversationState) -> Result<T> {
    let selected: i64 = reply
        .trim()
        .parse()
        .map_err(|_| UserError::Validation(NOT_A_NUMBER.to_string()))?;

    let options = state
        .context
        .get("options")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if selected < 1 || selected as usize > options.len() {
        return Err(UserError::Validation(NOT_IN_LIST.to_string()).into());
    }

    let choice = options[(selected - 1) as usize].clone();
    serde_json::from_value(choice).map_err(Error::from)
}

/// Find the account's balance for `symbol`. A single match resolves
/// immediately; zero matches fail; multiple matches park the candidates under
/// `command` and surface a numbered pick list.
pub async fn select_token_or_prepare(
    scanner: &dyn TokenScanner,
    store: &TypedStore,
    address: &AccountAddress,
    symbol: &str,
    sender: &SenderId,
    command: &str,
    extra_context: serde_json::Map<String, Value>,
) -> Result<SelectToken> {
    let balances = scanner.account_token_balances(address).await?;

    let mut matches: Vec<SelectToken> = balances
        .into_iter()
        .filter(|token| token.symbol.eq_ignore_ascii_case(symbol))
        .map(|token| SelectToken {
            balance: shift_down(token.amount, token.decimals),
            symbol: token.symbol,
            decimals: token.decimals,
            contract_id: token.contract_id,
        })
        .collect();

    match matches.len() {
        0 => Err(UserError::NoTokenFound.into()),
        1 => Ok(matches.remove(0)),
        _ => {
            let mut context = extra_context;
            context.insert("options".to_string(), serde_json::to_value(&matches)?);
            store.set_conversation_state(
                sender,
                &ConversationState {
                    command: command.to_string(),
                    step: Step::TokenSelectAwaitingUserChoice,
                    context,
                },
            )?;

            let listing: String = matches
                .iter()
                .enumerate()
                .map(|(index, token)| {
                    format!("\n{}. {} {}", index + 1, token.symbol, token.contract_id)
                })
                .collect();
            Err(UserError::MultipleTokensFound {
                symbol: symbol.to_string(),
                listing,
            }
            .into())
        }
    }
}

/// Shift an integer token amount down by `decimals`, trimming trailing zeros.
pub fn shift_down(amount: rust_decimal::Decimal, decimals: u32) -> String {
    let shifted = amount * rust_decimal::Decimal::new(1, decimals.min(28));
    shifted.normalize().to_string()
}
