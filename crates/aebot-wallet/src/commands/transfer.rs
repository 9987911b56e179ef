use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use aebot_core::{
    command::{ArgSpec, Command, CommandSpec, ParsedArgs, UsageContext},
    dispatcher::{Bot, BotContext},
    domain::{is_account_address, AccountAddress, ChatId, IncomingMessage, Sender},
    errors::{Error, UserError},
    ports::RawTx,
    select::{self, SelectToken},
    storage::{ConversationState, PendingTransfer},
    Result,
};

use crate::deeplink;

const COIN_DECIMALS: u32 = 18;

const RECIPIENT_FORMAT_HINT: &str = "You can either send tokens to a verified user on the \
     platform or to a specific wallet address. Use either \u{201c}@user\" or \u{201c}ak_xyz\u{201c}.";

fn transfer_error(message: impl Into<String>) -> Error {
    UserError::Validation(message.into()).into()
}

/// Shift a human amount up into the token's smallest unit.
fn shift_up(amount: Decimal, decimals: u32) -> Result<Decimal> {
    let factor = 10i128
        .checked_pow(decimals)
        .ok_or_else(|| Error::External(format!("unsupported token precision {decimals}")))?;
    amount
        .checked_mul(Decimal::from_i128_with_scale(factor, 0))
        .ok_or_else(|| Error::External(format!("amount {amount} overflows the token precision")))
}

fn confirmation_reply(recipient: &str, recipient_address: &AccountAddress, url: &str) -> String {
    let recipient_info = if recipient.starts_with('@') {
        format!(", wallet address: {recipient_address}")
    } else {
        String::new()
    };
    format!(
        "<p>👍 Sure thing! Please confirm the transaction through the link provided, and I \
         will immediately initiate the transfer to {recipient}{recipient_info}:</p>\n\
         <p><a href=\"{url}\" target=\"_blank\">Confirm Transaction</a> 🔗</p>"
    )
}

fn context_str<'a>(state: &'a ConversationState, key: &str) -> Result<&'a str> {
    state
        .context
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::External(format!("transfer context is missing \"{key}\"")))
}

pub struct TransferCommand {
    spec: CommandSpec,
}

impl TransferCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new("send", "Send tokens to a verified user or Wallet address")
                .args(vec![
                    ArgSpec::required("amount").describe("The amount of tokens to transfer"),
                    ArgSpec::optional("token").describe("The token you want to transfer"),
                    ArgSpec::literal("to"),
                    ArgSpec::required("recipient").describe("The address of the recipient"),
                ])
                .options(Vec::new())
                .usage(UsageContext::dm_only())
                .manual_argument_errors(),
        }
    }

    /// Park the pending transfer and build the sign deeplink for it.
    fn prepare_confirmation(
        &self,
        ctx: &BotContext,
        chat_id: &ChatId,
        raw_tx: &RawTx,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        ctx.store.set_pending_transfer(
            &id,
            &PendingTransfer {
                chat_id: chat_id.clone(),
                requested_at: Utc::now().to_rfc3339(),
            },
        )?;
        Ok(deeplink::sign_transaction_url(
            &ctx.config,
            raw_tx,
            &format!("send/{id}"),
        ))
    }

    async fn coin_transfer(
        &self,
        ctx: &BotContext,
        chat_id: &ChatId,
        address: &AccountAddress,
        amount: Decimal,
        recipient: &str,
        recipient_address: &AccountAddress,
    ) -> Result<String> {
        let balance = ctx.node.balance(address).await?;
        if balance < amount {
            return Err(UserError::InsufficientFunds.into());
        }

        let raw_tx = ctx
            .txs
            .spend_tx(address, recipient_address, shift_up(amount, COIN_DECIMALS)?)
            .await?;
        let url = self.prepare_confirmation(ctx, chat_id, &raw_tx)?;
        Ok(confirmation_reply(recipient, recipient_address, &url))
    }

    async fn token_transfer(
        &self,
        ctx: &BotContext,
        chat_id: &ChatId,
        address: &AccountAddress,
        token: &SelectToken,
        amount: Decimal,
        recipient: &str,
        recipient_address: &AccountAddress,
    ) -> Result<String> {
        let balance: Decimal = token
            .balance
            .parse()
            .map_err(|_| Error::External(format!("unreadable token balance \"{}\"", token.balance)))?;
        if balance - amount < Decimal::ZERO {
            return Err(UserError::InsufficientFunds.into());
        }

        let raw_tx = ctx
            .txs
            .token_transfer_tx(
                address,
                &token.contract_id,
                recipient_address,
                shift_up(amount, token.decimals)?,
            )
            .await?;
        let url = self.prepare_confirmation(ctx, chat_id, &raw_tx)?;
        Ok(confirmation_reply(recipient, recipient_address, &url))
    }
}

impl Default for TransferCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for TransferCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn handle(
        &self,
        bot: &Bot,
        sender: &Sender,
        message: &IncomingMessage,
        parsed: ParsedArgs,
    ) -> Result<String> {
        // Argument errors are reported manually so each gets its own phrasing.
        let Some(amount_text) = parsed.get("amount") else {
            return Err(transfer_error(
                "Ops, it looks like you forgot to specify amount.",
            ));
        };
        let Ok(amount) = amount_text.trim().parse::<Decimal>() else {
            return Err(transfer_error("Oops! 🚫 The amount provided is not a number."));
        };
        if amount <= Decimal::ZERO {
            return Err(transfer_error(
                "Whoa there, friend! We can't work with negative or zero amounts. Please \
                 make sure to use a positive amount for the transfer. Let's keep it positive!",
            ));
        }
        let Some(token) = parsed.get("token") else {
            return Err(transfer_error(
                "Ops, it looks like you forgot to specify the token symbol.",
            ));
        };
        let Some(recipient) = parsed.get("recipient") else {
            return Err(transfer_error(format!(
                "Ops, it looks like you forgot to specify the recipient. {RECIPIENT_FORMAT_HINT}"
            )));
        };
        if !recipient.starts_with('@') && !recipient.starts_with("ak_") {
            return Err(transfer_error(format!(
                "Ops, I could not recognize the recipient you specified. {RECIPIENT_FORMAT_HINT}"
            )));
        }
        if recipient.starts_with("ak_") && !is_account_address(recipient) {
            return Err(transfer_error(
                " Oops, it looks like there might be a tiny hiccup. It appears that the \
                 recipient doesn't have a compatible Wallet.",
            ));
        }
        if let Some(parse_error) = parsed.errors.first() {
            return Err(transfer_error(format!("Error: {parse_error}\n")));
        }

        let ctx = bot.context();
        let address = ctx.verified.resolve_or_fail(sender.id.as_str()).await?;

        let recipient_address = if recipient.starts_with('@') {
            match ctx.verified.resolve(recipient).await {
                Some(resolved) => resolved,
                None => {
                    return Ok(format!(
                        "The user {recipient} doesn't seem to be verified yet❗️"
                    ))
                }
            }
        } else {
            AccountAddress(recipient.to_string())
        };

        if message.tagged_accounts.len() >= 2 {
            return Ok("You can only transfer to one account at a time.".to_string());
        }

        if token == "AE" {
            self.coin_transfer(
                ctx,
                &message.chat_id,
                &address,
                amount,
                recipient,
                &recipient_address,
            )
            .await
        } else {
            let mut extra_context = serde_json::Map::new();
            extra_context.insert("recipient".to_string(), json!(recipient));
            extra_context.insert("recipient_address".to_string(), json!(recipient_address));
            extra_context.insert("amount".to_string(), json!(amount_text));
            extra_context.insert("address".to_string(), json!(address));

            let selected = select::select_token_or_prepare(
                ctx.scanner.as_ref(),
                &ctx.store,
                &address,
                token,
                &sender.id,
                self.spec.name,
                extra_context,
            )
            .await?;

            self.token_transfer(
                ctx,
                &message.chat_id,
                &address,
                &selected,
                amount,
                recipient,
                &recipient_address,
            )
            .await
        }
    }

    async fn handle_step(
        &self,
        bot: &Bot,
        sender: &Sender,
        message: &IncomingMessage,
        state: ConversationState,
    ) -> Result<String> {
        let ctx = bot.context();
        let result = async {
            let selected: SelectToken = select::resolve_selection(&message.text, &state)?;

            let address = AccountAddress(context_str(&state, "address")?.to_string());
            let recipient = context_str(&state, "recipient")?.to_string();
            let recipient_address =
                AccountAddress(context_str(&state, "recipient_address")?.to_string());
            let amount: Decimal = context_str(&state, "amount")?
                .trim()
                .parse()
                .map_err(|_| Error::External("unreadable parked amount".to_string()))?;

            self.token_transfer(
                ctx,
                &message.chat_id,
                &address,
                &selected,
                amount,
                &recipient,
                &recipient_address,
            )
            .await
        }
        .await;

        // One reply ends the dialogue, even when the pick was invalid.
        ctx.store.clear_conversation_state(&sender.id)?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_up_moves_the_decimal_point() {
        assert_eq!(
            shift_up(Decimal::new(15, 1), 18).unwrap().to_string(),
            "1500000000000000000.0"
        );
        assert_eq!(shift_up(Decimal::from(2), 6).unwrap(), Decimal::from(2_000_000));
    }

    #[test]
    fn confirmation_reply_names_the_wallet_only_for_tagged_users() {
        let address = AccountAddress("ak_abc".to_string());
        let tagged = confirmation_reply("@bob:example.org", &address, "https://x");
        assert!(tagged.contains("@bob:example.org, wallet address: ak_abc"));

        let direct = confirmation_reply("ak_abc", &address, "https://x");
        assert!(direct.contains("transfer to ak_abc:"));
        assert!(!direct.contains("wallet address"));
    }

    mod flows {
        use rust_decimal::Decimal;

        use crate::{testing, WalletBot};
        use aebot_core::domain::IncomingMessage;

        async fn wallet(world: testing::World) -> WalletBot {
            WalletBot::new(testing::context(world).await)
        }

        async fn reply(bot: &WalletBot, sender: &str, text: &str) -> String {
            bot.bot()
                .on_message(
                    &testing::dm_sender(sender),
                    &IncomingMessage::direct("!dm", text),
                )
                .await
                .unwrap()
        }

        #[tokio::test]
        async fn each_missing_argument_gets_its_own_message() {
            let bot = wallet(testing::World::default()).await;

            let text = reply(&bot, "@a:x", "/send").await;
            assert_eq!(text, "Ops, it looks like you forgot to specify amount.");

            let text = reply(&bot, "@a:x", "/send abc AE to @b:x").await;
            assert_eq!(text, "Oops! 🚫 The amount provided is not a number.");

            let text = reply(&bot, "@a:x", "/send -3 AE to @b:x").await;
            assert!(text.starts_with("Whoa there, friend!"));

            let text = reply(&bot, "@a:x", "/send 10 AE to bob").await;
            assert!(text.starts_with("Ops, I could not recognize the recipient"));

            let text = reply(&bot, "@a:x", "/send 10 AE to ak_tooShort").await;
            assert!(text.contains("doesn't have a compatible Wallet"));
        }

        #[tokio::test]
        async fn coin_transfer_builds_a_spend_confirmation() {
            let bot = wallet(testing::World {
                verified: vec![
                    ("@a:x", testing::ADDRESS),
                    ("@bob:x", testing::OTHER_ADDRESS),
                ],
                coin_balance: Decimal::from(50),
                ..Default::default()
            })
            .await;

            let text = reply(&bot, "@a:x", "/send 10 AE to @bob:x").await;
            assert!(text.contains("Confirm Transaction"));
            assert!(text.contains("transaction=tx_spend"));
            assert!(text.contains(&format!(
                "@bob:x, wallet address: {}",
                testing::OTHER_ADDRESS
            )));
        }

        #[tokio::test]
        async fn coin_transfer_requires_sufficient_balance() {
            let bot = wallet(testing::World {
                verified: vec![
                    ("@a:x", testing::ADDRESS),
                    ("@bob:x", testing::OTHER_ADDRESS),
                ],
                coin_balance: Decimal::from(5),
                ..Default::default()
            })
            .await;

            let text = reply(&bot, "@a:x", "/send 10 AE to @bob:x").await;
            assert!(text.contains("insufficient funds"));
        }

        #[tokio::test]
        async fn unverified_recipient_is_reported_by_name() {
            let bot = wallet(testing::World {
                verified: vec![("@a:x", testing::ADDRESS)],
                coin_balance: Decimal::from(50),
                ..Default::default()
            })
            .await;

            let text = reply(&bot, "@a:x", "/send 10 AE to @stranger:x").await;
            assert_eq!(
                text,
                "The user @stranger:x doesn't seem to be verified yet❗️"
            );
        }

        #[tokio::test]
        async fn ambiguous_token_transfer_resumes_from_parked_context() {
            let bot = wallet(testing::World {
                verified: vec![("@a:x", testing::ADDRESS)],
                tokens: vec![
                    testing::token("TKN", "ct_1", 10_000_000, 6),
                    testing::token("TKN", "ct_2", 20_000_000, 6),
                ],
                ..Default::default()
            })
            .await;
            let sender = testing::dm_sender("@a:x");

            let text = reply(
                &bot,
                "@a:x",
                &format!("/send 5 TKN to {}", testing::OTHER_ADDRESS),
            )
            .await;
            assert!(text.contains("multiple TKN tokens"));

            let text = reply(&bot, "@a:x", "1").await;
            assert!(text.contains("Confirm Transaction"));
            assert!(text.contains("transaction=tx_token"));
            assert!(bot
                .bot()
                .context()
                .store
                .conversation_state(&sender.id)
                .unwrap()
                .is_none());
        }

        #[tokio::test]
        async fn token_transfer_checks_the_selected_balance() {
            let bot = wallet(testing::World {
                verified: vec![("@a:x", testing::ADDRESS)],
                tokens: vec![testing::token("TKN", "ct_1", 2_000_000, 6)],
                ..Default::default()
            })
            .await;

            let text = reply(
                &bot,
                "@a:x",
                &format!("/send 5 TKN to {}", testing::OTHER_ADDRESS),
            )
            .await;
            assert!(text.contains("insufficient funds"));
        }

        #[tokio::test]
        async fn more_than_one_tagged_account_is_rejected() {
            let bot = wallet(testing::World {
                verified: vec![
                    ("@a:x", testing::ADDRESS),
                    ("@bob:x", testing::OTHER_ADDRESS),
                ],
                coin_balance: Decimal::from(50),
                ..Default::default()
            })
            .await;

            let mut message = IncomingMessage::direct("!dm", "/send 10 AE to @bob:x");
            message.tagged_accounts = vec![
                aebot_core::domain::TaggedAccount {
                    id: aebot_core::domain::SenderId("@bob:x".to_string()),
                    display_name: "bob".to_string(),
                },
                aebot_core::domain::TaggedAccount {
                    id: aebot_core::domain::SenderId("@carol:x".to_string()),
                    display_name: "carol".to_string(),
                },
            ];
            let text = bot
                .bot()
                .on_message(&testing::dm_sender("@a:x"), &message)
                .await
                .unwrap();
            assert_eq!(text, "You can only transfer to one account at a time.");
        }
    }
}
