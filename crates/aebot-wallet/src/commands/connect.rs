use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use aebot_core::{
    command::{ArgSpec, Command, CommandSpec, ParsedArgs, UsageContext},
    dispatcher::Bot,
    domain::{AccountAddress, IncomingMessage, Sender},
    errors::UserError,
    storage::PendingVerification,
    Result,
};

use crate::deeplink;

/// Appended to every connect validation error so the user always sees the
/// expected format.
fn connect_error(message: &str) -> UserError {
    UserError::Validation(format!(
        "{message}<br /><br />To connect your wallet, please use this format: \
         <b>/connect \u{201c}address\u{201d}</b>.<br />For example: /connect ak_xyz"
    ))
}

pub struct ConnectCommand {
    spec: CommandSpec,
}

impl ConnectCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new("connect", "Connect your Wallet")
                .args(vec![ArgSpec::required("address")
                    .describe("The address of the wallet you want to connect")])
                .options(Vec::new())
                .usage(UsageContext::dm_only())
                .manual_argument_errors(),
        }
    }
}

impl Default for ConnectCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for ConnectCommand {
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
        let Some(address) = parsed.get("address").and_then(AccountAddress::parse) else {
            return Err(connect_error(
                "Ops, it looks like you forgot to specify a valid account to connect to.",
            )
            .into());
        };

        let ctx = bot.context();
        let raw_tx = ctx.txs.verify_account_tx(&address, sender.id.as_str()).await?;

        let id = Uuid::new_v4().to_string();
        ctx.store.set_pending_verification(
            &id,
            &PendingVerification {
                address,
                sender_id: sender.id.clone(),
                chat_id: message.chat_id.clone(),
                requested_at: Utc::now().to_rfc3339(),
            },
        )?;

        let sign_transaction_url =
            deeplink::sign_transaction_url(&ctx.config, &raw_tx, &format!("verified-wallet/{id}"));
        Ok(format!(
            "<p>🔗 Sure! To connect the wallet, please sign the transaction link below to \
             connect your Superhero Wallet with me. 🦸‍♂️</p>\n\
             <p><a href=\"{sign_transaction_url}\" target=\"_blank\">Sign Transaction</a></p>"
        ))
    }
}
