use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use aebot_core::{
    command::{Command, CommandSpec, ParsedArgs, UsageContext},
    dispatcher::Bot,
    domain::{IncomingMessage, Sender},
    storage::PendingRemoval,
    Result,
};

use crate::deeplink;

pub struct DisconnectCommand {
    spec: CommandSpec,
}

impl DisconnectCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new("disconnect", "Disconnect your Wallet")
                .options(Vec::new())
                .usage(UsageContext::dm_only()),
        }
    }
}

impl Default for DisconnectCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for DisconnectCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn handle(
        &self,
        bot: &Bot,
        sender: &Sender,
        message: &IncomingMessage,
        _parsed: ParsedArgs,
    ) -> Result<String> {
        let ctx = bot.context();
        let caller = ctx.verified.resolve_or_fail(sender.id.as_str()).await?;
        let raw_tx = ctx
            .txs
            .remove_verified_account_tx(&caller, sender.id.as_str())
            .await?;

        let id = Uuid::new_v4().to_string();
        ctx.store.set_pending_removal(
            &id,
            &PendingRemoval {
                sender_id: sender.id.clone(),
                chat_id: message.chat_id.clone(),
                requested_at: Utc::now().to_rfc3339(),
            },
        )?;

        let sign_transaction_url = deeplink::sign_transaction_url(
            &ctx.config,
            &raw_tx,
            &format!("remove-verified-wallet/{id}"),
        );
        Ok(format!(
            "🔗 Sure! To remove the previous connection, please sign the transaction using \
             the link below:\n[Remove Connection]({sign_transaction_url})"
        ))
    }
}
