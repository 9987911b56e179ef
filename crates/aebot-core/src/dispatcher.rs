//! Message dispatch: prefix matching, usage gating, argument parsing, and
//! routing between fresh invocations and parked dialogue steps.
//!
//! A sender is either `Idle` (no Conversation State) or `AwaitingStep`. While
//! awaiting a step, every message from that sender goes to the owning
//! command's step handler, even if it happens to look like a new command.

use std::sync::Arc;

use crate::{
    command::{args, Command, CommandRegistry, RoomPolicy},
    config::Config,
    domain::{IncomingMessage, Sender},
    errors::{Error, GENERIC_APOLOGY},
    ports::{ChatAdapter, NodeClient, TokenScanner, TxBuilder},
    rates::PriceRates,
    storage::TypedStore,
    verified::VerifiedAccounts,
    Result,
};

/// Shared collaborators handed to every command handler.
pub struct BotContext {
    pub config: Arc<Config>,
    pub store: TypedStore,
    pub verified: Arc<VerifiedAccounts>,
    pub node: Arc<dyn NodeClient>,
    pub scanner: Arc<dyn TokenScanner>,
    pub txs: Arc<dyn TxBuilder>,
    pub rates: Arc<PriceRates>,
}

pub struct Bot {
    prefix: String,
    commands: CommandRegistry,
    ctx: Arc<BotContext>,
}

impl Bot {
    pub fn new(prefix: impl Into<String>, commands: CommandRegistry, ctx: Arc<BotContext>) -> Self {
        Self {
            prefix: prefix.into(),
            commands,
            ctx,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    /// Handle one inbound message. `None` means the message was not for us.
    pub async fn on_message(&self, sender: &Sender, message: &IncomingMessage) -> Option<String> {
        match self.dispatch(sender, message).await {
            Ok(reply) => reply,
            Err(Error::UserFacing(user_error)) => Some(user_error.to_string()),
            Err(internal) => {
                tracing::error!(
                    sender = %sender.id,
                    error = %internal,
                    "command handling failed"
                );
                Some(GENERIC_APOLOGY.to_string())
            }
        }
    }

    /// Convenience wrapper that drives the typing indicator and sends the
    /// reply through the adapter the message arrived on.
    pub async fn process(
        &self,
        adapter: &dyn ChatAdapter,
        sender: &Sender,
        message: &IncomingMessage,
    ) -> Result<()> {
        adapter.set_typing(&message.chat_id, true).await?;
        let reply = self.on_message(sender, message).await;
        adapter.set_typing(&message.chat_id, false).await?;
        if let Some(reply) = reply {
            adapter.send_message(&message.chat_id, &reply).await?;
        }
        Ok(())
    }

    async fn dispatch(&self, sender: &Sender, message: &IncomingMessage) -> Result<Option<String>> {
        // A parked dialogue owns the sender's next message.
        if let Some(state) = self.ctx.store.conversation_state(&sender.id)? {
            let Some(command) = self.commands.get(&state.command) else {
                tracing::warn!(
                    sender = %sender.id,
                    command = %state.command,
                    "conversation state references an unregistered command"
                );
                return Ok(Some(format!(
                    "Unknown interaction,\nPlease start fresh! use <b>{}help</b> to see the available commands",
                    self.prefix
                )));
            };
            return command
                .handle_step(self, sender, message, state)
                .await
                .map(Some);
        }

        let Some(after_prefix) = message.text.strip_prefix(&self.prefix) else {
            return Ok(None);
        };
        let Some(command) = self.commands.match_prefix(after_prefix) else {
            return Ok(None);
        };
        let spec = command.spec();

        if !usage_allowed(spec, sender, message) {
            return Ok(None);
        }

        if message.text.contains("--help") {
            return Ok(Some(spec.usage_text(&self.prefix)));
        }

        let rest = &after_prefix[spec.name.len()..];
        let parsed = args::parse(spec, rest);
        if spec.auto_argument_error {
            if let Some(error) = parsed.errors.first() {
                return Ok(Some(error.clone()));
            }
        }

        command.handle(self, sender, message, parsed).await.map(Some)
    }
}

fn usage_allowed(
    spec: &crate::command::CommandSpec,
    sender: &Sender,
    message: &IncomingMessage,
) -> bool {
    if sender.is_direct {
        return spec.usage.dm;
    }
    match &spec.usage.room {
        RoomPolicy::Allow => true,
        RoomPolicy::Deny => false,
        RoomPolicy::NamePrefix(prefix) => message
            .room_name
            .as_deref()
            .map(|name| name.starts_with(prefix))
            .unwrap_or(false),
    }
}
