use std::sync::Arc;

use aebot_core::{
    command::CommandRegistry,
    dispatcher::{Bot, BotContext},
    domain::{ChatEvent, ChatId, RoomMetadata},
};

use crate::commands::{
    BalanceCommand, ConnectCommand, DisconnectCommand, HelpCommand, TransferCommand,
};

const WELCOME_MESSAGE: &str = "<p>Hi there! 👋 Welcome to the Wallet Bot! I'm your trusted \
DeFi companion, here to simplify your crypto experience! With my superpowers, I can securely \
transfer your tokens, check your balance, and more! </p>\n\n\
<p>But before we dive in, let's get you set up:</p>\n\n\
<ol>\n\
  <li>First, download the Superhero Wallet: <a href=\"https://wallet.superhero.com\" \
target=\"_blank\">Superhero Wallet</a> 📥</li>\n\
  <li>After you have downloaded the Wallet and created an account, connect your Superhero \
Wallet to me.</li>\n\
  <li>Type: <code>/connect \"your wallet address\"</code><br>For example: \
<code>/connect ak_xyz</code></li>\n\
</ol>";

/// The wallet bot: the dispatcher wired with the wallet command set.
pub struct WalletBot {
    inner: Bot,
}

impl WalletBot {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        let prefix = ctx.config.command_prefix.clone();

        let mut commands = CommandRegistry::default();
        commands.register(Arc::new(HelpCommand::new()));
        commands.register(Arc::new(ConnectCommand::new()));
        commands.register(Arc::new(BalanceCommand::new()));
        commands.register(Arc::new(TransferCommand::new()));
        commands.register(Arc::new(DisconnectCommand::new()));

        Self {
            inner: Bot::new(prefix, commands, ctx),
        }
    }

    pub fn bot(&self) -> &Bot {
        &self.inner
    }

    /// Greeting for a freshly joined room; only one-on-one chats get one.
    pub fn on_room_join(
        &self,
        chat_id: &ChatId,
        event: &ChatEvent,
        metadata: &RoomMetadata,
    ) -> Option<String> {
        tracing::debug!(chat_id = %chat_id, sender = %event.sender, kind = %event.event_type, "room joined");
        if let Err(err) = self
            .inner
            .context()
            .store
            .set_room_metadata(chat_id, metadata)
        {
            tracing::warn!(chat_id = %chat_id, error = %err, "failed to store room metadata");
        }

        metadata.is_direct.then(|| WELCOME_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn all_wallet_commands_are_registered() {
        let bot = WalletBot::new(testing::context(testing::World::default()).await);
        for name in ["help", "connect", "balance", "send", "disconnect"] {
            assert!(bot.bot().commands().get(name).is_some(), "missing {name}");
        }
    }

    #[tokio::test]
    async fn only_direct_rooms_are_greeted() {
        let bot = WalletBot::new(testing::context(testing::World::default()).await);
        let chat = ChatId("!dm:example.org".to_string());
        let join = ChatEvent {
            sender: aebot_core::domain::SenderId("@alice:example.org".to_string()),
            event_type: "m.room.member".to_string(),
        };

        let greeting = bot.on_room_join(
            &chat,
            &join,
            &RoomMetadata {
                is_direct: true,
                room_name: None,
            },
        );
        assert!(greeting.unwrap().contains("Welcome to the Wallet Bot"));

        let silent = bot.on_room_join(
            &ChatId("!room:example.org".to_string()),
            &join,
            &RoomMetadata {
                is_direct: false,
                room_name: Some("#general".to_string()),
            },
        );
        assert_eq!(silent, None);

        // join bookkeeping is persisted either way
        let stored = bot
            .bot()
            .context()
            .store
            .room_metadata(&chat)
            .unwrap()
            .unwrap();
        assert!(stored.is_direct);
    }
}
