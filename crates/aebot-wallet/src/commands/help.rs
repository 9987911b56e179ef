use async_trait::async_trait;

use aebot_core::{
    command::{Command, CommandSpec, ParsedArgs},
    dispatcher::Bot,
    domain::{IncomingMessage, Sender},
    Result,
};

pub struct HelpCommand {
    spec: CommandSpec,
}

impl HelpCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new("help", "Show help").options(Vec::new()),
        }
    }
}

impl Default for HelpCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn handle(
        &self,
        bot: &Bot,
        _sender: &Sender,
        _message: &IncomingMessage,
        _parsed: ParsedArgs,
    ) -> Result<String> {
        let mut help = "Available commands:\n".to_string();
        for command in bot.commands().iter() {
            let spec = command.spec();
            help.push_str(&format!(
                "{}{} {} - {}\n",
                bot.prefix(),
                spec.name,
                spec.signature(),
                spec.description
            ));
        }
        Ok(help)
    }
}

#[cfg(test)]
mod tests {
    use crate::{testing, WalletBot};
    use aebot_core::domain::IncomingMessage;

    #[tokio::test]
    async fn help_lists_every_command_with_its_signature() {
        let bot = WalletBot::new(testing::context(testing::World::default()).await);
        let reply = bot
            .bot()
            .on_message(
                &testing::dm_sender("@a:x"),
                &IncomingMessage::direct("!dm", "/help"),
            )
            .await
            .unwrap();

        assert!(reply.starts_with("Available commands:\n"));
        assert!(reply.contains(
            "/send {amount} {token} to {recipient} - Send tokens to a verified user or Wallet address\n"
        ));
        assert!(reply.contains("/connect {address} - Connect your Wallet\n"));
        assert!(reply.contains("/disconnect  - Disconnect your Wallet\n"));
    }
}
