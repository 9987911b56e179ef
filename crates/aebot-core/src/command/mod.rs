pub mod args;
pub mod spec;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    dispatcher::Bot,
    domain::{IncomingMessage, Sender},
    errors::Error,
    storage::ConversationState,
    Result,
};

pub use args::{parse, ParsedArgs};
pub use spec::{ArgSpec, CommandSpec, RoomPolicy, UsageContext};

/// A chat command. The primary handler answers a fresh invocation; the step
/// handler resumes a dialogue this command parked earlier.
#[async_trait]
pub trait Command: Send + Sync {
    fn spec(&self) -> &CommandSpec;

    async fn handle(
        &self,
        bot: &Bot,
        sender: &Sender,
        message: &IncomingMessage,
        parsed: ParsedArgs,
    ) -> Result<String>;

    async fn handle_step(
        &self,
        bot: &Bot,
        sender: &Sender,
        message: &IncomingMessage,
        state: ConversationState,
    ) -> Result<String> {
        let _ = (bot, sender, message, state);
        Err(Error::External(format!(
            "command \"{}\" has no step handler",
            self.spec().name
        )))
    }
}

/// All registered commands, matched by name prefix.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.iter().find(|c| c.spec().name == name)
    }

    /// Longest command name that prefixes `text` wins, so `sendall` is never
    /// shadowed by `send`.
    pub fn match_prefix(&self, text: &str) -> Option<&Arc<dyn Command>> {
        self.commands
            .iter()
            .filter(|c| text.starts_with(c.spec().name))
            .max_by_key(|c| c.spec().name.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(CommandSpec);

    #[async_trait]
    impl Command for Named {
        fn spec(&self) -> &CommandSpec {
            &self.0
        }

        async fn handle(
            &self,
            _bot: &Bot,
            _sender: &Sender,
            _message: &IncomingMessage,
            _parsed: ParsedArgs,
        ) -> Result<String> {
            Ok(self.0.name.to_string())
        }
    }

    fn registry_with(names: &[&'static str]) -> CommandRegistry {
        let mut registry = CommandRegistry::default();
        for name in names {
            registry.register(Arc::new(Named(CommandSpec::new(name, ""))));
        }
        registry
    }

    #[test]
    fn longest_prefix_match_wins() {
        let registry = registry_with(&["send", "sendall"]);
        let matched = registry.match_prefix("sendall 5 to @x").map(|c| c.spec().name);
        assert_eq!(matched, Some("sendall"));
        let matched = registry.match_prefix("send 5 to @x").map(|c| c.spec().name);
        assert_eq!(matched, Some("send"));
    }

    #[test]
    fn unknown_name_matches_nothing() {
        let registry = registry_with(&["balance"]);
        assert!(registry.match_prefix("transfer 1 AE").is_none());
        assert!(registry.get("transfer").is_none());
    }
}
