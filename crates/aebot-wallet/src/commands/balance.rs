use async_trait::async_trait;

use aebot_core::{
    command::{ArgSpec, Command, CommandSpec, ParsedArgs, UsageContext},
    dispatcher::Bot,
    domain::{IncomingMessage, Sender},
    rates::{DEFAULT_CURRENCY_CODE, PROTOCOL_AETERNITY},
    select::{self, SelectToken},
    storage::ConversationState,
    Result,
};

pub struct BalanceCommand {
    spec: CommandSpec,
}

impl BalanceCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new("balance", "Check your wallet balance")
                .args(vec![ArgSpec::optional("token")
                    .describe("The token you want to check the balance of")])
                .options(vec![ArgSpec::optional("currency")
                    .describe("The currency you want to get the balance formatted in")
                    .example("usd")])
                .usage(UsageContext::dm_only()),
        }
    }
}

impl Default for BalanceCommand {
    fn default() -> Self {
        Self::new()
    }
}

fn is_coin_symbol(token: Option<&str>) -> bool {
    match token {
        None => true,
        Some(symbol) => {
            symbol.eq_ignore_ascii_case("ae") || symbol.eq_ignore_ascii_case("aeternity")
        }
    }
}

#[async_trait]
impl Command for BalanceCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn handle(
        &self,
        bot: &Bot,
        sender: &Sender,
        _message: &IncomingMessage,
        parsed: ParsedArgs,
    ) -> Result<String> {
        let ctx = bot.context();
        let address = ctx.verified.resolve_or_fail(sender.id.as_str()).await?;

        let token = parsed.get("token");
        let handle_as_coin = is_coin_symbol(token);

        let (balance, symbol) = if handle_as_coin {
            let balance = ctx.node.balance(&address).await?;
            (balance.normalize().to_string(), "AE".to_string())
        } else {
            let selected = select::select_token_or_prepare(
                ctx.scanner.as_ref(),
                &ctx.store,
                &address,
                token.unwrap_or_default(),
                &sender.id,
                self.spec.name,
                serde_json::Map::new(),
            )
            .await?;
            (selected.balance, selected.symbol)
        };

        // Fiat conversion only makes sense for the coin itself; a rate outage
        // must not take the balance reply down with it.
        let fiat_text = if handle_as_coin {
            let currency = parsed.option("currency").unwrap_or(DEFAULT_CURRENCY_CODE);
            match ctx
                .rates
                .formatted_fiat(&balance, PROTOCOL_AETERNITY, currency)
                .await
            {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(error = %err, "fiat conversion unavailable");
                    String::new()
                }
            }
        } else {
            String::new()
        };

        Ok(format!("Your wallet balance is: {balance} {symbol}\n{fiat_text}"))
    }

    async fn handle_step(
        &self,
        bot: &Bot,
        sender: &Sender,
        message: &IncomingMessage,
        state: ConversationState,
    ) -> Result<String> {
        // One reply ends the dialogue, even when the pick was invalid.
        let result = select::resolve_selection::<SelectToken>(&message.text, &state).map(
            |selected| {
                format!(
                    "Your wallet balance is: {} {}",
                    selected.balance, selected.symbol
                )
            },
        );
        bot.context().store.clear_conversation_state(&sender.id)?;
        result
    }
}
