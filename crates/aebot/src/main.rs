use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use aebot_chain::{
    ChainTxBuilder, ContractHelperClient, ContractLedgerClient, MiddlewareClient, NodeHttpClient,
};
use aebot_core::{
    config::Config,
    dispatcher::BotContext,
    domain::{ChatEvent, ChatId, IncomingMessage, RoomMetadata, Sender, SenderId},
    ports::ChatAdapter,
    rates::{CoinGeckoClient, PriceRates, PROTOCOL_AETERNITY},
    storage::{FileStore, TypedStore},
    verified::VerifiedAccounts,
};
use aebot_wallet::{CallbackState, WalletBot};

/// Terminal chat front end: the operator talks to the bot over stdin/stdout
/// as a one-on-one conversation.
#[derive(Default)]
struct ConsoleAdapter;

#[async_trait]
impl ChatAdapter for ConsoleAdapter {
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> aebot_core::Result<()> {
        println!("[{chat_id}] {text}");
        Ok(())
    }

    async fn set_typing(&self, _chat_id: &ChatId, _typing: bool) -> aebot_core::Result<()> {
        Ok(())
    }
}

async fn run_console(bot: Arc<WalletBot>, adapter: Arc<dyn ChatAdapter>) -> anyhow::Result<()> {
    let chat = ChatId("console".to_string());
    let sender = Sender {
        id: SenderId("@console".to_string()),
        display_name: "console".to_string(),
        is_direct: true,
    };

    if let Some(welcome) = bot.on_room_join(
        &chat,
        &ChatEvent {
            sender: sender.id.clone(),
            event_type: "join".to_string(),
        },
        &RoomMetadata {
            is_direct: true,
            room_name: None,
        },
    ) {
        adapter.send_message(&chat, &welcome).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let message = IncomingMessage::direct(chat.as_str(), text);
        if let Err(err) = bot.bot().process(adapter.as_ref(), &sender, &message).await {
            tracing::error!(error = %err, "message processing failed");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aebot_core::logging::init("aebot")?;

    let config = Arc::new(Config::load()?);
    let store = TypedStore::new(Arc::new(FileStore::open(&config.storage_file)?));

    let node = NodeHttpClient::new(config.network.node_url);
    let helper = ContractHelperClient::new(config.contract_helper_url.clone());
    let verification_contract = config
        .verification_contract
        .clone()
        .context("ACCOUNT_VERIFICATION_CONTRACT must be set")?;

    let ledger = Arc::new(ContractLedgerClient::new(
        node.clone(),
        helper.clone(),
        verification_contract.clone(),
    ));
    let verified = VerifiedAccounts::new(ledger, config.verified_refresh_interval);
    verified.init().await?;

    let rates = Arc::new(PriceRates::new(Arc::new(CoinGeckoClient::new(
        config.coin_gecko_api_url.clone(),
    ))));
    if let Err(err) = rates.preload(PROTOCOL_AETERNITY).await {
        tracing::warn!(error = %err, "price rate preload failed, rates load lazily");
    }

    let ctx = Arc::new(BotContext {
        config: config.clone(),
        store: store.clone(),
        verified: verified.clone(),
        node: Arc::new(node.clone()),
        scanner: Arc::new(MiddlewareClient::new(config.network.middleware_url)),
        txs: Arc::new(ChainTxBuilder::new(node, helper, verification_contract)),
        rates,
    });
    let bot = Arc::new(WalletBot::new(ctx));

    let adapter: Arc<dyn ChatAdapter> = Arc::new(ConsoleAdapter);
    let callback_state = Arc::new(CallbackState {
        store,
        verified: verified.clone(),
        adapters: vec![adapter.clone()],
    });
    let app = axum::Router::new().nest("/ae-wallet-bot", aebot_wallet::router(callback_state));
    let listener = tokio::net::TcpListener::bind(&config.callback_bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.callback_bind_addr))?;
    tracing::info!(addr = %config.callback_bind_addr, "callback server listening");

    tokio::select! {
        result = async { axum::serve(listener, app).await } => {
            result.context("callback server failed")?
        }
        result = run_console(bot, adapter) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    verified.shutdown().await;
    Ok(())
}
