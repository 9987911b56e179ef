//! HTTP surface the Superhero Wallet calls back into after the user signs
//! and broadcasts a transaction the bot prepared.
//!
//! Every confirmation endpoint is a GET keyed by the pending-request id the
//! deeplink carried, so the wallet's `x-success` redirect can hit it
//! directly from the browser.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use aebot_core::{
    domain::ChatId, errors::Error, ports::ChatAdapter, storage::TypedStore,
    verified::VerifiedAccounts,
};

const VERIFIED_PAGE: &str =
    "<script>window.close();</script>Account Verified successfully created, this window can be closed.";
const REMOVED_PAGE: &str =
    "<script>window.close();</script>Account Verification successfully removed, this window can be closed.";

pub struct CallbackState {
    pub store: TypedStore,
    pub verified: Arc<VerifiedAccounts>,
    pub adapters: Vec<Arc<dyn ChatAdapter>>,
}

pub fn router(state: Arc<CallbackState>) -> Router {
    Router::new()
        .route("/verified-wallet/{id}", get(verified_wallet))
        .route("/remove-verified-wallet/{id}", get(remove_verified_wallet))
        .route("/send/{id}", get(send_confirmed))
        .route("/get-verified-accounts", post(get_verified_accounts))
        .with_state(state)
}

async fn notify(state: &CallbackState, chat_id: &ChatId, text: &str) {
    for adapter in &state.adapters {
        if let Err(err) = adapter.send_message(chat_id, text).await {
            tracing::warn!(chat_id = %chat_id, error = %err, "callback notification failed");
        }
    }
}

fn internal_error(err: Error) -> Response {
    tracing::error!(error = %err, "callback handling failed");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

async fn verified_wallet(
    State(state): State<Arc<CallbackState>>,
    Path(id): Path<String>,
) -> Response {
    let pending = match state.store.pending_verification(&id) {
        Ok(Some(pending)) => pending,
        Ok(None) => return (StatusCode::NOT_FOUND, "Verification not found").into_response(),
        Err(err) => return internal_error(err),
    };

    match state
        .verified
        .verify_and_add(pending.sender_id.as_str(), &pending.address)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            // The ledger disagrees with the claimed address; the signed call
            // either failed or bound a different account.
            return (StatusCode::CONFLICT, "Verification not found on chain").into_response();
        }
        Err(err) => return internal_error(err),
    }

    notify(
        &state,
        &pending.chat_id,
        "Fantastic! Your wallet is now securely connected",
    )
    .await;
    Html(VERIFIED_PAGE).into_response()
}

async fn remove_verified_wallet(
    State(state): State<Arc<CallbackState>>,
    Path(id): Path<String>,
) -> Response {
    let pending = match state.store.pending_removal(&id) {
        Ok(Some(pending)) => pending,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Your original request could not found").into_response()
        }
        Err(err) => return internal_error(err),
    };

    state.verified.remove(pending.sender_id.as_str()).await;

    notify(
        &state,
        &pending.chat_id,
        "Farewell, my friend! Your wallet is now safely disconnected. If you ever need to \
         reconnect, you know where to find me. Until next time!",
    )
    .await;
    Html(REMOVED_PAGE).into_response()
}

async fn send_confirmed(State(state): State<Arc<CallbackState>>, Path(id): Path<String>) -> Response {
    let pending = match state.store.pending_transfer(&id) {
        Ok(Some(pending)) => pending,
        Ok(None) => return (StatusCode::NOT_FOUND, "Send not found").into_response(),
        Err(err) => return internal_error(err),
    };

    notify(&state, &pending.chat_id, "✅Perfect! Transfer completed!").await;
    Html(VERIFIED_PAGE).into_response()
}

#[derive(Debug, Default, Deserialize)]
struct VerifiedAccountsFilter {
    #[serde(default, alias = "filterAccounts")]
    filter_accounts: Vec<String>,
}

async fn get_verified_accounts(
    State(state): State<Arc<CallbackState>>,
    Json(body): Json<VerifiedAccountsFilter>,
) -> Response {
    let accounts = state.verified.snapshot(&body.filter_accounts).await;
    Json(accounts).into_response()
}
