//! Superhero Wallet sign-transaction deeplinks.
//!
//! The wallet opens the link, lets the user sign and broadcast the raw
//! transaction, then hits the `x-success` callback so the bot can report
//! completion in chat.

use aebot_core::{config::Config, ports::RawTx};
use url::Url;

const WALLET_SIGN_URL: &str = "https://wallet.superhero.com/sign-transaction";

/// Build the deeplink for `raw_tx`. `callback_path` is relative to the
/// configured callback base URL, e.g. `send/<uuid>`.
pub fn sign_transaction_url(config: &Config, raw_tx: &RawTx, callback_path: &str) -> String {
    let mut url = Url::parse(WALLET_SIGN_URL).expect("valid wallet url");
    url.query_pairs_mut()
        .append_pair("transaction", raw_tx.as_str())
        .append_pair("networkId", config.network.network_id)
        .append_pair("broadcast", "true")
        .append_pair(
            "x-success",
            &format!("{}/{callback_path}", config.callback_base_url),
        );
    url.to_string()
}
