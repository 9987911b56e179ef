use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ContractAddress, errors::Error, Result};

/// Target chain endpoints. Node ids map to well-known public deployments;
/// hyperchains would report different ids and are not configured here.
#[derive(Clone, Debug)]
pub struct Network {
    pub name: &'static str,
    pub network_id: &'static str,
    pub node_url: &'static str,
    pub middleware_url: &'static str,
    pub explorer_url: &'static str,
}

pub const NETWORK_MAINNET: Network = Network {
    name: "Mainnet",
    network_id: "ae_mainnet",
    node_url: "https://mainnet.aeternity.io",
    middleware_url: "https://mainnet.aeternity.io/mdw",
    explorer_url: "https://explorer.aeternity.io",
};

pub const NETWORK_TESTNET: Network = Network {
    name: "Testnet",
    network_id: "ae_uat",
    node_url: "https://testnet.aeternity.io",
    middleware_url: "https://testnet.aeternity.io/mdw",
    explorer_url: "https://explorer.testnet.aeternity.io",
};

pub fn network_by_id(network_id: &str) -> Option<Network> {
    match network_id {
        "ae_mainnet" => Some(NETWORK_MAINNET),
        "ae_uat" => Some(NETWORK_TESTNET),
        _ => None,
    }
}

/// Typed configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Chat platform
    pub home_server_url: String,
    pub bot_username: String,
    pub bot_access_token: Option<String>,
    pub command_prefix: String,

    // Persistence
    pub storage_file: PathBuf,

    // Chain
    pub network: Network,
    pub verification_contract: Option<ContractAddress>,
    pub contract_helper_url: String,

    // Verified-account cache
    pub verified_refresh_interval: Duration,

    // Price rates
    pub coin_gecko_api_url: String,

    // Wallet confirmation callbacks
    pub callback_base_url: String,
    pub callback_bind_addr: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let home_server_url = env_str("MATRIX_BOT_HOME_SERVER_URL").unwrap_or_default();
        if home_server_url.trim().is_empty() {
            return Err(Error::Config(
                "MATRIX_BOT_HOME_SERVER_URL environment variable is required".to_string(),
            ));
        }

        let bot_username = env_str("MATRIX_WALLET_BOT_USERNAME").unwrap_or_default();
        if bot_username.trim().is_empty() {
            return Err(Error::Config(
                "MATRIX_WALLET_BOT_USERNAME environment variable is required".to_string(),
            ));
        }

        let storage_file = env_str("BOT_STORAGE_FILE").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_STORAGE_FILE environment variable is required".to_string())
        })?;
        let storage_file = PathBuf::from(storage_file);

        let bot_access_token = env_str("MATRIX_WALLET_BOT_ACCESS_TOKEN").and_then(non_empty);

        let command_prefix = env_str("COMMAND_PREFIX")
            .and_then(non_empty)
            .unwrap_or_else(|| "/".to_string());

        let network_id = env_str("ACTIVE_NETWORK").unwrap_or_else(|| "ae_mainnet".to_string());
        let network = network_by_id(network_id.trim()).ok_or_else(|| {
            Error::Config(format!("ACTIVE_NETWORK \"{network_id}\" is not a known network id"))
        })?;

        let verification_contract = env_str("ACCOUNT_VERIFICATION_CONTRACT")
            .and_then(non_empty)
            .map(ContractAddress);

        let contract_helper_url = env_str("CONTRACT_HELPER_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "http://localhost:3113".to_string());

        let verified_refresh_interval =
            Duration::from_secs(env_u64("VERIFIED_REFRESH_INTERVAL_SECS").unwrap_or(300));

        let coin_gecko_api_url = env_str("COIN_GECKO_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://api.coingecko.com/api/v3".to_string());

        let callback_base_url = env_str("BACKEND_CALLBACK_BASE_URL")
            .and_then(non_empty)
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "http://localhost:3000/ae-wallet-bot".to_string());
        let callback_bind_addr = env_str("CALLBACK_BIND_ADDR")
            .and_then(non_empty)
            .unwrap_or_else(|| "0.0.0.0:3000".to_string());

        Ok(Self {
            home_server_url,
            bot_username,
            bot_access_token,
            command_prefix,
            storage_file,
            network,
            verification_contract,
            contract_helper_url,
            verified_refresh_interval,
            coin_gecko_api_url,
            callback_base_url,
            callback_bind_addr,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_networks_resolve() {
        assert_eq!(network_by_id("ae_mainnet").map(|n| n.name), Some("Mainnet"));
        assert_eq!(network_by_id("ae_uat").map(|n| n.name), Some("Testnet"));
        assert!(network_by_id("hc_devnet").is_none());
    }
}
