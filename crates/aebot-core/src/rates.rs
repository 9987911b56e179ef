//! Fiat price rates, fetched from CoinGecko and cached per protocol.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{errors::Error, ports::RateSource, Result};

pub const PROTOCOL_AETERNITY: &str = "aeternity";
pub const DEFAULT_CURRENCY_CODE: &str = "usd";

#[derive(Clone, Copy, Debug)]
pub struct Currency {
    pub name: &'static str,
    pub code: &'static str,
    pub symbol: &'static str,
}

pub const CURRENCIES: &[Currency] = &[
    Currency { name: "United States Dollar", code: "usd", symbol: "$" },
    Currency { name: "Euro", code: "eur", symbol: "\u{20ac}" },
    Currency { name: "Australia Dollar", code: "aud", symbol: "AU$" },
    Currency { name: "Brasil Real", code: "brl", symbol: "R$" },
    Currency { name: "Canada Dollar", code: "cad", symbol: "CA$" },
    Currency { name: "Swiss Franc", code: "chf", symbol: "CHF" },
    Currency { name: "United Kingdom Pound", code: "gbp", symbol: "\u{a3}" },
    Currency { name: "Gold Ounce", code: "xau", symbol: "XAU" },
];

pub fn currency_by_code(code: &str) -> Option<&'static Currency> {
    CURRENCIES.iter().find(|c| c.code == code)
}

/// `1234567.891` with code `usd` becomes `$1,234,567.89`.
pub fn format_currency(value: f64, code: &str) -> String {
    let symbol = currency_by_code(code)
        .map(|c| c.symbol.to_string())
        .unwrap_or_else(|| code.to_uppercase());

    let negative = value < 0.0;
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let grouped = group_thousands(int_part);

    if negative {
        format!("-{symbol}{grouped}.{frac_part}")
    } else {
        format!("{symbol}{grouped}.{frac_part}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (index, ch) in chars.iter().enumerate() {
        if index > 0 && (chars.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    out
}

/// CoinGecko `/simple/price` client.
///
/// <https://www.coingecko.com/api/documentation>
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RateSource for CoinGeckoClient {
    async fn coin_rates(&self, protocol: &str) -> Result<HashMap<String, f64>> {
        let vs_currencies = CURRENCIES
            .iter()
            .map(|c| c.code)
            .collect::<Vec<_>>()
            .join(",");

        let url = format!(
            "{}/simple/price?ids={protocol}&vs_currencies={vs_currencies}",
            self.base_url
        );
        let body: HashMap<String, HashMap<String, f64>> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        body.get(protocol)
            .cloned()
            .ok_or_else(|| Error::External(format!("no rates returned for {protocol}")))
    }
}

/// Per-protocol rate cache in front of a [`RateSource`]. Rates are fetched
/// lazily on first use and refreshed only when a lookup misses.
pub struct PriceRates {
    source: std::sync::Arc<dyn RateSource>,
    prices: tokio::sync::Mutex<HashMap<String, HashMap<String, f64>>>,
}

impl PriceRates {
    pub fn new(source: std::sync::Arc<dyn RateSource>) -> Self {
        Self {
            source,
            prices: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub async fn preload(&self, protocol: &str) -> Result<()> {
        let rates = self.source.coin_rates(protocol).await?;
        let mut prices = self.prices.lock().await;
        prices.insert(protocol.to_string(), rates);
        Ok(())
    }

    /// Convert a coin amount (decimal string) into the given fiat currency.
    pub async fn fiat_value(&self, amount: &str, protocol: &str, currency: &str) -> Result<f64> {
        let cached = {
            let prices = self.prices.lock().await;
            prices
                .get(protocol)
                .and_then(|rates| rates.get(currency))
                .copied()
        };

        let rate = match cached {
            Some(rate) => rate,
            None => {
                self.preload(protocol).await?;
                let prices = self.prices.lock().await;
                prices
                    .get(protocol)
                    .and_then(|rates| rates.get(currency))
                    .copied()
                    .ok_or_else(|| {
                        Error::External(format!("no {currency} rate for {protocol}"))
                    })?
            }
        };

        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| Error::External(format!("unparseable amount \"{amount}\"")))?;
        Ok(amount * rate)
    }

    pub async fn formatted_fiat(
        &self,
        amount: &str,
        protocol: &str,
        currency: &str,
    ) -> Result<String> {
        let fiat = self.fiat_value(amount, protocol, currency).await?;
        Ok(format_currency(fiat, currency))
    }
}
