//! Client for the contract-helper sidecar, which wraps the contract ACIs:
//! calldata encoding, call-result decoding, and bot-key message signing.

use serde::Deserialize;
use serde_json::{json, Value};

use aebot_core::Result;

#[derive(Clone)]
pub struct ContractHelperClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CalldataResponse {
    calldata: String,
}

#[derive(Deserialize)]
struct DecodeResponse {
    result: Value,
}

#[derive(Deserialize)]
struct SignResponse {
    signature: String,
}

impl ContractHelperClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    /// `cb_`-encoded calldata for `function` on the named contract interface.
    pub async fn encode_calldata(
        &self,
        contract: &str,
        function: &str,
        arguments: Vec<Value>,
    ) -> Result<String> {
        let response: CalldataResponse = self
            .post(
                "/encode-calldata",
                json!({
                    "contract": contract,
                    "function": function,
                    "arguments": arguments,
                }),
            )
            .await?;
        Ok(response.calldata)
    }

    /// Decode a `cb_`-encoded call return value into plain JSON.
    pub async fn decode_call_result(
        &self,
        contract: &str,
        function: &str,
        call_value: &str,
    ) -> Result<Value> {
        let response: DecodeResponse = self
            .post(
                "/decode-call-result",
                json!({
                    "contract": contract,
                    "function": function,
                    "call-value": call_value,
                }),
            )
            .await?;
        Ok(response.result)
    }

    /// Sign `message` with the bot's account key, returning a hex signature.
    pub async fn sign_message(&self, message: &str) -> Result<String> {
        let response: SignResponse = self
            .post("/sign-message", json!({ "message": message }))
            .await?;
        Ok(response.signature)
    }
}
