use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Platform-scoped identity of a chat user, e.g. `@alice:example.org`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(pub String);

impl SenderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform-scoped room/conversation id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An `ak_`-prefixed account address (base58check payload).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountAddress(pub String);

fn account_address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ak_[1-9A-HJ-NP-Za-km-z]{48,50}$").expect("valid regex"))
}

impl AccountAddress {
    /// Accepts the string only if it has the shape of a valid account address.
    pub fn parse(raw: &str) -> Option<Self> {
        is_account_address(raw).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_account_address(raw: &str) -> bool {
    account_address_re().is_match(raw)
}

/// A `ct_`-prefixed contract address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractAddress(pub String);

impl ContractAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who sent a message, as resolved by the chat adapter.
#[derive(Clone, Debug)]
pub struct Sender {
    pub id: SenderId,
    pub display_name: String,
    /// Whether the message arrived through a one-on-one conversation.
    pub is_direct: bool,
}

/// An account the adapter recognized as explicitly tagged in the message body.
#[derive(Clone, Debug)]
pub struct TaggedAccount {
    pub id: SenderId,
    pub display_name: String,
}

/// A normalized inbound chat message, already stripped of platform framing.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub tagged_accounts: Vec<TaggedAccount>,
    /// Human-readable room name, when the platform exposes one.
    pub room_name: Option<String>,
}

impl IncomingMessage {
    pub fn direct(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: ChatId(chat_id.into()),
            text: text.into(),
            tagged_accounts: Vec::new(),
            room_name: None,
        }
    }
}

/// A room-membership event as surfaced by the chat adapter.
#[derive(Clone, Debug)]
pub struct ChatEvent {
    pub sender: SenderId,
    pub event_type: String,
}

/// What the adapter knows about a room at join time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomMetadata {
    pub is_direct: bool,
    pub room_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_address_shape() {
        assert!(is_account_address(
            "ak_2dATVcZ9KJU5a8hdsVtTv21pYiGWiPbmVcU1Pz72FFqpk9pSRR"
        ));
        assert!(!is_account_address("ak_short"));
        assert!(!is_account_address(
            "ct_2dATVcZ9KJU5a8hdsVtTv21pYiGWiPbmVcU1Pz72FFqpk9pSRR"
        ));
        // base58 alphabet excludes 0, O, I and l
        assert!(!is_account_address(
            "ak_0dATVcZ9KJU5a8hdsVtTv21pYiGWiPbmVcU1Pz72FFqpk9pSRR"
        ));
    }

    #[test]
    fn parse_keeps_valid_addresses() {
        let raw = "ak_2dATVcZ9KJU5a8hdsVtTv21pYiGWiPbmVcU1Pz72FFqpk9pSRR";
        assert_eq!(AccountAddress::parse(raw).map(|a| a.0), Some(raw.to_string()));
        assert_eq!(AccountAddress::parse("not-an-address"), None);
    }
}
