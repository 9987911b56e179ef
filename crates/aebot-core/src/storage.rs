//! Flat key/value persistence plus the typed records the bot keeps in it.
//!
//! Every record lives under a `"<Category>: <id>"` key in one shared store,
//! serialized as JSON. Clearing a record writes the empty string rather than
//! deleting the key.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    domain::{AccountAddress, ChatId, RoomMetadata, SenderId},
    errors::Error,
    Result,
};

/// Minimal synchronous key/value substrate.
pub trait KvStore: Send + Sync {
    fn store_value(&self, key: &str, value: &str) -> Result<()>;
    fn read_value(&self, key: &str) -> Result<Option<String>>;
}

/// Single-file JSON store, every write flushed to disk.
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = match fs::read_to_string(&path) {
            Ok(contents) if !contents.trim().is_empty() => serde_json::from_str(&contents)?,
            Ok(_) => HashMap::new(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    fn persist(&self, cache: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string_pretty(cache)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn store_value(&self, key: &str, value: &str) -> Result<()> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| Error::Storage("store mutex poisoned".to_string()))?;
        cache.insert(key.to_string(), value.to_string());
        self.persist(&cache)
    }

    fn read_value(&self, key: &str) -> Result<Option<String>> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| Error::Storage("store mutex poisoned".to_string()))?;
        Ok(cache.get(key).cloned())
    }
}

/// In-memory store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl KvStore for MemoryStore {
    fn store_value(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| Error::Storage("store mutex poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn read_value(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| Error::Storage("store mutex poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }
}

/// Discrete points a multi-turn command dialogue can pause at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    #[serde(rename = "TOKEN_SELECT_AWAITING_USER_CHOICE")]
    TokenSelectAwaitingUserChoice,
}

/// A paused dialogue: which command owns it, where it paused, and whatever
/// the command stashed to resume with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationState {
    pub command: String,
    pub step: Step,
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// Wallet-verification request waiting for its confirmation callback.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingVerification {
    pub address: AccountAddress,
    #[serde(rename = "senderId")]
    pub sender_id: SenderId,
    #[serde(rename = "chatId")]
    pub chat_id: ChatId,
    #[serde(rename = "requestedAt")]
    pub requested_at: String,
}

/// Disconnect request waiting for its confirmation callback.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingRemoval {
    #[serde(rename = "senderId")]
    pub sender_id: SenderId,
    #[serde(rename = "chatId")]
    pub chat_id: ChatId,
    #[serde(rename = "requestedAt")]
    pub requested_at: String,
}

/// Transfer waiting for the wallet to broadcast and call back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingTransfer {
    #[serde(rename = "chatId")]
    pub chat_id: ChatId,
    #[serde(rename = "requestedAt")]
    pub requested_at: String,
}

fn user_state_key(sender: &SenderId) -> String {
    format!("UserState: {sender}")
}

fn verify_wallet_key(id: &str) -> String {
    format!("VerifyWallet: {id}")
}

fn remove_verified_wallet_key(id: &str) -> String {
    format!("RemoveVerifiedWallet: {id}")
}

fn send_key(id: &str) -> String {
    format!("Send: {id}")
}

fn room_key(chat_id: &ChatId) -> String {
    format!("Room: {chat_id}")
}

/// Typed access to the shared store.
#[derive(Clone)]
pub struct TypedStore {
    kv: Arc<dyn KvStore>,
}

impl TypedStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn read_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.kv.read_value(key)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                tracing::warn!(key, error = %err, "dropping unreadable stored record");
                Ok(None)
            }
        }
    }

    fn write_record<T: Serialize>(&self, key: &str, record: &T) -> Result<()> {
        self.kv.store_value(key, &serde_json::to_string(record)?)
    }

    pub fn set_conversation_state(
        &self,
        sender: &SenderId,
        state: &ConversationState,
    ) -> Result<()> {
        self.write_record(&user_state_key(sender), state)
    }

    pub fn conversation_state(&self, sender: &SenderId) -> Result<Option<ConversationState>> {
        self.read_record(&user_state_key(sender))
    }

    pub fn clear_conversation_state(&self, sender: &SenderId) -> Result<()> {
        self.kv.store_value(&user_state_key(sender), "")
    }

    pub fn set_pending_verification(&self, id: &str, record: &PendingVerification) -> Result<()> {
        self.write_record(&verify_wallet_key(id), record)
    }

    pub fn pending_verification(&self, id: &str) -> Result<Option<PendingVerification>> {
        self.read_record(&verify_wallet_key(id))
    }

    pub fn set_pending_removal(&self, id: &str, record: &PendingRemoval) -> Result<()> {
        self.write_record(&remove_verified_wallet_key(id), record)
    }

    pub fn pending_removal(&self, id: &str) -> Result<Option<PendingRemoval>> {
        self.read_record(&remove_verified_wallet_key(id))
    }

    pub fn set_pending_transfer(&self, id: &str, record: &PendingTransfer) -> Result<()> {
        self.write_record(&send_key(id), record)
    }

    pub fn pending_transfer(&self, id: &str) -> Result<Option<PendingTransfer>> {
        self.read_record(&send_key(id))
    }

    pub fn set_room_metadata(&self, chat_id: &ChatId, metadata: &RoomMetadata) -> Result<()> {
        self.write_record(&room_key(chat_id), metadata)
    }

    pub fn room_metadata(&self, chat_id: &ChatId) -> Result<Option<RoomMetadata>> {
        self.read_record(&room_key(chat_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn typed(store: Arc<dyn KvStore>) -> TypedStore {
        TypedStore::new(store)
    }

    #[test]
    fn conversation_state_roundtrip_and_clear() {
        let store = typed(Arc::new(MemoryStore::default()));
        let sender = SenderId("@alice:example.org".to_string());
        assert!(store.conversation_state(&sender).unwrap().is_none());

        let mut context = serde_json::Map::new();
        context.insert("options".to_string(), json!([{"symbol": "TKN"}]));
        store
            .set_conversation_state(
                &sender,
                &ConversationState {
                    command: "balance".to_string(),
                    step: Step::TokenSelectAwaitingUserChoice,
                    context,
                },
            )
            .unwrap();

        let state = store.conversation_state(&sender).unwrap().unwrap();
        assert_eq!(state.command, "balance");
        assert_eq!(state.step, Step::TokenSelectAwaitingUserChoice);

        store.clear_conversation_state(&sender).unwrap();
        assert!(store.conversation_state(&sender).unwrap().is_none());
    }

    #[test]
    fn step_serializes_with_legacy_tag() {
        let serialized = serde_json::to_string(&Step::TokenSelectAwaitingUserChoice).unwrap();
        assert_eq!(serialized, "\"TOKEN_SELECT_AWAITING_USER_CHOICE\"");
    }

    #[test]
    fn unreadable_record_reads_as_absent() {
        let kv = Arc::new(MemoryStore::default());
        kv.store_value("UserState: @bob:example.org", "{not json").unwrap();
        let store = typed(kv);
        assert!(store
            .conversation_state(&SenderId("@bob:example.org".to_string()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn pending_records_use_scoped_keys() {
        let kv = Arc::new(MemoryStore::default());
        let store = typed(kv.clone());
        store
            .set_pending_transfer(
                "abc",
                &PendingTransfer {
                    chat_id: ChatId("!room:example.org".to_string()),
                    requested_at: "2024-01-01T00:00:00Z".to_string(),
                },
            )
            .unwrap();
        assert!(kv.read_value("Send: abc").unwrap().is_some());
        assert!(store.pending_transfer("abc").unwrap().is_some());
        assert!(store.pending_transfer("missing").unwrap().is_none());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let path = std::env::temp_dir().join(format!("aebot-store-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        {
            let store = FileStore::open(&path).unwrap();
            store.store_value("UserState: @x", "{\"a\":1}").unwrap();
        }
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.read_value("UserState: @x").unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        let _ = fs::remove_file(&path);
    }
}
