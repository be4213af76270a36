//! Conversation types: raw provider payloads, the transformed zone
//! representation, stored copies and sync reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::connector::ChatProvider;

/// A single role-tagged message as delivered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawMessage {
    /// Provider role name, e.g. `user`, `assistant` or `tool`.
    pub role: String,
    /// Plain-text body.
    pub content: String,
}

impl RawMessage {
    /// Build a message from a role name and body.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }
}

/// Roles understood by the transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Written by the person chatting.
    User,
    /// Produced by the model.
    Assistant,
    /// Instructions framing the conversation.
    System,
}

impl MessageRole {
    /// Parse a provider role string. Unknown roles yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" | "human" => Some(Self::User),
            "assistant" | "ai" | "model" => Some(Self::Assistant),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Canonical role name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// Visibility scope of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// Shareable content.
    Public,
    /// Content carrying a private signal; redacted in prompts.
    Private,
    /// Content the user explicitly marked for later.
    Bookmark,
}

impl ZoneKind {
    /// Tag name used in prompts and meta tags.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Bookmark => "bookmark",
        }
    }
}

/// A tagged segment of a transformed conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Visibility of this segment.
    pub kind: ZoneKind,
    /// Role of the source message.
    pub role: MessageRole,
    /// Position of the source message in the input sequence.
    pub index: usize,
    /// Trimmed message body.
    pub content: String,
}

/// Output of the conversation transformer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedConversation {
    /// Zones rendered as PS-LANG markup, private bodies redacted.
    pub psl_prompt: String,
    /// Sorted `role:*`, `zone:*` and hashtag tags.
    pub meta_tags: Vec<String>,
    /// One zone per non-empty message with a known role.
    pub zones: Vec<Zone>,
    /// Sorted names of the private signals that were detected.
    pub private_signals: Vec<String>,
    /// First user message, truncated, or "Untitled conversation".
    pub title: String,
}

/// Entry of a provider's conversation index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConversationSummary {
    /// Provider conversation id.
    pub id: String,
    /// Provider-side title, if any.
    #[serde(default)]
    pub title: Option<String>,
    /// Last change reported by the provider.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full conversation detail fetched from a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConversation {
    /// Provider conversation id.
    pub id: String,
    /// Provider-side title, if any.
    #[serde(default)]
    pub title: Option<String>,
    /// Messages in conversation order.
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

/// Transformed local copy of an external conversation.
///
/// `external_conversation_id` is unique per `(user_id, provider)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedConversation {
    /// Local record id.
    pub id: String,
    /// Owner of the linked connector.
    pub user_id: String,
    /// Provider the conversation came from.
    pub provider: ChatProvider,
    /// Provider conversation id.
    pub external_conversation_id: String,
    /// Provider title, falling back to the transformed title.
    pub title: String,
    /// Messages as fetched.
    pub messages: Vec<RawMessage>,
    /// Transformer output for `messages`.
    pub transformed: TransformedConversation,
    /// BLAKE3 hex digest of the stored messages and title.
    pub content_hash: String,
    /// First time the conversation was stored.
    pub created_at: DateTime<Utc>,
    /// Last time the stored content changed.
    pub updated_at: DateTime<Utc>,
}

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No earlier copy existed.
    Inserted,
    /// An earlier copy was replaced.
    Updated,
    /// The content hash matched; nothing was written.
    Unchanged,
}

/// Per-conversation result of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SyncItem {
    /// Fetched, transformed and stored.
    Synced {
        /// Provider conversation id.
        external_id: String,
        /// Effect of the store write.
        outcome: UpsertOutcome,
    },
    /// Detail fetch or storage failed; the run continued.
    Failed {
        /// Provider conversation id.
        external_id: String,
        /// Error text from the failed step.
        reason: String,
    },
}

impl SyncItem {
    /// `true` for [`SyncItem::Synced`].
    #[must_use]
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

/// Aggregate result of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Provider that was synced.
    pub provider: ChatProvider,
    /// Items stored or found unchanged.
    pub synced_count: usize,
    /// Items that failed.
    pub failed_count: usize,
    /// Per-conversation results in index order.
    pub items: Vec<SyncItem>,
    /// Completion time, also written to the credential.
    pub last_sync_at: DateTime<Utc>,
}

impl SyncReport {
    /// Build a report from collected item results.
    #[must_use]
    pub fn from_items(
        provider: ChatProvider,
        items: Vec<SyncItem>,
        last_sync_at: DateTime<Utc>,
    ) -> Self {
        let synced_count = items.iter().filter(|item| item.is_synced()).count();
        let failed_count = items.len() - synced_count;
        Self { provider, synced_count, failed_count, items, last_sync_at }
    }
}
