//! Provider response bodies.
//!
//! Both providers are read through the same shapes; field aliases cover the
//! naming differences between their export formats.

use chrono::{DateTime, Utc};
use pslang_domain::{RawMessage, RemoteConversation, RemoteConversationSummary, TokenGrant};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl From<TokenResponse> for TokenGrant {
    fn from(value: TokenResponse) -> Self {
        Self {
            access_token: value.access_token,
            refresh_token: value.refresh_token,
            expires_in: value.expires_in,
        }
    }
}

/// Conversation listing, either bare or wrapped in `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ConversationList {
    Wrapped { data: Vec<ConversationSummaryBody> },
    Bare(Vec<ConversationSummaryBody>),
}

impl ConversationList {
    pub fn into_summaries(self) -> Vec<RemoteConversationSummary> {
        let items = match self {
            Self::Wrapped { data } => data,
            Self::Bare(items) => items,
        };
        items.into_iter().map(Into::into).collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationSummaryBody {
    #[serde(alias = "uuid")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default, alias = "update_time")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ConversationSummaryBody> for RemoteConversationSummary {
    fn from(value: ConversationSummaryBody) -> Self {
        Self { id: value.id, title: value.title, updated_at: value.updated_at }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationBody {
    #[serde(alias = "uuid")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default, alias = "chat_messages")]
    pub messages: Vec<MessageBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageBody {
    #[serde(alias = "sender")]
    pub role: String,
    #[serde(default, alias = "text")]
    pub content: String,
}

impl From<ConversationBody> for RemoteConversation {
    fn from(value: ConversationBody) -> Self {
        Self {
            id: value.id,
            title: value.title,
            messages: value
                .messages
                .into_iter()
                .map(|m| RawMessage::new(m.role, m.content))
                .collect(),
        }
    }
}
