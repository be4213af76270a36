//! Account-level records: preferences, feedback, newsletter, alpha signups,
//! outbound email and data export.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::connector::ConnectorSummary;
use super::conversation::SyncedConversation;
use super::tier::VisitorTier;
use crate::errors::PsLangError;

/// Persisted privacy preferences of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorPreferences {
    /// Owner of the preferences.
    pub user_id: String,
    /// Chosen data-retention tier.
    pub tier: VisitorTier,
    /// Last time the tier was set.
    pub updated_at: DateTime<Utc>,
}

/// Kind of feedback submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    /// Something is broken.
    Bug,
    /// A request for something new.
    Feature,
    /// Anything else.
    #[default]
    General,
}

impl FeedbackCategory {
    /// Storage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::General => "general",
        }
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackCategory {
    type Err = PsLangError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bug" => Ok(Self::Bug),
            "feature" => Ok(Self::Feature),
            "general" => Ok(Self::General),
            other => Err(PsLangError::BadRequest(format!("unknown feedback category: {other}"))),
        }
    }
}

/// Feedback submission as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFeedback {
    /// Defaults to `general`.
    #[serde(default)]
    pub category: FeedbackCategory,
    /// Free text, non-empty after trimming.
    pub message: String,
    /// Reply address for anonymous submitters.
    #[serde(default)]
    pub email: Option<String>,
    /// Page the feedback was sent from.
    #[serde(default)]
    pub page: Option<String>,
}

/// Stored feedback submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// Record id.
    pub id: String,
    /// Submitter, when signed in.
    pub user_id: Option<String>,
    /// Reply address: the account email or the one given.
    pub email: Option<String>,
    /// Kind of feedback.
    pub category: FeedbackCategory,
    /// Trimmed message body.
    pub message: String,
    /// Page the feedback was sent from.
    pub page: Option<String>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// Newsletter subscription, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscription {
    /// Normalized (trimmed, lower-case) address.
    pub email: String,
    /// Start of the current subscription.
    pub subscribed_at: DateTime<Utc>,
    /// Set once the address unsubscribes.
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl NewsletterSubscription {
    /// Subscribed and not yet unsubscribed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.unsubscribed_at.is_none()
    }
}

/// Alpha programme signup as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlphaSignup {
    /// Contact address; unique across signups.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// What the applicant wants to use PS-LANG for.
    #[serde(default)]
    pub use_case: Option<String>,
}

/// Stored alpha programme signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlphaSignup {
    /// Record id.
    pub id: String,
    /// Normalized contact address.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Stated use case.
    pub use_case: Option<String>,
    /// Account that signed up, when signed in.
    pub user_id: Option<String>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// Transactional email handed to the email sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
}

/// Everything the service stores about one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountExport {
    /// Exported account.
    pub user_id: String,
    /// Account email from the identity provider.
    pub email: String,
    /// Time the export was assembled.
    pub exported_at: DateTime<Utc>,
    /// Stored tier, if one was ever chosen.
    pub preferences: Option<VisitorPreferences>,
    /// Connector state without tokens.
    pub connectors: Vec<ConnectorSummary>,
    /// Every synced conversation.
    pub conversations: Vec<SyncedConversation>,
    /// Feedback submitted while signed in.
    pub feedback: Vec<Feedback>,
    /// Alpha signup made by this account.
    pub alpha_signup: Option<AlphaSignup>,
    /// Subscription for the account email, if any.
    pub newsletter: Option<NewsletterSubscription>,
}

/// Normalize an email address for storage and uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn feedback_category_defaults_to_general() {
        let body: NewFeedback = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(body.category, FeedbackCategory::General);
    }
}
