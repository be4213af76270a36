//! Domain types and models

pub mod account;
pub mod connector;
pub mod conversation;
pub mod tier;
pub mod user;

pub use account::{
    normalize_email, AccountExport, AlphaSignup, EmailMessage, Feedback, FeedbackCategory,
    NewAlphaSignup, NewFeedback, NewsletterSubscription, VisitorPreferences,
};
pub use connector::{
    ChatProvider, ConnectorCredential, ConnectorStatus, ConnectorSummary, TokenGrant,
};
pub use conversation::{
    MessageRole, RawMessage, RemoteConversation, RemoteConversationSummary, SyncItem, SyncReport,
    SyncedConversation, TransformedConversation, UpsertOutcome, Zone, ZoneKind,
};
pub use tier::{
    ConsentSignal, GateDecision, TierLookup, TierPermissions, VisitorIdentity, VisitorTier,
    ANONYMOUS_DEFAULT_TIER,
};
pub use user::{IdentityUser, UserFilter, UserRole};
