//! Account services: feedback, newsletter, alpha signups and data export.

use std::sync::Arc;

use chrono::Utc;
use pslang_domain::constants::{MAX_ALPHA_USE_CASE_LENGTH, MAX_EMAIL_LENGTH, MAX_FEEDBACK_LENGTH};
use pslang_domain::{
    normalize_email, AccountExport, AlphaSignup, ConnectorSummary, EmailMessage,
    Feedback, IdentityUser, NewAlphaSignup, NewFeedback, NewsletterSubscription, PsLangError,
    Result,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::ports::{AccountRepository, EmailSender};
use crate::connectors::ports::{ConversationRepository, CredentialRepository};
use crate::connectors::ProviderRegistry;
use crate::consent::ports::PreferenceRepository;

/// Repositories and senders the account service works with.
pub struct AccountDeps {
    pub accounts: Arc<dyn AccountRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
    pub credentials: Arc<dyn CredentialRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub email: Arc<dyn EmailSender>,
    pub registry: Arc<ProviderRegistry>,
}

pub struct AccountService {
    deps: AccountDeps,
    notify_address: Option<String>,
}

impl AccountService {
    pub fn new(deps: AccountDeps) -> Self {
        Self { deps, notify_address: None }
    }

    /// Send a copy of every feedback submission to `address`.
    #[must_use]
    pub fn with_feedback_notifications(mut self, address: Option<String>) -> Self {
        self.notify_address = address.filter(|a| !a.trim().is_empty());
        self
    }

    /// Store a feedback submission.
    #[instrument(skip(self, user, input), fields(category = %input.category))]
    pub async fn submit_feedback(
        &self,
        user: Option<&IdentityUser>,
        input: NewFeedback,
    ) -> Result<Feedback> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(PsLangError::BadRequest("feedback message is required".into()));
        }
        if message.chars().count() > MAX_FEEDBACK_LENGTH {
            return Err(PsLangError::BadRequest(format!(
                "feedback message exceeds {MAX_FEEDBACK_LENGTH} characters"
            )));
        }

        let email = match input.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            Some(raw) => Some(validate_email(raw)?),
            None => user.map(|u| normalize_email(&u.email)),
        };

        let feedback = Feedback {
            id: Uuid::new_v4().to_string(),
            user_id: user.map(|u| u.id.clone()),
            email,
            category: input.category,
            message: message.to_string(),
            page: input.page.filter(|p| !p.trim().is_empty()),
            created_at: Utc::now(),
        };
        self.deps.accounts.insert_feedback(feedback.clone()).await?;

        if let Some(to) = &self.notify_address {
            let text = format!(
                "{}\n\nfrom: {}\npage: {}",
                feedback.message,
                feedback.email.as_deref().unwrap_or("anonymous"),
                feedback.page.as_deref().unwrap_or("-"),
            );
            self.send_best_effort(EmailMessage {
                to: to.clone(),
                subject: format!("[PS-LANG feedback] {}", feedback.category),
                text,
            })
            .await;
        }

        info!(feedback_id = %feedback.id, "feedback stored");
        Ok(feedback)
    }

    /// Subscribe an address to the newsletter.
    ///
    /// # Errors
    /// `Conflict` when the address already has an active subscription.
    #[instrument(skip(self, email))]
    pub async fn subscribe(&self, email: &str) -> Result<NewsletterSubscription> {
        let email = validate_email(email)?;

        if let Some(existing) = self.deps.accounts.get_subscription(&email).await? {
            if existing.is_active() {
                return Err(PsLangError::Conflict("email is already subscribed".into()));
            }
        }

        let subscription =
            NewsletterSubscription { email, subscribed_at: Utc::now(), unsubscribed_at: None };
        self.deps.accounts.save_subscription(subscription.clone()).await?;

        self.send_best_effort(EmailMessage {
            to: subscription.email.clone(),
            subject: "Welcome to the PS-LANG newsletter".into(),
            text: "Thanks for subscribing. You can unsubscribe at any time.".into(),
        })
        .await;

        info!("newsletter subscription created");
        Ok(subscription)
    }

    /// Unsubscribe an address.
    ///
    /// # Errors
    /// `NotFound` when the address has no active subscription.
    #[instrument(skip(self, email))]
    pub async fn unsubscribe(&self, email: &str) -> Result<()> {
        let email = validate_email(email)?;
        let Some(mut subscription) =
            self.deps.accounts.get_subscription(&email).await?.filter(|s| s.is_active())
        else {
            return Err(PsLangError::NotFound("no active subscription".into()));
        };

        subscription.unsubscribed_at = Some(Utc::now());
        self.deps.accounts.save_subscription(subscription).await
    }

    /// Register interest in the alpha programme.
    ///
    /// # Errors
    /// `Conflict` when the address is already signed up.
    #[instrument(skip(self, user, input))]
    pub async fn alpha_signup(
        &self,
        user: Option<&IdentityUser>,
        input: NewAlphaSignup,
    ) -> Result<AlphaSignup> {
        let email = validate_email(&input.email)?;
        let use_case = input.use_case.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        if use_case.as_ref().is_some_and(|u| u.chars().count() > MAX_ALPHA_USE_CASE_LENGTH) {
            return Err(PsLangError::BadRequest(format!(
                "use case exceeds {MAX_ALPHA_USE_CASE_LENGTH} characters"
            )));
        }

        if self.deps.accounts.find_alpha_signup(&email).await?.is_some() {
            return Err(PsLangError::Conflict("email is already on the alpha list".into()));
        }

        let signup = AlphaSignup {
            id: Uuid::new_v4().to_string(),
            email,
            name: input.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            use_case,
            user_id: user.map(|u| u.id.clone()),
            created_at: Utc::now(),
        };
        self.deps.accounts.insert_alpha_signup(signup.clone()).await?;

        info!(signup_id = %signup.id, "alpha signup stored");
        Ok(signup)
    }

    /// Everything stored about `user`. Connector tokens are never included.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn export(&self, user: &IdentityUser) -> Result<AccountExport> {
        let email = normalize_email(&user.email);
        let preferences = self.deps.preferences.get(&user.id).await?;
        let credentials = self.deps.credentials.list_for_user(&user.id).await?;
        let conversations = self.deps.conversations.list_for_user(&user.id).await?;
        let feedback = self.deps.accounts.feedback_for_user(&user.id).await?;
        let alpha_signup = self.deps.accounts.alpha_signup_for_user(&user.id).await?;
        let newsletter = self.deps.accounts.get_subscription(&email).await?;

        let connectors = credentials
            .into_iter()
            .map(|c| ConnectorSummary {
                provider: c.provider,
                status: c.status,
                configured: self
                    .deps
                    .registry
                    .client(c.provider)
                    .is_ok_and(|client| client.is_configured()),
                last_sync_at: c.last_sync_at,
            })
            .collect();

        Ok(AccountExport {
            user_id: user.id.clone(),
            email,
            exported_at: Utc::now(),
            preferences,
            connectors,
            conversations,
            feedback,
            alpha_signup,
            newsletter,
        })
    }

    /// Most recent feedback, unfiltered.
    pub async fn list_feedback(&self, limit: u32) -> Result<Vec<Feedback>> {
        self.deps.accounts.list_feedback(limit).await
    }

    /// Most recent alpha signups, unfiltered.
    pub async fn list_alpha_signups(&self, limit: u32) -> Result<Vec<AlphaSignup>> {
        self.deps.accounts.list_alpha_signups(limit).await
    }

    /// Remove every local record owned by a user.
    #[instrument(skip(self))]
    pub async fn delete_local_data(&self, user_id: &str) -> Result<()> {
        self.deps.conversations.delete_for_user(user_id).await?;
        self.deps.credentials.delete_for_user(user_id).await?;
        self.deps.preferences.delete_for_user(user_id).await?;
        self.deps.accounts.delete_for_user(user_id).await?;
        info!("local account data deleted");
        Ok(())
    }

    async fn send_best_effort(&self, message: EmailMessage) {
        if let Err(err) = self.deps.email.send(&message).await {
            warn!(error = %err, subject = %message.subject, "email delivery failed");
        }
    }
}

/// Validate and normalize an email address.
///
/// # Errors
/// `BadRequest` for anything that is not a plausible single address.
pub fn validate_email(raw: &str) -> Result<String> {
    let email = normalize_email(raw);
    let plausible = email.len() <= MAX_EMAIL_LENGTH
        && !email.chars().any(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });

    if plausible {
        Ok(email)
    } else {
        Err(PsLangError::BadRequest("invalid email address".into()))
    }
}
