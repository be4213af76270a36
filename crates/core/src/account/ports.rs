//! Port interfaces for account records and outbound email

use async_trait::async_trait;
use pslang_domain::{AlphaSignup, EmailMessage, Feedback, NewsletterSubscription, Result};

/// Trait for feedback, newsletter and alpha-signup persistence
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Store a feedback submission
    async fn insert_feedback(&self, feedback: Feedback) -> Result<()>;

    /// Most recent feedback first, at most `limit` rows
    async fn list_feedback(&self, limit: u32) -> Result<Vec<Feedback>>;

    /// Feedback submitted by a user
    async fn feedback_for_user(&self, user_id: &str) -> Result<Vec<Feedback>>;

    /// Newsletter subscription by normalized email
    async fn get_subscription(&self, email: &str) -> Result<Option<NewsletterSubscription>>;

    /// Insert or replace a newsletter subscription
    async fn save_subscription(&self, subscription: NewsletterSubscription) -> Result<()>;

    /// Store an alpha signup.
    ///
    /// # Errors
    /// `Conflict` when the email is already signed up.
    async fn insert_alpha_signup(&self, signup: AlphaSignup) -> Result<()>;

    /// Alpha signup by normalized email
    async fn find_alpha_signup(&self, email: &str) -> Result<Option<AlphaSignup>>;

    /// Most recent alpha signups first, at most `limit` rows
    async fn list_alpha_signups(&self, limit: u32) -> Result<Vec<AlphaSignup>>;

    /// Alpha signup made while signed in as `user_id`
    async fn alpha_signup_for_user(&self, user_id: &str) -> Result<Option<AlphaSignup>>;

    /// Delete feedback and alpha signups owned by a user
    async fn delete_for_user(&self, user_id: &str) -> Result<()>;
}

/// Trait for transactional email delivery
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}
