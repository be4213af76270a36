//! Transactional email adapter
//!
//! Posts JSON to a Resend-style `/emails` endpoint. Without an API key the
//! sender only logs, so local setups work without an email account.

use async_trait::async_trait;
use pslang_core::EmailSender;
use pslang_domain::{EmailConfig, EmailMessage, Result};
use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use crate::http::{status_error, HttpClient};

pub struct HttpEmailSender {
    api_url: String,
    api_key: Option<String>,
    from: String,
    http: HttpClient,
}

#[derive(Serialize)]
struct SendBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig, http: HttpClient) -> Self {
        Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            from: config.from.clone(),
            http,
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    #[instrument(skip_all, fields(subject = %message.subject))]
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let Some(api_key) = self.api_key.as_deref() else {
            info!("email delivery disabled, message not sent");
            return Ok(());
        };

        let body = SendBody {
            from: &self.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            text: &message.text,
        };
        let request = self.http.request(Method::POST, &self.api_url).bearer_auth(api_key).json(&body);
        let response = self.http.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }
        Ok(())
    }
}
