//! Product analytics capture client
//!
//! Opt-in state lives in the client itself: the tier gate flips it through
//! `enable`/`disable`/`disable_replay_only`, and `capture` silently drops
//! events while the visitor is opted out. A fresh client starts opted out.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pslang_core::{AnalyticsClient, AnalyticsEvent};
use pslang_domain::{AnalyticsConfig, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::http::{status_error, HttpClient};

pub struct HttpAnalyticsClient {
    capture_url: Option<String>,
    api_key: Option<String>,
    http: HttpClient,
    capturing: AtomicBool,
    replay: AtomicBool,
}

impl HttpAnalyticsClient {
    pub fn new(config: &AnalyticsConfig, http: HttpClient) -> Self {
        Self {
            capture_url: config.capture_url.clone().filter(|u| !u.trim().is_empty()),
            api_key: config.api_key.clone(),
            http,
            capturing: AtomicBool::new(false),
            replay: AtomicBool::new(false),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    pub fn is_replay_enabled(&self) -> bool {
        self.replay.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalyticsClient for HttpAnalyticsClient {
    fn enable(&self) {
        self.capturing.store(true, Ordering::SeqCst);
        self.replay.store(true, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.capturing.store(false, Ordering::SeqCst);
        self.replay.store(false, Ordering::SeqCst);
    }

    fn disable_replay_only(&self) {
        self.capturing.store(true, Ordering::SeqCst);
        self.replay.store(false, Ordering::SeqCst);
    }

    #[instrument(skip_all, fields(event = %event.event))]
    async fn capture(&self, event: AnalyticsEvent) -> Result<()> {
        if !self.is_capturing() {
            debug!("visitor opted out, event dropped");
            return Ok(());
        }
        let Some(url) = self.capture_url.as_deref() else {
            return Ok(());
        };

        let mut properties = event.properties;
        properties.insert("session_replay".into(), Value::Bool(self.is_replay_enabled()));
        let body = json!({
            "api_key": self.api_key,
            "event": event.event,
            "distinct_id": event.distinct_id,
            "properties": properties,
        });

        let response = self.http.send(self.http.request(Method::POST, url).json(&body)).await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }
        Ok(())
    }
}
