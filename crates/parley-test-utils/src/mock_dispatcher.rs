// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock outbound dispatcher for deterministic testing.
//!
//! `MockDispatcher` implements `Dispatcher` with scripted failures and
//! captures every send attempt for assertion in tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::{
    Adapter, AdapterType, DispatchError, DispatchReceipt, Dispatcher, HealthStatus, ParleyError,
    PhoneInfo,
};

/// Phone number id reported by [`MockDispatcher::phone_info`].
pub const MOCK_PHONE_ID: &str = "mock-phone";

/// One captured send call.
///
/// `kind` is the provider message type. For templates `body` is
/// `name/language`; for images it is the media id, plus `|caption` when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub to: String,
    pub kind: &'static str,
    pub body: String,
}

/// A dispatcher that never touches the network.
///
/// Each call pops the next scripted error, if any. Recipients registered
/// with [`MockDispatcher::fail_for`] always fail. Otherwise the send
/// succeeds with a receipt id `wamid.mock-N`.
pub struct MockDispatcher {
    sent: Arc<Mutex<Vec<SentText>>>,
    scripted_failures: Arc<Mutex<VecDeque<DispatchError>>>,
    failing_recipients: Arc<Mutex<HashSet<String>>>,
    counter: AtomicUsize,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            scripted_failures: Arc::new(Mutex::new(VecDeque::new())),
            failing_recipients: Arc::new(Mutex::new(HashSet::new())),
            counter: AtomicUsize::new(0),
        }
    }

    /// Queue a failure for the next send attempt.
    pub async fn push_failure(&self, error: DispatchError) {
        self.scripted_failures.lock().await.push_back(error);
    }

    /// Make every send to `to` fail with a provider 500.
    pub async fn fail_for(&self, to: &str) {
        self.failing_recipients.lock().await.insert(to.to_string());
    }

    /// All attempts, including failed ones, in call order.
    pub async fn sent_messages(&self) -> Vec<SentText> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockDispatcher {
    fn name(&self) -> &str {
        "mock-dispatcher"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dispatcher
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

impl MockDispatcher {
    async fn record(
        &self,
        to: &str,
        kind: &'static str,
        body: String,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.sent.lock().await.push(SentText {
            to: to.to_string(),
            kind,
            body,
        });

        if let Some(error) = self.scripted_failures.lock().await.pop_front() {
            return Err(error);
        }
        if self.failing_recipients.lock().await.contains(to) {
            return Err(DispatchError::Provider {
                status: 500,
                body: "mock failure".to_string(),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(DispatchReceipt {
            message_ids: vec![format!("wamid.mock-{n}")],
        })
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    async fn send_text(&self, to: &str, body: &str) -> Result<DispatchReceipt, DispatchError> {
        self.record(to, "text", body.to_string()).await
    }

    async fn send_template(
        &self,
        to: &str,
        name: &str,
        language: &str,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.record(to, "template", format!("{name}/{language}")).await
    }

    async fn send_media(
        &self,
        to: &str,
        media_id: &str,
        caption: Option<&str>,
    ) -> Result<DispatchReceipt, DispatchError> {
        let body = match caption {
            Some(caption) => format!("{media_id}|{caption}"),
            None => media_id.to_string(),
        };
        self.record(to, "image", body).await
    }

    /// Pops a scripted failure like the sends do; never recorded.
    async fn phone_info(&self) -> Result<PhoneInfo, DispatchError> {
        if let Some(error) = self.scripted_failures.lock().await.pop_front() {
            return Err(error);
        }
        Ok(PhoneInfo {
            id: Some(MOCK_PHONE_ID.to_string()),
            display_phone_number: Some("+1 555-0100".to_string()),
            verified_name: Some("Parley Test".to_string()),
            quality_rating: Some("GREEN".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn records_sends_and_issues_ids() {
        let mock = MockDispatcher::new();
        let first = mock.send_text("1555", "hi").await.unwrap();
        let second = mock.send_text("1556", "yo").await.unwrap();
        assert_eq!(first.first_id(), Some("wamid.mock-1"));
        assert_eq!(second.first_id(), Some("wamid.mock-2"));
        assert_eq!(
            mock.sent_messages().await[1],
            SentText {
                to: "1556".into(),
                kind: "text",
                body: "yo".into()
            }
        );
    }

    #[tokio::test]
    async fn scripted_failure_applies_once() {
        let mock = MockDispatcher::new();
        mock.push_failure(DispatchError::Timeout {
            duration: Duration::from_secs(10),
        })
        .await;
        assert!(matches!(
            mock.send_text("1555", "a").await,
            Err(DispatchError::Timeout { .. })
        ));
        assert!(mock.send_text("1555", "b").await.is_ok());
        assert_eq!(mock.sent_count().await, 2);
    }

    #[tokio::test]
    async fn failing_recipient_always_fails() {
        let mock = MockDispatcher::new();
        mock.fail_for("1555").await;
        assert!(mock.send_text("1555", "a").await.is_err());
        assert!(mock.send_text("1555", "b").await.is_err());
        assert!(mock.send_text("1666", "c").await.is_ok());
    }

    #[tokio::test]
    async fn template_and_media_sends_are_recorded_with_kind() {
        let mock = MockDispatcher::new();
        mock.send_template("1555", "welcome", "en_US").await.unwrap();
        mock.send_media("1555", "media-1", Some("menu")).await.unwrap();
        mock.send_media("1555", "media-2", None).await.unwrap();

        let sent = mock.sent_messages().await;
        assert_eq!((sent[0].kind, sent[0].body.as_str()), ("template", "welcome/en_US"));
        assert_eq!((sent[1].kind, sent[1].body.as_str()), ("image", "media-1|menu"));
        assert_eq!(sent[2].body, "media-2");
    }

    #[tokio::test]
    async fn phone_info_honours_scripted_failure() {
        let mock = MockDispatcher::new();
        mock.push_failure(DispatchError::Provider {
            status: 403,
            body: "forbidden".into(),
        })
        .await;
        assert!(mock.phone_info().await.is_err());
        let info = mock.phone_info().await.unwrap();
        assert_eq!(info.id.as_deref(), Some(MOCK_PHONE_ID));
        assert_eq!(mock.sent_count().await, 0);
    }
}
