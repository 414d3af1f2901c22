// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end test harness: temp SQLite store, mock dispatcher, pipeline
//! and router wired with a known configuration.

use std::sync::Arc;

use axum::Router;
use parley_agent::{EventReport, WebhookPipeline};
use parley_config::model::{ParleyConfig, StorageConfig};
use parley_core::{CorrelationPolicy, Intent, MessageStore, NewIntent, ParleyError};
use parley_gateway::{AppState, build_router};
use parley_storage::SqliteStore;
use parley_whatsapp::WebhookEvent;

use crate::mock_dispatcher::MockDispatcher;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_VERIFY_TOKEN: &str = "verify-secret";
pub const TEST_PHONE_NUMBER_ID: &str = "1000";
pub const TEST_FALLBACK: &str = "Sorry, I did not get that.";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: ParleyConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ParleyConfig::default();
        config.auth.api_key = Some(TEST_API_KEY.to_string());
        config.whatsapp.verify_token = Some(TEST_VERIFY_TOKEN.to_string());
        config.whatsapp.phone_number_id = Some(TEST_PHONE_NUMBER_ID.to_string());
        config.bot.fallback_response = TEST_FALLBACK.to_string();
        config.rate_limit.enabled = false;
        Self { config }
    }

    pub fn with_correlation(mut self, policy: CorrelationPolicy) -> Self {
        self.config.bot.correlation = policy;
        self
    }

    /// Enable rate limiting with `capacity` tokens and no refill within
    /// the test's lifetime.
    pub fn with_rate_limit(mut self, capacity: u64) -> Self {
        self.config.rate_limit.enabled = true;
        self.config.rate_limit.capacity = capacity;
        self.config.rate_limit.refill_tokens = capacity;
        self.config.rate_limit.refill_period_secs = 3600;
        self
    }

    pub fn with_api_key(mut self, key: Option<&str>) -> Self {
        self.config.auth.api_key = key.map(str::to_string);
        self
    }

    pub fn with_history_limit(mut self, limit: i64) -> Self {
        self.config.bot.history_limit = limit;
        self
    }

    pub async fn build(self) -> Result<TestHarness, ParleyError> {
        let temp_dir = tempfile::TempDir::new().map_err(ParleyError::storage)?;
        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
        };

        let store = Arc::new(SqliteStore::new(config.storage.clone()));
        store.initialize().await?;
        let dispatcher = Arc::new(MockDispatcher::new());
        let pipeline = Arc::new(WebhookPipeline::new(
            store.clone(),
            dispatcher.clone(),
            &config,
        ));
        let state = AppState::new(Arc::clone(&pipeline), Arc::new(config));

        Ok(TestHarness {
            store,
            dispatcher,
            pipeline,
            state,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock dispatcher and temp storage.
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    pub dispatcher: Arc<MockDispatcher>,
    pub pipeline: Arc<WebhookPipeline>,
    /// Shared router state; one limiter instance across [`TestHarness::router`] calls.
    pub state: AppState,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub async fn new() -> Result<Self, ParleyError> {
        Self::builder().build().await
    }

    pub fn config(&self) -> &ParleyConfig {
        &self.state.config
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn seed_intent(
        &self,
        name: &str,
        trigger: &str,
        response: &str,
    ) -> Result<Intent, ParleyError> {
        self.store
            .create_intent(NewIntent {
                name: name.to_string(),
                trigger: trigger.to_string(),
                response: response.to_string(),
                active: true,
            })
            .await
    }

    /// Runs a JSON webhook payload straight through the pipeline.
    pub async fn deliver(&self, payload: serde_json::Value) -> Result<EventReport, ParleyError> {
        let event: WebhookEvent = serde_json::from_value(payload)
            .map_err(|e| ParleyError::Validation(format!("bad test payload: {e}")))?;
        Ok(self.pipeline.handle_event(&event).await)
    }
}
