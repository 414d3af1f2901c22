// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`MessageStore`].

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use parley_config::model::StorageConfig;
use parley_core::{
    Adapter, AdapterType, ChatMessage, Conversation, ConversationStatus, CorrelationPolicy,
    HealthStatus, Intent, MessageStore, NewChatMessage, NewIntent, NewUser, ParleyError, User,
    UserPatch,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed message store.
///
/// The database is opened lazily by [`MessageStore::initialize`]; every
/// other operation fails with a storage error until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, ParleyError> {
        self.db.get().ok_or_else(|| ParleyError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Adapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let probe = db
            .connection()
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await;
        Ok(match probe {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "storage health probe failed");
                HealthStatus::Unhealthy(e.to_string())
            }
        })
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn initialize(&self) -> Result<(), ParleyError> {
        self.db
            .get_or_try_init(|| Database::open(&self.config.database_path, self.config.wal_mode))
            .await?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn find_or_create_user(&self, new: NewUser) -> Result<User, ParleyError> {
        queries::users::find_or_create_user(self.db()?, new).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, ParleyError> {
        queries::users::get_user(self.db()?, user_id).await
    }

    async fn update_user(
        &self,
        user_id: &str,
        patch: UserPatch,
        expected_version: i64,
    ) -> Result<User, ParleyError> {
        queries::users::update_user(self.db()?, user_id, patch, expected_version).await
    }

    async fn resolve_conversation(
        &self,
        owner: &User,
        policy: CorrelationPolicy,
    ) -> Result<Conversation, ParleyError> {
        queries::conversations::resolve_conversation(self.db()?, owner, policy).await
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, ParleyError> {
        queries::conversations::get_conversation(self.db()?, conversation_id).await
    }

    async fn update_conversation_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
        expected_version: i64,
    ) -> Result<Conversation, ParleyError> {
        queries::conversations::update_status(self.db()?, conversation_id, status, expected_version)
            .await
    }

    async fn append_message(&self, message: NewChatMessage) -> Result<ChatMessage, ParleyError> {
        queries::messages::append_message(self.db()?, message).await
    }

    async fn get_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ParleyError> {
        queries::messages::get_messages_for_conversation(self.db()?, conversation_id, limit).await
    }

    async fn history_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, ParleyError> {
        queries::messages::history_for_user(self.db()?, user_id, limit).await
    }

    async fn list_active_intents(&self) -> Result<Vec<Intent>, ParleyError> {
        queries::intents::list_active(self.db()?).await
    }

    async fn get_intent(&self, id: &str) -> Result<Option<Intent>, ParleyError> {
        queries::intents::get_intent(self.db()?, id).await
    }

    async fn create_intent(&self, new: NewIntent) -> Result<Intent, ParleyError> {
        queries::intents::create_intent(self.db()?, new).await
    }

    async fn update_intent(&self, id: &str, update: NewIntent) -> Result<Intent, ParleyError> {
        queries::intents::update_intent(self.db()?, id, update).await
    }

    async fn delete_intent(&self, id: &str) -> Result<(), ParleyError> {
        queries::intents::delete_intent(self.db()?, id).await
    }
}
