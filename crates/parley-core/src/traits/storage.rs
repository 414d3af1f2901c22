// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence of users, conversations, messages and intents.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::Adapter;
use crate::types::{
    ChatMessage, Conversation, ConversationStatus, CorrelationPolicy, Intent, NewChatMessage,
    NewIntent, NewUser, User, UserPatch,
};

/// Durable message store.
///
/// Every mutation of a user or conversation increments its `version`.
/// Operations taking an `expected_version` fail with
/// [`ParleyError::Conflict`] when the stored version differs.
#[async_trait]
pub trait MessageStore: Adapter {
    /// Prepares the backend (connection, migrations). Idempotent.
    async fn initialize(&self) -> Result<(), ParleyError>;

    /// Looks the user up by external id, creating it with role USER and
    /// status ACTIVE on first contact.
    async fn find_or_create_user(&self, new: NewUser) -> Result<User, ParleyError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, ParleyError>;

    /// Applies an administrative patch guarded by `expected_version`.
    async fn update_user(
        &self,
        user_id: &str,
        patch: UserPatch,
        expected_version: i64,
    ) -> Result<User, ParleyError>;

    /// Returns the conversation that a new inbound message from `owner`
    /// belongs to, creating one when the policy calls for it.
    async fn resolve_conversation(
        &self,
        owner: &User,
        policy: CorrelationPolicy,
    ) -> Result<Conversation, ParleyError>;

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, ParleyError>;

    /// Changes a conversation's status guarded by `expected_version`.
    async fn update_conversation_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
        expected_version: i64,
    ) -> Result<Conversation, ParleyError>;

    /// Appends a message and updates the conversation's `message_count`,
    /// `last_message`, `updated_at` and `version` in one transaction.
    ///
    /// Fails with [`ParleyError::Duplicate`] when `external_id` is already
    /// recorded; nothing is written in that case.
    async fn append_message(&self, message: NewChatMessage) -> Result<ChatMessage, ParleyError>;

    /// Messages of one conversation, oldest first.
    async fn get_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ParleyError>;

    /// Messages in both directions across all of the user's conversations,
    /// newest first. An unknown user has an empty history.
    async fn history_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, ParleyError>;

    /// Active intents ordered by name.
    async fn list_active_intents(&self) -> Result<Vec<Intent>, ParleyError>;

    async fn get_intent(&self, id: &str) -> Result<Option<Intent>, ParleyError>;

    /// Fails with [`ParleyError::AlreadyExists`] on a duplicate name.
    async fn create_intent(&self, new: NewIntent) -> Result<Intent, ParleyError>;

    /// Replaces all editable fields of an intent.
    async fn update_intent(&self, id: &str, update: NewIntent) -> Result<Intent, ParleyError>;

    /// Deletes an intent. Messages that referenced it keep a null reference.
    async fn delete_intent(&self, id: &str) -> Result<(), ParleyError>;
}
