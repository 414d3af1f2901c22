// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the pipeline and the HTTP surface.
//!
//! Entities are plain records. Associations are expressed as identifier
//! fields and resolved through explicit [`MessageStore`](crate::MessageStore)
//! lookups.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ParleyError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Dispatcher,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    User,
    Bot,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
    Deleted,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStatus {
    Active,
    Paused,
    Ended,
    Blocked,
}

impl ConversationStatus {
    /// Whether new inbound messages may be correlated into a conversation
    /// in this state.
    pub fn accepts_messages(self) -> bool {
        matches!(self, ConversationStatus::Active | ConversationStatus::Paused)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// How an inbound sender is mapped to a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CorrelationPolicy {
    /// Reuse the sender's most recent ACTIVE or PAUSED conversation,
    /// minting a new one only when none exists.
    #[default]
    ReuseActive,
    /// Mint a fresh conversation for every inbound message.
    PerEvent,
}

/// Identity record for an external contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row identifier (UUID v4).
    pub id: String,
    /// External user identifier (the provider's `wa_id`). Unique.
    pub user_id: String,
    pub name: String,
    /// Contact address (phone number). Unique.
    pub contact: String,
    pub role: UserRole,
    pub status: UserStatus,
    /// Free-form preference blob.
    pub preferences: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub version: i64,
}

/// Fields required to create a user on first contact.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub name: String,
    pub contact: String,
}

/// Administrative changes to a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub preferences: Option<String>,
}

/// One logical thread with one external contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Row identifier (UUID v4).
    pub id: String,
    /// External conversation identifier. Unique.
    pub conversation_id: String,
    /// Row identifier of the owning [`User`].
    pub owner_id: String,
    pub contact: String,
    pub status: ConversationStatus,
    /// Body of the newest message, denormalized.
    pub last_message: Option<String>,
    /// Number of messages, denormalized.
    pub message_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub version: i64,
}

/// A persisted inbound or outbound text record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    /// Row identifier of the owning [`Conversation`].
    pub conversation_ref: String,
    /// External conversation identifier, denormalized.
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub direction: Direction,
    /// Matched intent. Only ever set on outbound messages.
    pub intent_id: Option<String>,
    /// Provider-assigned message id, when known.
    pub external_id: Option<String>,
    /// Provider event time in unix seconds (inbound only).
    pub provider_timestamp: Option<i64>,
    pub created_at: String,
    pub version: i64,
}

/// A message about to be appended to a conversation.
///
/// Build one with [`NewChatMessage::inbound`] or [`NewChatMessage::outbound`];
/// the store re-checks [`NewChatMessage::validate`] before writing.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub conversation_ref: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub direction: Direction,
    pub intent_id: Option<String>,
    pub external_id: Option<String>,
    pub provider_timestamp: Option<i64>,
}

impl NewChatMessage {
    pub fn inbound(conversation: &Conversation, sender_id: &str, body: &str) -> Self {
        Self {
            conversation_ref: conversation.id.clone(),
            conversation_id: conversation.conversation_id.clone(),
            sender_id: sender_id.to_string(),
            body: body.to_string(),
            direction: Direction::Inbound,
            intent_id: None,
            external_id: None,
            provider_timestamp: None,
        }
    }

    pub fn outbound(
        conversation: &Conversation,
        sender_id: &str,
        body: &str,
        intent: Option<&Intent>,
    ) -> Self {
        Self {
            conversation_ref: conversation.id.clone(),
            conversation_id: conversation.conversation_id.clone(),
            sender_id: sender_id.to_string(),
            body: body.to_string(),
            direction: Direction::Outbound,
            intent_id: intent.map(|i| i.id.clone()),
            external_id: None,
            provider_timestamp: None,
        }
    }

    pub fn with_external_id(mut self, external_id: Option<String>) -> Self {
        self.external_id = external_id.filter(|id| !id.is_empty());
        self
    }

    pub fn with_provider_timestamp(mut self, timestamp: Option<i64>) -> Self {
        self.provider_timestamp = timestamp;
        self
    }

    /// Checks the record invariants: non-empty body and sender, and an
    /// intent reference only on outbound messages.
    pub fn validate(&self) -> Result<(), ParleyError> {
        if self.body.is_empty() {
            return Err(ParleyError::Validation("message body must not be empty".into()));
        }
        if self.sender_id.is_empty() {
            return Err(ParleyError::Validation("sender id must not be empty".into()));
        }
        if self.conversation_ref.is_empty() || self.conversation_id.is_empty() {
            return Err(ParleyError::Validation(
                "message must belong to a conversation".into(),
            ));
        }
        if self.direction == Direction::Inbound && self.intent_id.is_some() {
            return Err(ParleyError::Validation(
                "only outbound messages may reference an intent".into(),
            ));
        }
        Ok(())
    }
}

/// A reply rule: when `trigger` occurs in a message, answer with `response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub id: String,
    pub name: String,
    pub trigger: String,
    pub response: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Intent {
    /// Case-insensitive substring test of the trigger against `text`.
    pub fn matches(&self, text: &str) -> bool {
        !self.trigger.is_empty() && text.to_lowercase().contains(&self.trigger.to_lowercase())
    }
}

/// Administrative create/replace payload for an intent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewIntent {
    pub name: String,
    pub trigger: String,
    pub response: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewIntent {
    pub fn validate(&self) -> Result<(), ParleyError> {
        for (field, value) in [
            ("name", &self.name),
            ("trigger", &self.trigger),
            ("response", &self.response),
        ] {
            if value.trim().is_empty() {
                return Err(ParleyError::Validation(format!(
                    "intent {field} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Provider acknowledgement of an outbound send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// Provider-assigned message ids, in request order.
    pub message_ids: Vec<String>,
}

impl DispatchReceipt {
    pub fn first_id(&self) -> Option<&str> {
        self.message_ids.first().map(String::as_str)
    }
}

/// Business phone number details reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_rating: Option<String>,
}
