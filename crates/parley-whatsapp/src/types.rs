// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the WhatsApp Cloud API.
//!
//! Only the parts of the webhook envelope needed to extract sender, text,
//! message id and timestamp are modeled. Every level is optional, and an
//! explicit `null` list decodes as empty, so that a partial envelope yields
//! nothing instead of a decode error.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Change field that carries inbound messages.
pub const MESSAGES_FIELD: &str = "messages";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Change {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<ChangeValue>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messaging_product: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contacts: Vec<Contact>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Contact {
    #[serde(default)]
    pub wa_id: Option<String>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    /// Unix seconds, usually sent as a string.
    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<Text>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Text {
    #[serde(default)]
    pub body: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// One inbound text message extracted from a [`WebhookEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    /// Sender's WhatsApp id.
    pub from: String,
    /// Profile name from the envelope's `contacts`, when present.
    pub display_name: Option<String>,
    pub body: String,
    /// Provider message id (`wamid...`).
    pub message_id: Option<String>,
    pub timestamp: Option<i64>,
}

impl WebhookEvent {
    /// Text messages in payload order.
    ///
    /// Changes whose field is not `messages`, non-text message types and
    /// messages without a sender or body are skipped.
    pub fn text_messages(&self) -> Vec<InboundText> {
        let mut out = Vec::new();
        for change in self.entry.iter().flat_map(|e| &e.changes) {
            if change.field.as_deref() != Some(MESSAGES_FIELD) {
                debug!(field = ?change.field, "skipping non-message change");
                continue;
            }
            let Some(value) = &change.value else {
                debug!("skipping change without value");
                continue;
            };
            for message in &value.messages {
                match extract(value, message) {
                    Some(text) => out.push(text),
                    None => debug!(
                        id = ?message.id,
                        kind = ?message.kind,
                        "skipping message without text body"
                    ),
                }
            }
        }
        out
    }
}

fn extract(value: &ChangeValue, message: &Message) -> Option<InboundText> {
    if message.kind.as_deref().is_some_and(|k| k != "text") {
        return None;
    }
    let from = message.from.as_deref().filter(|f| !f.is_empty())?;
    let body = message
        .text
        .as_ref()
        .and_then(|t| t.body.as_deref())
        .filter(|b| !b.is_empty())?;
    let display_name = value
        .contacts
        .iter()
        .find(|c| c.wa_id.as_deref() == Some(from))
        .and_then(|c| c.profile.as_ref())
        .and_then(|p| p.name.clone())
        .filter(|n| !n.is_empty());
    Some(InboundText {
        from: from.to_string(),
        display_name,
        body: body.to_string(),
        message_id: message.id.clone().filter(|id| !id.is_empty()),
        timestamp: message.timestamp.as_deref().and_then(|t| t.parse().ok()),
    })
}

/// Body of `POST /{version}/{phone_number_id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct SendRequest<'a> {
    pub messaging_product: &'static str,
    pub to: &'a str,
    #[serde(flatten)]
    pub content: OutboundContent<'a>,
}

/// Message payload, tagged by the provider's `type` field.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundContent<'a> {
    Text { text: SendText<'a> },
    Template { template: SendTemplate<'a> },
    Image { image: SendImage<'a> },
}

#[derive(Debug, Clone, Serialize)]
pub struct SendText<'a> {
    pub body: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendTemplate<'a> {
    pub name: &'a str,
    pub language: TemplateLanguage<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateLanguage<'a> {
    pub code: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendImage<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<&'a str>,
}

impl<'a> SendRequest<'a> {
    fn new(to: &'a str, content: OutboundContent<'a>) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            content,
        }
    }

    pub fn text(to: &'a str, body: &'a str) -> Self {
        Self::new(to, OutboundContent::Text {
            text: SendText { body },
        })
    }

    pub fn template(to: &'a str, name: &'a str, language: &'a str) -> Self {
        Self::new(to, OutboundContent::Template {
            template: SendTemplate {
                name,
                language: TemplateLanguage { code: language },
            },
        })
    }

    pub fn image(to: &'a str, media_id: &'a str, caption: Option<&'a str>) -> Self {
        Self::new(to, OutboundContent::Image {
            image: SendImage {
                id: media_id,
                caption,
            },
        })
    }

    /// Provider `type` value, for logging.
    pub fn kind(&self) -> &'static str {
        match self.content {
            OutboundContent::Text { .. } => "text",
            OutboundContent::Template { .. } => "template",
            OutboundContent::Image { .. } => "image",
        }
    }
}

/// Success response of the send endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub messaging_product: Option<String>,
    #[serde(default)]
    pub contacts: Vec<SendContact>,
    #[serde(default)]
    pub messages: Vec<SendMessageId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendContact {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub wa_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageId {
    pub id: String,
}
