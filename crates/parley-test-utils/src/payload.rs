// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook payload builders shaped like the Cloud API's deliveries.

use serde_json::{Value, json};

/// One inbound text message for [`webhook_event`].
#[derive(Debug, Clone)]
pub struct TextMessage {
    pub from: String,
    pub id: String,
    pub body: String,
    pub timestamp: String,
}

impl TextMessage {
    pub fn new(from: &str, id: &str, body: &str) -> Self {
        Self {
            from: from.to_string(),
            id: id.to_string(),
            body: body.to_string(),
            timestamp: "1700000000".to_string(),
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "from": self.from,
            "id": self.id,
            "timestamp": self.timestamp,
            "type": "text",
            "text": { "body": self.body }
        })
    }
}

/// A single-entry, single-change `messages` event carrying `messages`.
/// Each distinct sender gets a contact entry named `Contact <from>`.
pub fn webhook_event(messages: &[TextMessage]) -> Value {
    let mut contacts: Vec<Value> = Vec::new();
    for m in messages {
        if !contacts.iter().any(|c| c["wa_id"] == m.from.as_str()) {
            contacts.push(json!({
                "wa_id": m.from,
                "profile": { "name": format!("Contact {}", m.from) }
            }));
        }
    }

    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA-1",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "display_phone_number": "15550000000", "phone_number_id": "1000" },
                    "contacts": contacts,
                    "messages": messages.iter().map(TextMessage::to_json).collect::<Vec<_>>()
                }
            }]
        }]
    })
}

/// Shorthand for a one-message event.
pub fn text_event(from: &str, id: &str, body: &str) -> Value {
    webhook_event(&[TextMessage::new(from, id, body)])
}

/// A delivery-status event, which carries no messages.
pub fn status_event() -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA-1",
            "changes": [{
                "field": "statuses",
                "value": {
                    "messaging_product": "whatsapp",
                    "statuses": [{ "id": "wamid.out-1", "status": "delivered" }]
                }
            }]
        }]
    })
}
