// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Substring intent matching.

use std::sync::Arc;

use parley_core::{Intent, MessageStore, ParleyError};
use tracing::debug;

/// The text to send back and the intent that produced it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Intent(Intent),
    Fallback(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Intent(intent) => &intent.response,
            Reply::Fallback(text) => text,
        }
    }

    pub fn intent(&self) -> Option<&Intent> {
        match self {
            Reply::Intent(intent) => Some(intent),
            Reply::Fallback(_) => None,
        }
    }
}

/// Picks the first active intent whose trigger occurs in the message.
///
/// Precedence follows the store's ordering of active intents (by name).
pub struct IntentMatcher {
    store: Arc<dyn MessageStore>,
    fallback: String,
}

impl IntentMatcher {
    pub fn new(store: Arc<dyn MessageStore>, fallback: impl Into<String>) -> Self {
        Self {
            store,
            fallback: fallback.into(),
        }
    }

    pub async fn reply_for(&self, text: &str) -> Result<Reply, ParleyError> {
        let intents = self.store.list_active_intents().await?;
        Ok(match select(&intents, text) {
            Some(intent) => {
                debug!(intent = %intent.name, "intent matched");
                Reply::Intent(intent.clone())
            }
            None => {
                debug!("no intent matched, using fallback");
                Reply::Fallback(self.fallback.clone())
            }
        })
    }
}

/// First active intent in `intents` whose trigger matches `text`.
pub fn select<'a>(intents: &'a [Intent], text: &str) -> Option<&'a Intent> {
    let lowered = text.to_lowercase();
    intents
        .iter()
        .filter(|intent| intent.active)
        .find(|intent| intent.matches(&lowered))
}
