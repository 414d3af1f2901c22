// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps an inbound sender to a user and conversation.

use std::sync::Arc;

use parley_core::{Conversation, CorrelationPolicy, MessageStore, NewUser, ParleyError, User};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Correlation {
    pub user: User,
    pub conversation: Conversation,
}

pub struct ConversationCorrelator {
    store: Arc<dyn MessageStore>,
    policy: CorrelationPolicy,
}

impl ConversationCorrelator {
    pub fn new(store: Arc<dyn MessageStore>, policy: CorrelationPolicy) -> Self {
        Self { store, policy }
    }

    /// Finds or creates the sender's user record, then resolves the
    /// conversation under the configured policy.
    ///
    /// The sender id doubles as the contact address; `display_name` is
    /// only used when the user is first created.
    pub async fn correlate(
        &self,
        sender: &str,
        display_name: Option<&str>,
    ) -> Result<Correlation, ParleyError> {
        let user = self
            .store
            .find_or_create_user(NewUser {
                user_id: sender.to_string(),
                name: display_name.unwrap_or(sender).to_string(),
                contact: sender.to_string(),
            })
            .await?;
        let conversation = self.store.resolve_conversation(&user, self.policy).await?;
        debug!(
            sender,
            conversation_id = %conversation.conversation_id,
            policy = %self.policy,
            "correlated inbound sender"
        );
        Ok(Correlation { user, conversation })
    }
}
