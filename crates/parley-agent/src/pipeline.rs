// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event webhook pipeline.
//!
//! Every text message in an event runs independently, in payload order:
//!
//! 1. correlate the sender to a user and conversation
//! 2. persist the inbound message (before any reply work)
//! 3. match an intent, or fall back
//! 4. dispatch the reply (one attempt)
//! 5. persist the outbound message, only if dispatch succeeded
//!
//! Failures end that message's run with a [`MessageOutcome`]; they are
//! never raised to the webhook caller and never stop sibling messages.

use std::sync::Arc;

use parley_config::model::ParleyConfig;
use parley_core::{Dispatcher, MessageStore, NewChatMessage, ParleyError};
use parley_whatsapp::{InboundText, WebhookEvent};
use strum::Display;
use tracing::{error, info};

use crate::correlator::ConversationCorrelator;
use crate::matcher::IntentMatcher;

/// Outbound sender id used when no phone number id is configured.
const DEFAULT_BOT_SENDER: &str = "bot";

/// Pipeline step at which a message run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Correlate,
    PersistInbound,
    Match,
    PersistOutbound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Inbound and outbound were both persisted.
    Replied {
        conversation_id: String,
        intent_id: Option<String>,
        provider_message_id: Option<String>,
    },
    /// The provider message id was already recorded; nothing was done.
    Duplicate { external_id: String },
    /// Inbound was persisted, the send failed, no outbound was stored.
    DispatchFailed {
        conversation_id: String,
        error: String,
    },
    Failed { stage: Stage, error: String },
}

/// Outcomes of one webhook event, in payload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventReport {
    pub outcomes: Vec<MessageOutcome>,
}

impl EventReport {
    pub fn replied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, MessageOutcome::Replied { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    MessageOutcome::Failed { .. } | MessageOutcome::DispatchFailed { .. }
                )
            })
            .count()
    }
}

pub struct WebhookPipeline {
    store: Arc<dyn MessageStore>,
    dispatcher: Arc<dyn Dispatcher>,
    correlator: ConversationCorrelator,
    matcher: IntentMatcher,
    bot_sender_id: String,
}

impl WebhookPipeline {
    pub fn new(
        store: Arc<dyn MessageStore>,
        dispatcher: Arc<dyn Dispatcher>,
        config: &ParleyConfig,
    ) -> Self {
        Self {
            correlator: ConversationCorrelator::new(Arc::clone(&store), config.bot.correlation),
            matcher: IntentMatcher::new(Arc::clone(&store), config.bot.fallback_response.clone()),
            bot_sender_id: config
                .whatsapp
                .phone_number_id
                .clone()
                .unwrap_or_else(|| DEFAULT_BOT_SENDER.to_string()),
            store,
            dispatcher,
        }
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub async fn handle_event(&self, event: &WebhookEvent) -> EventReport {
        let messages = event.text_messages();
        let mut report = EventReport {
            outcomes: Vec::with_capacity(messages.len()),
        };
        for message in &messages {
            report.outcomes.push(self.handle_message(message).await);
        }
        report
    }

    pub async fn handle_message(&self, message: &InboundText) -> MessageOutcome {
        let from = message.from.as_str();

        let correlation = match self
            .correlator
            .correlate(from, message.display_name.as_deref())
            .await
        {
            Ok(c) => c,
            Err(e) => return failed(Stage::Correlate, from, e),
        };
        let conversation = correlation.conversation;
        let conversation_id = conversation.conversation_id.clone();

        let inbound = NewChatMessage::inbound(&conversation, from, &message.body)
            .with_external_id(message.message_id.clone())
            .with_provider_timestamp(message.timestamp);
        match self.store.append_message(inbound).await {
            Ok(_) => info!(sender = %from, conversation_id = %conversation_id, "inbound message recorded"),
            Err(ParleyError::Duplicate { external_id }) => {
                info!(sender = %from, external_id = %external_id, "skipping redelivered message");
                return MessageOutcome::Duplicate { external_id };
            }
            Err(e) => return failed(Stage::PersistInbound, from, e),
        }

        let reply = match self.matcher.reply_for(&message.body).await {
            Ok(reply) => reply,
            Err(e) => return failed(Stage::Match, from, e),
        };

        let receipt = match self.dispatcher.send_text(&conversation.contact, reply.text()).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(
                    sender = %from,
                    conversation_id = %conversation_id,
                    error = %e,
                    "failed to send reply"
                );
                return MessageOutcome::DispatchFailed {
                    conversation_id,
                    error: e.to_string(),
                };
            }
        };
        let provider_message_id = receipt.first_id().map(str::to_string);

        let outbound =
            NewChatMessage::outbound(&conversation, &self.bot_sender_id, reply.text(), reply.intent())
                .with_external_id(provider_message_id.clone());
        if let Err(e) = self.store.append_message(outbound).await {
            return failed(Stage::PersistOutbound, from, e);
        }

        info!(
            sender = %from,
            conversation_id = %conversation_id,
            intent = reply.intent().map(|i| i.name.as_str()).unwrap_or("-"),
            "reply sent"
        );
        MessageOutcome::Replied {
            conversation_id,
            intent_id: reply.intent().map(|i| i.id.clone()),
            provider_message_id,
        }
    }
}

fn failed(stage: Stage, sender: &str, e: ParleyError) -> MessageOutcome {
    error!(sender, stage = %stage, error = %e, "pipeline step failed");
    MessageOutcome::Failed {
        stage,
        error: e.to_string(),
    }
}
