// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook-to-reply pipeline.
//!
//! [`WebhookPipeline`] runs each inbound text message through
//! correlate, persist inbound, match, dispatch and persist outbound.
//! [`IntentMatcher`] and [`ConversationCorrelator`] are the two lookups it
//! composes; [`verify`] answers the provider's subscription handshake.

pub mod correlator;
pub mod matcher;
pub mod pipeline;
pub mod verify;

pub use correlator::{Correlation, ConversationCorrelator};
pub use matcher::{IntentMatcher, Reply};
pub use pipeline::{EventReport, MessageOutcome, Stage, WebhookPipeline};
pub use verify::{Verification, verify_subscription};
