// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API integration.
//!
//! [`types`] holds the inbound webhook envelope and the send API payloads;
//! [`WhatsAppClient`] implements [`parley_core::Dispatcher`] over the
//! Graph API `/{version}/{phone_number_id}` resource and its `/messages`
//! endpoint.

pub mod client;
pub mod types;

pub use client::WhatsAppClient;
pub use types::{InboundText, WebhookEvent};
