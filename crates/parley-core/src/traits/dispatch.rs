// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message dispatch.

use async_trait::async_trait;

use crate::error::DispatchError;
use crate::traits::adapter::Adapter;
use crate::types::{DispatchReceipt, PhoneInfo};

/// Sends messages to an external contact through a messaging provider.
///
/// One call is one attempt. Implementations must bound the call with a
/// timeout and never retry on their own.
#[async_trait]
pub trait Dispatcher: Adapter {
    /// Sends `body` to the contact address `to`.
    async fn send_text(&self, to: &str, body: &str) -> Result<DispatchReceipt, DispatchError>;

    /// Sends a pre-approved template by name in the given language code.
    async fn send_template(
        &self,
        to: &str,
        name: &str,
        language: &str,
    ) -> Result<DispatchReceipt, DispatchError>;

    /// Sends an already-uploaded image by media id.
    async fn send_media(
        &self,
        to: &str,
        media_id: &str,
        caption: Option<&str>,
    ) -> Result<DispatchReceipt, DispatchError>;

    /// Fetches details of the sending phone number.
    async fn phone_info(&self) -> Result<PhoneInfo, DispatchError>;
}
