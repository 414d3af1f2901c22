// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Cloud API messages and phone number endpoints.

use std::time::Duration;

use async_trait::async_trait;
use parley_config::model::WhatsAppConfig;
use parley_core::{
    Adapter, AdapterType, DispatchError, DispatchReceipt, Dispatcher, HealthStatus, ParleyError,
    PhoneInfo,
};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, info, warn};

use crate::types::{SendRequest, SendResponse};

/// Outbound dispatcher for WhatsApp messages.
///
/// Each [`Dispatcher`] call is exactly one request bounded by the
/// configured timeout. There is no retry.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    /// `{base}/{version}/{phone_number_id}`
    phone_url: Option<String>,
    access_token: Option<String>,
    timeout: Duration,
}

impl WhatsAppClient {
    /// Builds a client from configuration.
    ///
    /// Missing credentials do not fail construction; sends fail with
    /// [`DispatchError::Config`] instead so the webhook surface can still run.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, ParleyError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ParleyError::Config(format!("failed to build HTTP client: {e}")))?;

        let phone_url = config.phone_number_id.as_ref().map(|phone_id| {
            format!(
                "{}/{}/{}",
                config.base_url.trim_end_matches('/'),
                config.api_version,
                phone_id
            )
        });

        Ok(Self {
            client,
            phone_url,
            access_token: config.access_token.clone(),
            timeout: config.timeout(),
        })
    }

    fn credentials(&self) -> Result<(&str, &str), DispatchError> {
        let phone_url = self
            .phone_url
            .as_deref()
            .ok_or_else(|| DispatchError::Config("whatsapp.phone_number_id is not set".into()))?;
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| DispatchError::Config("whatsapp.access_token is not set".into()))?;
        Ok((phone_url, token))
    }

    /// Sends one request and decodes a 2xx body as `T`.
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, DispatchError> {
        let response = request.send().await.map_err(|e| self.transport(e))?;

        let status = response.status();
        debug!(status = %status, context, "provider response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, context, "provider rejected request");
            return Err(DispatchError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await.map_err(|e| self.transport(e))?;
        serde_json::from_str(&raw).map_err(|e| DispatchError::Decode(format!("{e}: {raw}")))
    }

    async fn send(&self, request: SendRequest<'_>) -> Result<DispatchReceipt, DispatchError> {
        let (phone_url, token) = self.credentials()?;
        let kind = request.kind();
        let to = request.to;

        let builder = self
            .client
            .post(format!("{phone_url}/messages"))
            .bearer_auth(token)
            .json(&request);
        let parsed: SendResponse = self.execute(builder, kind).await?;

        let receipt = DispatchReceipt {
            message_ids: parsed.messages.into_iter().map(|m| m.id).collect(),
        };
        info!(to, kind, message_id = ?receipt.first_id(), "message sent");
        Ok(receipt)
    }

    fn transport(&self, e: reqwest::Error) -> DispatchError {
        if e.is_timeout() {
            DispatchError::Timeout {
                duration: self.timeout,
            }
        } else {
            DispatchError::Transport {
                message: e.to_string(),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[async_trait]
impl Adapter for WhatsAppClient {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dispatcher
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(match self.credentials() {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Degraded(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl Dispatcher for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<DispatchReceipt, DispatchError> {
        self.send(SendRequest::text(to, body)).await
    }

    async fn send_template(
        &self,
        to: &str,
        name: &str,
        language: &str,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.send(SendRequest::template(to, name, language)).await
    }

    async fn send_media(
        &self,
        to: &str,
        media_id: &str,
        caption: Option<&str>,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.send(SendRequest::image(to, media_id, caption)).await
    }

    async fn phone_info(&self) -> Result<PhoneInfo, DispatchError> {
        let (phone_url, token) = self.credentials()?;
        let builder = self.client.get(phone_url).bearer_auth(token);
        self.execute(builder, "phone_info").await
    }
}
