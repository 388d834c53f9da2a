// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Notification relay client.
//!
//! Posts `{fid, notificationDetails}` to the app server's relay endpoint and
//! classifies the answer. There is no retry or backoff; a rate-limited send
//! is reported and the user may try again.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Classify, FailureKind};
use crate::host::NotificationDetails;

/// Relay route, relative to the configured base URL.
pub const RELAY_PATH: &str = "/api/send-notification";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("Relay rejected the notification: {0}")]
    Rejected(String),

    #[error("Relay request failed: {0}")]
    Request(String),

    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),
}

impl Classify for RelayError {
    fn kind(&self) -> FailureKind {
        match self {
            RelayError::Rejected(_) => FailureKind::RelayError,
            RelayError::Request(_) => FailureKind::TransportError,
            RelayError::InvalidUrl(_) => FailureKind::InvalidInput,
        }
    }
}

/// Classified result of one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Success,
    RateLimited,
    /// Response body for a non-200 answer, or the transport error text.
    Error(String),
}

impl NotificationOutcome {
    pub fn label(&self) -> String {
        match self {
            NotificationOutcome::Success => "Success".to_string(),
            NotificationOutcome::RateLimited => "Rate limited".to_string(),
            NotificationOutcome::Error(message) => format!("Error: {message}"),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            NotificationOutcome::Success => None,
            NotificationOutcome::RateLimited => Some(FailureKind::RateLimited),
            NotificationOutcome::Error(_) => Some(FailureKind::RelayError),
        }
    }

    fn from_response(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::OK => NotificationOutcome::Success,
            StatusCode::TOO_MANY_REQUESTS => NotificationOutcome::RateLimited,
            _ => NotificationOutcome::Error(body),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendNotificationBody<'a> {
    fid: u64,
    notification_details: &'a NotificationDetails,
}

/// HTTP client for the notification relay.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    endpoint: String,
    http: Client,
}

impl NotificationClient {
    pub fn new(base_url: &str) -> Result<Self, RelayError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, RelayError> {
        let base = url::Url::parse(base_url)
            .map_err(|e| RelayError::InvalidUrl(format!("{base_url}: {e}")))?;
        let endpoint = base
            .join(RELAY_PATH)
            .map_err(|e| RelayError::InvalidUrl(format!("{base_url}: {e}")))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a notification for `fid` using the host-issued grant.
    ///
    /// Returns `None` without touching the network when either the user or
    /// the grant is missing.
    pub async fn send(
        &self,
        fid: Option<u64>,
        details: Option<&NotificationDetails>,
    ) -> Option<NotificationOutcome> {
        let (Some(fid), Some(details)) = (fid, details) else {
            debug!("Skipping notification: no context or no notification grant");
            return None;
        };

        let outcome = match self.post(fid, details).await {
            Ok((status, body)) => NotificationOutcome::from_response(status, body),
            Err(e) => NotificationOutcome::Error(e.to_string()),
        };

        match &outcome {
            NotificationOutcome::Success => info!(fid, "Notification sent"),
            NotificationOutcome::RateLimited => info!(fid, "Notification rate limited"),
            NotificationOutcome::Error(message) => {
                warn!(fid, error = %message, "Notification relay error")
            }
        }
        Some(outcome)
    }

    async fn post(
        &self,
        fid: u64,
        details: &NotificationDetails,
    ) -> Result<(StatusCode, String), RelayError> {
        let body = SendNotificationBody {
            fid,
            notification_details: details,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::Request(e.to_string()))?;
        Ok((status, text))
    }
}
