// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the signal submission and fetch-all endpoints.
//!
//! Every call is a single attempt. Failures are classified into
//! [`DeliveryError`] and handed back; retry policy belongs to the caller.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use signalbox_config::model::ApiConfig;
use signalbox_core::{
    Credential, DeliveryError, FetchQuery, Priority, Signal, SignalError, SignalId,
    SignalTransport, SubmitAck,
};
use tracing::{debug, warn};

/// Submission payload. Author fields are resolved server-side from the
/// bearer credential and are never sent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    id: &'a SignalId,
    title: &'a str,
    body: Option<&'a str>,
    date: Option<DateTime<Utc>>,
    source: &'a str,
    restaurant_ids: &'a [String],
    priority: Option<Priority>,
}

impl<'a> From<&'a Signal> for SubmitBody<'a> {
    fn from(signal: &'a Signal) -> Self {
        Self {
            id: &signal.id,
            title: &signal.title,
            body: signal.body.as_deref(),
            date: signal.date,
            source: &signal.source,
            restaurant_ids: &signal.restaurant_ids,
            priority: signal.priority,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignalsPage {
    signals: Vec<Signal>,
}

/// Error bodies seen from the API: `{"error": "..."}`, `{"message": "..."}`,
/// or `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorBody {
    fn into_message(self) -> Option<String> {
        match self.error {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
            Some(serde_json::Value::Object(obj)) => obj
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => self.message.filter(|m| !m.is_empty()),
        }
    }
}

/// Bearer-authenticated client for the signal REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    submit_url: String,
    list_url: String,
    probe_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, SignalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SignalError::Config(format!("failed to build HTTP client: {e}")))?;

        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            client,
            base_url: base.to_string(),
            submit_url: format!("{base}{}", config.submit_path),
            list_url: format!("{base}{}", config.list_path),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        })
    }

    /// Fetches every page of the fetch-all endpoint, starting at
    /// `query.offset`, until a short page comes back or a page holds nothing
    /// not already seen. Rows repeated across pages are kept once.
    pub async fn fetch_all_pages(
        &self,
        query: &FetchQuery,
        page_size: u32,
        credential: &Credential,
    ) -> Result<Vec<Signal>, DeliveryError> {
        let page_size = page_size.max(1);
        let mut offset = query.offset.unwrap_or(0);
        let mut all = Vec::new();
        let mut seen: HashSet<SignalId> = HashSet::new();
        loop {
            let page_query = FetchQuery {
                limit: Some(page_size),
                offset: Some(offset),
                ..query.clone()
            };
            let page = self.fetch(&page_query, credential).await?;
            let received = page.len() as u32;
            let before = all.len();
            all.extend(page.into_iter().filter(|signal| seen.insert(signal.id.clone())));
            if received < page_size {
                break;
            }
            if all.len() == before {
                warn!(offset, "fetch-all page repeated earlier rows, stopping");
                break;
            }
            offset += received;
        }
        debug!(count = all.len(), "fetched all signal pages");
        Ok(all)
    }

    /// Whether the API host answers at all. Any HTTP status counts as online.
    pub async fn probe_online(&self) -> bool {
        match self
            .client
            .head(&self.base_url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "connectivity probe failed");
                false
            }
        }
    }

    fn list_url_for(&self, query: &FetchQuery) -> Result<Url, DeliveryError> {
        let mut url = Url::parse(&self.list_url).map_err(|e| DeliveryError::Transport {
            message: format!("invalid list URL {}: {e}", self.list_url),
            source: Some(Box::new(e)),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = query.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
            if let Some(email) = &query.author_email {
                pairs.append_pair("authorEmail", email);
            }
            if let Some(status) = query.status {
                pairs.append_pair("status", &status.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }
}

/// Converts a non-success response into [`DeliveryError::Rejected`], using
/// the server's message when the body carries one.
async fn rejection(response: reqwest::Response) -> DeliveryError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(ApiErrorBody::into_message)
        .unwrap_or_else(|| generic_message(status));
    DeliveryError::Rejected {
        status: status.as_u16(),
        message,
    }
}

fn generic_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("request failed: {reason}"),
        None => "request failed".to_string(),
    }
}

#[async_trait]
impl SignalTransport for HttpTransport {
    async fn submit(
        &self,
        signal: &Signal,
        credential: &Credential,
    ) -> Result<SubmitAck, DeliveryError> {
        let response = self
            .client
            .post(&self.submit_url)
            .bearer_auth(credential.token.expose_secret())
            .json(&SubmitBody::from(signal))
            .send()
            .await
            .map_err(|e| DeliveryError::transport(format!("submit request failed: {e}"), e))?;

        let status = response.status();
        debug!(signal_id = %signal.id, status = %status, "submit response received");
        if !status.is_success() {
            return Err(rejection(response).await);
        }

        // The server has accepted the signal at this point; an unreadable
        // acknowledgement body is not a delivery failure.
        let body = response.text().await.unwrap_or_default();
        let ack = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
        Ok(SubmitAck(ack))
    }

    async fn fetch(
        &self,
        query: &FetchQuery,
        credential: &Credential,
    ) -> Result<Vec<Signal>, DeliveryError> {
        let url = self.list_url_for(query)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(credential.token.expose_secret())
            .send()
            .await
            .map_err(|e| DeliveryError::transport(format!("fetch request failed: {e}"), e))?;

        let status = response.status();
        debug!(status = %status, "fetch response received");
        if !status.is_success() {
            return Err(rejection(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::transport(format!("failed to read response body: {e}"), e))?;
        let page: SignalsPage = serde_json::from_str(&body).map_err(|e| DeliveryError::Decode {
            message: format!("failed to parse signal list: {e}"),
        })?;
        Ok(page.signals)
    }
}
