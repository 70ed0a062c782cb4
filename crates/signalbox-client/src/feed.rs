// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Websocket live feed with an HTTP baseline.
//!
//! On connect the client sends one subscribe frame for the signal table.
//! The server then pushes change frames shaped
//! `{"eventType": "INSERT" | "UPDATE" | "DELETE", "record": {...}}`; the
//! row may also arrive as `new` (inserts and updates) or `old` (deletes).
//! Rows use the table's snake_case columns and are mapped through
//! [`signalbox_core::wire`].

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use serde::Deserialize;
use signalbox_core::wire::signal_from_row;
use signalbox_core::{
    Credential, DeliveryError, FeedEvent, FeedSource, FeedStream, FetchQuery, Signal, SignalId,
};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tracing::{debug, info, warn};

use crate::transport::HttpTransport;

const SUBSCRIBE_FRAME: &str = r#"{"type":"subscribe","table":"signals"}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedFrame {
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    record: Option<serde_json::Value>,
    #[serde(default)]
    new: Option<serde_json::Value>,
    #[serde(default)]
    old: Option<serde_json::Value>,
}

fn decode_error(message: impl Into<String>) -> DeliveryError {
    DeliveryError::Decode {
        message: message.into(),
    }
}

fn row_to_signal(row: Option<serde_json::Value>, kind: &str) -> Result<Signal, DeliveryError> {
    let row = row.ok_or_else(|| decode_error(format!("{kind} frame without a record")))?;
    signal_from_row(row).map_err(|e| decode_error(format!("invalid {kind} record: {e}")))
}

/// Parses one text frame from the feed.
///
/// Returns `Ok(None)` for frames that are not change notifications
/// (acknowledgements, heartbeats, unknown event types).
pub fn parse_feed_frame(text: &str) -> Result<Option<FeedEvent>, DeliveryError> {
    let frame: FeedFrame = serde_json::from_str(text)
        .map_err(|e| decode_error(format!("feed frame is not JSON: {e}")))?;
    let Some(event_type) = frame.event_type else {
        return Ok(None);
    };

    match event_type.to_ascii_uppercase().as_str() {
        "INSERT" => row_to_signal(frame.record.or(frame.new), "INSERT")
            .map(|signal| Some(FeedEvent::Insert(signal))),
        "UPDATE" => row_to_signal(frame.record.or(frame.new), "UPDATE")
            .map(|signal| Some(FeedEvent::Update(signal))),
        "DELETE" => {
            let row = frame
                .old
                .or(frame.record)
                .ok_or_else(|| decode_error("DELETE frame without a record"))?;
            let id = row
                .get("id")
                .and_then(|id| id.as_str())
                .ok_or_else(|| decode_error("DELETE record without an id"))?;
            Ok(Some(FeedEvent::Delete(SignalId::from(id))))
        }
        other => {
            debug!(event_type = other, "ignoring feed frame");
            Ok(None)
        }
    }
}

/// Live feed backed by the fetch-all endpoint and a websocket channel.
pub struct WsFeedSource {
    http: HttpTransport,
    feed_url: String,
    page_size: u32,
}

impl WsFeedSource {
    pub fn new(http: HttpTransport, feed_url: impl Into<String>, page_size: u32) -> Self {
        Self {
            http,
            feed_url: feed_url.into(),
            page_size,
        }
    }
}

#[async_trait]
impl FeedSource for WsFeedSource {
    async fn baseline(&self, credential: &Credential) -> Result<Vec<Signal>, DeliveryError> {
        self.http
            .fetch_all_pages(&FetchQuery::default(), self.page_size, credential)
            .await
    }

    async fn subscribe(&self, credential: &Credential) -> Result<FeedStream, DeliveryError> {
        let mut request = self
            .feed_url
            .as_str()
            .into_client_request()
            .map_err(|e| DeliveryError::transport(format!("invalid feed URL: {e}"), e))?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", credential.token.expose_secret()))
            .map_err(|e| DeliveryError::transport("credential is not a valid header value", e))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let (mut ws, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| DeliveryError::transport(format!("feed connect failed: {e}"), e))?;
        ws.send(Message::Text(SUBSCRIBE_FRAME.into()))
            .await
            .map_err(|e| DeliveryError::transport(format!("feed subscribe failed: {e}"), e))?;
        info!(url = %self.feed_url, "live feed subscribed");

        let events = ws.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => match parse_feed_frame(text.as_str()) {
                    Ok(event) => event.map(Ok),
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable feed frame");
                        None
                    }
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "live feed closed by server");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(DeliveryError::transport(
                    format!("feed connection lost: {e}"),
                    e,
                ))),
            }
        });
        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use signalbox_config::model::ApiConfig;
    use signalbox_core::SignalStatus;
    use tokio::net::TcpListener;

    #[test]
    fn insert_frame_maps_snake_case_row() {
        let frame = r#"{"eventType":"INSERT","record":{"id":"abc","title":"Nová","restaurant_ids":["r1"],"author_email":"jana@example.cz","status":"inbox"}}"#;
        let Some(FeedEvent::Insert(signal)) = parse_feed_frame(frame).unwrap() else {
            panic!("expected insert");
        };
        assert_eq!(signal.id.as_str(), "abc");
        assert_eq!(signal.restaurant_ids, vec!["r1".to_string()]);
        assert_eq!(signal.author_email.as_deref(), Some("jana@example.cz"));
    }

    #[test]
    fn update_frame_accepts_new_row() {
        let frame = r#"{"eventType":"UPDATE","new":{"id":"abc","title":"A","status":"triaged"},"old":{"id":"abc"}}"#;
        let Some(FeedEvent::Update(signal)) = parse_feed_frame(frame).unwrap() else {
            panic!("expected update");
        };
        assert_eq!(signal.status, SignalStatus::Triaged);
    }

    #[test]
    fn delete_frame_uses_old_id() {
        let frame = r#"{"eventType":"DELETE","old":{"id":"gone"}}"#;
        assert_eq!(
            parse_feed_frame(frame).unwrap(),
            Some(FeedEvent::Delete(SignalId::from("gone")))
        );
    }

    #[test]
    fn non_change_frames_are_ignored() {
        assert_eq!(parse_feed_frame(r#"{"type":"ack"}"#).unwrap(), None);
        assert_eq!(
            parse_feed_frame(r#"{"eventType":"TRUNCATE"}"#).unwrap(),
            None
        );
    }

    #[test]
    fn malformed_frames_are_decode_errors() {
        assert!(matches!(
            parse_feed_frame("not json"),
            Err(DeliveryError::Decode { .. })
        ));
        assert!(matches!(
            parse_feed_frame(r#"{"eventType":"INSERT"}"#),
            Err(DeliveryError::Decode { .. })
        ));
        assert!(matches!(
            parse_feed_frame(r#"{"eventType":"DELETE","old":{}}"#),
            Err(DeliveryError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn subscribe_streams_change_events() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let subscribe = ws.next().await.unwrap().unwrap();
            assert!(subscribe.to_text().unwrap().contains("subscribe"));

            for frame in [
                r#"{"type":"ack"}"#,
                r#"{"eventType":"INSERT","record":{"id":"s1","title":"first"}}"#,
                "garbage",
                r#"{"eventType":"DELETE","old":{"id":"s1"}}"#,
            ] {
                ws.send(Message::Text(frame.into())).await.unwrap();
            }
            ws.close(None).await.unwrap();
            while ws.next().await.is_some() {}
        });

        let http = HttpTransport::new(&ApiConfig::default()).unwrap();
        let source = WsFeedSource::new(http, format!("ws://{addr}/feed"), 50);
        let credential = Credential::new("tok", Utc::now());
        let events: Vec<_> = source
            .subscribe(&credential)
            .await
            .unwrap()
            .collect()
            .await;

        server.await.unwrap();
        let events: Vec<FeedEvent> = events.into_iter().filter_map(Result::ok).collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], FeedEvent::Insert(s) if s.id.as_str() == "s1"));
        assert_eq!(events[1], FeedEvent::Delete(SignalId::from("s1")));
    }

    #[tokio::test]
    async fn subscribe_to_closed_port_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let http = HttpTransport::new(&ApiConfig::default()).unwrap();
        let source = WsFeedSource::new(http, format!("ws://{addr}/feed"), 50);
        let result = source.subscribe(&Credential::new("tok", Utc::now())).await;
        assert!(matches!(result, Err(DeliveryError::Transport { .. })));
    }
}
