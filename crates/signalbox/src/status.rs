// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `signalbox status` - connectivity, session, and queue summary.

use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use serde::Serialize;
use signalbox_core::Identity;

use crate::app::App;

/// JSON shape of the status command.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub api_base_url: String,
    pub online: bool,
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_expires_at: Option<DateTime<Utc>>,
    pub queue_depth: usize,
    pub live_feed: bool,
}

impl StatusReport {
    pub async fn collect(app: &App, online: bool) -> Self {
        let signed_in = app.session.load().await.is_some();
        Self {
            api_base_url: app.config.api.base_url.clone(),
            online,
            signed_in,
            identity: app.session.identity().await,
            session_expires_at: if signed_in {
                app.session.expires_at().await
            } else {
                None
            },
            queue_depth: app.queue.len().await,
            live_feed: app.config.api.feed_url.is_some(),
        }
    }
}

pub async fn run_status(app: &App, json: bool, plain: bool) {
    let online = app.refresh_connectivity().await;
    let report = StatusReport::collect(app, online).await;

    if json {
        println!("{}", crate::render::to_json(&report));
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_report(&report, use_color);
    }
}

fn print_report(report: &StatusReport, use_color: bool) {
    println!();
    println!("  signalbox status");
    println!("  {}", "-".repeat(35));

    let (network, session) = if use_color {
        use colored::Colorize;
        (
            if report.online {
                format!("{} online", "✓".green())
            } else {
                format!("{} offline", "✗".red())
            },
            if report.signed_in {
                format!("{} signed in", "✓".green())
            } else {
                format!("{} signed out", "✗".yellow())
            },
        )
    } else {
        (
            if report.online { "[OK] online" } else { "[FAIL] offline" }.to_string(),
            if report.signed_in {
                "[OK] signed in"
            } else {
                "[WARN] signed out"
            }
            .to_string(),
        )
    };

    println!("    API:      {} ({})", report.api_base_url, network);
    println!("    Session:  {session}");
    if let Some(identity) = &report.identity {
        let who = identity
            .email
            .as_deref()
            .or(identity.name.as_deref())
            .unwrap_or(identity.id.as_str());
        println!("    User:     {who}");
    }
    if let Some(expires) = report.session_expires_at {
        println!("    Expires:  {}", expires.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("    Queued:   {}", report.queue_depth);
    println!(
        "    Feed:     {}",
        if report.live_feed { "configured" } else { "disabled" }
    );
    println!();
    if !report.signed_in {
        println!("  Sign in with: signalbox login --user-id <ID>");
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_config;

    #[tokio::test]
    async fn report_reflects_session_and_queue() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(test_config(&dir)).await.unwrap();

        let report = StatusReport::collect(&app, false).await;
        assert!(!report.signed_in);
        assert!(report.identity.is_none());
        assert!(report.session_expires_at.is_none());
        assert_eq!(report.queue_depth, 0);

        let identity = Identity {
            id: "u-1".into(),
            name: None,
            email: None,
        };
        app.login("tok", &identity).await.unwrap();
        let report = StatusReport::collect(&app, true).await;
        assert!(report.signed_in);
        assert!(report.session_expires_at.is_some());
        assert_eq!(report.identity, Some(identity));
    }

    #[test]
    fn report_serializes_without_empty_fields() {
        let report = StatusReport {
            api_base_url: "http://localhost:3000".into(),
            online: false,
            signed_in: false,
            identity: None,
            session_expires_at: None,
            queue_depth: 2,
            live_feed: false,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"queue_depth\":2"));
        assert!(!json.contains("identity"));
        assert!(!json.contains("session_expires_at"));
    }
}
