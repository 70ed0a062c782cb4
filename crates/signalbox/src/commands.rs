// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands.

use signalbox_capture::{CaptureOutcome, Draft};
use signalbox_core::{FetchQuery, Identity, SignalError, SignalTransport};
use tracing::{info, warn};

use crate::app::App;
use crate::render::{print_signals, to_json};

pub async fn login(
    app: &App,
    token: Option<String>,
    identity: Identity,
) -> Result<(), SignalError> {
    let token = match token {
        Some(token) => token,
        None => {
            eprint!("Bearer token: ");
            rpassword::read_password()
                .map_err(|e| SignalError::Internal(format!("failed to read token: {e}")))?
        }
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(SignalError::Validation("token must not be empty".into()));
    }

    app.login(token, &identity).await?;
    if let Some(expires) = app.session.expires_at().await {
        println!("Signed in. Session valid until {}.", expires.format("%H:%M UTC"));
    }

    // A fresh credential is the other trigger for pending deliveries.
    if app.refresh_connectivity().await
        && let Some(report) = app.reconciler.drain_with_session(&app.session).await
        && report.attempted > 0
    {
        println!(
            "Delivered {} queued signal(s), {} still pending.",
            report.delivered, report.remaining
        );
    }
    Ok(())
}

pub async fn logout(app: &App) -> Result<(), SignalError> {
    app.logout().await?;
    let pending = app.queue.len().await;
    println!("Signed out.");
    if pending > 0 {
        println!("{pending} signal(s) stay queued until the next sign-in.");
    }
    Ok(())
}

pub async fn capture(app: &App, draft: Draft) -> Result<(), SignalError> {
    app.refresh_connectivity().await;

    let machine = app.capture_machine();
    machine.begin();
    machine.set_title(draft.title);
    machine.set_body(draft.body);
    machine.set_priority(draft.priority);
    for restaurant in draft.restaurant_ids {
        machine.toggle_restaurant(restaurant);
    }

    let outcome = machine.submit().await;
    machine.finish();

    let outcome = outcome?;
    match &outcome {
        CaptureOutcome::Delivered { id } => println!("Delivered {id}."),
        CaptureOutcome::Queued {
            id,
            reason,
            persisted,
        } => {
            let label: &'static str = (*reason).into();
            println!("Queued {id} ({label}).");
            if !persisted {
                warn!(signal_id = %id, "queued signal was not persisted");
                println!("Warning: local storage failed, this signal will not survive a restart.");
            }
        }
    }
    if outcome.needs_reauth() {
        println!("Sign in again with `signalbox login` so the queue can drain.");
    }
    Ok(())
}

pub async fn show_queue(app: &App, json: bool) {
    let entries = app.queue.read_all().await;
    if json {
        println!("{}", to_json(&entries));
        return;
    }
    println!("{} queued signal(s)", entries.len());
    for entry in &entries {
        println!(
            "  {}  {}  ({})",
            entry.queued_at.format("%Y-%m-%d %H:%M:%S"),
            entry.signal.title,
            entry.signal.id
        );
    }
}

pub async fn drain(app: &App) -> Result<(), SignalError> {
    if !app.refresh_connectivity().await {
        println!("Offline, {} signal(s) stay queued.", app.queue.len().await);
        return Ok(());
    }
    match app.reconciler.drain_with_session(&app.session).await {
        Some(report) => {
            info!(?report, "manual drain finished");
            println!(
                "Attempted {}, delivered {}, retained {}, rejected {}. {} remaining.",
                report.attempted,
                report.delivered,
                report.retained,
                report.rejected,
                report.remaining
            );
            Ok(())
        }
        None => Err(SignalError::Validation(
            "no valid session, sign in with `signalbox login`".into(),
        )),
    }
}

pub async fn list(app: &App, query: FetchQuery, all: bool, json: bool) -> Result<(), SignalError> {
    let credential = app.session.load().await.ok_or_else(|| {
        SignalError::Validation("no valid session, sign in with `signalbox login`".into())
    })?;

    let signals = if all {
        app.http
            .fetch_all_pages(&query, app.config.sync.page_size, &credential)
            .await?
    } else {
        app.http.fetch(&query, &credential).await?
    };

    if json {
        println!("{}", to_json(&signals));
    } else {
        print_signals(&signals);
    }
    Ok(())
}
