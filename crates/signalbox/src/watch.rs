// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `signalbox watch` - long-running mirror, probe, and reconnect drain.
//!
//! Prints the merged view (live mirror plus locally pending captures) every
//! time either side changes, until the cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use signalbox_sync::{merge_signals, LiveMirror};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::App;
use crate::render::print_signals;

pub async fn run_watch(app: &App, cancel: CancellationToken) {
    // Pending captures are the local side of the merged view. The reconciler
    // drops each one again once its entry is resolved.
    for entry in app.queue.read_all().await {
        app.local.upsert(entry.into_signal());
    }

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    let http = app.http.clone();
    tasks.push(app.connectivity.spawn_probe(
        Duration::from_secs(app.config.sync.probe_interval_secs),
        move || {
            let http = http.clone();
            async move { http.probe_online().await }
        },
        cancel.clone(),
    ));

    {
        let reconciler = Arc::clone(&app.reconciler);
        let session = Arc::clone(&app.session);
        let online = app.connectivity.subscribe();
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            reconciler.run_on_reconnect(session, online, cancel).await;
        }));
    }

    let mirror = Arc::new(LiveMirror::new());
    match app.feed() {
        Some(feed) => {
            let mirror = Arc::clone(&mirror);
            let session = Arc::clone(&app.session);
            let retry = Duration::from_secs(app.config.sync.baseline_retry_secs);
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                mirror.run(feed, session, retry, cancel).await;
            }));
        }
        None => warn!("api.feed_url is not set, live feed disabled"),
    }

    info!("watching signals, press Ctrl+C to stop");
    let mut live = mirror.subscribe();
    let mut local = app.local.subscribe();
    print_signals(&merge_signals(&mirror.snapshot(), &app.local.snapshot()));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = live.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = local.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        let live_now = live.borrow_and_update().clone();
        let local_now = local.borrow_and_update().clone();
        println!();
        print_signals(&merge_signals(&live_now, &local_now));
    }

    cancel.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "background task ended abnormally");
        }
    }
}
