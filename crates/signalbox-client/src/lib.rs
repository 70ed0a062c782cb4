// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network collaborators for the Signalbox pipeline.
//!
//! [`HttpTransport`] is the single-attempt Signal Sender and fetch-all
//! client. [`WsFeedSource`] provides the live feed: a paged HTTP baseline plus
//! a websocket change stream.

pub mod feed;
pub mod transport;

pub use feed::{WsFeedSource, parse_feed_frame};
pub use transport::HttpTransport;
