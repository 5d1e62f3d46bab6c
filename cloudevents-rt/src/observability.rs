//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Observability support.
//!
//! The runtime reports latency for client sends, transport sends, event
//! codec and data codec calls under the named [`Measure`]s:
//!
//! | Measure                     | Reported by                          |
//! |-----------------------------|--------------------------------------|
//! | `client/latency`            | [`Client::send`](crate::client::Client::send) and handler invocation |
//! | `transport/http/latency`    | HTTP transport send and receive      |
//! | `transport/kafka/latency`   | Kafka transport send and receive     |
//! | `transport/nats/latency`    | NATS transport send and receive      |
//! | `transport/pubsub/latency`  | Pub/Sub transport send and receive   |
//! | `codec/latency`             | event codec encode and decode        |
//! | `datacodec/latency`         | data codec encode and decode         |
//!
//! Each observation runs inside a `tracing` span and updates the atomic
//! [`LatencyMetrics`] of its measure. With the `observability` feature the
//! observation is also exported to the `metrics` facade, so any recorder the
//! application installs sees it:
//!
//! ```toml
//! [dependencies]
//! cloudevents-rt = { version = "0.1", features = ["observability"] }
//! metrics-exporter-prometheus = "0.15"
//! ```
//!
//! Spans are emitted at `debug` level under the `cloudevents` name. To see
//! them, install a subscriber:
//!
//! ```rust
//! use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(tracing_subscriber::EnvFilter::new("cloudevents_rt=debug"))
//!     .init();
//! ```
//!
//! Reporting is on by default and can be switched off process-wide:
//!
//! ```rust
//! use cloudevents_rt::observability;
//!
//! observability::enable_tracing(false);
//! assert!(!observability::is_tracing_enabled());
//! observability::enable_tracing(true);
//! ```

mod metrics;
mod reporter;

pub use self::metrics::{LatencyMetrics, Measure};
pub use self::reporter::{Reporter, report};

use std::sync::atomic::{AtomicBool, Ordering};

static TRACING_ENABLED: AtomicBool = AtomicBool::new(true);

/// Turns latency reporting and operation spans on or off for the process.
pub fn enable_tracing(enabled: bool) {
    TRACING_ENABLED.store(enabled, Ordering::Relaxed);
    tracing::debug!(enabled, "cloudevents tracing switched");
}

/// Returns `true` if latency reporting is on.
#[must_use]
pub fn is_tracing_enabled() -> bool {
    TRACING_ENABLED.load(Ordering::Relaxed)
}
