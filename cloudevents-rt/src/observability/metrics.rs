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

//! Latency measures.
//!
//! Each [`Measure`] owns one [`LatencyMetrics`] instance created lazily on
//! first use and shared for the rest of the process.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A named latency measure.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::observability::Measure;
///
/// assert_eq!(Measure::Client.name(), "client/latency");
/// assert_eq!(Measure::HttpTransport.name(), "transport/http/latency");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    /// `client/latency`
    Client,
    /// `transport/http/latency`
    HttpTransport,
    /// `transport/kafka/latency`
    KafkaTransport,
    /// `transport/nats/latency`
    NatsTransport,
    /// `transport/pubsub/latency`
    PubSubTransport,
    /// `codec/latency`
    Codec,
    /// `datacodec/latency`
    DataCodec,
}

impl Measure {
    /// Every measure, in registry order.
    pub const ALL: [Measure; 7] = [
        Self::Client,
        Self::HttpTransport,
        Self::KafkaTransport,
        Self::NatsTransport,
        Self::PubSubTransport,
        Self::Codec,
        Self::DataCodec,
    ];

    /// Returns the measure name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Client => "client/latency",
            Self::HttpTransport => "transport/http/latency",
            Self::KafkaTransport => "transport/kafka/latency",
            Self::NatsTransport => "transport/nats/latency",
            Self::PubSubTransport => "transport/pubsub/latency",
            Self::Codec => "codec/latency",
            Self::DataCodec => "datacodec/latency",
        }
    }

    /// Returns the process-wide metrics for this measure.
    #[must_use]
    pub fn metrics(&self) -> &'static LatencyMetrics {
        static REGISTRY: OnceLock<[LatencyMetrics; 7]> = OnceLock::new();
        let registry = REGISTRY.get_or_init(Default::default);
        &registry[*self as usize]
    }
}

/// Latency metrics for one measure.
///
/// Counts observations and errors and accumulates elapsed microseconds. With
/// the `observability` feature each observation is also exported to the
/// `metrics` facade as a histogram named after the measure.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::observability::LatencyMetrics;
/// use std::time::Duration;
///
/// let metrics = LatencyMetrics::new();
/// metrics.record("client/latency", "send", Duration::from_millis(10), true);
/// metrics.record("client/latency", "send", Duration::from_millis(30), false);
/// assert_eq!(metrics.total_observations(), 2);
/// assert_eq!(metrics.total_errors(), 1);
/// assert_eq!(metrics.average_latency_us(), 20_000);
/// ```
#[derive(Debug, Default)]
pub struct LatencyMetrics {
    observations: AtomicU64,
    errors: AtomicU64,
    total_us: AtomicU64,
    max_us: AtomicU64,
}

impl LatencyMetrics {
    /// Creates zeroed metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation.
    #[allow(unused_variables)]
    pub fn record(&self, name: &'static str, method: &'static str, latency: Duration, ok: bool) {
        let us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.observations.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.total_us.fetch_add(us, Ordering::Relaxed);
        self.max_us.fetch_max(us, Ordering::Relaxed);

        #[cfg(feature = "observability")]
        metrics::histogram!(
            name,
            "method" => method,
            "result" => if ok { "ok" } else { "error" }
        )
        .record(us as f64);
    }

    /// Returns the number of observations.
    #[must_use]
    pub fn total_observations(&self) -> u64 {
        self.observations.load(Ordering::Relaxed)
    }

    /// Returns the number of failed observations.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns the largest latency seen, in microseconds.
    #[must_use]
    pub fn max_latency_us(&self) -> u64 {
        self.max_us.load(Ordering::Relaxed)
    }

    /// Returns the mean latency in microseconds, or zero with no observations.
    #[must_use]
    pub fn average_latency_us(&self) -> u64 {
        let count = self.total_observations();
        if count == 0 {
            return 0;
        }
        self.total_us.load(Ordering::Relaxed) / count
    }

    /// Returns the mean latency.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        Duration::from_micros(self.average_latency_us())
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.observations.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.total_us.store(0, Ordering::Relaxed);
        self.max_us.store(0, Ordering::Relaxed);
    }
}
