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

use super::{Measure, is_tracing_enabled};
use std::time::Instant;
use tracing::Span;

/// Records the latency of one operation against a [`Measure`].
///
/// Created by [`report`]. Finishing with [`Reporter::ok`] or
/// [`Reporter::error`] records the elapsed time; dropping it unfinished
/// records nothing. When tracing is disabled the reporter is inert.
#[derive(Debug)]
#[must_use = "a reporter records nothing until ok() or error() is called"]
pub struct Reporter {
    measure: Measure,
    method: &'static str,
    start: Option<Instant>,
    span: Span,
}

/// Starts timing `method` under `measure`.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::observability::{self, Measure};
///
/// observability::enable_tracing(true);
/// let before = Measure::DataCodec.metrics().total_observations();
/// observability::report(Measure::DataCodec, "encode").ok();
/// assert!(Measure::DataCodec.metrics().total_observations() > before);
/// ```
pub fn report(measure: Measure, method: &'static str) -> Reporter {
    let enabled = is_tracing_enabled();
    let span = if enabled {
        tracing::debug_span!("cloudevents", measure = measure.name(), method)
    } else {
        Span::none()
    };
    Reporter {
        measure,
        method,
        start: enabled.then(Instant::now),
        span,
    }
}

impl Reporter {
    /// Returns the span covering the operation.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Records a successful completion.
    pub fn ok(self) {
        self.finish(true);
    }

    /// Records a failed completion.
    pub fn error(self) {
        self.finish(false);
    }

    /// Records the outcome of `result`.
    pub fn result<T, E>(self, result: &Result<T, E>) {
        self.finish(result.is_ok());
    }

    fn finish(self, ok: bool) {
        if let Some(start) = self.start {
            self.measure
                .metrics()
                .record(self.measure.name(), self.method, start.elapsed(), ok);
        }
    }
}
