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

//! Receiver lifecycle state machine.
//!
//! ```text
//! Idle -> Starting -> Running -> Stopping -> Stopped
//!                        |                     ^
//!                        +---- fatal error ----+
//! ```
//!
//! A stopped receiver may be started again.

use super::TransportError;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default bound on draining in-flight work after cancellation.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

/// Receiver lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReceiverState {
    /// Never started
    Idle = 0,
    /// Acquiring listener or subscription
    Starting = 1,
    /// Dispatching messages
    Running = 2,
    /// Draining after cancellation
    Stopping = 3,
    /// Finished
    Stopped = 4,
}

impl ReceiverState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ReceiverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Atomic holder of a [`ReceiverState`].
#[derive(Debug)]
pub struct Lifecycle {
    transport: &'static str,
    state: AtomicU8,
}

impl Lifecycle {
    /// Creates an idle lifecycle.
    #[must_use]
    pub fn new(transport: &'static str) -> Self {
        Self {
            transport,
            state: AtomicU8::new(ReceiverState::Idle as u8),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ReceiverState {
        ReceiverState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves to `Starting`; the guard moves to `Stopped` when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::AlreadyStarted`] unless the receiver is
    /// idle or stopped.
    pub fn start(&self) -> Result<LifecycleGuard<'_>, TransportError> {
        let from_idle = self.transition(ReceiverState::Idle, ReceiverState::Starting);
        if !from_idle && !self.transition(ReceiverState::Stopped, ReceiverState::Starting) {
            return Err(TransportError::AlreadyStarted);
        }
        tracing::debug!(transport = self.transport, "receiver starting");
        Ok(LifecycleGuard { lifecycle: self })
    }

    fn transition(&self, from: ReceiverState, to: ReceiverState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn set(&self, state: ReceiverState) {
        self.state.store(state as u8, Ordering::Release);
        tracing::debug!(transport = self.transport, %state, "receiver state");
    }
}

/// Holds a started receiver. Dropping it stops the receiver on every
/// exit path.
#[derive(Debug)]
#[must_use = "the receiver stops when the guard is dropped"]
pub struct LifecycleGuard<'a> {
    lifecycle: &'a Lifecycle,
}

impl LifecycleGuard<'_> {
    /// Marks the receiver as running.
    pub fn running(&self) {
        self.lifecycle.set(ReceiverState::Running);
    }

    /// Marks the receiver as draining.
    pub fn stopping(&self) {
        self.lifecycle.set(ReceiverState::Stopping);
    }

    /// Awaits in-flight `work`. Once `cancel` fires the receiver is
    /// draining and `work` has `limit` left to finish.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ShutdownTimeout`] if `work` outlives
    /// `limit` after cancellation. The work is dropped.
    pub async fn drain<F: Future>(
        &self,
        work: F,
        cancel: &CancellationToken,
        limit: Duration,
    ) -> Result<F::Output, TransportError> {
        tokio::pin!(work);
        tokio::select! {
            output = &mut work => return Ok(output),
            () = cancel.cancelled() => {}
        }
        self.stopping();
        tracing::info!(transport = self.lifecycle.transport, "draining in-flight message");
        tokio::time::timeout(limit, work).await.map_err(|_| {
            tracing::warn!(
                transport = self.lifecycle.transport,
                timeout = ?limit,
                "graceful shutdown timed out"
            );
            TransportError::ShutdownTimeout { duration: limit }
        })
    }
}

impl Drop for LifecycleGuard<'_> {
    fn drop(&mut self) {
        self.lifecycle.set(ReceiverState::Stopped);
    }
}
