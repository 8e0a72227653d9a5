// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Swap promises and their monitors.
//!
//! A [`SwapPromise`] is a callback attached to "the next frame": it is either
//! carried along with a commit (and later fulfilled by whoever swaps it) or
//! broken with a [`DidNotSwapReason`] when no frame results. Every queued
//! promise resolves exactly once because resolution consumes the box.
//!
//! A [`SwapPromiseMonitor`] observes commit requests on the main thread, for
//! example to attach latency information to the frame they will produce.

use std::collections::BTreeMap;
use std::fmt;

/// Why a promised frame was not swapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DidNotSwapReason {
    /// The swap itself failed.
    SwapFails,
    /// The commit was aborted.
    CommitFails,
    /// The main frame ran but had nothing to commit.
    CommitNoUpdate,
    /// The committed tree never activated.
    ActivationFails,
}

/// A callback tied to the swap of an upcoming frame.
pub trait SwapPromise {
    /// Resolves the promise as broken.
    fn did_not_swap(self: Box<Self>, reason: DidNotSwapReason);

    /// Resolves the promise as fulfilled. Default is a no-op.
    fn did_swap(self: Box<Self>) {}

    /// Identifier used to correlate the promise in traces.
    fn trace_id(&self) -> u64;
}

/// Observes commit requests made on the main thread.
pub trait SwapPromiseMonitor {
    /// Called whenever a main-frame stage is requested.
    fn on_set_needs_commit_on_main(&mut self);
}

/// Handle to a monitor registered with a [`SwapPromiseManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonitorId(u32);

/// Holds queued promises and registered monitors.
#[derive(Default)]
pub struct SwapPromiseManager {
    promises: Vec<Box<dyn SwapPromise>>,
    monitors: BTreeMap<MonitorId, Box<dyn SwapPromiseMonitor>>,
    next_monitor: u32,
}

impl fmt::Debug for SwapPromiseManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapPromiseManager")
            .field("promises", &self.promises.len())
            .field("monitors", &self.monitors.len())
            .finish_non_exhaustive()
    }
}

impl SwapPromiseManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a promise for the next commit.
    pub fn queue_swap_promise(&mut self, promise: Box<dyn SwapPromise>) {
        self.promises.push(promise);
    }

    /// Breaks every queued promise with `reason`, in queue order.
    pub fn break_swap_promises(&mut self, reason: DidNotSwapReason) {
        for promise in self.promises.drain(..) {
            promise.did_not_swap(reason);
        }
    }

    /// Takes every queued promise, leaving the queue empty.
    #[must_use]
    pub fn take_swap_promises(&mut self) -> Vec<Box<dyn SwapPromise>> {
        core::mem::take(&mut self.promises)
    }

    /// Number of queued promises.
    #[must_use]
    pub fn len(&self) -> usize {
        self.promises.len()
    }

    /// Whether no promises are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.promises.is_empty()
    }

    /// Registers a monitor.
    pub fn insert_monitor(&mut self, monitor: Box<dyn SwapPromiseMonitor>) -> MonitorId {
        let id = MonitorId(self.next_monitor);
        self.next_monitor += 1;
        self.monitors.insert(id, monitor);
        id
    }

    /// Unregisters a monitor, returning it if it was registered.
    pub fn remove_monitor(&mut self, id: MonitorId) -> Option<Box<dyn SwapPromiseMonitor>> {
        self.monitors.remove(&id)
    }

    /// Tells every monitor that a commit was requested.
    pub fn notify_monitors_of_set_needs_commit(&mut self) {
        for monitor in self.monitors.values_mut() {
            monitor.on_set_needs_commit_on_main();
        }
    }
}
