// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred task queue.
//!
//! Work that must happen *after* the current call returns (for example, the
//! draw/swap notifications that follow a commit) is posted here and drained
//! by the owner on its next turn. Tasks run in FIFO order. A task posted
//! while the queue is draining runs in the same drain, after everything that
//! was already queued.

use std::collections::VecDeque;
use std::fmt;

/// A deferred unit of work run against a `T`.
pub type Task<T> = Box<dyn FnOnce(&mut T)>;

/// FIFO queue of deferred tasks.
pub struct TaskQueue<T> {
    tasks: VecDeque<Task<T>>,
}

impl<T> TaskQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Appends a task.
    pub fn post(&mut self, task: impl FnOnce(&mut T) + 'static) {
        self.tasks.push_back(Box::new(task));
    }

    /// Returns the number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Removes the oldest task.
    pub fn pop(&mut self) -> Option<Task<T>> {
        self.tasks.pop_front()
    }

    /// Runs tasks against `target` until the queue is empty and returns how
    /// many ran.
    ///
    /// Only usable when the queue is not itself part of `target`; owners that
    /// embed their queue drain it with [`pop`](Self::pop) instead.
    pub fn run_all(&mut self, target: &mut T) -> usize {
        let mut ran = 0;
        while let Some(task) = self.tasks.pop_front() {
            task(target);
            ran += 1;
        }
        ran
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TaskQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_in_post_order() {
        let mut queue = TaskQueue::<Vec<u32>>::new();
        queue.post(|log| log.push(1));
        queue.post(|log| log.push(2));
        assert_eq!(queue.len(), 2);

        let mut log = Vec::new();
        assert_eq!(queue.run_all(&mut log), 2);
        assert_eq!(log, [1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn tasks_posted_while_draining_run_last() {
        struct Target {
            queue: TaskQueue<Self>,
            log: Vec<&'static str>,
        }

        let mut target = Target {
            queue: TaskQueue::new(),
            log: Vec::new(),
        };
        target.queue.post(|t| {
            t.log.push("first");
            t.queue.post(|t| t.log.push("nested"));
        });
        target.queue.post(|t| t.log.push("second"));

        while let Some(task) = target.queue.pop() {
            task(&mut target);
        }
        assert_eq!(target.log, ["first", "second", "nested"]);
    }
}
