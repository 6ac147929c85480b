// SPDX-License-Identifier: GPL-3.0-only

//! Deferred work returned by [`CaptureScreen::update`](super::CaptureScreen::update)
//!
//! A task is a future that resolves to the next [`Message`]. The caller runs
//! it however it likes (spawned on the runtime, or awaited in place) and
//! feeds the resulting message back into `update`.

use super::state::Message;
use futures::future::BoxFuture;
use std::future::Future;

#[must_use = "a task does nothing unless it is run"]
pub struct Task(Option<BoxFuture<'static, Message>>);

impl Task {
    /// Nothing to do
    pub fn none() -> Self {
        Task(None)
    }

    /// Run `future` and turn its output into a message
    pub fn perform<T, F, M>(future: F, map: M) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        M: FnOnce(T) -> Message + Send + 'static,
    {
        Task(Some(Box::pin(async move { map(future.await) })))
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn into_future(self) -> Option<BoxFuture<'static, Message>> {
        self.0
    }

    /// Await the task in place
    pub async fn run(self) -> Option<Message> {
        match self.0 {
            Some(future) => Some(future.await),
            None => None,
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_none() { "Task::none" } else { "Task::perform" })
    }
}
