//! The two execution contexts of an update check.
//!
//! Network and parsing work runs on the [`Background`] endpoint (a tokio
//! runtime). Anything that touches the UI is posted as a [`UiCommand`] to the
//! [`Foreground`] endpoint and executed by whichever thread owns the UI. Posts
//! are fire-and-forget.

use std::future::Future;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};
use log::debug;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::manifest::UpdateDescription;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    ShowResult {
        headline: String,
        updates: Vec<UpdateDescription>,
    },
    ShowError(String),
    ScheduleNextCheck(DateTime<Utc>),
}

#[derive(Debug, Clone)]
pub struct Foreground {
    sender: Sender<UiCommand>,
}

impl Foreground {
    pub fn post(&self, command: UiCommand) {
        if let Err(error) = self.sender.send(command) {
            debug!("UI queue closed, dropping {:?}", error.into_inner());
        }
    }
}

/// Create the foreground queue. The receiver belongs to the UI thread.
#[must_use]
pub fn foreground_queue() -> (Foreground, Receiver<UiCommand>) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (Foreground { sender }, receiver)
}

#[derive(Debug, Clone)]
pub struct Background {
    handle: Handle,
}

impl Background {
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// The runtime the caller is running on, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

#[cfg(test)]
mod tests {
    use super::{Background, UiCommand, foreground_queue};

    #[test]
    fn posts_arrive_in_order() {
        let (foreground, receiver) = foreground_queue();

        foreground.post(UiCommand::ShowError("first".to_string()));
        foreground.post(UiCommand::ShowError("second".to_string()));

        let received: Vec<UiCommand> = receiver.try_iter().collect();
        assert_eq!(
            received,
            vec![
                UiCommand::ShowError("first".to_string()),
                UiCommand::ShowError("second".to_string()),
            ]
        );
    }

    #[test]
    fn posting_after_receiver_dropped_is_harmless() {
        let (foreground, receiver) = foreground_queue();
        drop(receiver);

        foreground.post(UiCommand::ShowError("nobody listens".to_string()));
    }

    #[test]
    fn current_is_none_outside_a_runtime() {
        assert!(Background::current().is_none());
    }

    #[tokio::test]
    async fn spawn_runs_on_the_background_runtime() {
        let background = Background::current().expect("test runs inside a runtime");

        let value = background
            .spawn(async { 21 * 2 })
            .await
            .expect("task should complete");

        assert_eq!(value, 42);
    }
}
