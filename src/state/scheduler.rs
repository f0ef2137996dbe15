use std::{future::Future, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::debug;

use crate::error::GameError;

/// Runs deferred phase effects on the Tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scheduler;

impl Scheduler {
    /// Run `effect` once `after` has elapsed. Scheduled effects cannot be cancelled.
    pub fn schedule<F>(&self, after: Duration, effect: F) -> PendingTransition
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(after = ?after, "scheduling delayed effect");
        let handle = tokio::spawn(async move {
            sleep(after).await;
            effect.await;
        });

        PendingTransition {
            handle: Some(handle),
        }
    }
}

/// Completion handle of a phase transition.
///
/// Immediate transitions hand out a handle that is already complete. Awaiting
/// the handle is optional: the effect runs whether or not anyone waits for it.
#[derive(Debug)]
#[must_use = "await `finished` to observe the delayed effect, or drop the handle"]
pub struct PendingTransition {
    handle: Option<JoinHandle<()>>,
}

impl PendingTransition {
    /// Handle of a transition whose effect already ran.
    pub fn ready() -> Self {
        Self { handle: None }
    }

    /// Whether the delayed effect still has to run.
    pub fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait until the delayed effect and its notification have completed.
    pub async fn finished(self) -> Result<(), GameError> {
        match self.handle {
            Some(handle) => handle
                .await
                .map_err(|err| GameError::InvalidState(format!("delayed effect failed: {err}"))),
            None => Ok(()),
        }
    }
}
