//! Caller-facing view of a running operation.

use tokio::sync::watch;

use super::registry::OperationToken;
use crate::error::BerthError;

/// How an operation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed,
    Failed(BerthError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed)
    }

    pub fn error(&self) -> Option<&BerthError> {
        match self {
            Outcome::Completed => None,
            Outcome::Failed(err) => Some(err),
        }
    }
}

/// Latest status record plus the outcome once there is one.
#[derive(Debug, Clone)]
pub struct OperationSnapshot<S> {
    pub status: S,
    pub outcome: Option<Outcome>,
}

impl<S> OperationSnapshot<S> {
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Receives notifications while an operation runs.
///
/// `on_progress` fires after every applied event with a full snapshot.
/// Exactly one of `on_complete` or `on_error` fires, once, at the end.
pub trait OperationObserver<S>: Send + 'static {
    fn on_progress(&mut self, _status: &S) {}

    fn on_complete(&mut self, _status: &S) {}

    fn on_error(&mut self, _error: &BerthError, _status: &S) {}
}

/// Observer that ignores everything. Use the handle instead.
impl<S> OperationObserver<S> for () {}

/// Handle returned when an operation starts.
///
/// The terminal snapshot is retained, so [`wait`](OperationHandle::wait)
/// resolves even when called after the operation already finished.
#[derive(Debug, Clone)]
pub struct OperationHandle<S> {
    token: OperationToken,
    state: watch::Receiver<OperationSnapshot<S>>,
}

impl<S: Clone> OperationHandle<S> {
    pub(crate) fn new(token: OperationToken, state: watch::Receiver<OperationSnapshot<S>>) -> Self {
        Self { token, state }
    }

    pub fn token(&self) -> OperationToken {
        self.token
    }

    /// Copy of the most recent status record.
    pub fn latest(&self) -> S {
        self.state.borrow().status.clone()
    }

    /// Terminal outcome, if the operation has finished.
    pub fn outcome(&self) -> Option<Outcome> {
        self.state.borrow().outcome.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.state.borrow().is_finished()
    }

    /// Independent receiver of every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<OperationSnapshot<S>> {
        self.state.clone()
    }

    /// Wait for the operation to end and return its final status.
    pub async fn wait(&self) -> Result<S, BerthError> {
        let mut state = self.state.clone();
        let snapshot = match state.wait_for(OperationSnapshot::is_finished).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => {
                return Err(BerthError::System {
                    message: format!("operation {} stopped without reporting an outcome", self.token),
                })
            }
        };

        match snapshot.outcome {
            Some(Outcome::Failed(err)) => Err(err),
            _ => Ok(snapshot.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;

    fn channel(status: u32) -> (watch::Sender<OperationSnapshot<u32>>, OperationHandle<u32>) {
        let (tx, rx) = watch::channel(OperationSnapshot {
            status,
            outcome: None,
        });
        (tx, OperationHandle::new(OperationToken::new(), rx))
    }

    #[tokio::test]
    async fn test_wait_after_completion_replays_outcome() {
        let (tx, handle) = channel(0);
        tx.send_replace(OperationSnapshot {
            status: 7,
            outcome: Some(Outcome::Completed),
        });
        drop(tx);

        assert!(handle.is_finished());
        assert_eq!(handle.wait().await.unwrap(), 7);
        // A second waiter sees the same result.
        assert_eq!(handle.wait().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_wait_returns_error() {
        let (tx, handle) = channel(0);
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait().await })
        };

        tx.send_replace(OperationSnapshot {
            status: 1,
            outcome: Some(Outcome::Failed(StreamError::Cancelled.into())),
        });

        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(handle.outcome().unwrap().error().unwrap(), &err);
    }

    #[tokio::test]
    async fn test_sender_dropped_without_outcome() {
        let (tx, handle) = channel(0);
        drop(tx);
        let err = handle.wait().await.unwrap_err();
        assert!(err.to_string().contains("without reporting an outcome"));
    }

    #[test]
    fn test_latest_tracks_progress() {
        let (tx, handle) = channel(0);
        tx.send_replace(OperationSnapshot {
            status: 42,
            outcome: None,
        });
        assert_eq!(handle.latest(), 42);
        assert!(handle.outcome().is_none());
    }

    #[test]
    fn test_unit_observer_is_noop() {
        let mut observer = ();
        OperationObserver::<u32>::on_progress(&mut observer, &1);
        OperationObserver::<u32>::on_error(&mut observer, &StreamError::Cancelled.into(), &1);
    }
}
