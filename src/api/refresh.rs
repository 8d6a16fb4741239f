//! Single-flight coordination for token refresh
//!
//! At most one refresh call is in flight at any time. The first request to
//! hit a 401 becomes the leader and performs the refresh; requests that fail
//! while it runs are queued and settled together with the leader's outcome.

use std::sync::Mutex;

use tokio::sync::oneshot;

use super::error::RefreshError;

pub type RefreshOutcome = Result<String, RefreshError>;

/// What a caller joining the refresh cycle is told to do.
pub enum RefreshTicket {
    /// Perform the refresh and `settle` the coordinator with its outcome
    Leader,
    /// Wait for the in-flight refresh; the channel yields its outcome
    Follower(oneshot::Receiver<RefreshOutcome>),
}

/// Owned by a client instance; the flag and queue are private so independent
/// clients never share refresh state.
#[derive(Default)]
pub struct TokenRefreshCoordinator {
    state: Mutex<RefreshState>,
}

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

impl TokenRefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the current refresh cycle. The first caller since the last
    /// settle becomes the leader and must call `settle` exactly once; later
    /// callers are queued in arrival order.
    ///
    /// The lock is only held across this synchronous bookkeeping, never
    /// across an await point.
    pub fn join(&self) -> RefreshTicket {
        let mut state = self.state.lock().unwrap();
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            RefreshTicket::Follower(rx)
        } else {
            state.refreshing = true;
            RefreshTicket::Leader
        }
    }

    /// Publish the refresh outcome, draining the queue in arrival order.
    /// Waiters whose request was cancelled are skipped silently.
    pub fn settle(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.state.lock().unwrap();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.state.lock().unwrap().waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn first_join_is_leader_rest_are_followers() {
        let coord = TokenRefreshCoordinator::new();

        assert!(matches!(coord.join(), RefreshTicket::Leader));
        assert!(matches!(coord.join(), RefreshTicket::Follower(_)));
        assert!(matches!(coord.join(), RefreshTicket::Follower(_)));
        assert_eq!(coord.queued(), 2);
    }

    #[tokio::test]
    async fn settle_resolves_all_followers_with_same_outcome() {
        let coord = TokenRefreshCoordinator::new();
        assert!(matches!(coord.join(), RefreshTicket::Leader));

        let mut receivers = Vec::new();
        for _ in 0..3 {
            match coord.join() {
                RefreshTicket::Follower(rx) => receivers.push(rx),
                RefreshTicket::Leader => panic!("second leader elected"),
            }
        }

        coord.settle(Ok("new-token".to_string()));

        for rx in receivers {
            assert_eq!(rx.await.unwrap().unwrap(), "new-token");
        }
    }

    #[tokio::test]
    async fn settle_rejects_all_followers_with_same_error() {
        let coord = TokenRefreshCoordinator::new();
        assert!(matches!(coord.join(), RefreshTicket::Leader));

        let rx1 = match coord.join() {
            RefreshTicket::Follower(rx) => rx,
            _ => panic!("expected follower"),
        };
        let rx2 = match coord.join() {
            RefreshTicket::Follower(rx) => rx,
            _ => panic!("expected follower"),
        };

        coord.settle(Err(RefreshError::Rejected));

        assert!(matches!(rx1.await.unwrap(), Err(RefreshError::Rejected)));
        assert!(matches!(rx2.await.unwrap(), Err(RefreshError::Rejected)));
    }

    #[tokio::test]
    async fn queue_drains_in_arrival_order() {
        let coord = Arc::new(TokenRefreshCoordinator::new());
        assert!(matches!(coord.join(), RefreshTicket::Leader));

        // Join synchronously so queue order is fixed, then record the order
        // the waiters are woken in.
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for i in 0..4 {
            let rx = match coord.join() {
                RefreshTicket::Follower(rx) => rx,
                _ => panic!("expected follower"),
            };
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                rx.await.unwrap().unwrap();
                order.lock().unwrap().push(i);
            }));
        }

        coord.settle(Ok("t".to_string()));
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn settle_resets_state_for_next_outage() {
        let coord = TokenRefreshCoordinator::new();

        assert!(matches!(coord.join(), RefreshTicket::Leader));
        coord.settle(Ok("t1".to_string()));

        // Queue was drained exactly once; a later 401 starts a fresh cycle.
        assert_eq!(coord.queued(), 0);
        assert!(matches!(coord.join(), RefreshTicket::Leader));
        coord.settle(Err(RefreshError::Rejected));
        assert!(matches!(coord.join(), RefreshTicket::Leader));
    }
}
