//! FIFO ordering of network exchanges.
//!
//! Every ask and every session teardown takes a turn in the lane when it is
//! accepted, so they reach the session store in acceptance order no matter
//! how the runtime schedules the tasks that carry them.

use tokio::sync::oneshot;

#[derive(Debug, Default)]
pub(crate) struct ExchangeLane {
    tail: Option<oneshot::Receiver<()>>,
}

/// A place in the lane. Dropping it lets the next turn start.
#[derive(Debug)]
pub(crate) struct LaneTurn {
    previous: Option<oneshot::Receiver<()>>,
    _done: oneshot::Sender<()>,
}

impl ExchangeLane {
    pub(crate) fn join(&mut self) -> LaneTurn {
        let (done, next) = oneshot::channel();
        let previous = self.tail.replace(next);
        LaneTurn {
            previous,
            _done: done,
        }
    }
}

impl LaneTurn {
    /// Wait until every earlier turn has been dropped.
    pub(crate) async fn ready(&mut self) {
        if let Some(previous) = self.previous.take() {
            // The sender is never used; a closed channel is the signal.
            let _ = previous.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn turns_run_in_join_order() {
        let mut lane = ExchangeLane::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        let turns: Vec<LaneTurn> = (0..3).map(|_| lane.join()).collect();

        // Spawn in reverse so scheduling order disagrees with join order.
        let mut handles = Vec::new();
        for (i, mut turn) in turns.into_iter().enumerate().rev() {
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                turn.ready().await;
                tokio::task::yield_now().await;
                order.lock().unwrap().push(i);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn first_turn_is_ready_immediately() {
        let mut lane = ExchangeLane::default();
        let mut turn = lane.join();
        turn.ready().await;
    }
}
