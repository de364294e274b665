//! Recurring one-second tick sources

use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Identifies one scheduled tick stream. Ticks carrying an id the timer no
/// longer expects are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickId(pub u64);

pub trait Scheduler {
    /// Start delivering `id` once per second
    fn schedule(&mut self, id: TickId);

    /// Stop delivering `id`
    fn cancel(&mut self, id: TickId);
}

/// Spawns a tokio interval task per tick stream and forwards ids over a channel
pub struct TokioScheduler {
    runtime: Handle,
    tx: UnboundedSender<TickId>,
    tasks: HashMap<TickId, JoinHandle<()>>,
}

impl TokioScheduler {
    /// Scheduler plus the receiving end the UI loop drains
    pub fn new(runtime: Handle) -> (Self, UnboundedReceiver<TickId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            runtime,
            tx,
            tasks: HashMap::new(),
        };
        (scheduler, rx)
    }

    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, id: TickId) {
        let tx = self.tx.clone();
        let task = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(id).is_err() {
                    break;
                }
            }
        });

        if let Some(old) = self.tasks.insert(id, task) {
            old.abort();
        }
        debug!("Scheduled tick stream {:?}", id);
    }

    fn cancel(&mut self, id: TickId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
            debug!("Cancelled tick stream {:?}", id);
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tokio_scheduler_delivers_and_cancels() {
        let (mut scheduler, mut rx) = TokioScheduler::new(Handle::current());
        scheduler.schedule(TickId(7));
        assert_eq!(scheduler.active_tasks(), 1);

        let got = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("tick within timeout");
        assert_eq!(got, Some(TickId(7)));

        scheduler.cancel(TickId(7));
        assert_eq!(scheduler.active_tasks(), 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_is_noop() {
        let (mut scheduler, _rx) = TokioScheduler::new(Handle::current());
        scheduler.cancel(TickId(1));
        assert_eq!(scheduler.active_tasks(), 0);
    }
}
