//! Reply scheduler
//!
//! Holds simulated counterpart replies until their deadline. A task's target
//! contact is fixed when it is scheduled; nothing cancels a scheduled task.

use crate::directory::ContactId;
use tokio::time::Instant;

/// A pending counterpart reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTask {
    /// Contact whose timeline receives the reply
    pub target: ContactId,
    pub fire_at: Instant,
    pub text: String,
    /// Scheduling order, breaks ties between equal deadlines
    pub seq: u64,
}

/// Deadline-ordered queue of reply tasks
#[derive(Debug, Default)]
pub struct ReplyScheduler {
    /// Sorted by `(fire_at, seq)`
    queue: Vec<ReplyTask>,
    next_seq: u64,
}

impl ReplyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `target`, returning the scheduled task
    pub fn schedule(
        &mut self,
        target: ContactId,
        fire_at: Instant,
        text: impl Into<String>,
    ) -> ReplyTask {
        let task = ReplyTask {
            target,
            fire_at,
            text: text.into(),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        // seq is monotonic, so inserting after every task due no later than
        // this one keeps equal deadlines in scheduling order
        let pos = self.queue.partition_point(|t| t.fire_at <= fire_at);
        self.queue.insert(pos, task.clone());
        task
    }

    /// Remove and return every task due at `now`, earliest first
    pub fn pop_due(&mut self, now: Instant) -> Vec<ReplyTask> {
        let due = self.queue.partition_point(|t| t.fire_at <= now);
        self.queue.drain(..due).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.first().map(|t| t.fire_at)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Replies still owed to one contact ("is typing" indicator)
    pub fn pending_for(&self, target: ContactId) -> usize {
        self.queue.iter().filter(|t| t.target == target).count()
    }
}
