//! The single-threaded cooperative scheduler (spec.md §4.2).

use crate::Action;
use osio_core::Clock;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One entry in the dispatcher's queue: an action plus a monotonic sequence
/// number used to break ties between equal `when` values with a stable
/// (first-in-first-out) order. The spec only requires ties be broken
/// "arbitrarily but stably within a single enqueue operation"; FIFO is a
/// valid, simple instance of that.
struct Entry {
    when: f64,
    seq: u64,
    action: Box<dyn Action>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.when == other.when && self.seq == other.seq
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the smallest `when` (and,
        // among ties, the smallest `seq`) sorts to the top.
        other
            .when
            .total_cmp(&self.when)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// An ordered multiset of [`Action`]s keyed by `when` (spec.md §3,
/// "Dispatcher queue"). Created empty, seeded with initial actions, and
/// drained by [`Dispatcher::run`] until empty.
pub struct Dispatcher<C: Clock> {
    clock: C,
    queue: BinaryHeap<Entry>,
    next_seq: u64,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, queue: BinaryHeap::new(), next_seq: 0 }
    }

    /// Add action(s) to the queue. Matches spec.md's `dispatcher.add(*events)`.
    pub fn push(&mut self, action: Box<dyn Action>) {
        let when = action.when();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry { when, seq, action });
    }

    pub fn push_all(&mut self, actions: Vec<Box<dyn Action>>) {
        for a in actions {
            self.push(a);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Process actions until the queue is empty.
    ///
    /// 1. Pop the action with minimum `when`.
    /// 2. Sleep until that deadline (no wake-up for newly inserted earlier
    ///    events — see SPEC_FULL.md §9).
    /// 3. Execute it; enqueue every follow-on it returns.
    /// 4. Repeat until the queue is empty.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        while let Some(Entry { when, action, .. }) = self.queue.pop() {
            self.clock.sleep_until(when).await;
            let followups = action.execute().await?;
            self.push_all(followups);
        }
        Ok(())
    }
}
