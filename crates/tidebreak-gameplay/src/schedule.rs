//! Cooperative task timers.
//!
//! A [`Scheduler`] holds delayed tasks for one owner. The owner advances it
//! from its frame tick and handles whatever comes due. Cancelling is
//! per-handle or all at once, which is how an owner stops its own pending
//! work when its state changes underneath it.

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct PendingTask<T> {
    handle: TaskHandle,
    remaining: f32,
    task: T,
}

/// Delayed tasks owned by a single entity.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    /// Pending tasks in scheduling order
    pending: Vec<PendingTask<T>>,
    /// Next handle value
    next_handle: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_handle: 1,
        }
    }

    /// Schedules `task` to come due after `delay` seconds.
    pub fn schedule(&mut self, delay: f32, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(PendingTask {
            handle,
            remaining: delay.max(0.0),
            task,
        });
        handle
    }

    /// Cancels a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    /// Cancels every pending task.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Advances all timers by `dt` and returns the tasks that came due,
    /// earliest deadline first. Ties keep scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        let mut due = Vec::new();
        let mut kept = Vec::with_capacity(self.pending.len());

        for mut pending in self.pending.drain(..) {
            pending.remaining -= dt;
            if pending.remaining <= 0.0 {
                due.push(pending);
            } else {
                kept.push(pending);
            }
        }
        self.pending = kept;

        // Stable sort keeps scheduling order on equal deadlines
        due.sort_by(|a, b| a.remaining.total_cmp(&b.remaining));
        due.into_iter().map(|p| p.task).collect()
    }

    /// Remaining time on a pending task.
    #[must_use]
    pub fn remaining(&self, handle: TaskHandle) -> Option<f32> {
        self.pending
            .iter()
            .find(|p| p.handle == handle)
            .map(|p| p.remaining)
    }

    /// Checks whether a task is still pending.
    #[must_use]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_task_fires_after_delay() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.5, "reload");

        assert!(scheduler.advance(0.3).is_empty());
        assert_eq!(scheduler.advance(0.3), vec!["reload"]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(0.05, 1);
        scheduler.schedule(0.1, 2);

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert_eq!(scheduler.advance(1.0), vec![2]);
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.1, 'a');
        scheduler.schedule(0.2, 'b');
        scheduler.cancel_all();
        assert!(scheduler.advance(10.0).is_empty());
    }

    #[test]
    fn test_due_tasks_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.9, "late");
        scheduler.schedule(0.1, "early");
        scheduler.schedule(0.1, "early-second");

        assert_eq!(
            scheduler.advance(1.0),
            vec!["early", "early-second", "late"]
        );
    }

    #[test]
    fn test_remaining_tracks_handle() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(1.0, ());
        scheduler.advance(0.25);
        let remaining = scheduler.remaining(handle).expect("pending");
        assert!((remaining - 0.75).abs() < 1e-6);
        scheduler.advance(1.0);
        assert!(!scheduler.is_pending(handle));
        assert_eq!(scheduler.remaining(handle), None);
    }

    proptest! {
        #[test]
        fn prop_every_task_fires_exactly_once(delays in prop::collection::vec(0.0f32..2.0, 1..20)) {
            let mut scheduler = Scheduler::new();
            for (i, d) in delays.iter().enumerate() {
                scheduler.schedule(*d, i);
            }
            let mut fired = Vec::new();
            for _ in 0..50 {
                fired.extend(scheduler.advance(0.05));
            }
            fired.sort_unstable();
            prop_assert_eq!(fired, (0..delays.len()).collect::<Vec<_>>());
        }
    }
}
