//! Deferred work queue.
//!
//! Confirmed deletions and copies are not applied inside the click that
//! confirmed them; they are queued here and run when the host flushes the
//! queue after the current input event has finished.

use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::trace;

thread_local! {
    static QUEUE: RefCell<VecDeque<Box<dyn FnOnce()>>> = const { RefCell::new(VecDeque::new()) };
}

pub fn queue_microtask(task: impl FnOnce() + 'static) {
    QUEUE.with(|queue| queue.borrow_mut().push_back(Box::new(task)));
}

/// Run queued tasks until the queue is empty, including tasks queued by
/// tasks. Returns how many ran.
pub fn flush_microtasks() -> usize {
    let mut ran = 0;
    loop {
        let next = QUEUE.with(|queue| queue.borrow_mut().pop_front());
        let Some(task) = next else { break };
        task();
        ran += 1;
    }
    if ran > 0 {
        trace!(ran, "flushed microtasks");
    }
    ran
}

pub fn pending_microtasks() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

pub fn reset_microtasks() {
    QUEUE.with(|queue| queue.borrow_mut().clear());
}
