//! Ambient dispatch context for the compile step.
//!
//! The compiler backend may schedule callbacks (progress reporting, asset
//! refresh hooks) that must run on the host's synchronous dispatcher. The
//! compile step installs that dispatcher as the thread's ambient context
//! for its duration via [`DispatchGuard`]; the previous context is restored
//! exactly once when the guard drops, on every exit path including panics.

use std::cell::RefCell;
use std::sync::mpsc::{Receiver, Sender, channel};

type Job = Box<dyn FnOnce() + Send>;

/// Handle used to post work onto the host's synchronous dispatch queue.
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<Job>,
}

impl Dispatcher {
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        // A dropped pump means the host is shutting down; the job is moot.
        let _ = self.tx.send(Box::new(job));
    }
}

/// Host-side end of the dispatch queue. The host pumps it from the thread
/// the callbacks must run on.
pub struct DispatchPump {
    rx: Receiver<Job>,
}

impl DispatchPump {
    /// Runs every queued job and returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}

pub fn dispatch_channel() -> (Dispatcher, DispatchPump) {
    let (tx, rx) = channel();
    (Dispatcher { tx }, DispatchPump { rx })
}

thread_local! {
    static AMBIENT: RefCell<Option<Dispatcher>> = const { RefCell::new(None) };
}

/// The dispatcher currently installed on this thread, if any.
pub fn ambient_dispatcher() -> Option<Dispatcher> {
    AMBIENT.with(|cell| cell.borrow().clone())
}

/// Scoped installation of an ambient dispatcher.
pub struct DispatchGuard {
    previous: Option<Dispatcher>,
}

impl DispatchGuard {
    #[must_use = "the previous dispatcher is restored when the guard drops"]
    pub fn enter(dispatcher: Dispatcher) -> Self {
        let previous = AMBIENT.with(|cell| cell.borrow_mut().replace(dispatcher));
        Self { previous }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        AMBIENT.with(|cell| *cell.borrow_mut() = previous);
    }
}
