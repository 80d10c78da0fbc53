//! One-shot reply handles for operations run on the executor.
//!
//! Every queued operation that produces a value hands its caller a
//! [`Reply`]. The executor holds the matching [`Completer`] and fills it in
//! once the operation has run. The caller may block on the reply, poll it,
//! or attach a callback.
//!
//! If the executor stops before an operation runs, the completer is dropped
//! unfilled and the reply resolves to [`CoreError::ExecutorStopped`].

use crate::error::{CoreError, CoreResult};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Callback<T> = Box<dyn FnOnce(CoreResult<T>) + Send>;

enum Slot<T> {
    /// Not run yet, optionally with a callback waiting for the result.
    Pending(Option<Callback<T>>),
    Ready(CoreResult<T>),
    /// Result handed out already.
    Taken,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn fulfil(&self, result: CoreResult<T>) {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Pending(Some(callback)) => {
                drop(slot);
                callback(result);
            }
            Slot::Pending(None) => {
                *slot = Slot::Ready(result);
                self.ready.notify_all();
            }
            done => *slot = done,
        }
    }
}

/// Creates a connected completer and reply.
pub(crate) fn channel<T>() -> (Completer<T>, Reply<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Pending(None)),
        ready: Condvar::new(),
    });
    (
        Completer {
            shared: Some(Arc::clone(&shared)),
        },
        Reply { shared },
    )
}

/// Executor-side half of a reply.
pub(crate) struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Completer<T> {
    /// Delivers the result, running the callback if one is attached.
    pub(crate) fn complete(mut self, result: CoreResult<T>) {
        if let Some(shared) = self.shared.take() {
            shared.fulfil(result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.fulfil(Err(CoreError::ExecutorStopped));
        }
    }
}

/// The eventual result of a store operation.
///
/// # Example
///
/// ```rust,ignore
/// let keys = store.list_keys().wait()?;
///
/// store.peek_oldest().then(|peeked| {
///     if let Ok(Some(entry)) = peeked {
///         println!("next: {}", entry.key);
///     }
/// });
/// ```
#[must_use = "a reply does nothing unless waited on or given a callback"]
pub struct Reply<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Reply<T> {
    /// Blocks until the operation has run and returns its result.
    ///
    /// # Errors
    ///
    /// `ExecutorStopped` if the store shut down before the operation ran,
    /// `InvalidOperation` if the result was already taken.
    pub fn wait(self) -> CoreResult<T> {
        let mut slot = self.shared.slot.lock();
        loop {
            match std::mem::replace(&mut *slot, Slot::Taken) {
                Slot::Ready(result) => return result,
                Slot::Taken => return Err(already_taken()),
                pending => {
                    *slot = pending;
                    self.shared.ready.wait(&mut slot);
                }
            }
        }
    }

    /// Blocks for at most `timeout`.
    ///
    /// On `Err(Timeout)` the operation is still queued and the reply stays
    /// usable, so the caller may wait again.
    pub fn wait_timeout(&self, timeout: Duration) -> CoreResult<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.shared.slot.lock();
        loop {
            match std::mem::replace(&mut *slot, Slot::Taken) {
                Slot::Ready(result) => return result,
                Slot::Taken => return Err(already_taken()),
                pending => {
                    *slot = pending;
                    if Instant::now() >= deadline {
                        return Err(CoreError::Timeout);
                    }
                    self.shared.ready.wait_until(&mut slot, deadline);
                }
            }
        }
    }

    /// Takes the result if the operation has already run.
    pub fn try_take(&self) -> Option<CoreResult<T>> {
        let mut slot = self.shared.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(result) => Some(result),
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Returns true once a result is available to take.
    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.slot.lock(), Slot::Ready(_))
    }

    /// Runs `callback` with the result.
    ///
    /// The callback normally runs on the executor thread. If the result is
    /// already available it runs right away on the calling thread. It never
    /// runs if the result was taken earlier.
    ///
    /// A callback running on the executor thread must not block on another
    /// reply from a store: the job that would complete it is queued behind
    /// the callback, so [`Reply::wait`] there never returns. Chain further
    /// work with `then`, or hand it to another thread.
    pub fn then<F>(self, callback: F)
    where
        F: FnOnce(CoreResult<T>) + Send + 'static,
    {
        let mut slot = self.shared.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(result) => {
                drop(slot);
                callback(result);
            }
            Slot::Pending(_) => *slot = Slot::Pending(Some(Box::new(callback))),
            Slot::Taken => {}
        }
    }
}

impl<T> std::fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("ready", &self.is_ready())
            .finish()
    }
}

fn already_taken() -> CoreError {
    CoreError::invalid_operation("reply result was already taken")
}
