//! Serialized executor.
//!
//! ```text
//! ┌──────────────┐    crossbeam     ┌──────────────────┐
//! │    Store     │ ──── channel ──► │  spool-executor  │ ──► Engine
//! │ (any thread) │                  │   (one thread)   │
//! └──────────────┘                  └──────────────────┘
//! ```
//!
//! Every operation becomes a job on an unbounded channel. One worker thread
//! owns the [`Engine`] and runs jobs in the order they were submitted, so no
//! two operations ever observe each other half-done.

use crate::dir::StoreDir;
use crate::engine::Engine;
use crate::error::CoreResult;
use crate::reply::{self, Reply};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Name of the worker thread.
const THREAD_NAME: &str = "spool-executor";

/// A unit of work run against the engine.
pub(crate) type Job = Box<dyn FnOnce(&mut Engine) + Send>;

enum Command {
    Run(Job),
    Shutdown,
}

/// Handle to the worker thread.
pub(crate) struct Executor {
    sender: Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl Executor {
    /// Spawns the worker. The directory lock, if any, is released only
    /// after the engine has shut down.
    pub(crate) fn start(engine: Engine, dir: Option<StoreDir>) -> CoreResult<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let worker = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(engine, receiver, dir))?;

        Ok(Self {
            sender,
            worker: Mutex::new(Some(worker)),
            stopped: AtomicBool::new(false),
        })
    }

    /// Queues a job. Returns `false` if the executor has stopped; the job is
    /// dropped in that case.
    pub(crate) fn submit(&self, job: Job) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return false;
        }
        self.sender.send(Command::Run(job)).is_ok()
    }

    /// Queues a job whose return value is delivered through a [`Reply`].
    pub(crate) fn call<T, F>(&self, f: F) -> Reply<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Engine) -> T + Send + 'static,
    {
        let (completer, reply) = reply::channel();
        // A rejected job drops its completer, which resolves the reply
        self.submit(Box::new(move |engine| completer.complete(Ok(f(engine)))));
        reply
    }

    /// Like [`Executor::call`] for jobs that can fail; the job's error
    /// becomes the reply's error.
    pub(crate) fn try_call<T, F>(&self, f: F) -> Reply<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Engine) -> CoreResult<T> + Send + 'static,
    {
        let (completer, reply) = reply::channel();
        self.submit(Box::new(move |engine| completer.complete(f(engine))));
        reply
    }

    /// Returns true once shutdown has been requested.
    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stops the worker after it drains the jobs already queued, and waits
    /// for it to exit.
    ///
    /// Called from the worker thread itself (a callback dropping the last
    /// store handle) it returns without waiting. Returns `false` if the
    /// worker panicked.
    pub(crate) fn shutdown(&self) -> bool {
        let Some(worker) = self.worker.lock().take() else {
            return true;
        };
        self.stopped.store(true, Ordering::Release);
        // Fails only if the worker is already gone
        let _ = self.sender.send(Command::Shutdown);

        if worker.thread().id() == thread::current().id() {
            debug!("executor shutdown requested from its own thread");
            return true;
        }
        match worker.join() {
            Ok(()) => true,
            Err(_) => {
                error!("executor thread panicked");
                false
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

fn run(mut engine: Engine, receiver: Receiver<Command>, dir: Option<StoreDir>) {
    debug!("executor started");
    for command in receiver.iter() {
        match command {
            Command::Run(job) => job(&mut engine),
            Command::Shutdown => break,
        }
    }

    engine.shutdown();

    // Anything queued after shutdown resolves as stopped
    let abandoned = receiver.try_iter().count();
    if abandoned > 0 {
        debug!(abandoned, "dropped jobs queued after shutdown");
    }
    drop(dir);
    debug!("executor stopped");
}
