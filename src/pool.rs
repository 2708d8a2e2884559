//! Fixed-size worker pool backing parallel view iteration.
//!
//! One process-wide pool, sized from available hardware parallelism at
//! first use, shared by every view. Tasks go through an MPMC queue and are
//! picked up FIFO by whichever worker wakes; completion is signalled back
//! to the submitting caller through a counter it owns (see [`Completion`]).

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError},
    thread,
};

use crossbeam_queue::SegQueue;

pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// The process-wide pool.
pub(crate) fn global() -> &'static WorkerPool {
    static POOL: OnceLock<WorkerPool> = OnceLock::new();
    POOL.get_or_init(|| {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        WorkerPool::new(threads)
    })
}

struct Shared {
    queue: SegQueue<Task>,
    idle: Mutex<()>,
    available: Condvar,
}

pub(crate) struct WorkerPool {
    shared: Arc<Shared>,
    threads: usize,
}

impl WorkerPool {
    fn new(threads: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: SegQueue::new(),
            idle: Mutex::new(()),
            available: Condvar::new(),
        });

        for i in 0..threads {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(format!("sparsec-worker-{}", i))
                .spawn(move || worker(&shared))
                .expect("failed to spawn sparsec worker thread");
        }

        WorkerPool { shared, threads }
    }

    /// Number of worker threads, fixed at construction.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Enqueue a task; any idle worker picks it up. FIFO within the queue.
    pub fn submit(&self, task: Task) {
        self.shared.queue.push(task);
        // serialize with the emptiness check in `worker` so the push above
        // cannot slip between a failed pop and the wait
        drop(lock(&self.shared.idle));
        self.shared.available.notify_one();
    }
}

fn worker(shared: &Shared) {
    let mut guard = lock(&shared.idle);
    loop {
        match shared.queue.pop() {
            Some(task) => {
                drop(guard);
                if catch_unwind(AssertUnwindSafe(task)).is_err() {
                    log::error!("view iteration task panicked; the rest of its chunk was skipped");
                }
                guard = lock(&shared.idle);
            }
            None => {
                guard = shared
                    .available
                    .wait(guard)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Caller-side completion signalling for one parallel iteration: every
/// chunk task bumps the counter exactly once (on unwind too, via the
/// guard), and the caller blocks until the submitted count is reached.
///
/// Single caller per instance; the pool itself never touches this.
#[derive(Default)]
pub(crate) struct Completion {
    done: Mutex<usize>,
    finished: Condvar,
}

impl Completion {
    /// A guard that marks one chunk done when dropped.
    pub fn guard(&self) -> CompletionGuard<'_> {
        CompletionGuard { signal: self }
    }

    /// Blocks until `target` chunks have signalled.
    pub fn wait(&self, target: usize) {
        let mut done = lock(&self.done);
        while *done < target {
            done = self
                .finished
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

pub(crate) struct CompletionGuard<'a> {
    signal: &'a Completion,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        *lock(&self.signal.done) += 1;
        self.signal.finished.notify_one();
    }
}
