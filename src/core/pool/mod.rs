//! A small FIFO worker pool with explicit wait and shutdown semantics.
//!
//! Jobs are boxed closures executed in submission order by `size()`
//! long-lived workers. `wait()` blocks until the queue is drained and no
//! job is in flight; `stop_and_free()` discards queued jobs, lets running
//! jobs finish, and joins every worker.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::io;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug)]
pub enum PoolError {
    /// The pool has been told to stop; no further jobs are accepted.
    Stopped,
    /// A worker thread could not be spawned.
    Spawn(io::Error),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "worker pool is stopping"),
            Self::Spawn(err) => write!(f, "could not spawn worker thread: {}", err),
        }
    }
}

impl Error for PoolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Stopped => None,
            Self::Spawn(err) => Some(err),
        }
    }
}

struct PoolState {
    queue: VecDeque<Job>,
    num_working: usize,
    stop: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    // signalled when a job is queued or stop is requested
    todo: Condvar,
    // signalled when a job finishes or a worker exits
    done: Condvar,
}

pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
    size: usize,
}

fn worker_loop(id: usize, shared: &PoolShared) {
    log::trace!("worker {} started", id);
    loop {
        let job = {
            let mut state = shared.state.lock().unwrap();
            loop {
                if state.stop {
                    shared.done.notify_all();
                    log::trace!("worker {} stopping", id);
                    return;
                }
                if let Some(job) = state.queue.pop_front() {
                    state.num_working += 1;
                    break job;
                }
                state = shared.todo.wait(state).unwrap();
            }
        };

        job();

        let mut state = shared.state.lock().unwrap();
        state.num_working -= 1;
        shared.done.notify_all();
    }
}

impl ThreadPool {
    /// Starts a pool of `max(num_threads, 1)` workers.
    pub fn new(num_threads: usize) -> Result<Self, PoolError> {
        let size = num_threads.max(1);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                num_working: 0,
                stop: false,
            }),
            todo: Condvar::new(),
            done: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, &worker_shared));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    // unwind the partially-built pool before reporting
                    let mut pool = Self {
                        shared,
                        workers,
                        size,
                    };
                    pool.stop_and_free();
                    return Err(PoolError::Spawn(err));
                }
            }
        }

        Ok(Self {
            shared,
            workers,
            size,
        })
    }

    /// Enqueues a job at the tail of the FIFO queue.
    pub fn add(&self, job: impl FnOnce() + Send + 'static) -> Result<(), PoolError> {
        let mut state = self.shared.state.lock().unwrap();
        if state.stop {
            log::warn!("job submitted to a stopping pool, discarding");
            return Err(PoolError::Stopped);
        }
        state.queue.push_back(Box::new(job));
        self.shared.todo.notify_all();
        Ok(())
    }

    /// Blocks until the queue is empty and no job is running.
    pub fn wait(&self) {
        let mut state = self.shared.state.lock().unwrap();
        while state.num_working > 0 || !state.queue.is_empty() {
            state = self.shared.done.wait(state).unwrap();
        }
    }

    /// Worker count; never changes for the life of the pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Jobs queued but not yet started.
    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.shared.state.lock().unwrap().queue.len()
    }

    /// Sets the stop flag, discards queued jobs, lets in-flight jobs
    /// finish, and joins every worker. Idempotent; also run on drop.
    pub fn stop_and_free(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.stop = true;
            state.queue.clear();
            self.shared.todo.notify_all();
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop_and_free();
    }
}
