//! Fixed set of worker threads fed through a bounded channel.
//!
//! Store services (selling, logistics) run as tasks on these workers. A task
//! that panics is logged and counted; the worker keeps going.

use bookshop_core::error::ConcurrencyError;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, error, info, trace};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use thiserror::Error;

/// Error when submitting a task
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerPoolError {
    /// The pool has been joined and accepts no more tasks
    #[error("worker pool is shutting down")]
    ShuttingDown,

    /// The task queue is full
    #[error("worker pool queue is full")]
    QueueFull,

    /// The operating system refused to start a worker thread
    #[error("failed to spawn worker thread: {0}")]
    SpawnFailed(String),
}

impl From<WorkerPoolError> for bookshop_core::Error {
    fn from(err: WorkerPoolError) -> Self {
        match err {
            WorkerPoolError::ShuttingDown => ConcurrencyError::WorkerPoolShutdown.into(),
            WorkerPoolError::QueueFull => ConcurrencyError::WorkerQueueFull.into(),
            WorkerPoolError::SpawnFailed(msg) => {
                bookshop_core::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, msg))
            }
        }
    }
}

/// Configuration for the worker pool
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads
    pub workers: usize,

    /// Maximum number of queued tasks
    pub queue_size: usize,

    /// Name prefix for worker threads
    pub thread_name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            queue_size: 1024,
            thread_name_prefix: "bookshop-worker".to_string(),
        }
    }
}

/// Statistics about the worker pool
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerPoolStats {
    /// Number of tasks accepted
    pub tasks_queued: usize,

    /// Number of tasks that ran to completion
    pub tasks_completed: usize,

    /// Number of tasks that panicked
    pub tasks_panicked: usize,

    /// Total task execution time (microseconds)
    pub total_execution_time_us: u64,

    /// Total time tasks spent queued (microseconds)
    pub total_queue_time_us: u64,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Task {
    job: Job,
    enqueued_at: Instant,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicUsize,
    completed: AtomicUsize,
    panicked: AtomicUsize,
    execution_us: AtomicU64,
    queue_us: AtomicU64,
}

/// A pool of worker threads
pub struct WorkerPool {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl WorkerPool {
    /// Start `workers` threads with default settings
    pub fn new(workers: usize) -> Result<Self, WorkerPoolError> {
        Self::with_config(WorkerPoolConfig {
            workers,
            ..Default::default()
        })
    }

    /// Start a pool with the given configuration
    pub fn with_config(config: WorkerPoolConfig) -> Result<Self, WorkerPoolError> {
        let (sender, receiver) = bounded(config.queue_size);
        let counters = Arc::new(Counters::default());

        info!(
            "Starting {} workers (queue size {})",
            config.workers, config.queue_size
        );

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let receiver: Receiver<Task> = receiver.clone();
            let counters = Arc::clone(&counters);
            let handle = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, id))
                .spawn(move || Self::worker_loop(id, receiver, counters))
                .map_err(|e| WorkerPoolError::SpawnFailed(e.to_string()))?;
            workers.push(handle);
        }

        Ok(Self {
            sender: Some(sender),
            workers,
            counters,
        })
    }

    fn worker_loop(id: usize, receiver: Receiver<Task>, counters: Arc<Counters>) {
        debug!("Worker {}: starting", id);

        // recv fails once every sender is gone and the queue is drained
        while let Ok(task) = receiver.recv() {
            let queue_time = task.enqueued_at.elapsed();
            counters
                .queue_us
                .fetch_add(queue_time.as_micros() as u64, Ordering::Relaxed);

            let start = Instant::now();
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task.job));
            let exec_time = start.elapsed();
            counters
                .execution_us
                .fetch_add(exec_time.as_micros() as u64, Ordering::Relaxed);

            match result {
                Ok(()) => {
                    trace!("Worker {}: task finished in {:?}", id, exec_time);
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "<unknown panic>".to_string());
                    error!("Worker {}: task panicked: {}", id, message);
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        debug!("Worker {}: shutting down", id);
    }

    /// Queue a task without blocking
    pub fn execute<F>(&self, f: F) -> Result<(), WorkerPoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(WorkerPoolError::ShuttingDown)?;
        match sender.try_send(Task {
            job: Box::new(f),
            enqueued_at: Instant::now(),
        }) {
            Ok(()) => {
                self.counters.queued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(WorkerPoolError::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(WorkerPoolError::ShuttingDown),
        }
    }

    /// Queue a task, waiting for room in the queue if necessary
    pub fn execute_blocking<F>(&self, f: F) -> Result<(), WorkerPoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(WorkerPoolError::ShuttingDown)?;
        sender
            .send(Task {
                job: Box::new(f),
                enqueued_at: Instant::now(),
            })
            .map_err(|_| WorkerPoolError::ShuttingDown)?;
        self.counters.queued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current statistics
    pub fn stats(&self) -> WorkerPoolStats {
        let c = &self.counters;
        WorkerPoolStats {
            tasks_queued: c.queued.load(Ordering::Relaxed),
            tasks_completed: c.completed.load(Ordering::Relaxed),
            tasks_panicked: c.panicked.load(Ordering::Relaxed),
            total_execution_time_us: c.execution_us.load(Ordering::Relaxed),
            total_queue_time_us: c.queue_us.load(Ordering::Relaxed),
        }
    }

    /// Number of worker threads
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting tasks, run everything already queued, and wait for the workers
    pub fn join(mut self) -> WorkerPoolStats {
        self.shutdown_and_wait();
        info!("Worker pool stopped");
        self.stats()
    }

    fn shutdown_and_wait(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("Worker thread panicked outside a task");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown_and_wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_worker_pool_runs_all_tasks_before_join_returns() {
        let pool = WorkerPool::new(4).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.execute_blocking(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        let stats = pool.join();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        assert_eq!(stats.tasks_queued, 50);
        assert_eq!(stats.tasks_completed, 50);
    }

    #[test]
    fn test_worker_pool_survives_panics() {
        let pool = WorkerPool::new(1).unwrap();
        let flag = Arc::new(AtomicBool::new(false));

        pool.execute(|| panic!("this task should panic")).unwrap();
        let flag_clone = Arc::clone(&flag);
        pool.execute(move || flag_clone.store(true, Ordering::SeqCst))
            .unwrap();

        let stats = pool.join();
        assert!(flag.load(Ordering::SeqCst));
        assert_eq!(stats.tasks_panicked, 1);
        assert_eq!(stats.tasks_completed, 1);
    }

    #[test]
    fn test_worker_pool_queue_full() {
        let pool = WorkerPool::with_config(WorkerPoolConfig {
            workers: 1,
            queue_size: 1,
            thread_name_prefix: "test".to_string(),
        })
        .unwrap();

        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock().unwrap();
        let started = Arc::new(AtomicBool::new(false));

        let gate_clone = Arc::clone(&gate);
        let started_clone = Arc::clone(&started);
        pool.execute(move || {
            started_clone.store(true, Ordering::SeqCst);
            let _guard = gate_clone.lock().unwrap();
        })
        .unwrap();

        // the worker is now parked on the gate, so the queue drains no further
        while !started.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }

        pool.execute(|| {}).unwrap();
        assert_eq!(pool.execute(|| {}), Err(WorkerPoolError::QueueFull));

        drop(held);
        let stats = pool.join();
        assert_eq!(stats.tasks_completed, 2);
    }

    #[test]
    fn test_worker_threads_are_named() {
        let pool = WorkerPool::with_config(WorkerPoolConfig {
            workers: 1,
            queue_size: 4,
            thread_name_prefix: "named".to_string(),
        })
        .unwrap();
        let name = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&name);
        pool.execute(move || {
            *slot.lock().unwrap() = thread::current().name().map(str::to_string);
        })
        .unwrap();
        pool.join();

        assert_eq!(name.lock().unwrap().as_deref(), Some("named-0"));
    }
}
