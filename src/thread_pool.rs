use std::{fmt, thread};

use flume::{Receiver, Sender};

trait FnBox: Send + 'static {
    fn call(self: Box<Self>);
}

impl<T> FnBox for T
where
    T: FnOnce() + Send + 'static,
{
    fn call(self: Box<Self>) {
        (*self)()
    }
}

/// A basic thread pool that backends use to run preparation work
/// off the calling thread.
///
/// Worker threads exit once the pool and every clone of its
/// task sender have been dropped.
pub struct WorkerPool {
    tasks: Sender<Box<dyn FnBox>>,
    num_threads: usize,
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> Self {
        let (sender, receiver) = flume::unbounded::<Box<dyn FnBox>>();

        let mut spawned = 0;
        for i in 0..num_threads {
            let receiver: Receiver<Box<dyn FnBox>> = receiver.clone();
            let result = thread::Builder::new()
                .name(format!("strata-worker-{}", i))
                .spawn(move || {
                    for task in receiver {
                        task.call();
                    }
                });
            match result {
                Ok(_) => spawned += 1,
                Err(e) => log::warn!("Failed to spawn worker thread: {}", e),
            }
        }

        Self {
            tasks: sender,
            num_threads: spawned,
        }
    }

    /// Number of worker threads actually running.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Runs `task` on a worker thread. If no worker is available,
    /// the task runs on the calling thread instead.
    pub fn spawn(&self, task: impl FnOnce() + Send + 'static) {
        if self.num_threads == 0 {
            task();
            return;
        }
        if let Err(flume::SendError(task)) = self.tasks.send(Box::new(task)) {
            task.call();
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads)
            .finish()
    }
}

/// The pending result of a task spawned on a [`WorkerPool`].
#[derive(Debug)]
#[cfg_attr(not(feature = "software"), allow(dead_code))]
pub(crate) struct Task<T> {
    receiver: Option<Receiver<T>>,
    value: Option<T>,
}

#[cfg_attr(not(feature = "software"), allow(dead_code))]
impl<T> Task<T>
where
    T: Send + 'static,
{
    /// Runs `f` on `pool`, or inline when there is no pool.
    pub fn spawn(pool: Option<&WorkerPool>, f: impl FnOnce() -> T + Send + 'static) -> Self {
        match pool {
            Some(pool) => {
                let (sender, receiver) = flume::bounded(1);
                pool.spawn(move || {
                    // The receiver may be gone if the task was discarded.
                    let _ = sender.send(f());
                });
                Self {
                    receiver: Some(receiver),
                    value: None,
                }
            }
            None => Self::ready(f()),
        }
    }

    pub fn ready(value: T) -> Self {
        Self {
            receiver: None,
            value: Some(value),
        }
    }

    /// Blocks until the task has completed, then returns its result.
    ///
    /// Returns `None` if the worker running the task panicked.
    pub fn get(&mut self) -> Option<&T> {
        if let Some(receiver) = self.receiver.take() {
            self.value = receiver.recv().ok();
        }
        self.value.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_complete_on_workers() {
        let pool = WorkerPool::new(2);
        assert_eq!(pool.num_threads(), 2);

        let mut tasks: Vec<_> = (0..16u32)
            .map(|i| Task::spawn(Some(&pool), move || i * i))
            .collect();
        for (i, task) in tasks.iter_mut().enumerate() {
            assert_eq!(task.get(), Some(&((i * i) as u32)));
        }
    }

    #[test]
    fn inline_without_pool() {
        let mut task = Task::spawn(None, || "done");
        assert_eq!(task.get(), Some(&"done"));
        // Repeated gets return the cached value.
        assert_eq!(task.get(), Some(&"done"));
    }

    #[test]
    fn empty_pool_runs_inline() {
        let pool = WorkerPool::new(0);
        let mut task = Task::spawn(Some(&pool), || 7);
        assert_eq!(task.get(), Some(&7));
    }

    #[test]
    fn panicking_task_has_no_result() {
        let pool = WorkerPool::new(1);
        let mut task = Task::spawn(Some(&pool), || -> u32 { panic!("task failed") });
        assert_eq!(task.get(), None);
        assert_eq!(task.get(), None);
    }
}
