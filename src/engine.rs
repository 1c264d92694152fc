use std::{fmt, sync::Arc};

use parking_lot::Mutex;

use crate::{thread_pool::WorkerPool, Error, Result};

/// The kinds of backend a canvas may be bound to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// CPU rasterization into a pixel buffer.
    Software,
    /// Flattened draw commands for a deferred consumer such as a GPU renderer.
    CommandStream,
}

impl BackendKind {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        match self {
            BackendKind::Software => 0,
            BackendKind::CommandStream => 1,
        }
    }
}

/// The `strata` engine. Tracks which backend kinds have been
/// brought up and owns the worker pool shared by backends.
///
/// Each backend kind is reference counted: every successful
/// [`init`](Engine::init) must be balanced by a [`term`](Engine::term).
/// A [`Canvas`](crate::Canvas) can only be created for a kind
/// that is currently initialized.
///
/// The `Engine` can be cloned to create a new handle.
/// It internally uses an `Arc`.
#[derive(Clone, Default)]
pub struct Engine(Arc<Inner>);

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    counts: [u32; BackendKind::COUNT],
    pool: Option<Arc<WorkerPool>>,
}

impl State {
    fn is_idle(&self) -> bool {
        self.counts.iter().all(|&count| count == 0)
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes `kind`, incrementing its reference count.
    ///
    /// The first initialization of any kind creates the worker pool with
    /// `workers` threads. Later calls reuse the existing pool.
    /// Zero workers means backends do all their work on the calling thread.
    pub fn init(&self, kind: BackendKind, workers: usize) -> Result<()> {
        let mut state = self.0.state.lock();
        if state.is_idle() && state.pool.is_none() && workers > 0 {
            state.pool = Some(Arc::new(WorkerPool::new(workers)));
        }
        state.counts[kind.index()] += 1;
        log::debug!(
            "Initialized {:?} backend (reference count {})",
            kind,
            state.counts[kind.index()]
        );
        Ok(())
    }

    /// Terminates one initialization of `kind`.
    ///
    /// When no kind remains initialized, the worker pool is released.
    /// Backends still holding the pool keep it alive until they are dropped.
    pub fn term(&self, kind: BackendKind) -> Result<()> {
        let mut state = self.0.state.lock();
        let count = &mut state.counts[kind.index()];
        if *count == 0 {
            log::warn!("Terminate called on uninitialized {:?} backend", kind);
            return Err(Error::EngineNotInitialized(kind));
        }
        *count -= 1;
        log::debug!("Terminated {:?} backend (reference count {})", kind, *count);

        if state.is_idle() {
            state.pool = None;
        }
        Ok(())
    }

    /// Returns whether `kind` currently has a nonzero reference count.
    pub fn is_initialized(&self, kind: BackendKind) -> bool {
        self.0.state.lock().counts[kind.index()] > 0
    }

    /// Returns the reference count of `kind`.
    pub fn reference_count(&self, kind: BackendKind) -> u32 {
        self.0.state.lock().counts[kind.index()]
    }

    /// Returns the worker pool, if one was created.
    pub fn worker_pool(&self) -> Option<Arc<WorkerPool>> {
        self.0.state.lock().pool.clone()
    }

    pub(crate) fn ensure_initialized(&self, kind: BackendKind) -> Result<()> {
        if self.is_initialized(kind) {
            Ok(())
        } else {
            Err(Error::EngineNotInitialized(kind))
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.lock();
        f.debug_struct("Engine")
            .field("counts", &state.counts)
            .field("pool", &state.pool)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn reference_counting() {
        let engine = Engine::new();
        assert!(!engine.is_initialized(BackendKind::Software));

        engine.init(BackendKind::Software, 0).unwrap();
        engine.init(BackendKind::Software, 0).unwrap();
        assert_eq!(engine.reference_count(BackendKind::Software), 2);
        assert!(!engine.is_initialized(BackendKind::CommandStream));

        engine.term(BackendKind::Software).unwrap();
        assert!(engine.is_initialized(BackendKind::Software));
        engine.term(BackendKind::Software).unwrap();
        assert!(!engine.is_initialized(BackendKind::Software));

        let err = engine.term(BackendKind::Software).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
    }

    #[test]
    fn pool_lives_while_any_kind_is_initialized() {
        let engine = Engine::new();
        engine.init(BackendKind::Software, 2).unwrap();
        engine.init(BackendKind::CommandStream, 8).unwrap();

        let pool = engine.worker_pool().unwrap();
        assert_eq!(pool.num_threads(), 2);

        engine.term(BackendKind::Software).unwrap();
        assert!(engine.worker_pool().is_some());
        engine.term(BackendKind::CommandStream).unwrap();
        assert!(engine.worker_pool().is_none());
    }

    #[test]
    fn no_pool_without_workers() {
        let engine = Engine::new();
        engine.init(BackendKind::Software, 0).unwrap();
        assert!(engine.worker_pool().is_none());
    }

    #[test]
    fn clones_share_state() {
        let engine = Engine::new();
        let other = engine.clone();
        engine.init(BackendKind::CommandStream, 0).unwrap();
        assert!(other.is_initialized(BackendKind::CommandStream));
    }
}
