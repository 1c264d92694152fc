use glam::Affine2;
use slotmap::SecondaryMap;

use crate::{
    backend::{RenderKey, RenderUpdateFlags},
    paint::PaintList,
    Backend, Engine, Error, Paint, PaintId, Result,
};

/// A retained-mode canvas bound to one backend.
///
/// The canvas owns a sequence of top-level paints. Index 0 is the
/// bottom of the stack and is drawn first. Paints are re-derived
/// ("updated") for the backend when pushed, when reordered, and on
/// request; [`draw`](Canvas::draw) then renders the derived state.
pub struct Canvas<B: Backend> {
    engine: Engine,
    backend: B,
    paints: PaintList,
    /// Every backend key this canvas has prepared and not yet released.
    issued: SecondaryMap<RenderKey, ()>,
}

impl<B: Backend> Canvas<B> {
    /// Creates a canvas drawing through `backend`.
    ///
    /// Fails if `engine` has not been initialized for the backend's kind.
    pub fn new(engine: &Engine, backend: B) -> Result<Self> {
        engine.ensure_initialized(backend.kind())?;
        log::debug!("Created canvas for {:?} backend", backend.kind());
        Ok(Self {
            engine: engine.clone(),
            backend,
            paints: PaintList::new(),
            issued: SecondaryMap::new(),
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Takes ownership of `paint`, placing it on top, and prepares it.
    ///
    /// Returns [`Error::Corruption`] and leaves the canvas unchanged if the
    /// paint is invalid. A failure to prepare the new paint is logged and
    /// otherwise ignored; the paint is retried on the next update.
    pub fn push(&mut self, paint: impl Into<Paint>) -> Result<PaintId> {
        let id = self.paints.push(paint.into())?;
        if let Err(e) = self.paints.update_one(id, &mut self.backend) {
            log::warn!("Failed to prepare pushed paint {:?}: {}", id, e);
        }
        if let Some(paint) = self.paints.get(id) {
            paint.collect_keys(self.paints.tag(), &mut self.issued);
        }
        Ok(id)
    }

    /// Reserves capacity for at least `additional` more paints.
    pub fn reserve(&mut self, additional: usize) {
        self.paints.reserve(additional);
    }

    pub fn len(&self) -> usize {
        self.paints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paints.is_empty()
    }

    pub fn contains(&self, id: PaintId) -> bool {
        self.paints.contains(id)
    }

    /// Ids of the top-level paints in draw order, bottom first.
    pub fn ids(&self) -> impl Iterator<Item = PaintId> + '_ {
        self.paints.ids()
    }

    /// Top-level paints in draw order, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = &Paint> + '_ {
        self.paints.iter()
    }

    pub fn get(&self, id: PaintId) -> Option<&Paint> {
        self.paints.get(id)
    }

    /// Mutable access to a paint. Edits take effect after the
    /// next [`update`](Canvas::update).
    ///
    /// Content swapped or replaced through this reference is prepared from
    /// scratch on that update, and backend state left behind by the old
    /// content is released.
    pub fn get_mut(&mut self, id: PaintId) -> Option<&mut Paint> {
        self.paints.get_mut(id)
    }

    /// Clears the target, then releases and destroys every paint.
    ///
    /// Ids issued by this canvas become stale. Fails without a target,
    /// in which case the paints are kept.
    pub fn clear(&mut self) -> Result<()> {
        self.reset_target()?;
        let paints = self.release_all();
        log::debug!("Cleared canvas, destroying {} paints", paints.len());
        Ok(())
    }

    /// Clears the target and hands every paint back to the caller,
    /// bottom first.
    ///
    /// Backend state derived for the paints is released, so pushing them
    /// again prepares them from scratch. Ids issued by this canvas become
    /// stale. Fails without a target, in which case the paints are kept.
    pub fn detach(&mut self) -> Result<Vec<Paint>> {
        self.reset_target()?;
        let paints = self.release_all();
        log::debug!("Detached {} paints from canvas", paints.len());
        Ok(paints)
    }

    /// Re-derives backend state for one paint, or for all of them
    /// in draw order when `id` is `None`.
    pub fn update(&mut self, id: Option<PaintId>) -> Result<()> {
        self.ensure_ready()?;
        let result = match id {
            Some(id) => self.paints.update_one(id, &mut self.backend),
            None => self.update_all(),
        };
        self.reconcile();
        result
    }

    /// Renders every paint bottom to top within one frame.
    ///
    /// Rendering stops at the first failure. The target then holds a
    /// partially drawn frame and should be redrawn or discarded.
    pub fn draw(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.backend.begin_frame()?;
        if let Err(e) = self.paints.render_all(&mut self.backend, self.paints.tag()) {
            if let Err(end) = self.backend.end_frame() {
                log::warn!("Failed to end frame after render failure: {}", end);
            }
            return Err(e.into());
        }
        self.backend.end_frame()?;
        Ok(())
    }

    /// Blocks until the backend has finished all outstanding work.
    pub fn sync(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.backend.sync()?;
        Ok(())
    }

    /// Moves `id` to the top and re-derives it.
    pub fn raise(&mut self, id: PaintId) -> Result<()> {
        self.paints.raise(id)?;
        log::trace!("Raised {:?}", id);
        self.update(Some(id))
    }

    /// Moves `id` to the bottom and re-derives every paint.
    pub fn lower(&mut self, id: PaintId) -> Result<()> {
        self.paints.lower(id)?;
        log::trace!("Lowered {:?}", id);
        self.update(None)
    }

    /// Moves `id` directly above `reference` and re-derives every paint.
    pub fn move_above(&mut self, id: PaintId, reference: PaintId) -> Result<()> {
        self.paints.move_above(id, reference)?;
        log::trace!("Moved {:?} above {:?}", id, reference);
        self.update(None)
    }

    /// Moves `id` directly below `reference` and re-derives every paint.
    pub fn move_below(&mut self, id: PaintId, reference: PaintId) -> Result<()> {
        self.paints.move_below(id, reference)?;
        log::trace!("Moved {:?} below {:?}", id, reference);
        self.update(None)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.backend.is_ready() {
            Ok(())
        } else {
            Err(Error::NoTarget)
        }
    }

    fn reset_target(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.backend.reset_target()?;
        Ok(())
    }

    fn update_all(&mut self) -> Result<()> {
        let owner = self.paints.tag();
        self.paints.update_all(
            &mut self.backend,
            owner,
            &Affine2::IDENTITY,
            u8::MAX,
            &mut Vec::new(),
            RenderUpdateFlags::empty(),
        )
    }

    /// Releases issued keys that no paint in the tree holds any more.
    fn reconcile(&mut self) {
        let mut live = SecondaryMap::new();
        self.paints.collect_keys(self.paints.tag(), &mut live);
        let mut released = 0;
        for key in self.issued.keys() {
            if !live.contains_key(key) {
                self.backend.dispose(key);
                released += 1;
            }
        }
        if released > 0 {
            log::trace!("Released {} orphaned backend keys", released);
        }
        self.issued = live;
    }

    /// Releases all backend state and removes every paint.
    fn release_all(&mut self) -> Vec<Paint> {
        let owner = self.paints.tag();
        self.paints.dispose_all(&mut self.backend, owner);
        // Keys of content swapped out since the last update.
        for key in self.issued.keys() {
            self.backend.dispose(key);
        }
        self.issued.clear();
        self.paints.drain()
    }
}

impl<B: Backend> Drop for Canvas<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}
