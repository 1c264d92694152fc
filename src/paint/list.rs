use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use glam::Affine2;
use slotmap::{Key, SecondaryMap, SlotMap};

use crate::{
    backend::{Clip, RenderKey, RenderUpdateFlags},
    Backend, BackendError, Error, Paint, Result,
};

slotmap::new_key_type! {
    struct PaintKey;
}

/// Source of list identities. Zero is never issued.
static NEXT_LIST: AtomicU32 = AtomicU32::new(1);

/// A non-owning handle to a paint inside a [`Canvas`](crate::Canvas) or
/// [`Scene`](crate::Scene).
///
/// Ids remember which container issued them. Once the paint leaves that
/// container, or when the id is used with a different container, lookups
/// report [`Error::NotFound`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct PaintId {
    list: u32,
    key: PaintKey,
}

impl fmt::Debug for PaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaintId({}:{:?})", self.list, self.key.data())
    }
}

/// An ordered sequence of owned paints.
///
/// Index 0 of the order is the bottom of the paint stack and is drawn
/// first. The slot map owns the paints; `order` holds each key exactly once.
pub(crate) struct PaintList {
    tag: u32,
    paints: SlotMap<PaintKey, Paint>,
    order: Vec<PaintKey>,
}

impl Default for PaintList {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintList {
    pub fn new() -> Self {
        Self {
            tag: NEXT_LIST.fetch_add(1, Ordering::Relaxed),
            paints: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// The identity stamped into ids, and into backend state prepared on
    /// behalf of this list.
    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn reserve(&mut self, additional: usize) {
        self.paints.reserve(additional);
        self.order.reserve(additional);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Takes ownership of `paint`, placing it on top.
    pub fn push(&mut self, paint: Paint) -> Result<PaintId> {
        paint.validate()?;
        let key = self.paints.insert(paint);
        self.order.push(key);
        Ok(self.id(key))
    }

    fn id(&self, key: PaintKey) -> PaintId {
        PaintId {
            list: self.tag,
            key,
        }
    }

    /// Finds the z-order position of `id`.
    pub fn position(&self, id: PaintId) -> Option<usize> {
        if id.list != self.tag {
            return None;
        }
        self.order.iter().position(|&key| key == id.key)
    }

    pub fn contains(&self, id: PaintId) -> bool {
        id.list == self.tag && self.paints.contains_key(id.key)
    }

    pub fn get(&self, id: PaintId) -> Option<&Paint> {
        if id.list != self.tag {
            return None;
        }
        self.paints.get(id.key)
    }

    pub fn get_mut(&mut self, id: PaintId) -> Option<&mut Paint> {
        if id.list != self.tag {
            return None;
        }
        self.paints.get_mut(id.key)
    }

    /// Ids in z-order, bottom first.
    pub fn ids(&self) -> impl Iterator<Item = PaintId> + '_ {
        self.order.iter().map(move |&key| self.id(key))
    }

    /// Paints in z-order, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = &Paint> + '_ {
        self.order.iter().map(move |&key| &self.paints[key])
    }

    fn locate(&self, id: PaintId) -> Result<usize> {
        self.position(id).ok_or(Error::NotFound(id))
    }

    /// Moves `id` to the top.
    pub fn raise(&mut self, id: PaintId) -> Result<()> {
        let position = self.locate(id)?;
        let key = self.order.remove(position);
        self.order.push(key);
        Ok(())
    }

    /// Moves `id` to the bottom.
    pub fn lower(&mut self, id: PaintId) -> Result<()> {
        let position = self.locate(id)?;
        let key = self.order.remove(position);
        self.order.insert(0, key);
        Ok(())
    }

    /// Moves `id` directly above `reference`.
    pub fn move_above(&mut self, id: PaintId, reference: PaintId) -> Result<()> {
        self.move_relative(id, reference, 1)
    }

    /// Moves `id` directly below `reference`.
    pub fn move_below(&mut self, id: PaintId, reference: PaintId) -> Result<()> {
        self.move_relative(id, reference, 0)
    }

    fn move_relative(&mut self, id: PaintId, reference: PaintId, offset: usize) -> Result<()> {
        if id == reference {
            return Err(Error::SelfReference(id));
        }
        let position = self.locate(id)?;
        self.locate(reference)?;

        let key = self.order.remove(position);
        // Removal shifts everything above `position` down by one.
        let target = match self.locate(reference) {
            Ok(target) => target + offset,
            Err(e) => {
                self.order.insert(position, key);
                return Err(e);
            }
        };
        self.order.insert(target, key);
        Ok(())
    }

    /// Updates a single paint as a direct child of the root.
    pub fn update_one(&mut self, id: PaintId, backend: &mut dyn Backend) -> Result<()> {
        let owner = self.tag;
        let paint = self.get_mut(id).ok_or(Error::NotFound(id))?;
        let mut clips = Vec::new();
        paint.update(
            backend,
            owner,
            owner,
            &Affine2::IDENTITY,
            u8::MAX,
            &mut clips,
            RenderUpdateFlags::empty(),
        )
    }

    /// Updates every paint in z-order.
    ///
    /// A failing paint does not stop the others from updating;
    /// the first failure is returned.
    pub fn update_all(
        &mut self,
        backend: &mut dyn Backend,
        owner: u32,
        transform: &Affine2,
        opacity: u8,
        clips: &mut Vec<Clip>,
        flags: RenderUpdateFlags,
    ) -> Result<()> {
        let mut result = Ok(());
        for key in &self.order {
            let paint = &mut self.paints[*key];
            let updated = paint.update(backend, owner, self.tag, transform, opacity, clips, flags);
            if let Err(e) = updated {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Renders every paint bottom to top, stopping at the first failure.
    pub fn render_all(&self, backend: &mut dyn Backend, owner: u32) -> Result<(), BackendError> {
        self.iter().try_for_each(|paint| paint.render(backend, owner))
    }

    pub fn dispose_all(&mut self, backend: &mut dyn Backend, owner: u32) {
        for key in &self.order {
            self.paints[*key].dispose(backend, owner);
        }
    }

    /// Collects every key `owner` prepared for paints in this list,
    /// descending into scenes.
    pub fn collect_keys(&self, owner: u32, keys: &mut SecondaryMap<RenderKey, ()>) {
        for paint in self.iter() {
            paint.collect_keys(owner, keys);
        }
    }

    /// Removes every paint, returning them in z-order.
    ///
    /// Ids issued for them become stale.
    pub fn drain(&mut self) -> Vec<Paint> {
        let paints = &mut self.paints;
        let drained: Vec<Paint> = self
            .order
            .drain(..)
            .filter_map(|key| paints.remove(key))
            .collect();
        debug_assert!(self.paints.is_empty());
        drained
    }
}

impl fmt::Debug for PaintList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
