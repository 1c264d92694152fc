//! Drawable nodes.
//!
//! A [`Paint`] is one node of a scene tree. It wraps one of three variants:
//! a vector [`Shape`], a [`Scene`] grouping child paints, or a raster
//! [`Image`]. All variants share a local transform, an opacity, and an
//! optional clip shape, which compose down the tree.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Affine2, Vec2};
use slotmap::SecondaryMap;

use crate::{
    backend::{Clip, RenderKey, RenderState, RenderUpdateFlags},
    color::multiply_alpha,
    Backend, BackendError, Error, Result,
};

mod image;
mod list;
mod scene;
mod shape;

pub use image::Image;
pub(crate) use list::PaintList;
pub use list::PaintId;
pub use scene::Scene;
pub use shape::Shape;

static NEXT_CONTENT: AtomicU64 = AtomicU64::new(1);

/// Issues a process-unique identity for a shape, scene or image.
pub(crate) fn next_content_id() -> u64 {
    NEXT_CONTENT.fetch_add(1, Ordering::Relaxed)
}

/// The variant of a [`Paint`].
#[derive(Debug)]
pub enum PaintKind {
    Shape(Shape),
    Scene(Scene),
    Image(Image),
}

impl PaintKind {
    fn content_id(&self) -> u64 {
        match self {
            PaintKind::Shape(shape) => shape.id(),
            PaintKind::Scene(scene) => scene.id(),
            PaintKind::Image(image) => image.id(),
        }
    }
}

/// Backend state derived for a paint, tagged with the canvas that
/// prepared it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Cache {
    owner: u32,
    key: RenderKey,
}

/// An owned drawable node.
///
/// Paints are moved into a [`Canvas`](crate::Canvas) or [`Scene`] with
/// `push`, which returns a [`PaintId`] for later lookups.
/// Property changes are recorded and only take effect on the
/// next update of the owning canvas.
#[derive(Debug)]
pub struct Paint {
    kind: PaintKind,
    transform: Affine2,
    opacity: u8,
    clip: Option<Shape>,
    flags: RenderUpdateFlags,
    cache: Option<Cache>,
    /// Identity of the content the cache was derived from.
    content: u64,
    /// Tag of the list that held the paint at its last update.
    parent: u32,
    /// Whether the last update found the paint fully transparent.
    hidden: bool,
}

impl Paint {
    fn new(kind: PaintKind) -> Self {
        Self {
            content: kind.content_id(),
            parent: 0,
            kind,
            transform: Affine2::IDENTITY,
            opacity: u8::MAX,
            clip: None,
            flags: RenderUpdateFlags::all(),
            cache: None,
            hidden: false,
        }
    }

    pub fn kind(&self) -> &PaintKind {
        &self.kind
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match &self.kind {
            PaintKind::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_shape_mut(&mut self) -> Option<&mut Shape> {
        match &mut self.kind {
            PaintKind::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_scene(&self) -> Option<&Scene> {
        match &self.kind {
            PaintKind::Scene(scene) => Some(scene),
            _ => None,
        }
    }

    pub fn as_scene_mut(&mut self) -> Option<&mut Scene> {
        match &mut self.kind {
            PaintKind::Scene(scene) => Some(scene),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match &self.kind {
            PaintKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    /// Sets the opacity, where 255 is fully opaque.
    ///
    /// Paints that were fully transparent at their last update are
    /// skipped when drawing.
    pub fn set_opacity(&mut self, opacity: u8) -> &mut Self {
        if opacity != self.opacity {
            self.opacity = opacity;
            self.flags |= RenderUpdateFlags::OPACITY;
        }
        self
    }

    /// The transform from this paint's space to its parent's.
    pub fn transform(&self) -> Affine2 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Affine2) -> &mut Self {
        self.transform = transform;
        self.flags |= RenderUpdateFlags::TRANSFORM;
        self
    }

    /// Translates the paint in its parent's space.
    pub fn translate(&mut self, translation: Vec2) -> &mut Self {
        self.set_transform(Affine2::from_translation(translation) * self.transform)
    }

    /// Scales the paint about its local origin.
    pub fn scale(&mut self, factor: f32) -> &mut Self {
        self.set_transform(self.transform * Affine2::from_scale(Vec2::splat(factor)))
    }

    /// Rotates the paint about its local origin by `degrees`, clockwise
    /// in a y-down coordinate system.
    pub fn rotate(&mut self, degrees: f32) -> &mut Self {
        self.set_transform(self.transform * Affine2::from_angle(degrees.to_radians()))
    }

    pub fn clip(&self) -> Option<&Shape> {
        self.clip.as_ref()
    }

    /// Restricts drawing of this paint (and its children) to the inside
    /// of `clip`, given in this paint's local space.
    pub fn set_clip(&mut self, clip: Option<Shape>) -> &mut Self {
        self.clip = clip;
        self.flags |= RenderUpdateFlags::CLIP;
        self
    }

    /// Whether the paint currently holds backend state from a previous update.
    ///
    /// For scenes, whether every descendant does.
    pub fn is_prepared(&self) -> bool {
        if self.content != self.kind.content_id() {
            return false;
        }
        match &self.kind {
            PaintKind::Scene(scene) => scene.iter().all(Paint::is_prepared),
            _ => self.cache.is_some(),
        }
    }

    /// Checks that the paint can be handed to a container.
    pub fn validate(&self) -> Result<()> {
        self.check()?;
        match &self.kind {
            PaintKind::Scene(scene) => scene.iter().try_for_each(Paint::validate),
            _ => Ok(()),
        }
    }

    /// Validates this paint, but not its children.
    fn check(&self) -> Result<()> {
        if !self
            .transform
            .to_cols_array()
            .iter()
            .all(|value| value.is_finite())
        {
            return Err(Error::Corruption("transform is not finite"));
        }
        match &self.kind {
            PaintKind::Image(image) => image.validate(),
            _ => Ok(()),
        }
    }

    /// Derives backend state for this paint and its descendants, on behalf
    /// of the canvas tagged `owner`.
    ///
    /// State prepared by another canvas is discarded. Content swapped in
    /// since the last update, or a paint moved under another parent, is
    /// re-derived in full.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn update(
        &mut self,
        backend: &mut dyn Backend,
        owner: u32,
        parent: u32,
        parent_transform: &Affine2,
        parent_opacity: u8,
        clips: &mut Vec<Clip>,
        parent_flags: RenderUpdateFlags,
    ) -> Result<()> {
        self.check()?;

        if self.cache.map_or(false, |cache| cache.owner != owner) {
            self.cache = None;
        }
        let mut flags = parent_flags | self.flags;
        if self.content != self.kind.content_id() || self.parent != parent {
            flags = RenderUpdateFlags::all();
        }
        let cache = self.cache.map(|cache| cache.key);
        let transform = *parent_transform * self.transform;
        let opacity = multiply_alpha(parent_opacity, self.opacity);

        let depth = clips.len();
        if let Some(clip) = &self.clip {
            clips.push(Clip {
                path: clip.path().transformed(&transform),
                fill_rule: clip.fill_rule(),
            });
        }

        let result = match &mut self.kind {
            PaintKind::Shape(shape) => {
                let state = RenderState {
                    transform,
                    opacity,
                    clips: &clips[..],
                };
                backend
                    .prepare_shape(cache, shape, &state, flags | shape.flags())
                    .map(|key| {
                        self.cache = Some(Cache { owner, key });
                        shape.clear_flags();
                    })
                    .map_err(Error::from)
            }
            PaintKind::Image(image) => {
                let state = RenderState {
                    transform,
                    opacity,
                    clips: &clips[..],
                };
                backend
                    .prepare_image(cache, image, &state, flags | image.flags())
                    .map(|key| {
                        self.cache = Some(Cache { owner, key });
                        image.clear_flags();
                    })
                    .map_err(Error::from)
            }
            PaintKind::Scene(scene) => {
                scene
                    .paints_mut()
                    .update_all(backend, owner, &transform, opacity, clips, flags)
            }
        };

        clips.truncate(depth);
        if result.is_ok() {
            self.flags = RenderUpdateFlags::empty();
            self.content = self.kind.content_id();
            self.parent = parent;
            self.hidden = self.opacity == 0;
        }
        result
    }

    /// Draws this paint and its descendants with the state prepared by
    /// the canvas tagged `owner`.
    pub(crate) fn render(
        &self,
        backend: &mut dyn Backend,
        owner: u32,
    ) -> Result<(), BackendError> {
        if self.hidden {
            return Ok(());
        }
        match &self.kind {
            PaintKind::Scene(scene) => scene.paints().render_all(backend, owner),
            PaintKind::Shape(_) | PaintKind::Image(_) => {
                let cache = self
                    .cache
                    .filter(|cache| cache.owner == owner)
                    .ok_or(BackendError::NotPrepared)?;
                backend.render(cache.key)
            }
        }
    }

    /// Releases backend state held by this paint and its descendants.
    ///
    /// State prepared by other canvases is forgotten without being released.
    /// The paint will be prepared from scratch on its next update.
    pub(crate) fn dispose(&mut self, backend: &mut dyn Backend, owner: u32) {
        if let Some(cache) = self.cache.take() {
            if cache.owner == owner {
                backend.dispose(cache.key);
            }
        }
        if let PaintKind::Scene(scene) = &mut self.kind {
            scene.paints_mut().dispose_all(backend, owner);
        }
        self.flags = RenderUpdateFlags::all();
    }

    /// Adds the keys `owner` prepared for this paint and its descendants.
    pub(crate) fn collect_keys(&self, owner: u32, keys: &mut SecondaryMap<RenderKey, ()>) {
        if let Some(cache) = self.cache.filter(|cache| cache.owner == owner) {
            keys.insert(cache.key, ());
        }
        if let PaintKind::Scene(scene) = &self.kind {
            scene.paints().collect_keys(owner, keys);
        }
    }
}

impl From<Shape> for Paint {
    fn from(shape: Shape) -> Self {
        Paint::new(PaintKind::Shape(shape))
    }
}

impl From<Scene> for Paint {
    fn from(scene: Scene) -> Self {
        Paint::new(PaintKind::Scene(scene))
    }
}

impl From<Image> for Paint {
    fn from(image: Image) -> Self {
        Paint::new(PaintKind::Image(image))
    }
}

#[cfg(test)]
mod tests {
    use glam::vec2;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn setters_record_flags() {
        let mut paint = Paint::from(Shape::new());
        paint.flags = RenderUpdateFlags::empty();

        paint.set_opacity(255);
        assert!(paint.flags.is_empty());

        paint.set_opacity(10).translate(vec2(1., 2.));
        assert_eq!(
            paint.flags,
            RenderUpdateFlags::OPACITY | RenderUpdateFlags::TRANSFORM
        );
    }

    #[test]
    fn transforms_compose() {
        let mut paint = Paint::from(Shape::new());
        paint.translate(vec2(10., 0.)).scale(2.);
        let point = paint.transform().transform_point2(vec2(1., 1.));
        assert_eq!(point, vec2(12., 2.));

        let mut paint = Paint::from(Shape::new());
        paint.rotate(90.);
        let point = paint.transform().transform_point2(vec2(1., 0.));
        assert!((point - vec2(0., 1.)).length() < 1e-5);
    }

    #[test]
    fn non_finite_transform_is_rejected() {
        let mut paint = Paint::from(Shape::new());
        paint.set_transform(Affine2::from_scale(vec2(f32::NAN, 1.)));
        assert_eq!(paint.validate().unwrap_err().kind(), ErrorKind::Corruption);
    }

    #[test]
    fn invalid_image_in_scene_is_rejected() {
        let mut scene = Scene::new();
        scene.push(Shape::new()).unwrap();
        let mut paint = Paint::from(scene);
        assert!(paint.validate().is_ok());

        // Scenes check their children on push, so mutate one afterwards.
        let image = Image::new(2, 2, vec![0; 4]);
        let id = paint.as_scene_mut().unwrap().push(image).unwrap();
        paint
            .as_scene_mut()
            .unwrap()
            .get_mut(id)
            .unwrap()
            .set_transform(Affine2::from_translation(vec2(f32::INFINITY, 0.)));
        assert!(paint.validate().is_err());
    }

    #[test]
    fn variant_accessors() {
        let mut paint = Paint::from(Scene::new());
        assert!(paint.as_scene().is_some());
        assert!(paint.as_shape().is_none());
        assert!(paint.as_shape_mut().is_none());
        assert!(paint.as_image().is_none());
        // An empty scene has nothing left to prepare.
        assert!(paint.is_prepared());
    }
}
