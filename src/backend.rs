use glam::Affine2;

use crate::{BackendError, BackendKind, FillRule, Image, Path, Shape};

pub mod command;
#[cfg(feature = "software")]
pub mod software;

slotmap::new_key_type! {
    /// Handle to the state a backend derived for one paint.
    pub struct RenderKey;
}

bitflags::bitflags! {
    /// Which properties of a paint changed since it was last prepared.
    ///
    /// Backends may use these to skip recomputing cached state. An empty
    /// set means nothing changed, not that nothing needs to be prepared:
    /// a paint without a cache must always be prepared in full.
    pub struct RenderUpdateFlags: u8 {
        const PATH      = 0b0000_0001;
        const COLOR     = 0b0000_0010;
        const STROKE    = 0b0000_0100;
        const TRANSFORM = 0b0000_1000;
        const OPACITY   = 0b0001_0000;
        const IMAGE     = 0b0010_0000;
        const CLIP      = 0b0100_0000;
    }
}

impl RenderUpdateFlags {
    /// Flags that invalidate derived geometry, as opposed to paint parameters.
    pub const GEOMETRY: RenderUpdateFlags = RenderUpdateFlags {
        bits: Self::PATH.bits | Self::TRANSFORM.bits | Self::CLIP.bits | Self::STROKE.bits,
    };
}

/// A clip region in target space.
///
/// Nested clips intersect: a paint is visible only inside every clip
/// in its [`RenderState`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub path: Path,
    pub fill_rule: FillRule,
}

/// Inherited state a paint is prepared with.
#[derive(Debug, Clone, Copy)]
pub struct RenderState<'a> {
    /// Product of the paint's transform with those of its ancestors.
    pub transform: Affine2,
    /// Product of the paint's opacity with those of its ancestors.
    pub opacity: u8,
    /// Clips applied by the paint and its ancestors, outermost first.
    pub clips: &'a [Clip],
}

/// A rendering backend bound to a [`Canvas`](crate::Canvas).
///
/// The canvas sequences the frame calls; paints call
/// [`prepare_shape`](Backend::prepare_shape), [`prepare_image`](Backend::prepare_image),
/// [`render`](Backend::render), and [`dispose`](Backend::dispose) for themselves.
/// Every call blocks until it has either succeeded or failed.
///
/// A frame looks like:
///
/// ```text
/// begin_frame
///     render(key) for every paint, bottom to top
/// end_frame
/// ```
pub trait Backend: 'static {
    fn kind(&self) -> BackendKind;

    /// Whether a render target is configured.
    fn is_ready(&self) -> bool;

    /// Clears the render target.
    fn reset_target(&mut self) -> Result<(), BackendError>;

    fn begin_frame(&mut self) -> Result<(), BackendError>;

    fn end_frame(&mut self) -> Result<(), BackendError>;

    /// Blocks until all outstanding work has finished.
    fn sync(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Derives render state for a shape.
    ///
    /// `cache` is the key returned by the previous call for the same paint,
    /// if any. Returns the key under which the derived state is stored;
    /// this may be `cache` itself.
    fn prepare_shape(
        &mut self,
        cache: Option<RenderKey>,
        shape: &Shape,
        state: &RenderState<'_>,
        flags: RenderUpdateFlags,
    ) -> Result<RenderKey, BackendError>;

    /// Derives render state for an image. See [`prepare_shape`](Backend::prepare_shape).
    fn prepare_image(
        &mut self,
        cache: Option<RenderKey>,
        image: &Image,
        state: &RenderState<'_>,
        flags: RenderUpdateFlags,
    ) -> Result<RenderKey, BackendError>;

    /// Draws previously prepared state to the target.
    fn render(&mut self, key: RenderKey) -> Result<(), BackendError>;

    /// Releases previously prepared state. Unknown keys are ignored.
    fn dispose(&mut self, key: RenderKey);
}

/// Returns the factor by which `transform` scales lengths, on average.
pub(crate) fn average_scale(transform: &Affine2) -> f32 {
    transform.matrix2.determinant().abs().sqrt()
}
