//! A software rasterizer built on [`tiny-skia`](https://docs.rs/tiny-skia).

use std::sync::Arc;

use slotmap::SlotMap;
use tiny_skia::{
    FilterQuality, Mask, Pixmap, PixmapPaint, PremultipliedColorU8, Stroke, Transform,
};

use crate::{
    backend::{average_scale, Clip, RenderKey, RenderState, RenderUpdateFlags},
    thread_pool::{Task, WorkerPool},
    Backend, BackendError, BackendKind, Color, Colorspace, Engine, FillRule, Image, LineCap,
    LineJoin, Path, PathSegment, Shape,
};

/// Builder for a [`SoftwareBackend`].
pub struct SoftwareBackendBuilder {
    pool: Option<Arc<WorkerPool>>,
    settings: Settings,
}

impl SoftwareBackendBuilder {
    /// Sets whether shapes, strokes and clips are anti-aliased.
    ///
    /// Default: `true`.
    pub fn anti_alias(mut self, enabled: bool) -> Self {
        self.settings.anti_alias = enabled;
        self
    }

    /// Sets the color the target is cleared to at the start of each frame.
    ///
    /// Default: [`Color::TRANSPARENT`].
    pub fn clear_color(mut self, color: Color) -> Self {
        self.settings.clear_color = color;
        self
    }

    pub fn build(self) -> SoftwareBackend {
        SoftwareBackend {
            pool: self.pool,
            settings: self.settings,
            target: None,
            nodes: SlotMap::with_key(),
            in_frame: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Settings {
    anti_alias: bool,
    clear_color: Color,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anti_alias: true,
            clear_color: Color::TRANSPARENT,
        }
    }
}

struct Target {
    pixmap: Pixmap,
    colorspace: Colorspace,
}

/// Target-space paths derived from a shape.
struct Geometry {
    /// `None` if the path is empty.
    path: Option<tiny_skia::Path>,
    clips: Vec<ClipPath>,
}

/// A clip converted for tiny-skia. A `None` path clips everything away.
#[derive(Clone)]
struct ClipPath {
    path: Option<tiny_skia::Path>,
    fill_rule: tiny_skia::FillRule,
}

enum Node {
    Shape {
        geometry: Task<Geometry>,
        fill: Option<(tiny_skia::Color, tiny_skia::FillRule)>,
        stroke: Option<(tiny_skia::Color, Stroke)>,
    },
    Image {
        pixmap: Pixmap,
        transform: Transform,
        opacity: u8,
        clips: Vec<ClipPath>,
    },
}

/// A backend that rasterizes into an in-memory pixel buffer.
///
/// Shape geometry is flattened on the [`Engine`]'s worker pool, if it has
/// one, and joined when the shape is first rendered or on
/// [`sync`](Backend::sync).
pub struct SoftwareBackend {
    pool: Option<Arc<WorkerPool>>,
    settings: Settings,
    target: Option<Target>,
    nodes: SlotMap<RenderKey, Node>,
    in_frame: bool,
}

impl SoftwareBackend {
    /// Creates a backend with default settings that spreads work over
    /// `engine`'s worker pool.
    pub fn new(engine: &Engine) -> Self {
        Self::builder(engine).build()
    }

    pub fn builder(engine: &Engine) -> SoftwareBackendBuilder {
        SoftwareBackendBuilder {
            pool: engine.worker_pool(),
            settings: Settings::default(),
        }
    }

    /// Allocates a `width` x `height` target, replacing the previous one.
    ///
    /// Pixels are exported in `colorspace`.
    pub fn set_target(
        &mut self,
        width: u32,
        height: u32,
        colorspace: Colorspace,
    ) -> Result<(), BackendError> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(BackendError::InvalidTarget { width, height })?;
        pixmap.fill(convert_color(self.settings.clear_color));
        self.target = Some(Target { pixmap, colorspace });
        self.in_frame = false;
        log::debug!("Configured {}x{} software target", width, height);
        Ok(())
    }

    pub fn width(&self) -> Option<u32> {
        self.target.as_ref().map(|target| target.pixmap.width())
    }

    pub fn height(&self) -> Option<u32> {
        self.target.as_ref().map(|target| target.pixmap.height())
    }

    pub fn colorspace(&self) -> Option<Colorspace> {
        self.target.as_ref().map(|target| target.colorspace)
    }

    /// Reads back one pixel of the target, unpremultiplied.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let target = self.target.as_ref()?;
        target.pixmap.pixel(x, y).map(demultiply)
    }

    /// Copies the target out as packed pixels in the target's colorspace,
    /// row by row without padding.
    pub fn pixels(&self) -> Result<Vec<u32>, BackendError> {
        let target = self.target.as_ref().ok_or(BackendError::NoTarget)?;
        Ok(target
            .pixmap
            .pixels()
            .iter()
            .map(|&pixel| target.colorspace.pack(demultiply(pixel)))
            .collect())
    }

    /// Copies the target into `buffer`, whose rows are `stride` pixels apart.
    pub fn copy_to(&self, buffer: &mut [u32], stride: usize) -> Result<(), BackendError> {
        let target = self.target.as_ref().ok_or(BackendError::NoTarget)?;
        let width = target.pixmap.width() as usize;
        let height = target.pixmap.height() as usize;
        if stride < width || buffer.len() < stride * (height - 1) + width {
            return Err(BackendError::InvalidTarget {
                width: stride as u32,
                height: (buffer.len() / stride.max(1)) as u32,
            });
        }

        for (src, dst) in target
            .pixmap
            .pixels()
            .chunks_exact(width)
            .zip(buffer.chunks_mut(stride))
        {
            for (&pixel, out) in src.iter().zip(dst.iter_mut()) {
                *out = target.colorspace.pack(demultiply(pixel));
            }
        }
        Ok(())
    }

    /// Number of paints with prepared state.
    pub fn prepared_count(&self) -> usize {
        self.nodes.len()
    }

    fn clear_target(&mut self) -> Result<(), BackendError> {
        let target = self.target.as_mut().ok_or(BackendError::NoTarget)?;
        target.pixmap.fill(convert_color(self.settings.clear_color));
        Ok(())
    }

    fn store(&mut self, cache: Option<RenderKey>, node: Node) -> RenderKey {
        match cache.and_then(|key| self.nodes.get_mut(key).map(|slot| (key, slot))) {
            Some((key, slot)) => {
                *slot = node;
                key
            }
            None => self.nodes.insert(node),
        }
    }
}

impl Backend for SoftwareBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }

    fn is_ready(&self) -> bool {
        self.target.is_some()
    }

    fn reset_target(&mut self) -> Result<(), BackendError> {
        self.clear_target()?;
        self.in_frame = false;
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), BackendError> {
        if self.in_frame {
            return Err(BackendError::FrameInProgress);
        }
        self.clear_target()?;
        self.in_frame = true;
        log::trace!("Began software frame");
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        if !self.in_frame {
            return Err(BackendError::NoFrame);
        }
        self.in_frame = false;
        log::trace!("Ended software frame");
        Ok(())
    }

    fn sync(&mut self) -> Result<(), BackendError> {
        let mut result = Ok(());
        for node in self.nodes.values_mut() {
            if let Node::Shape { geometry, .. } = node {
                if geometry.get().is_none() {
                    result = Err(BackendError::TaskFailed);
                }
            }
        }
        result
    }

    fn prepare_shape(
        &mut self,
        cache: Option<RenderKey>,
        shape: &Shape,
        state: &RenderState<'_>,
        flags: RenderUpdateFlags,
    ) -> Result<RenderKey, BackendError> {
        let fill = shape.fill().map(|color| {
            (
                convert_color(color.with_opacity(state.opacity)),
                convert_fill_rule(shape.fill_rule()),
            )
        });
        let stroke = shape.stroke().map(|settings| {
            (
                convert_color(settings.color.with_opacity(state.opacity)),
                Stroke {
                    width: settings.width * average_scale(&state.transform),
                    line_cap: convert_line_cap(settings.line_cap),
                    line_join: convert_line_join(settings.line_join),
                    ..Default::default()
                },
            )
        });

        // Only color or opacity changed: keep the derived geometry.
        if let Some(Node::Shape {
            fill: old_fill,
            stroke: old_stroke,
            ..
        }) = cache.and_then(|key| self.nodes.get_mut(key))
        {
            if !flags.intersects(RenderUpdateFlags::GEOMETRY) {
                *old_fill = fill;
                *old_stroke = stroke;
                return cache.ok_or(BackendError::StaleKey);
            }
        }

        let path = shape.path().transformed(&state.transform);
        let clips = state.clips.to_vec();
        let geometry = Task::spawn(self.pool.as_deref(), move || Geometry {
            path: convert_path(&path),
            clips: convert_clips(&clips),
        });

        Ok(self.store(
            cache,
            Node::Shape {
                geometry,
                fill,
                stroke,
            },
        ))
    }

    fn prepare_image(
        &mut self,
        cache: Option<RenderKey>,
        image: &Image,
        state: &RenderState<'_>,
        flags: RenderUpdateFlags,
    ) -> Result<RenderKey, BackendError> {
        let transform = convert_transform(&state.transform);
        let clips = convert_clips(state.clips);

        if let Some(Node::Image {
            transform: old_transform,
            opacity,
            clips: old_clips,
            ..
        }) = cache.and_then(|key| self.nodes.get_mut(key))
        {
            if !flags.contains(RenderUpdateFlags::IMAGE) {
                *old_transform = transform;
                *opacity = state.opacity;
                *old_clips = clips;
                return cache.ok_or(BackendError::StaleKey);
            }
        }

        let pixmap = convert_image(image).ok_or(BackendError::InvalidTarget {
            width: image.width(),
            height: image.height(),
        })?;
        Ok(self.store(
            cache,
            Node::Image {
                pixmap,
                transform,
                opacity: state.opacity,
                clips,
            },
        ))
    }

    fn render(&mut self, key: RenderKey) -> Result<(), BackendError> {
        if !self.in_frame {
            return Err(BackendError::NoFrame);
        }
        let anti_alias = self.settings.anti_alias;
        let target = self.target.as_mut().ok_or(BackendError::NoTarget)?;
        let node = self.nodes.get_mut(key).ok_or(BackendError::StaleKey)?;

        match node {
            Node::Shape {
                geometry,
                fill,
                stroke,
            } => {
                let geometry = geometry.get().ok_or(BackendError::TaskFailed)?;
                let path = match &geometry.path {
                    Some(path) => path,
                    None => return Ok(()),
                };
                let mask = match build_mask(&target.pixmap, &geometry.clips, anti_alias) {
                    Coverage::Everything => None,
                    Coverage::Nothing => return Ok(()),
                    Coverage::Mask(mask) => Some(mask),
                };

                let mut paint = tiny_skia::Paint {
                    anti_alias,
                    ..Default::default()
                };
                if let Some((color, fill_rule)) = fill {
                    paint.set_color(*color);
                    target.pixmap.fill_path(
                        path,
                        &paint,
                        *fill_rule,
                        Transform::identity(),
                        mask.as_ref(),
                    );
                }
                if let Some((color, stroke)) = stroke {
                    paint.set_color(*color);
                    target.pixmap.stroke_path(
                        path,
                        &paint,
                        stroke,
                        Transform::identity(),
                        mask.as_ref(),
                    );
                }
            }
            Node::Image {
                pixmap,
                transform,
                opacity,
                clips,
            } => {
                let mask = match build_mask(&target.pixmap, clips, anti_alias) {
                    Coverage::Everything => None,
                    Coverage::Nothing => return Ok(()),
                    Coverage::Mask(mask) => Some(mask),
                };
                let paint = PixmapPaint {
                    opacity: f32::from(*opacity) / 255.,
                    quality: if transform.is_translate() {
                        FilterQuality::Nearest
                    } else {
                        FilterQuality::Bilinear
                    },
                    ..Default::default()
                };
                target
                    .pixmap
                    .draw_pixmap(0, 0, pixmap.as_ref(), &paint, *transform, mask.as_ref());
            }
        }
        Ok(())
    }

    fn dispose(&mut self, key: RenderKey) {
        self.nodes.remove(key);
    }
}

enum Coverage {
    Everything,
    Nothing,
    Mask(Mask),
}

/// Intersects `clips` into one mask covering the target.
fn build_mask(target: &Pixmap, clips: &[ClipPath], anti_alias: bool) -> Coverage {
    if clips.is_empty() {
        return Coverage::Everything;
    }
    let mut mask = match Mask::new(target.width(), target.height()) {
        Some(mask) => mask,
        None => return Coverage::Nothing,
    };
    for (i, clip) in clips.iter().enumerate() {
        let path = match &clip.path {
            Some(path) => path,
            None => return Coverage::Nothing,
        };
        if i == 0 {
            mask.fill_path(path, clip.fill_rule, anti_alias, Transform::identity());
        } else {
            mask.intersect_path(path, clip.fill_rule, anti_alias, Transform::identity());
        }
    }
    Coverage::Mask(mask)
}

fn convert_clips(clips: &[Clip]) -> Vec<ClipPath> {
    clips
        .iter()
        .map(|clip| ClipPath {
            path: convert_path(&clip.path),
            fill_rule: convert_fill_rule(clip.fill_rule),
        })
        .collect()
}

fn convert_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut builder = tiny_skia::PathBuilder::new();
    for segment in path.segments() {
        match *segment {
            PathSegment::MoveTo(pos) => builder.move_to(pos.x, pos.y),
            PathSegment::LineTo(pos) => builder.line_to(pos.x, pos.y),
            PathSegment::QuadTo { control, end } => {
                builder.quad_to(control.x, control.y, end.x, end.y)
            }
            PathSegment::CubicTo {
                control1,
                control2,
                end,
            } => builder.cubic_to(control1.x, control1.y, control2.x, control2.y, end.x, end.y),
            PathSegment::Close => builder.close(),
        }
    }
    builder.finish()
}

/// Converts ARGB pixels into a premultiplied pixmap.
fn convert_image(image: &Image) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (&argb, out) in image.pixels().iter().zip(pixmap.pixels_mut()) {
        let color = Color::from_argb(argb);
        *out = tiny_skia::ColorU8::from_rgba(
            color.red(),
            color.green(),
            color.blue(),
            color.alpha(),
        )
        .premultiply();
    }
    Some(pixmap)
}

fn demultiply(pixel: PremultipliedColorU8) -> Color {
    let color = pixel.demultiply();
    Color::rgba(color.red(), color.green(), color.blue(), color.alpha())
}

fn convert_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.red(), color.green(), color.blue(), color.alpha())
}

fn convert_transform(transform: &glam::Affine2) -> Transform {
    let cols = transform.to_cols_array();
    Transform::from_row(cols[0], cols[1], cols[2], cols[3], cols[4], cols[5])
}

fn convert_line_cap(cap: LineCap) -> tiny_skia::LineCap {
    match cap {
        LineCap::Butt => tiny_skia::LineCap::Butt,
        LineCap::Round => tiny_skia::LineCap::Round,
        LineCap::Square => tiny_skia::LineCap::Square,
    }
}

fn convert_line_join(join: LineJoin) -> tiny_skia::LineJoin {
    match join {
        LineJoin::Miter => tiny_skia::LineJoin::Miter,
        LineJoin::Round => tiny_skia::LineJoin::Round,
        LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
    }
}

fn convert_fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
        FillRule::NonZero => tiny_skia::FillRule::Winding,
    }
}
