use super::next_content_id;
use crate::{backend::RenderUpdateFlags, Color, FillRule, Path, PathSegment, StrokeSettings};

/// A vector shape: a path with an optional fill and stroke.
///
/// Methods return `&mut Self` to enable chaining:
///
/// ```
/// use strata::{Color, Shape};
///
/// let mut shape = Shape::new();
/// shape
///     .append_circle(300., 200., 100., 100.)
///     .set_fill(Color::rgb(0, 0, 255));
/// ```
#[derive(Debug)]
pub struct Shape {
    id: u64,
    path: Path,
    fill: Option<Color>,
    fill_rule: FillRule,
    stroke: Option<StrokeSettings>,
    flags: RenderUpdateFlags,
}

impl Default for Shape {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones carry fresh identities, so a clone swapped into a prepared paint
/// is prepared from scratch.
impl Clone for Shape {
    fn clone(&self) -> Self {
        Self {
            id: next_content_id(),
            path: self.path.clone(),
            fill: self.fill,
            fill_rule: self.fill_rule,
            stroke: self.stroke.clone(),
            flags: self.flags,
        }
    }
}

impl Shape {
    pub fn new() -> Self {
        Self {
            id: next_content_id(),
            path: Path::new(),
            fill: None,
            fill_rule: FillRule::default(),
            stroke: None,
            flags: RenderUpdateFlags::all(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes every path segment.
    pub fn reset(&mut self) -> &mut Self {
        self.path.clear();
        self.flags |= RenderUpdateFlags::PATH;
        self
    }

    /// Appends the segments of `path`.
    pub fn append_path(&mut self, path: &Path) -> &mut Self {
        for segment in path.segments() {
            self.path.push(*segment);
        }
        self.flags |= RenderUpdateFlags::PATH;
        self
    }

    pub fn push_segment(&mut self, segment: PathSegment) -> &mut Self {
        self.path.push(segment);
        self.flags |= RenderUpdateFlags::PATH;
        self
    }

    /// See [`Path::append_rect`].
    pub fn append_rect(&mut self, x: f32, y: f32, w: f32, h: f32, rx: f32, ry: f32) -> &mut Self {
        self.path.append_rect(x, y, w, h, rx, ry);
        self.flags |= RenderUpdateFlags::PATH;
        self
    }

    /// See [`Path::append_circle`].
    pub fn append_circle(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) -> &mut Self {
        self.path.append_circle(cx, cy, rx, ry);
        self.flags |= RenderUpdateFlags::PATH;
        self
    }

    pub fn fill(&self) -> Option<Color> {
        self.fill
    }

    /// Fills the shape with a solid color.
    pub fn set_fill(&mut self, color: impl Into<Color>) -> &mut Self {
        self.fill = Some(color.into());
        self.flags |= RenderUpdateFlags::COLOR;
        self
    }

    pub fn clear_fill(&mut self) -> &mut Self {
        self.fill = None;
        self.flags |= RenderUpdateFlags::COLOR;
        self
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) -> &mut Self {
        self.fill_rule = fill_rule;
        self.flags |= RenderUpdateFlags::PATH;
        self
    }

    pub fn stroke(&self) -> Option<&StrokeSettings> {
        self.stroke.as_ref()
    }

    pub fn set_stroke(&mut self, stroke: StrokeSettings) -> &mut Self {
        self.stroke = Some(stroke);
        self.flags |= RenderUpdateFlags::STROKE;
        self
    }

    pub fn clear_stroke(&mut self) -> &mut Self {
        self.stroke = None;
        self.flags |= RenderUpdateFlags::STROKE;
        self
    }

    pub(crate) fn flags(&self) -> RenderUpdateFlags {
        self.flags
    }

    pub(crate) fn clear_flags(&mut self) {
        self.flags = RenderUpdateFlags::empty();
    }
}
