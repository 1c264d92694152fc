use glam::{vec2, Affine2, Vec2};

/// Approximates a quarter circle with a cubic Bezier curve.
const KAPPA: f32 = 0.552_284_8;

/// A vector path composed of line segments and Bezier curves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathSegment {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo {
        control: Vec2,
        end: Vec2,
    },
    CubicTo {
        control1: Vec2,
        control2: Vec2,
        end: Vec2,
    },
    Close,
}

impl PathSegment {
    /// Applies `transform` to every point of the segment.
    pub fn transformed(&self, transform: &Affine2) -> Self {
        let p = |point: Vec2| transform.transform_point2(point);
        match *self {
            PathSegment::MoveTo(to) => PathSegment::MoveTo(p(to)),
            PathSegment::LineTo(to) => PathSegment::LineTo(p(to)),
            PathSegment::QuadTo { control, end } => PathSegment::QuadTo {
                control: p(control),
                end: p(end),
            },
            PathSegment::CubicTo {
                control1,
                control2,
                end,
            } => PathSegment::CubicTo {
                control1: p(control1),
                control2: p(control2),
                end: p(end),
            },
            PathSegment::Close => PathSegment::Close,
        }
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Appends a closed rectangle with top-left corner `(x, y)`.
    ///
    /// Nonzero `rx` / `ry` round the corners. The radii are clamped to
    /// half the width and height; a rectangle whose radii reach both
    /// halves becomes an ellipse.
    pub fn append_rect(&mut self, x: f32, y: f32, w: f32, h: f32, rx: f32, ry: f32) {
        let half_w = w * 0.5;
        let half_h = h * 0.5;
        let rx = rx.clamp(0., half_w.max(0.));
        let ry = ry.clamp(0., half_h.max(0.));

        if rx == 0. && ry == 0. {
            self.segments.extend([
                PathSegment::MoveTo(vec2(x, y)),
                PathSegment::LineTo(vec2(x + w, y)),
                PathSegment::LineTo(vec2(x + w, y + h)),
                PathSegment::LineTo(vec2(x, y + h)),
                PathSegment::Close,
            ]);
        } else if rx == half_w && ry == half_h {
            self.append_circle(x + half_w, y + half_h, rx, ry);
        } else {
            let hrx = rx * KAPPA;
            let hry = ry * KAPPA;
            self.segments.extend([
                PathSegment::MoveTo(vec2(x + rx, y)),
                PathSegment::LineTo(vec2(x + w - rx, y)),
                PathSegment::CubicTo {
                    control1: vec2(x + w - rx + hrx, y),
                    control2: vec2(x + w, y + ry - hry),
                    end: vec2(x + w, y + ry),
                },
                PathSegment::LineTo(vec2(x + w, y + h - ry)),
                PathSegment::CubicTo {
                    control1: vec2(x + w, y + h - ry + hry),
                    control2: vec2(x + w - rx + hrx, y + h),
                    end: vec2(x + w - rx, y + h),
                },
                PathSegment::LineTo(vec2(x + rx, y + h)),
                PathSegment::CubicTo {
                    control1: vec2(x + rx - hrx, y + h),
                    control2: vec2(x, y + h - ry + hry),
                    end: vec2(x, y + h - ry),
                },
                PathSegment::LineTo(vec2(x, y + ry)),
                PathSegment::CubicTo {
                    control1: vec2(x, y + ry - hry),
                    control2: vec2(x + rx - hrx, y),
                    end: vec2(x + rx, y),
                },
                PathSegment::Close,
            ]);
        }
    }

    /// Appends a closed ellipse centered at `(cx, cy)` with radii `rx` and `ry`.
    pub fn append_circle(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        let hrx = rx * KAPPA;
        let hry = ry * KAPPA;
        self.segments.extend([
            PathSegment::MoveTo(vec2(cx, cy - ry)),
            PathSegment::CubicTo {
                control1: vec2(cx + hrx, cy - ry),
                control2: vec2(cx + rx, cy - hry),
                end: vec2(cx + rx, cy),
            },
            PathSegment::CubicTo {
                control1: vec2(cx + rx, cy + hry),
                control2: vec2(cx + hrx, cy + ry),
                end: vec2(cx, cy + ry),
            },
            PathSegment::CubicTo {
                control1: vec2(cx - hrx, cy + ry),
                control2: vec2(cx - rx, cy + hry),
                end: vec2(cx - rx, cy),
            },
            PathSegment::CubicTo {
                control1: vec2(cx - rx, cy - hry),
                control2: vec2(cx - hrx, cy - ry),
                end: vec2(cx, cy - ry),
            },
            PathSegment::Close,
        ]);
    }

    /// Returns a copy of the path with `transform` applied to every point.
    pub fn transformed(&self, transform: &Affine2) -> Path {
        Path {
            segments: self
                .segments
                .iter()
                .map(|segment| segment.transformed(transform))
                .collect(),
        }
    }
}

/// A builder for a [`Path`].
///
/// Maintains a current "pen position," which is initially
/// set to the origin.
#[derive(Debug, Default)]
pub struct PathBuilder {
    path: Path,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the pen position to the given point without
    /// drawing a segment to it.
    pub fn move_to(mut self, point: Vec2) -> Self {
        self.path.push(PathSegment::MoveTo(point));
        self
    }

    /// Adds a line segment from the pen position to the given
    /// point, then sets the pen position to `point`.
    pub fn line_to(mut self, point: Vec2) -> Self {
        self.path.push(PathSegment::LineTo(point));
        self
    }

    /// Adds a quadratic Bezier curve from the pen position
    /// to `end` using the given control point.
    pub fn quad_to(mut self, control: Vec2, end: Vec2) -> Self {
        self.path.push(PathSegment::QuadTo { control, end });
        self
    }

    /// Adds a cubic Bezier curve from the pen position
    /// to `end` using the given control points.
    pub fn cubic_to(mut self, control1: Vec2, control2: Vec2, end: Vec2) -> Self {
        self.path.push(PathSegment::CubicTo {
            control1,
            control2,
            end,
        });
        self
    }

    /// Closes the path, then builds it.
    ///
    /// Closing a path adds a line segment to the initial point in the path.
    pub fn close(mut self) -> Path {
        self.path.push(PathSegment::Close);
        self.build()
    }

    pub fn build(self) -> Path {
        self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharp_rect() {
        let mut path = Path::new();
        path.append_rect(10., 20., 30., 40., 0., 0.);
        assert_eq!(
            path.segments(),
            &[
                PathSegment::MoveTo(vec2(10., 20.)),
                PathSegment::LineTo(vec2(40., 20.)),
                PathSegment::LineTo(vec2(40., 60.)),
                PathSegment::LineTo(vec2(10., 60.)),
                PathSegment::Close,
            ]
        );
    }

    #[test]
    fn fully_rounded_rect_is_ellipse() {
        let mut rect = Path::new();
        rect.append_rect(0., 0., 100., 50., 80., 80.);
        let mut ellipse = Path::new();
        ellipse.append_circle(50., 25., 50., 25.);
        assert_eq!(rect, ellipse);
    }

    #[test]
    fn rounded_rect_has_four_corners() {
        let mut path = Path::new();
        path.append_rect(0., 0., 100., 100., 10., 10.);
        let corners = path
            .segments()
            .iter()
            .filter(|s| matches!(s, PathSegment::CubicTo { .. }))
            .count();
        assert_eq!(corners, 4);
    }

    #[test]
    fn transform_points() {
        let path = Path::builder()
            .move_to(vec2(1., 1.))
            .line_to(vec2(2., 3.))
            .close();
        let moved = path.transformed(&Affine2::from_translation(vec2(10., 0.)));
        assert_eq!(
            moved.segments(),
            &[
                PathSegment::MoveTo(vec2(11., 1.)),
                PathSegment::LineTo(vec2(12., 3.)),
                PathSegment::Close,
            ]
        );
    }
}
