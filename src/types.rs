use crate::Color;

/// Determines how to fill paths with self-intersections.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FillRule {
    EvenOdd,
    NonZero,
}

impl Default for FillRule {
    fn default() -> Self {
        FillRule::NonZero
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

impl Default for LineCap {
    fn default() -> Self {
        LineCap::Butt
    }
}

impl Default for LineJoin {
    fn default() -> Self {
        LineJoin::Miter
    }
}

/// How to stroke a path.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StrokeSettings {
    /// Width of the path to stroke
    pub width: f32,
    /// Color of the stroke
    pub color: Color,
    /// How to cap the ends of open segments
    pub line_cap: LineCap,
    /// How to join segments together
    pub line_join: LineJoin,
}

impl Default for StrokeSettings {
    fn default() -> Self {
        Self {
            width: 1.,
            color: Color::BLACK,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
        }
    }
}

/// Pixel layout of a software render target.
///
/// Both layouts pack one pixel per `u32` with alpha in the high byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Colorspace {
    /// `0xAARRGGBB`
    Argb8888,
    /// `0xAABBGGRR`
    Abgr8888,
}

impl Default for Colorspace {
    fn default() -> Self {
        Colorspace::Argb8888
    }
}

impl Colorspace {
    /// Packs a color into a pixel of this layout.
    pub fn pack(self, color: Color) -> u32 {
        let [r, g, b, a] = color.to_array();
        match self {
            Colorspace::Argb8888 => u32::from_be_bytes([a, r, g, b]),
            Colorspace::Abgr8888 => u32::from_be_bytes([a, b, g, r]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_colorspaces() {
        let color = Color::rgba(1, 2, 3, 4);
        assert_eq!(Colorspace::Argb8888.pack(color), 0x0401_0203);
        assert_eq!(Colorspace::Abgr8888.pack(color), 0x0403_0201);
    }
}
