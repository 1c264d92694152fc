use super::next_content_id;
use crate::{backend::RenderUpdateFlags, Color, Error, Result};

/// A raster image placed with its top-left corner at the origin
/// of its paint's space.
///
/// Pixels are `0xAARRGGBB` words, not premultiplied, in row-major order.
#[derive(Debug)]
pub struct Image {
    id: u64,
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    flags: RenderUpdateFlags,
}

impl Clone for Image {
    fn clone(&self) -> Self {
        Self {
            id: next_content_id(),
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
            flags: self.flags,
        }
    }
}

impl Image {
    /// Creates an image from raw pixels.
    ///
    /// The buffer is checked against the dimensions when the image is
    /// pushed into a container.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Self {
        Self {
            id: next_content_id(),
            width,
            height,
            pixels,
            flags: RenderUpdateFlags::all(),
        }
    }

    /// Creates an image filled with one color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let len = width as usize * height as usize;
        Self::new(width, height, vec![color.to_argb(); len])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Replaces the pixel data, keeping the dimensions.
    pub fn set_pixels(&mut self, pixels: Vec<u32>) -> &mut Self {
        self.pixels = pixels;
        self.flags |= RenderUpdateFlags::IMAGE;
        self
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Corruption("image has zero size"));
        }
        if self.pixels.len() != self.width as usize * self.height as usize {
            return Err(Error::Corruption(
                "image pixel buffer does not match its dimensions",
            ));
        }
        Ok(())
    }

    pub(crate) fn flags(&self) -> RenderUpdateFlags {
        self.flags
    }

    pub(crate) fn clear_flags(&mut self) {
        self.flags = RenderUpdateFlags::empty();
    }
}
