//! Canvas raster: an RGBA pixel buffer with dab/line painting and the PNG
//! snapshot codec.
//!
//! The raster is the unit of canvas hand-off: the whole buffer is encoded to
//! PNG when a snapshot is sent to the session, and a received snapshot is
//! decoded back into a `RasterImage` and installed wholesale. Painting is
//! deliberately simple (hard round dabs, interpolated along line segments);
//! stroke fidelity is a rendering concern, not a synchronization one.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use crate::brush::{Brush, Rgba};
use crate::point::Point;
use crate::protocol::ErrorCode;

/// Canvas background color (opaque white).
pub const BACKGROUND: Rgba = [255, 255, 255, 255];

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("png encode failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("png decode failed: {0}")]
    Decode(#[from] png::DecodingError),
    #[error("unsupported png layout (expected 8-bit RGBA)")]
    UnsupportedLayout,
    #[error("decoded image is empty")]
    EmptyImage,
}

impl ErrorCode for RasterError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "E_PNG_ENCODE",
            Self::Decode(_) => "E_PNG_DECODE",
            Self::UnsupportedLayout => "E_PNG_LAYOUT",
            Self::EmptyImage => "E_EMPTY_IMAGE",
        }
    }
}

/// An RGBA8 pixel buffer in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Create a canvas filled with the background color.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(len * 4);
        for _ in 0..len {
            pixels.extend_from_slice(&BACKGROUND);
        }
        Self { width, height, pixels }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// A zero-area image carries no canvas state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Read one pixel. Out-of-bounds coordinates yield `None`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Write one pixel. Out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[i..i + 4].copy_from_slice(&color);
    }

    /// Paint one round dab centered on `center`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn paint_dab(&mut self, center: Point, brush: Brush) {
        let radius = brush.radius().max(0.5);
        let min_x = (center.x - radius).floor().max(0.0) as u32;
        let min_y = (center.y - radius).floor().max(0.0) as u32;
        let max_x = (center.x + radius).ceil().max(0.0) as u32;
        let max_y = (center.y + radius).ceil().max(0.0) as u32;
        for y in min_y..=max_y.min(self.height.saturating_sub(1)) {
            for x in min_x..=max_x.min(self.width.saturating_sub(1)) {
                let p = Point::new(f64::from(x), f64::from(y));
                if p.distance_to(center) <= radius {
                    self.set_pixel(x, y, brush.color);
                }
            }
        }
    }

    /// Paint a line segment as dabs interpolated from `from` to `to`.
    ///
    /// The segment is clipped to the canvas before stepping, so the dab count
    /// is bounded by the canvas size rather than by how far outside it the
    /// endpoints lie. A segment with a non-finite endpoint paints nothing.
    pub fn paint_line(&mut self, from: Point, to: Point, brush: Brush) {
        let radius = brush.radius().max(0.5);
        let Some((from, to)) = self.clip_segment(from, to, radius) else {
            return;
        };
        let spacing = (brush.radius() / 2.0).max(1.0);
        let distance = from.distance_to(to);
        let steps = (distance / spacing).ceil().max(1.0);
        let mut t = 0.0;
        while t <= 1.0 {
            self.paint_dab(from.lerp(to, t), brush);
            t += 1.0 / steps;
        }
        self.paint_dab(to, brush);
    }

    /// Clip a segment to the canvas rectangle grown by `margin` on each side.
    /// Returns `None` when the segment misses the canvas entirely or carries
    /// a non-finite coordinate.
    #[allow(clippy::float_cmp)]
    fn clip_segment(&self, from: Point, to: Point, margin: f64) -> Option<(Point, Point)> {
        if !(from.is_finite() && to.is_finite()) {
            return None;
        }
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let max_x = f64::from(self.width) - 1.0 + margin;
        let max_y = f64::from(self.height) - 1.0 + margin;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        // Liang-Barsky: each (delta, room) pair is one slab boundary.
        for (delta, room) in [
            (-dx, from.x + margin),
            (dx, max_x - from.x),
            (-dy, from.y + margin),
            (dy, max_y - from.y),
        ] {
            if delta == 0.0 {
                if room < 0.0 {
                    return None;
                }
                continue;
            }
            let t = room / delta;
            if delta < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((from.lerp(to, t0), from.lerp(to, t1)))
    }

    /// Encode the buffer as an 8-bit RGBA PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the PNG writer rejects the image (for example a
    /// zero-area buffer).
    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
        }
        Ok(out)
    }

    /// Decode an 8-bit RGBA PNG back into a raster.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid PNG data, use a layout
    /// other than 8-bit RGBA, or decode to a zero-area image.
    pub fn decode_png(bytes: &[u8]) -> Result<Self, RasterError> {
        let decoder = png::Decoder::new(bytes);
        let mut reader = decoder.read_info()?;
        let mut pixels = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut pixels)?;
        if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
            return Err(RasterError::UnsupportedLayout);
        }
        if info.width == 0 || info.height == 0 {
            return Err(RasterError::EmptyImage);
        }
        pixels.truncate(info.buffer_size());
        Ok(Self { width: info.width, height: info.height, pixels })
    }
}
