use serde::{Deserialize, Serialize};

/// RGBA color, 8 bits per channel.
pub type Rgba = [u8; 4];

/// Opaque black, the default brush color.
pub const BLACK: Rgba = [0, 0, 0, 255];

/// Brush settings carried by tool-select traffic and used for painting.
///
/// A brush is plain data: the active tool decides what color it paints with
/// (an eraser is a brush in the background color), and the board applies it
/// per user so remote strokes render with the brush their sender selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brush {
    /// Dab diameter in canvas pixels.
    pub diameter: u32,
    /// Paint color.
    pub color: Rgba,
}

impl Default for Brush {
    fn default() -> Self {
        Self { diameter: 4, color: BLACK }
    }
}

impl Brush {
    #[must_use]
    pub fn new(diameter: u32, color: Rgba) -> Self {
        Self { diameter, color }
    }

    /// Dab radius in canvas pixels.
    #[must_use]
    pub fn radius(self) -> f64 {
        f64::from(self.diameter) / 2.0
    }
}
