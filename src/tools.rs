//! Drawing tools: the tool vocabulary and the active brush settings.
//!
//! Tools split into two classes. Mutating tools (brush, eraser) paint through
//! the board's editor and are subject to the synchronization lock. Read-only
//! tools (pan, color picker) never touch canvas state, so they stay usable
//! while the board is locked for a hand-off; their actual effects (camera
//! movement, palette updates) live in the embedding application.

#[cfg(test)]
#[path = "tools_test.rs"]
mod tools_test;

use crate::brush::Brush;
use crate::raster::BACKGROUND;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    /// Paint with the current brush (default).
    #[default]
    Brush,
    /// Paint with the background color.
    Eraser,
    /// Move the viewport.
    Pan,
    /// Sample a color from the canvas.
    ColorPicker,
}

impl ToolKind {
    /// Whether this tool leaves canvas state untouched and is therefore
    /// exempt from the synchronization lock.
    #[must_use]
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Pan | Self::ColorPicker)
    }
}

/// The active tool plus current brush settings.
#[derive(Debug, Clone, Default)]
pub struct ToolBox {
    active: ToolKind,
    brush: Brush,
}

impl ToolBox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn active(&self) -> ToolKind {
        self.active
    }

    pub fn select(&mut self, kind: ToolKind) {
        self.active = kind;
    }

    /// The user's brush settings, independent of the active tool.
    #[must_use]
    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    /// The brush a stroke with the active tool paints with, or `None` for
    /// read-only tools.
    #[must_use]
    pub fn stroke_brush(&self) -> Option<Brush> {
        match self.active {
            ToolKind::Brush => Some(self.brush),
            ToolKind::Eraser => Some(Brush::new(self.brush.diameter, BACKGROUND)),
            ToolKind::Pan | ToolKind::ColorPicker => None,
        }
    }
}
