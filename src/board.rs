//! Board model: user roster, canvas raster, stroke previews, and the editor
//! capability.
//!
//! ARCHITECTURE
//! ============
//! The board is the single mutable surface the controller drives. Local input
//! reaches it through `begin_stroke`/`continue_stroke`/`end_stroke`, which
//! route through the owned `Editor`: a local editor paints straight into the
//! canvas, a session editor forwards commands to the session and paints
//! nothing (the canvas updates when the session echoes the stroke back).
//! Remote strokes always apply directly via `user_stroke`, regardless of the
//! lock state; the lock constrains local tools only.
//!
//! DESIGN
//! ======
//! Each roster entry keeps the user's current brush and an optional stroke
//! anchor (the last point of an unfinished stroke). The anchors are the
//! "pending previews" cleared when leaving a session.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::brush::Brush;
use crate::point::Point;
use crate::protocol::{ClientCommand, UserId};
use crate::raster::RasterImage;
use crate::session::SessionUser;

/// One roster entry.
#[derive(Debug, Clone)]
pub struct BoardUser {
    pub id: UserId,
    pub name: String,
    /// Brush this user's strokes currently paint with.
    pub brush: Brush,
    /// Last point of an unfinished stroke, if one is in progress.
    pub anchor: Option<Point>,
}

/// How local drawing input is applied.
#[derive(Debug, Clone)]
pub enum Editor {
    /// Paint directly into the local canvas.
    Local,
    /// Forward drawing commands into the joined session.
    Session { commands: mpsc::UnboundedSender<ClientCommand> },
}

impl Editor {
    fn send(commands: &mpsc::UnboundedSender<ClientCommand>, command: ClientCommand) {
        if commands.send(command).is_err() {
            debug!("session command channel closed");
        }
    }
}

/// The shared canvas and everything the controller needs to drive it.
#[derive(Debug)]
pub struct Board {
    users: HashMap<UserId, BoardUser>,
    local: SessionUser,
    canvas: RasterImage,
    editor: Editor,
    lock_reason: Option<String>,
}

impl Board {
    /// Create a board for the given local user with a background-filled
    /// canvas of the given size.
    #[must_use]
    pub fn new(local: SessionUser, width: u32, height: u32) -> Self {
        let mut board = Self {
            users: HashMap::new(),
            local,
            canvas: RasterImage::new(width, height),
            editor: Editor::Local,
            lock_reason: None,
        };
        board.reset_roster();
        board
    }

    // =========================================================================
    // ROSTER
    // =========================================================================

    /// The local user's drawing identity.
    #[must_use]
    pub fn local_user(&self) -> UserId {
        self.local.id
    }

    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&BoardUser> {
        self.users.get(&id)
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn users(&self) -> impl Iterator<Item = &BoardUser> {
        self.users.values()
    }

    pub fn add_user(&mut self, user: SessionUser) {
        self.users.insert(
            user.id,
            BoardUser { id: user.id, name: user.name, brush: Brush::default(), anchor: None },
        );
    }

    pub fn remove_user(&mut self, id: UserId) {
        if self.users.remove(&id).is_none() {
            debug!(%id, "removed unknown user");
        }
    }

    /// Reset the roster to the local user only.
    pub fn reset_roster(&mut self) {
        self.users.clear();
        self.add_user(self.local.clone());
    }

    // =========================================================================
    // REMOTE DRAWING
    // =========================================================================

    pub fn set_user_brush(&mut self, id: UserId, brush: Brush) {
        let Some(user) = self.users.get_mut(&id) else {
            debug!(%id, "brush for unknown user dropped");
            return;
        };
        user.brush = brush;
    }

    /// Apply one stroke point for a user: a dab on first contact, a line
    /// segment from the previous anchor otherwise.
    pub fn user_stroke(&mut self, id: UserId, point: Point) {
        let Some(user) = self.users.get_mut(&id) else {
            debug!(%id, "stroke for unknown user dropped");
            return;
        };
        let brush = user.brush;
        match user.anchor.replace(point) {
            Some(previous) => self.canvas.paint_line(previous, point, brush),
            None => self.canvas.paint_dab(point, brush),
        }
    }

    pub fn user_stroke_end(&mut self, id: UserId) {
        let Some(user) = self.users.get_mut(&id) else {
            debug!(%id, "stroke end for unknown user dropped");
            return;
        };
        user.anchor = None;
    }

    /// Drop every unfinished stroke anchor.
    pub fn clear_previews(&mut self) {
        for user in self.users.values_mut() {
            user.anchor = None;
        }
    }

    // =========================================================================
    // CANVAS
    // =========================================================================

    #[must_use]
    pub fn image(&self) -> &RasterImage {
        &self.canvas
    }

    /// Replace the canvas contents with a downloaded snapshot.
    pub fn install_image(&mut self, image: RasterImage) {
        self.canvas = image;
    }

    // =========================================================================
    // LOCK MIRROR
    // =========================================================================

    pub fn lock(&mut self, reason: &str) {
        self.lock_reason = Some(reason.to_string());
    }

    pub fn unlock(&mut self) {
        self.lock_reason = None;
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock_reason.is_some()
    }

    #[must_use]
    pub fn lock_reason(&self) -> Option<&str> {
        self.lock_reason.as_deref()
    }

    // =========================================================================
    // EDITOR
    // =========================================================================

    pub fn use_local_editor(&mut self) {
        self.editor = Editor::Local;
    }

    pub fn use_session_editor(&mut self, commands: mpsc::UnboundedSender<ClientCommand>) {
        self.editor = Editor::Session { commands };
    }

    #[must_use]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Begin a local stroke with the given brush.
    pub fn begin_stroke(&mut self, brush: Brush, point: Point) {
        if let Editor::Session { commands } = &self.editor {
            Editor::send(commands, ClientCommand::ToolSelect { brush });
            Editor::send(commands, ClientCommand::Stroke { point });
            return;
        }
        let local = self.local.id;
        self.set_user_brush(local, brush);
        self.user_stroke(local, point);
    }

    /// Extend the local stroke to the given point.
    pub fn continue_stroke(&mut self, point: Point) {
        if let Editor::Session { commands } = &self.editor {
            Editor::send(commands, ClientCommand::Stroke { point });
            return;
        }
        let local = self.local.id;
        self.user_stroke(local, point);
    }

    /// Finish the local stroke.
    pub fn end_stroke(&mut self) {
        if let Editor::Session { commands } = &self.editor {
            Editor::send(commands, ClientCommand::StrokeEnd);
            return;
        }
        let local = self.local.id;
        self.user_stroke_end(local);
    }
}

#[cfg(test)]
pub mod test_helpers {
    use uuid::Uuid;

    use super::*;

    /// A small board owned by a fresh local user.
    #[must_use]
    pub fn test_board(width: u32, height: u32) -> Board {
        Board::new(local_user(), width, height)
    }

    #[must_use]
    pub fn local_user() -> SessionUser {
        SessionUser { id: Uuid::new_v4(), name: "local".to_string() }
    }

    #[must_use]
    pub fn remote_user(name: &str) -> SessionUser {
        SessionUser { id: Uuid::new_v4(), name: name.to_string() }
    }
}
