//! The draw/sync interleaving state machine.
//!
//! ARCHITECTURE
//! ============
//! Local pointer input and session sync traffic arrive on independent
//! schedules, and a canvas snapshot must never be captured or the board
//! locked while a stroke is in flight. `SyncMachine` is the single authority
//! on that ordering: every transition takes one event, updates four private
//! state bits (`pen_down`, `upload_requested`, `wait_requested`, `locked`),
//! and returns the effects the caller must execute. The machine itself
//! performs no I/O and knows nothing about boards, tools, or sessions, which
//! keeps every interleaving testable in isolation.
//!
//! DESIGN
//! ======
//! Sync requests arriving mid-stroke are deferred: they arm a pending flag
//! instead of acting, and the next pointer-up consumes at most one of them,
//! upload first. Both flags disarm at that pointer-up regardless of which
//! was honored; a discarded wait is the session's to re-issue. Requests
//! arriving while idle act immediately. The lock is edge-triggered, while
//! the pause acknowledgment fires on every honored wait so the session can
//! always make progress.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

/// Side effects requested by a transition, executed by the caller in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Begin a stroke with the active tool at the pointer position.
    BeginStroke,
    /// Forward pointer motion to the active stroke.
    ContinueStroke,
    /// End the active stroke.
    EndStroke,
    /// Tell observers the canvas now differs from its last known state.
    MarkDirty,
    /// Encode the canvas and hand it to the session.
    SendSnapshot,
    /// Lock the board for a synchronization hand-off.
    Lock,
    /// Tell the session local edits are suspended.
    AcknowledgeSync,
    /// Release the board lock.
    Unlock,
}

/// Pointer and synchronization state for one client.
#[derive(Debug, Clone, Default)]
pub struct SyncMachine {
    pen_down: bool,
    upload_requested: bool,
    wait_requested: bool,
    locked: bool,
}

impl SyncMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mutating stroke is in progress.
    #[must_use]
    pub fn pen_down(&self) -> bool {
        self.pen_down
    }

    /// A snapshot upload is armed for the next pointer-up.
    #[must_use]
    pub fn upload_requested(&self) -> bool {
        self.upload_requested
    }

    /// A sync pause is armed for the next pointer-up.
    #[must_use]
    pub fn wait_requested(&self) -> bool {
        self.wait_requested
    }

    /// The board is locked for a hand-off.
    #[must_use]
    pub fn locked(&self) -> bool {
        self.locked
    }

    // =========================================================================
    // POINTER EVENTS
    // =========================================================================

    /// Pointer pressed. `read_only` describes the active tool.
    ///
    /// While locked, only read-only tools are admitted. Read-only gestures
    /// never count as strokes, so they neither set `pen_down` nor dirty the
    /// canvas.
    pub fn pointer_down(&mut self, read_only: bool) -> Vec<Effect> {
        if self.pen_down {
            return Vec::new();
        }
        if self.locked && !read_only {
            return Vec::new();
        }
        if read_only {
            return vec![Effect::BeginStroke];
        }
        self.pen_down = true;
        vec![Effect::BeginStroke, Effect::MarkDirty]
    }

    /// Pointer moved while pressed.
    pub fn pointer_move(&mut self, read_only: bool) -> Vec<Effect> {
        if read_only {
            return vec![Effect::ContinueStroke];
        }
        if self.pen_down && !self.locked {
            return vec![Effect::ContinueStroke];
        }
        Vec::new()
    }

    /// Pointer released. Ends the open stroke, consumes at most one deferred
    /// sync obligation, upload before wait, and disarms both.
    ///
    /// A release with no stroke open (read-only gestures, presses swallowed
    /// by the lock) is inert.
    pub fn pointer_up(&mut self) -> Vec<Effect> {
        if !self.pen_down {
            return Vec::new();
        }
        self.pen_down = false;
        let mut effects = vec![Effect::EndStroke];
        if self.upload_requested {
            effects.push(Effect::SendSnapshot);
        } else if self.wait_requested {
            // locked is always false here: a lock can only arrive deferred
            // while drawing, and that deferral lands exactly at this point.
            self.locked = true;
            effects.push(Effect::Lock);
            effects.push(Effect::AcknowledgeSync);
        }
        self.upload_requested = false;
        self.wait_requested = false;
        effects
    }

    // =========================================================================
    // SESSION EVENTS
    // =========================================================================

    /// The session asked this client for a canvas snapshot.
    pub fn upload_request(&mut self) -> Vec<Effect> {
        if self.pen_down {
            self.upload_requested = true;
            return Vec::new();
        }
        vec![Effect::SendSnapshot]
    }

    /// The session asked this client to pause local edits.
    pub fn wait_request(&mut self) -> Vec<Effect> {
        if self.pen_down {
            self.wait_requested = true;
            return Vec::new();
        }
        let mut effects = Vec::new();
        if !self.locked {
            self.locked = true;
            effects.push(Effect::Lock);
        }
        effects.push(Effect::AcknowledgeSync);
        effects
    }

    /// The hand-off finished, successfully or not. Clears any armed wait;
    /// a completed sync cancels a pending pause.
    pub fn sync_done(&mut self) -> Vec<Effect> {
        self.wait_requested = false;
        if self.locked {
            self.locked = false;
            return vec![Effect::Unlock];
        }
        Vec::new()
    }

    /// Full reset on disconnect, session error, or part.
    pub fn reset(&mut self) -> Vec<Effect> {
        self.pen_down = false;
        self.upload_requested = false;
        self.wait_requested = false;
        if self.locked {
            self.locked = false;
            return vec![Effect::Unlock];
        }
        Vec::new()
    }
}
