//! Session controller: executes sync-machine effects and orchestrates the
//! board, tools, session peer, and connection lifecycle.
//!
//! ARCHITECTURE
//! ============
//! The controller is the only writer of shared state. Pointer input and
//! session/connection events feed the `SyncMachine`, and the effect lists it
//! returns are executed here: painting through the board's editor, encoding
//! and chunking snapshots toward the session, locking and unlocking the
//! board. Everything observers need to know leaves through one unbounded
//! event channel.
//!
//! LIFECYCLE
//! =========
//! A board is installed once, before any session exists. Sessions come and
//! go: join swaps the board's editor to session-bound and rebuilds the
//! roster, part swaps back and force-unlocks. A disconnect or connection
//! error runs the part flow (when joined) and then resets the machine, so no
//! state outlives the connection that created it.
//!
//! ERROR HANDLING
//! ==============
//! Transport and protocol failures never propagate out of the controller;
//! they are converted to notification events (`DisconnectedWith`,
//! `NetworkError`, `SyncFailed`) and journal entries. A failed snapshot
//! download aborts the hand-off, keeps the canvas at its last good state,
//! and unlocks the board so the session can retry.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::brush::Brush;
use crate::connection::ConnectionEvent;
use crate::journal::{LogEntry, LogLevel, LogTopic, LogUser, SessionJournal};
use crate::point::Point;
use crate::protocol::{SessionMessage, UserId};
use crate::session::{SessionEvent, SessionPeer, SessionUser};
use crate::sync::{Effect, SyncMachine};
use crate::tools::{ToolBox, ToolKind};

/// Reason string surfaced while the board is locked for a hand-off.
pub const SYNC_LOCK_REASON: &str = "Synchronizing new user";

/// Notifications for external observers.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Entered a session with the given title.
    Joined { title: String },
    /// Left the session.
    Parted,
    /// The canvas differs from its last known state.
    Changed,
    /// The board locked for a synchronization hand-off.
    BoardLocked { reason: String },
    /// The board lock was released.
    BoardUnlocked,
    /// Snapshot download progress, 0 to 100.
    DownloadProgress { percent: u8 },
    /// The transport connected and logged in.
    ConnectedTo { address: String },
    /// The transport disconnected.
    DisconnectedWith { reason: String },
    /// The transport or peer reported an error.
    NetworkError { message: String },
    /// A snapshot hand-off failed; the canvas keeps its last good state.
    SyncFailed { message: String },
}

/// The client-side orchestrator. One per connection.
#[derive(Debug)]
pub struct Controller {
    local: SessionUser,
    board: Option<Board>,
    tools: ToolBox,
    machine: SyncMachine,
    session: Option<SessionPeer>,
    journal: SessionJournal,
    events: mpsc::UnboundedSender<ControllerEvent>,
}

impl Controller {
    #[must_use]
    pub fn new(local: SessionUser, events: mpsc::UnboundedSender<ControllerEvent>) -> Self {
        Self {
            local,
            board: None,
            tools: ToolBox::new(),
            machine: SyncMachine::new(),
            session: None,
            journal: SessionJournal::default(),
            events,
        }
    }

    /// Install the board this controller drives. Must happen before any
    /// session is joined.
    pub fn set_board(&mut self, board: Board) {
        self.board = Some(board);
    }

    #[must_use]
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&SessionPeer> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn sync(&self) -> &SyncMachine {
        &self.machine
    }

    #[must_use]
    pub fn journal(&self) -> &SessionJournal {
        &self.journal
    }

    #[must_use]
    pub fn tools(&self) -> &ToolBox {
        &self.tools
    }

    #[must_use]
    pub fn local_user(&self) -> UserId {
        self.local.id
    }

    pub fn select_tool(&mut self, kind: ToolKind) {
        self.tools.select(kind);
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.tools.set_brush(brush);
    }

    // =========================================================================
    // POINTER INPUT
    // =========================================================================

    pub fn pen_down(&mut self, point: Point) {
        let read_only = self.tools.active().is_read_only();
        let effects = self.machine.pointer_down(read_only);
        self.run_effects(effects, Some(point));
    }

    pub fn pen_move(&mut self, point: Point) {
        let read_only = self.tools.active().is_read_only();
        let effects = self.machine.pointer_move(read_only);
        self.run_effects(effects, Some(point));
    }

    pub fn pen_up(&mut self) {
        let effects = self.machine.pointer_up();
        self.run_effects(effects, None);
    }

    // =========================================================================
    // SESSION LIFECYCLE
    // =========================================================================

    /// Enter a session: rebuild the roster from the peer's membership, swap
    /// in a session-bound editor, and announce the join.
    ///
    /// Joining while already in a session parts the old session first.
    ///
    /// # Panics
    ///
    /// Panics if no board has been installed; a board must exist before any
    /// session does.
    pub fn join_session(&mut self, peer: SessionPeer) {
        if self.session.is_some() {
            self.part_session();
        }
        let Some(board) = self.board.as_mut() else {
            panic!("a board must be installed before joining a session");
        };
        board.reset_roster();
        for user in peer.users() {
            board.add_user(user.clone());
        }
        board.use_session_editor(peer.command_sender());
        info!(session_id = %peer.id(), title = %peer.title(), users = peer.user_count(), "joined session");
        self.journal.record(
            LogEntry::about(LogLevel::Info, LogTopic::Join)
                .session(peer.id())
                .user(self.local_log_user())
                .message("joined session"),
        );
        self.emit(ControllerEvent::Joined { title: peer.title().to_string() });
        self.session = Some(peer);
    }

    /// Leave the current session and return to solo editing. A no-op when
    /// not in a session. The board never stays locked past a part.
    pub fn part_session(&mut self) {
        let Some(peer) = self.session.take() else {
            return;
        };
        if let Some(board) = self.board.as_mut() {
            // Resetting the roster also drops every stroke anchor.
            board.reset_roster();
            board.use_local_editor();
        }
        info!(session_id = %peer.id(), "parted session");
        self.journal.record(
            LogEntry::about(LogLevel::Info, LogTopic::Leave)
                .session(peer.id())
                .user(self.local_log_user())
                .message("left session"),
        );
        self.emit(ControllerEvent::Parted);
        let effects = self.machine.reset();
        self.run_effects(effects, None);
    }

    // =========================================================================
    // SESSION EVENTS
    // =========================================================================

    /// Feed one inbound wire message through the session peer and react to
    /// the event it yields. Messages arriving with no active session are
    /// dropped.
    pub fn handle_session_message(&mut self, message: SessionMessage) {
        let Some(peer) = self.session.as_mut() else {
            debug!("session message with no active session dropped");
            return;
        };
        let Some(event) = peer.handle_message(message) else {
            return;
        };
        self.handle_session_event(event);
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::UserJoined(user) => {
                info!(user_id = %user.id, name = %user.name, "user joined session");
                if let Some(board) = self.board.as_mut() {
                    board.add_user(user.clone());
                }
                let entry = LogEntry::about(LogLevel::Info, LogTopic::Join)
                    .user(LogUser { id: user.id, name: user.name, remote_addr: None })
                    .message("joined session");
                self.record_in_session(entry);
            }
            SessionEvent::UserLeft(user_id) => {
                info!(%user_id, "user left session");
                let name = self
                    .board
                    .as_ref()
                    .and_then(|board| board.user(user_id))
                    .map(|user| user.name.clone())
                    .unwrap_or_default();
                if let Some(board) = self.board.as_mut() {
                    board.remove_user(user_id);
                }
                let entry = LogEntry::about(LogLevel::Info, LogTopic::Leave)
                    .user(LogUser { id: user_id, name, remote_addr: None })
                    .message("left session");
                self.record_in_session(entry);
            }
            SessionEvent::ToolChanged(user_id, brush) => {
                if let Some(board) = self.board.as_mut() {
                    board.set_user_brush(user_id, brush);
                }
            }
            SessionEvent::StrokeReceived(user_id, point) => {
                if let Some(board) = self.board.as_mut() {
                    board.user_stroke(user_id, point);
                }
            }
            SessionEvent::StrokeEndReceived(user_id) => {
                if let Some(board) = self.board.as_mut() {
                    board.user_stroke_end(user_id);
                }
            }
            SessionEvent::SnapshotUploadRequested => {
                let effects = self.machine.upload_request();
                self.run_effects(effects, None);
            }
            SessionEvent::SyncPauseRequested => {
                let effects = self.machine.wait_request();
                self.run_effects(effects, None);
            }
            SessionEvent::SyncResumed => {
                let effects = self.machine.sync_done();
                self.run_effects(effects, None);
            }
            SessionEvent::SnapshotDownloadProgress(percent) => {
                self.raster_progress(percent);
            }
        }
    }

    // =========================================================================
    // CONNECTION LIFECYCLE
    // =========================================================================

    pub fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected { address } => {
                info!(%address, "connected");
                self.journal.record(
                    LogEntry::about(LogLevel::Info, LogTopic::Status)
                        .message(format!("connected to {address}")),
                );
                self.emit(ControllerEvent::ConnectedTo { address });
            }
            ConnectionEvent::Disconnected { reason } => {
                info!(%reason, "disconnected");
                self.part_session();
                let effects = self.machine.reset();
                self.run_effects(effects, None);
                self.journal.record(
                    LogEntry::about(LogLevel::Info, LogTopic::Status)
                        .message(format!("disconnected: {reason}")),
                );
                self.emit(ControllerEvent::DisconnectedWith { reason });
            }
            ConnectionEvent::Error { message } => {
                warn!(%message, "connection error");
                self.journal.record(
                    LogEntry::about(LogLevel::Warn, LogTopic::Status)
                        .message(format!("connection error: {message}")),
                );
                self.emit(ControllerEvent::NetworkError { message });
                self.part_session();
                let effects = self.machine.reset();
                self.run_effects(effects, None);
            }
        }
    }

    // =========================================================================
    // EFFECTS
    // =========================================================================

    fn run_effects(&mut self, effects: Vec<Effect>, point: Option<Point>) {
        for effect in effects {
            match effect {
                Effect::BeginStroke => {
                    let Some(point) = point else { continue };
                    let Some(brush) = self.tools.stroke_brush() else { continue };
                    let Some(board) = self.board.as_mut() else { continue };
                    board.begin_stroke(brush, point);
                }
                Effect::ContinueStroke => {
                    let Some(point) = point else { continue };
                    if self.tools.stroke_brush().is_none() {
                        continue;
                    }
                    let Some(board) = self.board.as_mut() else { continue };
                    board.continue_stroke(point);
                }
                Effect::EndStroke => {
                    // The open stroke finishes even if the user switched
                    // tools mid-gesture.
                    let Some(board) = self.board.as_mut() else { continue };
                    board.end_stroke();
                }
                Effect::MarkDirty => self.emit(ControllerEvent::Changed),
                Effect::SendSnapshot => self.send_snapshot(),
                Effect::Lock => {
                    if let Some(board) = self.board.as_mut() {
                        board.lock(SYNC_LOCK_REASON);
                    }
                    self.emit(ControllerEvent::BoardLocked {
                        reason: SYNC_LOCK_REASON.to_string(),
                    });
                }
                Effect::AcknowledgeSync => {
                    if let Some(peer) = self.session.as_ref() {
                        peer.acknowledge_sync_pause();
                    }
                }
                Effect::Unlock => {
                    if let Some(board) = self.board.as_mut() {
                        board.unlock();
                    }
                    self.emit(ControllerEvent::BoardUnlocked);
                }
            }
        }
    }

    // =========================================================================
    // RASTER HAND-OFF
    // =========================================================================

    fn send_snapshot(&mut self) {
        let Some(peer) = self.session.as_ref() else {
            debug!("snapshot requested with no active session");
            return;
        };
        let Some(board) = self.board.as_ref() else {
            debug!("snapshot requested with no board installed");
            return;
        };
        match board.image().encode_png() {
            Ok(bytes) => {
                info!(bytes = bytes.len(), "snapshot uploaded");
                peer.send_snapshot(&bytes);
            }
            Err(err) => {
                warn!(error = %err, "snapshot encode failed");
                let entry = LogEntry::about(LogLevel::Warn, LogTopic::BadData)
                    .session(peer.id())
                    .message(format!("snapshot encode failed: {err}"));
                self.journal.record(entry);
                self.emit(ControllerEvent::SyncFailed { message: err.to_string() });
            }
        }
    }

    fn raster_progress(&mut self, percent: u8) {
        if percent >= 100 {
            self.install_snapshot();
        }
        self.emit(ControllerEvent::DownloadProgress { percent });
    }

    /// Install the completed snapshot download, or abort the hand-off if the
    /// session delivered an unusable image. The transfer buffer is released
    /// either way.
    fn install_snapshot(&mut self) {
        let result = match self.session.as_mut() {
            Some(peer) => {
                let result = peer.session_image();
                peer.release_raster();
                result
            }
            None => return,
        };
        match result {
            Ok(image) => {
                let Some(board) = self.board.as_mut() else { return };
                board.install_image(image);
                info!(
                    width = board.image().width(),
                    height = board.image().height(),
                    "snapshot installed"
                );
                self.emit(ControllerEvent::Changed);
            }
            Err(err) => {
                warn!(error = %err, "snapshot download failed");
                let mut entry = LogEntry::about(LogLevel::Warn, LogTopic::BadData)
                    .message(format!("snapshot download failed: {err}"));
                if let Some(peer) = self.session.as_ref() {
                    entry = entry.session(peer.id());
                }
                self.journal.record(entry);
                self.emit(ControllerEvent::SyncFailed { message: err.to_string() });
                let effects = self.machine.sync_done();
                self.run_effects(effects, None);
            }
        }
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn local_log_user(&self) -> LogUser {
        LogUser { id: self.local.id, name: self.local.name.clone(), remote_addr: None }
    }

    fn record_in_session(&mut self, entry: LogEntry) {
        let entry = match self.session.as_ref() {
            Some(peer) => entry.session(peer.id()),
            None => entry,
        };
        self.journal.record(entry);
    }

    fn emit(&self, event: ControllerEvent) {
        if self.events.send(event).is_err() {
            debug!("controller event channel closed");
        }
    }
}
