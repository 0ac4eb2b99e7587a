//! Session peer: membership bookkeeping, wire-message translation, and the
//! raster transfer buffer.
//!
//! ARCHITECTURE
//! ============
//! One `SessionPeer` represents one joined collaborative session. Inbound
//! wire messages go through `handle_message`, which keeps the membership map
//! and raster download buffer current and yields at most one `SessionEvent`
//! for the controller. Outbound traffic goes onto an unbounded command
//! channel whose receiving end belongs to the transport; sending never
//! blocks and never fails loudly (a closed channel means a disconnect is
//! already on its way).
//!
//! LIFECYCLE
//! =========
//! The peer is constructed by the login layer once a session is entered,
//! handed to the controller on join, and dropped on part or disconnect. The
//! raster buffer lives only for the duration of one snapshot download.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::brush::Brush;
use crate::point::Point;
use crate::protocol::{ClientCommand, ErrorCode, SessionMessage, UserId, chunk_raster};
use crate::raster::{RasterError, RasterImage};

/// Identity of a joined session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: Uuid,
    pub title: String,
}

/// One session participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
}

/// Session-scoped events surfaced to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    UserJoined(SessionUser),
    UserLeft(UserId),
    ToolChanged(UserId, Brush),
    StrokeReceived(UserId, Point),
    StrokeEndReceived(UserId),
    SnapshotUploadRequested,
    SyncPauseRequested,
    SyncResumed,
    SnapshotDownloadProgress(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("raster transfer incomplete: {received} of {expected} bytes")]
    RasterIncomplete { received: usize, expected: usize },
    #[error("no raster transfer in progress")]
    NoTransfer,
    #[error(transparent)]
    Raster(#[from] RasterError),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RasterIncomplete { .. } => "E_RASTER_INCOMPLETE",
            Self::NoTransfer => "E_NO_TRANSFER",
            Self::Raster(err) => err.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        !matches!(self, Self::NoTransfer)
    }
}

/// Accumulates one inbound snapshot.
#[derive(Debug)]
struct RasterBuffer {
    expected: usize,
    data: Vec<u8>,
}

impl RasterBuffer {
    /// Download progress in percent, complete when all announced bytes are in.
    fn progress(&self) -> u8 {
        if self.expected == 0 {
            return 100;
        }
        let percent = self.data.len().min(self.expected) * 100 / self.expected;
        u8::try_from(percent).unwrap_or(100)
    }
}

/// One joined collaborative session.
#[derive(Debug)]
pub struct SessionPeer {
    info: SessionInfo,
    users: HashMap<UserId, SessionUser>,
    commands: mpsc::UnboundedSender<ClientCommand>,
    raster: Option<RasterBuffer>,
}

impl SessionPeer {
    #[must_use]
    pub fn new(
        info: SessionInfo,
        users: Vec<SessionUser>,
        commands: mpsc::UnboundedSender<ClientCommand>,
    ) -> Self {
        let users = users.into_iter().map(|user| (user.id, user)).collect();
        Self { info, users, commands, raster: None }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.info.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.info.title
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn users(&self) -> impl Iterator<Item = &SessionUser> {
        self.users.values()
    }

    /// A clone of the outbound command channel, for the session editor.
    #[must_use]
    pub fn command_sender(&self) -> mpsc::UnboundedSender<ClientCommand> {
        self.commands.clone()
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Apply one inbound message and translate it into a session event.
    ///
    /// Returns `None` for messages that only update internal state (an
    /// unexpected raster chunk, for example).
    pub fn handle_message(&mut self, message: SessionMessage) -> Option<SessionEvent> {
        match message {
            SessionMessage::UserJoined { user_id, name } => {
                let user = SessionUser { id: user_id, name };
                self.users.insert(user_id, user.clone());
                debug!(%user_id, users = self.users.len(), "user joined session");
                Some(SessionEvent::UserJoined(user))
            }
            SessionMessage::UserLeft { user_id } => {
                self.users.remove(&user_id);
                debug!(%user_id, users = self.users.len(), "user left session");
                Some(SessionEvent::UserLeft(user_id))
            }
            SessionMessage::ToolSelect { user_id, brush } => {
                Some(SessionEvent::ToolChanged(user_id, brush))
            }
            SessionMessage::Stroke { user_id, point } => {
                Some(SessionEvent::StrokeReceived(user_id, point))
            }
            SessionMessage::StrokeEnd { user_id } => {
                Some(SessionEvent::StrokeEndReceived(user_id))
            }
            SessionMessage::SyncRequest => Some(SessionEvent::SnapshotUploadRequested),
            SessionMessage::SyncWait => Some(SessionEvent::SyncPauseRequested),
            SessionMessage::SyncDone => Some(SessionEvent::SyncResumed),
            SessionMessage::RasterStart { total } => {
                let expected = usize::try_from(total).unwrap_or(usize::MAX);
                let buffer = RasterBuffer { expected, data: Vec::new() };
                let progress = buffer.progress();
                self.raster = Some(buffer);
                Some(SessionEvent::SnapshotDownloadProgress(progress))
            }
            SessionMessage::Raster { chunk } => {
                let Some(buffer) = self.raster.as_mut() else {
                    warn!(bytes = chunk.len(), "raster chunk with no transfer in progress");
                    return None;
                };
                buffer.data.extend_from_slice(&chunk);
                Some(SessionEvent::SnapshotDownloadProgress(buffer.progress()))
            }
        }
    }

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    fn send(&self, command: ClientCommand) {
        if self.commands.send(command).is_err() {
            debug!("session command channel closed");
        }
    }

    /// Chunk an encoded snapshot onto the command channel.
    pub fn send_snapshot(&self, png: &[u8]) {
        debug!(bytes = png.len(), "sending snapshot");
        for command in chunk_raster(png) {
            self.send(command);
        }
    }

    /// Tell the session this client has suspended local edits.
    pub fn acknowledge_sync_pause(&self) {
        self.send(ClientCommand::SyncAck);
    }

    // =========================================================================
    // DOWNLOAD BUFFER
    // =========================================================================

    /// Decode the completed snapshot download.
    ///
    /// # Errors
    ///
    /// Returns an error if no transfer is in progress, the transfer is short
    /// of its announced size, or the bytes do not decode to a usable image.
    pub fn session_image(&self) -> Result<RasterImage, SessionError> {
        let Some(buffer) = self.raster.as_ref() else {
            return Err(SessionError::NoTransfer);
        };
        if buffer.data.len() < buffer.expected {
            return Err(SessionError::RasterIncomplete {
                received: buffer.data.len(),
                expected: buffer.expected,
            });
        }
        Ok(RasterImage::decode_png(&buffer.data)?)
    }

    /// Drop the snapshot transfer buffer.
    pub fn release_raster(&mut self) {
        self.raster = None;
    }
}
