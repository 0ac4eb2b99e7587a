//! Wire vocabulary for session traffic.
//!
//! ARCHITECTURE
//! ============
//! Two tagged enums cover everything that crosses the session boundary:
//! `SessionMessage` for traffic delivered to this client and `ClientCommand`
//! for traffic this client emits. Both serialize with an internal `type` tag
//! so transports can frame them as JSON without inspecting payloads. Byte
//! layout beyond that is the transport's concern.
//!
//! DESIGN
//! ======
//! Snapshots travel as a `RasterStart { total }` announcement followed by
//! `Raster { chunk }` pieces of at most `RASTER_CHUNK_SIZE` bytes, so the
//! receiving side can derive monotonic download progress from byte counts
//! alone.

#[cfg(test)]
#[path = "protocol_test.rs"]
mod protocol_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::brush::Brush;
use crate::point::Point;

/// Unique identifier for a session participant.
pub type UserId = Uuid;

/// Maximum payload of one raster chunk, in bytes.
pub const RASTER_CHUNK_SIZE: usize = 8192;

/// Grepable error code and retryable flag for errors crossing the crate
/// boundary.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Messages delivered by the session to this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionMessage {
    /// A participant entered the session.
    UserJoined { user_id: UserId, name: String },
    /// A participant left the session.
    UserLeft { user_id: UserId },
    /// A participant selected a brush for their next strokes.
    ToolSelect { user_id: UserId, brush: Brush },
    /// One stroke point from a participant (the local user's echoes included).
    Stroke { user_id: UserId, point: Point },
    /// A participant lifted their pen.
    StrokeEnd { user_id: UserId },
    /// The session asks this client to supply a canvas snapshot.
    SyncRequest,
    /// The session asks this client to pause local edits for a hand-off.
    SyncWait,
    /// The hand-off completed; local edits may resume.
    SyncDone,
    /// A snapshot download begins; `total` is the encoded byte count.
    RasterStart { total: u32 },
    /// One piece of the snapshot being downloaded.
    Raster { chunk: Vec<u8> },
}

/// Commands sent from this client toward the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Select the brush for the local user's next strokes.
    ToolSelect { brush: Brush },
    /// One stroke point from the local user.
    Stroke { point: Point },
    /// The local user lifted their pen.
    StrokeEnd,
    /// Acknowledge a sync pause: local edits are now suspended.
    SyncAck,
    /// A snapshot upload begins; `total` is the encoded byte count.
    RasterStart { total: u32 },
    /// One piece of the snapshot being uploaded.
    Raster { chunk: Vec<u8> },
}

/// Split an encoded snapshot into its chunked upload commands.
#[must_use]
pub fn chunk_raster(bytes: &[u8]) -> Vec<ClientCommand> {
    let total = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    let mut commands = Vec::with_capacity(bytes.len() / RASTER_CHUNK_SIZE + 2);
    commands.push(ClientCommand::RasterStart { total });
    for chunk in bytes.chunks(RASTER_CHUNK_SIZE) {
        commands.push(ClientCommand::Raster { chunk: chunk.to_vec() });
    }
    commands
}
