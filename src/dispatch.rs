//! Dispatch loop: feeds pointer input and network traffic to the controller.
//!
//! DESIGN
//! ======
//! The controller is single-writer, so all mutation funnels through one
//! task. Two unbounded lanes feed it: `InputEvent` from the embedding
//! application's UI and `NetEvent` from the transport task. The loop runs
//! until both lanes close, then hands the controller back for final
//! inspection.
//!
//! The lanes carry plain data. In particular a join arrives as the session
//! description plus the outbound command channel, and the session peer is
//! assembled here; the transport task never touches controller state.

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::brush::Brush;
use crate::connection::ConnectionEvent;
use crate::controller::Controller;
use crate::point::Point;
use crate::protocol::{ClientCommand, SessionMessage};
use crate::session::{SessionInfo, SessionPeer, SessionUser};
use crate::tools::ToolKind;

/// Pointer and tool input from the embedding application.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PenDown(Point),
    PenMove(Point),
    PenUp,
    SelectTool(ToolKind),
    SetBrush(Brush),
    /// Leave the current session and return to solo editing.
    PartSession,
}

/// Traffic from the transport task.
#[derive(Debug, Clone)]
pub enum NetEvent {
    /// Login completed: the session description, its current membership, and
    /// the channel outbound commands should be written to.
    Joined {
        info: SessionInfo,
        users: Vec<SessionUser>,
        commands: mpsc::UnboundedSender<ClientCommand>,
    },
    /// One decoded session message.
    Message(SessionMessage),
    /// The session ended this client's membership (left, kicked, or the
    /// session closed).
    Parted,
    /// Transport lifecycle change.
    Connection(ConnectionEvent),
}

/// Run the controller until both lanes close, then return it.
pub async fn run(
    mut controller: Controller,
    mut input: mpsc::UnboundedReceiver<InputEvent>,
    mut net: mpsc::UnboundedReceiver<NetEvent>,
) -> Controller {
    info!("dispatch loop started");
    loop {
        tokio::select! {
            Some(event) = input.recv() => handle_input(&mut controller, event),
            Some(event) = net.recv() => handle_net(&mut controller, event),
            else => break,
        }
    }
    info!("dispatch loop finished");
    controller
}

fn handle_input(controller: &mut Controller, event: InputEvent) {
    match event {
        InputEvent::PenDown(point) => controller.pen_down(point),
        InputEvent::PenMove(point) => controller.pen_move(point),
        InputEvent::PenUp => controller.pen_up(),
        InputEvent::SelectTool(kind) => controller.select_tool(kind),
        InputEvent::SetBrush(brush) => controller.set_brush(brush),
        InputEvent::PartSession => controller.part_session(),
    }
}

fn handle_net(controller: &mut Controller, event: NetEvent) {
    match event {
        NetEvent::Joined { info, users, commands } => {
            debug!(session_id = %info.id, "join event");
            controller.join_session(SessionPeer::new(info, users, commands));
        }
        NetEvent::Message(message) => controller.handle_session_message(message),
        NetEvent::Parted => controller.part_session(),
        NetEvent::Connection(event) => controller.handle_connection_event(event),
    }
}
