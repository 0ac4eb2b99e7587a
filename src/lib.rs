//! Client-side orchestration for real-time shared-canvas sessions.
//!
//! This crate owns everything between the embedding application's pointer
//! events and the session wire: a board that paints locally or routes strokes
//! into the session, a state machine that interleaves drawing with canvas
//! hand-offs, and a controller that executes the machine's decisions. The
//! embedding application supplies the transport (sockets, login, reconnects)
//! and the rendering surface; this crate supplies the rules.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | Top-level orchestrator and its notification events |
//! | [`dispatch`] | Async loop feeding the input and network lanes to the controller |
//! | [`sync`] | The draw/sync interleaving state machine |
//! | [`board`] | Shared canvas state, user roster, and the editor seam |
//! | [`session`] | Joined-session peer: membership, sync traffic, raster transfers |
//! | [`connection`] | Transport lifecycle vocabulary and address parsing |
//! | [`protocol`] | Wire message vocabulary and raster chunking |
//! | [`tools`] | Tool vocabulary and active brush settings |
//! | [`raster`] | RGBA canvas buffer and the PNG snapshot codec |
//! | [`journal`] | In-memory moderation journal with queries |
//! | [`brush`] | Brush data |
//! | [`point`] | Canvas-space points |

pub mod board;
pub mod brush;
pub mod connection;
pub mod controller;
pub mod dispatch;
pub mod journal;
pub mod point;
pub mod protocol;
pub mod raster;
pub mod session;
pub mod sync;
pub mod tools;
