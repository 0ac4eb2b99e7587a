use super::*;
use crate::brush::BLACK;
use crate::protocol::RASTER_CHUNK_SIZE;

fn peer() -> (SessionPeer, mpsc::UnboundedReceiver<ClientCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let info = SessionInfo { id: Uuid::new_v4(), title: "sketching".to_string() };
    let users = vec![
        SessionUser { id: Uuid::new_v4(), name: "ada".to_string() },
        SessionUser { id: Uuid::new_v4(), name: "brin".to_string() },
    ];
    (SessionPeer::new(info, users, tx), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ClientCommand>) -> Vec<ClientCommand> {
    let mut commands = Vec::new();
    while let Ok(command) = rx.try_recv() {
        commands.push(command);
    }
    commands
}

// --- Membership ---

#[test]
fn initial_membership_from_constructor() {
    let (peer, _rx) = peer();
    assert_eq!(peer.user_count(), 2);
    assert_eq!(peer.title(), "sketching");
}

#[test]
fn user_joined_adds_member_and_yields_event() {
    let (mut peer, _rx) = peer();
    let user_id = Uuid::new_v4();
    let event = peer.handle_message(SessionMessage::UserJoined {
        user_id,
        name: "cleo".to_string(),
    });
    assert_eq!(
        event,
        Some(SessionEvent::UserJoined(SessionUser { id: user_id, name: "cleo".to_string() }))
    );
    assert_eq!(peer.user_count(), 3);
}

#[test]
fn user_left_removes_member_and_yields_event() {
    let (mut peer, _rx) = peer();
    let gone = peer.users().next().expect("seeded user").id;
    let event = peer.handle_message(SessionMessage::UserLeft { user_id: gone });
    assert_eq!(event, Some(SessionEvent::UserLeft(gone)));
    assert_eq!(peer.user_count(), 1);
}

// --- Event translation ---

#[test]
fn sync_lifecycle_messages_translate_directly() {
    let (mut peer, _rx) = peer();
    assert_eq!(
        peer.handle_message(SessionMessage::SyncRequest),
        Some(SessionEvent::SnapshotUploadRequested)
    );
    assert_eq!(
        peer.handle_message(SessionMessage::SyncWait),
        Some(SessionEvent::SyncPauseRequested)
    );
    assert_eq!(peer.handle_message(SessionMessage::SyncDone), Some(SessionEvent::SyncResumed));
}

#[test]
fn stroke_messages_carry_user_and_point() {
    let (mut peer, _rx) = peer();
    let user_id = Uuid::new_v4();
    assert_eq!(
        peer.handle_message(SessionMessage::Stroke { user_id, point: Point::new(1.0, 2.0) }),
        Some(SessionEvent::StrokeReceived(user_id, Point::new(1.0, 2.0)))
    );
    assert_eq!(
        peer.handle_message(SessionMessage::ToolSelect { user_id, brush: Brush::new(3, BLACK) }),
        Some(SessionEvent::ToolChanged(user_id, Brush::new(3, BLACK)))
    );
    assert_eq!(
        peer.handle_message(SessionMessage::StrokeEnd { user_id }),
        Some(SessionEvent::StrokeEndReceived(user_id))
    );
}

// --- Raster download ---

fn progress_of(event: Option<SessionEvent>) -> u8 {
    match event {
        Some(SessionEvent::SnapshotDownloadProgress(p)) => p,
        other => panic!("expected progress event, got {other:?}"),
    }
}

#[test]
fn download_progress_is_monotonic_and_ends_at_100() {
    let (mut peer, _rx) = peer();
    let bytes = vec![5u8; RASTER_CHUNK_SIZE * 2];

    let total = u32::try_from(bytes.len()).expect("fits");
    let start = peer.handle_message(SessionMessage::RasterStart { total });
    assert_eq!(progress_of(start), 0);

    let half = peer.handle_message(SessionMessage::Raster {
        chunk: bytes[..RASTER_CHUNK_SIZE].to_vec(),
    });
    assert_eq!(progress_of(half), 50);

    let done = peer.handle_message(SessionMessage::Raster {
        chunk: bytes[RASTER_CHUNK_SIZE..].to_vec(),
    });
    assert_eq!(progress_of(done), 100);
}

#[test]
fn zero_total_reports_complete_immediately() {
    let (mut peer, _rx) = peer();
    let start = peer.handle_message(SessionMessage::RasterStart { total: 0 });
    assert_eq!(progress_of(start), 100);
}

#[test]
fn chunk_without_transfer_is_swallowed() {
    let (mut peer, _rx) = peer();
    assert_eq!(peer.handle_message(SessionMessage::Raster { chunk: vec![1, 2, 3] }), None);
}

#[test]
fn session_image_decodes_completed_transfer() {
    let (mut peer, _rx) = peer();
    let mut image = crate::raster::RasterImage::new(10, 6);
    image.set_pixel(3, 3, BLACK);
    let png = image.encode_png().expect("encode");

    peer.handle_message(SessionMessage::RasterStart {
        total: u32::try_from(png.len()).expect("fits"),
    });
    peer.handle_message(SessionMessage::Raster { chunk: png });

    let decoded = peer.session_image().expect("decode");
    assert_eq!(decoded, image);
}

#[test]
fn session_image_before_transfer_fails() {
    let (peer, _rx) = peer();
    assert!(matches!(peer.session_image(), Err(SessionError::NoTransfer)));
}

#[test]
fn session_image_short_transfer_fails() {
    let (mut peer, _rx) = peer();
    peer.handle_message(SessionMessage::RasterStart { total: 100 });
    peer.handle_message(SessionMessage::Raster { chunk: vec![0; 40] });
    assert!(matches!(
        peer.session_image(),
        Err(SessionError::RasterIncomplete { received: 40, expected: 100 })
    ));
}

#[test]
fn session_image_undecodable_bytes_fail() {
    let (mut peer, _rx) = peer();
    peer.handle_message(SessionMessage::RasterStart { total: 4 });
    peer.handle_message(SessionMessage::Raster { chunk: vec![9, 9, 9, 9] });
    assert!(matches!(peer.session_image(), Err(SessionError::Raster(_))));
}

#[test]
fn release_raster_drops_buffer() {
    let (mut peer, _rx) = peer();
    peer.handle_message(SessionMessage::RasterStart { total: 4 });
    peer.release_raster();
    assert!(matches!(peer.session_image(), Err(SessionError::NoTransfer)));
}

// --- Outbound ---

#[test]
fn send_snapshot_chunks_onto_channel() {
    let (peer, mut rx) = peer();
    let png = vec![8u8; RASTER_CHUNK_SIZE + 10];
    peer.send_snapshot(&png);

    let commands = drain(&mut rx);
    assert_eq!(commands.len(), 3);
    assert_eq!(
        commands[0],
        ClientCommand::RasterStart { total: u32::try_from(png.len()).expect("fits") }
    );
}

#[test]
fn acknowledge_sync_pause_sends_ack() {
    let (peer, mut rx) = peer();
    peer.acknowledge_sync_pause();
    assert_eq!(drain(&mut rx), vec![ClientCommand::SyncAck]);
}

#[test]
fn sends_after_transport_drop_are_quiet() {
    let (peer, rx) = peer();
    drop(rx);
    peer.acknowledge_sync_pause();
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(SessionError::NoTransfer.error_code(), "E_NO_TRANSFER");
    assert_eq!(
        SessionError::RasterIncomplete { received: 1, expected: 2 }.error_code(),
        "E_RASTER_INCOMPLETE"
    );
    assert!(SessionError::RasterIncomplete { received: 1, expected: 2 }.retryable());
    assert!(!SessionError::NoTransfer.retryable());
}
