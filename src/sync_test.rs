use super::*;

fn drawing_machine() -> SyncMachine {
    let mut machine = SyncMachine::new();
    let effects = machine.pointer_down(false);
    assert_eq!(effects, vec![Effect::BeginStroke, Effect::MarkDirty]);
    machine
}

// --- Pointer basics ---

#[test]
fn fresh_machine_is_idle() {
    let machine = SyncMachine::new();
    assert!(!machine.pen_down());
    assert!(!machine.upload_requested());
    assert!(!machine.wait_requested());
    assert!(!machine.locked());
}

#[test]
fn mutating_pointer_down_starts_stroke_and_dirties() {
    let machine = drawing_machine();
    assert!(machine.pen_down());
}

#[test]
fn read_only_pointer_down_never_sets_pen_down() {
    let mut machine = SyncMachine::new();
    assert_eq!(machine.pointer_down(true), vec![Effect::BeginStroke]);
    assert!(!machine.pen_down());
}

#[test]
fn duplicate_pointer_down_is_ignored() {
    let mut machine = drawing_machine();
    assert!(machine.pointer_down(false).is_empty());
    assert!(machine.pen_down());
}

#[test]
fn motion_forwards_while_drawing() {
    let mut machine = drawing_machine();
    assert_eq!(machine.pointer_move(false), vec![Effect::ContinueStroke]);
}

#[test]
fn pointer_up_ends_stroke() {
    let mut machine = drawing_machine();
    assert_eq!(machine.pointer_up(), vec![Effect::EndStroke]);
    assert!(!machine.pen_down());
}

#[test]
fn pointer_up_without_stroke_is_inert() {
    let mut machine = SyncMachine::new();
    assert!(machine.pointer_up().is_empty());
}

// --- Lock gate ---

#[test]
fn locked_board_rejects_mutating_pointer_down() {
    let mut machine = SyncMachine::new();
    machine.wait_request();
    assert!(machine.locked());
    assert!(machine.pointer_down(false).is_empty());
    assert!(!machine.pen_down());
}

#[test]
fn locked_board_admits_read_only_tools() {
    let mut machine = SyncMachine::new();
    machine.wait_request();
    assert_eq!(machine.pointer_down(true), vec![Effect::BeginStroke]);
    assert_eq!(machine.pointer_move(true), vec![Effect::ContinueStroke]);
    assert!(!machine.pen_down());
}

// --- Immediate sync while idle ---

#[test]
fn idle_upload_request_sends_immediately() {
    let mut machine = SyncMachine::new();
    assert_eq!(machine.upload_request(), vec![Effect::SendSnapshot]);
    assert!(!machine.upload_requested());
}

#[test]
fn idle_wait_request_locks_and_acknowledges() {
    let mut machine = SyncMachine::new();
    assert_eq!(machine.wait_request(), vec![Effect::Lock, Effect::AcknowledgeSync]);
    assert!(machine.locked());
}

#[test]
fn repeated_wait_request_reacknowledges_without_relocking() {
    let mut machine = SyncMachine::new();
    machine.wait_request();
    assert_eq!(machine.wait_request(), vec![Effect::AcknowledgeSync]);
    assert!(machine.locked());
}

#[test]
fn upload_request_while_locked_still_sends() {
    let mut machine = SyncMachine::new();
    machine.wait_request();
    assert_eq!(machine.upload_request(), vec![Effect::SendSnapshot]);
}

// --- Deferral during a stroke ---

#[test]
fn upload_request_mid_stroke_is_deferred() {
    let mut machine = drawing_machine();
    assert!(machine.upload_request().is_empty());
    assert!(machine.upload_requested());
}

#[test]
fn wait_request_mid_stroke_is_deferred() {
    let mut machine = drawing_machine();
    assert!(machine.wait_request().is_empty());
    assert!(machine.wait_requested());
    assert!(!machine.locked());
}

#[test]
fn deferred_upload_fires_at_pointer_up() {
    let mut machine = drawing_machine();
    machine.upload_request();
    let effects = machine.pointer_up();
    assert_eq!(effects, vec![Effect::EndStroke, Effect::SendSnapshot]);
    assert!(!machine.upload_requested());
}

#[test]
fn deferred_wait_locks_at_pointer_up() {
    let mut machine = drawing_machine();
    machine.wait_request();
    let effects = machine.pointer_up();
    assert_eq!(effects, vec![Effect::EndStroke, Effect::Lock, Effect::AcknowledgeSync]);
    assert!(machine.locked());
    assert!(!machine.wait_requested());
}

#[test]
fn upload_wins_when_both_are_armed() {
    let mut machine = drawing_machine();
    machine.upload_request();
    machine.wait_request();
    let effects = machine.pointer_up();
    assert_eq!(effects, vec![Effect::EndStroke, Effect::SendSnapshot]);
    assert!(!machine.upload_requested());
    assert!(!machine.wait_requested());
    assert!(!machine.locked());
}

#[test]
fn flags_only_arm_while_pen_down() {
    let mut machine = SyncMachine::new();
    machine.upload_request();
    machine.sync_done();
    assert!(!machine.upload_requested());
    assert!(!machine.wait_requested());

    let mut machine = drawing_machine();
    machine.pointer_up();
    assert!(!machine.upload_requested());
    assert!(!machine.wait_requested());
}

#[test]
fn next_stroke_starts_with_clean_flags() {
    let mut machine = drawing_machine();
    machine.upload_request();
    machine.pointer_up();
    machine.pointer_down(false);
    assert!(!machine.upload_requested());
    assert!(!machine.wait_requested());
}

// --- Unlock ---

#[test]
fn sync_done_unlocks() {
    let mut machine = SyncMachine::new();
    machine.wait_request();
    assert_eq!(machine.sync_done(), vec![Effect::Unlock]);
    assert!(!machine.locked());
}

#[test]
fn sync_done_while_unlocked_is_silent() {
    let mut machine = SyncMachine::new();
    assert!(machine.sync_done().is_empty());
}

#[test]
fn sync_done_cancels_armed_wait() {
    let mut machine = drawing_machine();
    machine.wait_request();
    machine.sync_done();
    assert_eq!(machine.pointer_up(), vec![Effect::EndStroke]);
    assert!(!machine.locked());
}

// --- Reset ---

#[test]
fn reset_clears_everything_and_unlocks() {
    let mut machine = drawing_machine();
    machine.upload_request();
    machine.pointer_up();
    machine.wait_request();
    assert!(machine.locked());

    assert_eq!(machine.reset(), vec![Effect::Unlock]);
    assert!(!machine.pen_down());
    assert!(!machine.upload_requested());
    assert!(!machine.wait_requested());
    assert!(!machine.locked());
}

#[test]
fn reset_mid_stroke_clears_pending_flags() {
    let mut machine = drawing_machine();
    machine.upload_request();
    machine.wait_request();
    assert!(machine.reset().is_empty());
    assert!(!machine.pen_down());
    assert!(!machine.upload_requested());
    assert!(!machine.wait_requested());
}

#[test]
fn reset_when_idle_is_a_no_op() {
    let mut machine = SyncMachine::new();
    assert!(machine.reset().is_empty());
}
