//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskflip_core` linkage.
//! - Run one scripted create/toggle scenario on an in-memory board.
//! - Keep output deterministic for quick local sanity checks.

use std::time::Duration;
use taskflip_core::{MemoryKeyValueStore, TaskBoard, TaskDraft, TransitionTiming};

fn main() {
    println!("taskflip_core ping={}", taskflip_core::ping());
    println!("taskflip_core version={}", taskflip_core::core_version());

    let board = TaskBoard::load(MemoryKeyValueStore::new());
    let timing = TransitionTiming::default();
    let id = board.create(TaskDraft::new("Buy milk", "groceries", ""));
    println!("toggle={:?}", board.toggle(id));

    report(&board, Duration::ZERO);
    board.advance(timing.exit);
    report(&board, timing.exit);
    board.advance(timing.enter);
    report(&board, timing.total());
}

fn report(board: &TaskBoard<MemoryKeyValueStore>, at: Duration) {
    let snapshot = board.snapshot();
    println!(
        "t={}ms open={} done={} total={} transition={:?}",
        at.as_millis(),
        snapshot.counts.open,
        snapshot.counts.done,
        snapshot.counts.total,
        snapshot.transition
    );
}
