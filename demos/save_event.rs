//! Attach two handlers to a "save" event, publish, then detach.
//!
//! Run with `SWITCHBOARD_LOG_LEVEL=debug cargo run --example save_event`
//! to see attach/detach logging, or set `SWITCHBOARD_MISMATCH_POLICY=skip`
//! to see the strict policy at work.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use switchboard::prelude::*;
use tracing::info;

fn main() {
    switchboard::log::init();

    let bus = EventBus::with_config(EventBusConfig::from_env());
    let saves = Arc::new(AtomicUsize::new(0));

    bus.attach("save", |id: i32| info!(id, "Saving document"));

    let counter = saves.clone();
    bus.attach("save", move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    bus.publish("save", (42,));

    // Wrong argument type: the first handler sees 0, or is skipped when strict
    let report = bus.dispatch("save", (String::from("42"),));
    info!(
        called = report.called(),
        degraded = report.degraded(),
        skipped = report.skipped(),
        "Published with a mismatched argument"
    );

    bus.detach("save");
    bus.publish("save", (42,));

    info!(saves = saves.load(Ordering::SeqCst), "Done");
}
