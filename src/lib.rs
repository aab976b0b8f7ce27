// Switchboard - typed in-process publish/subscribe
//
// Callbacks with arbitrary argument signatures are attached under string
// identifiers and called with type-checked arguments on publish.

// Re-export the event bus
pub use switchboard_events::*;

// Re-export optional crates
#[cfg(feature = "log")]
pub use switchboard_log as log;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        DispatchReport,
        EventBus,
        EventBusBuilder,
        EventBusConfig,
        Invocation,
        IntoArgs,
        MismatchPolicy,
        SkipReason,
        Value,
        args,
    };
}
