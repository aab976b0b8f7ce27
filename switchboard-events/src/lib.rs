//! In-process publish/subscribe for Switchboard
//!
//! Callbacks with arbitrary, fixed argument signatures are attached under a
//! string identifier. Publishing an identifier with a list of values calls
//! every attached callback, converting each value back to the type the
//! callback expects.
//!
//! ## Features
//!
//! - **Event Bus** - Attach, detach and publish by string identifier
//! - **Typed callbacks** - Argument types inferred from the closure signature
//! - **Mixed signatures** - Handlers under one identifier may disagree on arguments
//! - **Best-effort dispatch** - Type mismatches degrade to default values or skip the handler
//! - **Synchronous** - Handlers run in attach order on the publisher's thread
//!
//! ## Quick Start
//!
//! ```rust
//! use switchboard_events::*;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let bus = EventBus::new();
//! let saved = Arc::new(AtomicUsize::new(0));
//!
//! let counter = saved.clone();
//! bus.attach("save", move |id: i32| {
//!     counter.fetch_add(id as usize, Ordering::SeqCst);
//! });
//! bus.attach("save", || println!("document saved"));
//!
//! bus.publish("save", (42,));
//! assert_eq!(saved.load(Ordering::SeqCst), 42);
//!
//! bus.detach("save");
//! bus.publish("save", (42,));
//! assert_eq!(saved.load(Ordering::SeqCst), 42);
//! ```
//!
//! ## Argument Mismatches
//!
//! Publishers and subscribers are not checked against each other. When a
//! published value has the wrong type for a handler, the default policy
//! calls the handler with `Default::default()` at that position and logs a
//! warning. A strict bus skips the handler instead:
//!
//! ```rust
//! use switchboard_events::*;
//!
//! let bus = EventBusBuilder::new().strict().build();
//! bus.attach("resize", |w: u32, h: u32| println!("{}x{}", w, h));
//!
//! // i32 literals do not match u32
//! let report = bus.dispatch("resize", (800, 600));
//! assert_eq!(report.skipped(), 1);
//! ```
//!
//! Handlers with fewer published arguments than they declare are never
//! called. Extra trailing arguments are ignored.
//!
//! ## Configuration
//!
//! ```rust
//! use switchboard_events::*;
//!
//! let bus = EventBusBuilder::new()
//!     .mismatch_policy(MismatchPolicy::Degrade)  // Default-fill mismatched arguments
//!     .enable_logging(true)                      // Log dispatch problems
//!     .build();
//!
//! // Or from SWITCHBOARD_MISMATCH_POLICY / SWITCHBOARD_EVENT_LOGGING
//! let bus = EventBus::with_config(EventBusConfig::from_env());
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod handler;
pub mod value;

pub use bus::{DispatchReport, EventBus, EventBusBuilder};
pub use config::{EventBusConfig, MismatchPolicy};
pub use error::{ConfigError, ConversionError, SkipReason};
pub use handler::{ArgList, Callback, DynHandler, Extracted, Invocation, TypedHandler};
pub use value::{IntoArgs, Value};
