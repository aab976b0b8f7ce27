//! Event Bus implementation

use crate::config::{EventBusConfig, MismatchPolicy};
use crate::handler::{ArgList, Callback, DynHandler, Invocation, TypedHandler};
use crate::value::{IntoArgs, Value};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Event bus for in-process, synchronous event publishing.
///
/// Handlers are grouped under a string identifier. Any number of handlers
/// may share an identifier and each may expect a different argument shape.
///
/// The bus is a cheap `Clone` handle over a shared registry and can be used
/// from several threads. `publish` snapshots the handler list before calling
/// into it, so handlers may attach, detach or publish on the same bus.
/// Edits made while a publish is in progress apply to the next publish.
#[derive(Clone)]
pub struct EventBus {
    /// Handlers registered for each event identifier, in attach order
    handlers: Arc<DashMap<String, Vec<Arc<dyn DynHandler>>>>,

    /// Configuration
    config: Arc<EventBusConfig>,
}

impl EventBus {
    /// Create new event bus
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create event bus with custom config
    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            handlers: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    /// Get the bus configuration
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Attach a callback under an event identifier.
    ///
    /// The argument types are taken from the callback's own signature, so
    /// closure parameters need type annotations.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use switchboard_events::EventBus;
    ///
    /// let bus = EventBus::new();
    /// bus.attach("save", |id: i32| println!("saving {}", id));
    /// bus.attach("save", || println!("saved"));
    /// assert_eq!(bus.handler_count("save"), 2);
    /// ```
    pub fn attach<Args, F>(&self, id: impl Into<String>, callback: F)
    where
        Args: ArgList,
        F: Callback<Args>,
    {
        let id = id.into();
        let handler: Arc<dyn DynHandler> = Arc::new(TypedHandler::new(callback));

        if self.config.enable_logging {
            debug!(
                event = %id,
                arity = handler.arity(),
                signature = handler.signature(),
                "Attached handler"
            );
        }

        self.handlers.entry(id).or_default().push(handler);
    }

    /// Remove every handler attached under `id`. Unknown identifiers are a no-op.
    pub fn detach(&self, id: &str) {
        let removed = self.handlers.remove(id).map(|(_, h)| h.len()).unwrap_or(0);

        if self.config.enable_logging && removed > 0 {
            debug!(event = %id, removed, "Detached handlers");
        }
    }

    /// Publish an event.
    ///
    /// Every handler under `id` is called in attach order on the current
    /// thread before this returns. Publishing to an identifier with no
    /// handlers does nothing. Handler argument problems never surface here;
    /// they are logged and the remaining handlers still run.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use switchboard_events::{args, EventBus};
    ///
    /// let bus = EventBus::new();
    /// bus.attach("moved", |x: f64, y: f64| assert_eq!((x, y), (1.0, 2.0)));
    ///
    /// bus.publish("moved", (1.0, 2.0));
    /// bus.publish("moved", args![1.0, 2.0]);
    /// ```
    pub fn publish(&self, id: &str, args: impl IntoArgs) {
        self.dispatch(id, args);
    }

    /// Publish an event and report what happened to each handler.
    ///
    /// Outcomes are listed in invocation order.
    pub fn dispatch(&self, id: &str, args: impl IntoArgs) -> DispatchReport {
        let handlers = match self.handlers.get(id) {
            Some(handlers) => handlers.clone(),
            None => return DispatchReport::empty(id),
        };

        let args = args.into_args();
        let policy = self.config.mismatch_policy;

        if self.config.enable_logging {
            trace!(
                event = %id,
                handlers = handlers.len(),
                args = args.len(),
                "Publishing event"
            );
        }

        let outcomes = handlers
            .iter()
            .map(|handler| {
                let outcome = handler.invoke(&args, policy);
                if self.config.enable_logging {
                    self.log_outcome(id, handler.as_ref(), &args, policy, &outcome);
                }
                outcome
            })
            .collect();

        DispatchReport {
            event: id.to_string(),
            outcomes,
        }
    }

    fn log_outcome(
        &self,
        id: &str,
        handler: &dyn DynHandler,
        args: &[Value],
        policy: MismatchPolicy,
        outcome: &Invocation,
    ) {
        match outcome {
            Invocation::Called { mismatches } => {
                for mismatch in mismatches {
                    warn!(
                        event = %id,
                        index = mismatch.index,
                        expected = mismatch.expected,
                        found = mismatch.found,
                        "Cannot convert argument, using default value"
                    );
                }
            }
            Invocation::Skipped(reason) => {
                warn!(
                    event = %id,
                    signature = handler.signature(),
                    provided = args.len(),
                    policy = %policy,
                    "Handler skipped: {}",
                    reason
                );
            }
        }
    }

    /// Remove all handlers
    pub fn clear(&self) {
        self.handlers.clear();
        if self.config.enable_logging {
            debug!("Cleared all event handlers");
        }
    }

    /// Get handler count for an event identifier
    pub fn handler_count(&self, id: &str) -> usize {
        self.handlers.get(id).map(|h| h.len()).unwrap_or(0)
    }

    /// Check whether anything is attached under `id`
    pub fn has_handlers(&self, id: &str) -> bool {
        self.handler_count(id) > 0
    }

    /// Identifiers that currently have handlers, in no particular order
    pub fn event_ids(&self) -> Vec<String> {
        self.handlers.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.handlers.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Per-handler outcomes of one publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Event identifier that was published
    pub event: String,

    /// One entry per handler, in invocation order
    pub outcomes: Vec<Invocation>,
}

impl DispatchReport {
    fn empty(id: &str) -> Self {
        Self {
            event: id.to_string(),
            outcomes: Vec::new(),
        }
    }

    /// No handler was registered for the event
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of handlers whose callback ran
    pub fn called(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_called()).count()
    }

    /// Number of handlers called with default-filled arguments
    pub fn degraded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_degraded()).count()
    }

    /// Number of handlers that were not called
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.called()
    }
}

/// Event bus builder
pub struct EventBusBuilder {
    config: EventBusConfig,
}

impl EventBusBuilder {
    /// Create new event bus builder
    pub fn new() -> Self {
        Self {
            config: EventBusConfig::default(),
        }
    }

    /// Set the policy for mismatched argument types
    pub fn mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.config.mismatch_policy = policy;
        self
    }

    /// Skip handlers on any argument type mismatch
    pub fn strict(self) -> Self {
        self.mismatch_policy(MismatchPolicy::Skip)
    }

    /// Enable/disable logging
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Build the event bus
    pub fn build(self) -> EventBus {
        EventBus::with_config(self.config)
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::error::SkipReason;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Journal {
        entries: Arc<Mutex<Vec<String>>>,
    }

    impl Journal {
        fn record(&self, entry: impl Into<String>) {
            self.entries.lock().unwrap().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.entries.lock().unwrap().clone()
        }
    }

    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` under a thread-local subscriber and return the lines it logged.
    fn capture_logs(f: impl FnOnce()) -> Vec<String> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .with_writer(move || LogSink(sink.clone()))
            .finish();

        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn warnings(lines: &[String]) -> Vec<&String> {
        lines.iter().filter(|line| line.contains("WARN")).collect()
    }

    #[test]
    fn test_publish_in_attach_order() {
        let bus = EventBus::new();
        let journal = Journal::default();

        for name in ["first", "second", "third"] {
            let journal = journal.clone();
            bus.attach("tick", move || journal.record(name));
        }

        bus.publish("tick", ());
        assert_eq!(journal.entries(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_publish_without_handlers() {
        let bus = EventBus::new();

        bus.publish("nobody", args![1, 2, 3]);
        let report = bus.dispatch("nobody", ());

        assert!(report.is_empty());
        assert_eq!(report.event, "nobody");
    }

    #[test]
    fn test_detach_removes_all_handlers() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            bus.attach("save", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(bus.handler_count("save"), 3);

        bus.detach("save");
        bus.publish("save", ());

        assert_eq!(bus.handler_count("save"), 0);
        assert!(!bus.has_handlers("save"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detach_unknown_id_is_noop() {
        let bus = EventBus::new();
        bus.attach("keep", || {});

        bus.detach("missing");

        assert_eq!(bus.handler_count("keep"), 1);
    }

    #[test]
    fn test_detach_only_affects_one_id() {
        let bus = EventBus::new();
        bus.attach("a", || {});
        bus.attach("b", || {});

        bus.detach("a");

        assert_eq!(bus.event_ids(), vec!["b".to_string()]);
    }

    #[test]
    fn test_dispatch_report() {
        let bus = EventBus::new();
        bus.attach("mixed", |_: i32| {});
        bus.attach("mixed", |_: String| {});
        bus.attach("mixed", |_: i32, _: i32| {});

        let report = bus.dispatch("mixed", (5,));

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.called(), 2);
        assert_eq!(report.degraded(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(
            report.outcomes[2].skip_reason(),
            Some(&SkipReason::InsufficientArguments {
                expected: 2,
                provided: 1
            })
        );
    }

    #[test]
    fn test_strict_bus_skips_mismatches() {
        let bus = EventBusBuilder::new().strict().build();
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        bus.attach("count", move |n: u32| {
            c.fetch_add(n, Ordering::SeqCst);
        });

        let report = bus.dispatch("count", (5i64,));
        assert_eq!(report.skipped(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        bus.publish("count", (5u32,));
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_handler_can_reenter_bus() {
        let bus = EventBus::new();
        let journal = Journal::default();

        let inner_bus = bus.clone();
        let j = journal.clone();
        bus.attach("outer", move || {
            j.record("outer");
            inner_bus.publish("inner", ());
            inner_bus.detach("outer");
        });

        let j = journal.clone();
        bus.attach("inner", move || j.record("inner"));

        bus.publish("outer", ());
        bus.publish("outer", ());

        assert_eq!(journal.entries(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_clear() {
        let bus = EventBus::new();
        bus.attach("a", || {});
        bus.attach("b", |_: bool| {});

        bus.clear();

        assert!(bus.event_ids().is_empty());
    }

    #[test]
    fn test_builder() {
        let bus = EventBusBuilder::new()
            .mismatch_policy(MismatchPolicy::Skip)
            .enable_logging(false)
            .build();

        assert_eq!(bus.config().mismatch_policy, MismatchPolicy::Skip);
        assert!(!bus.config().enable_logging);
    }

    #[test]
    fn test_bus_is_shareable_across_threads() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        bus.attach("hit", move |n: u32| {
            c.fetch_add(n, Ordering::SeqCst);
        });

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let bus = bus.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        bus.publish("hit", (1u32,));
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 40);
    }

    #[test]
    fn test_unknown_id_logs_nothing() {
        let bus = EventBus::new();

        let lines = capture_logs(|| {
            bus.publish("nobody", (1, 2));
            bus.detach("nobody");
        });

        assert!(lines.is_empty(), "unexpected output: {:?}", lines);
    }

    #[test]
    fn test_insufficient_args_logs_one_warning() {
        let bus = EventBus::new();
        bus.attach("pair", |_: i32, _: String| {});

        let lines = capture_logs(|| bus.publish("pair", (1,)));
        let warnings = warnings(&lines);

        assert_eq!(warnings.len(), 1, "{:?}", lines);
        assert!(warnings[0].contains("Handler skipped: not enough arguments: expected 2, got 1"));
        assert!(warnings[0].contains("event=pair"));
    }

    #[test]
    fn test_each_mismatch_logs_a_warning() {
        let bus = EventBus::new();
        bus.attach("typed", |_: i32, _: String| {});
        bus.attach("typed", |_: String, _: String| {});

        let lines = capture_logs(|| bus.publish("typed", (1, 2)));
        let warnings = warnings(&lines);

        // One for the first handler's position 1, two for the second handler
        assert_eq!(warnings.len(), 3, "{:?}", lines);
        assert!(warnings.iter().all(|w| w.contains("Cannot convert argument, using default value")));
        assert!(warnings[0].contains("index=1"));
        assert!(warnings[0].contains("i32"));
        assert!(warnings[1].contains("index=0"));
        assert!(warnings[2].contains("index=1"));
    }

    #[test]
    fn test_matching_publish_logs_no_warnings() {
        let bus = EventBus::new();
        bus.attach("ok", |_: i32| {});

        let lines = capture_logs(|| bus.publish("ok", (1,)));

        assert!(warnings(&lines).is_empty(), "{:?}", lines);
    }

    #[test]
    fn test_disabled_logging_is_silent() {
        let bus = EventBusBuilder::new().enable_logging(false).build();

        let lines = capture_logs(|| {
            bus.attach("quiet", |_: i32, _: String| {});
            bus.publish("quiet", (1,));
            bus.publish("quiet", (1, 2));
            bus.detach("quiet");
            bus.clear();
        });

        assert!(lines.is_empty(), "unexpected output: {:?}", lines);
    }
}
