//! Mutation logger.

use tracing::info;

use crate::error::Result;
use crate::store::{Plugin, Store};

/// Emits one `tracing` event per applied mutation under the
/// `arbor::logger` target.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    include_state: bool,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log the full state after each mutation.
    pub fn with_state(mut self, include_state: bool) -> Self {
        self.include_state = include_state;
        self
    }
}

impl Plugin for Logger {
    fn install(self: Box<Self>, store: &Store) -> Result<()> {
        let include_state = self.include_state;
        store.subscribe(move |record, state| {
            if include_state {
                info!(
                    target: "arbor::logger",
                    mutation = %record.kind,
                    payload = %record.payload,
                    state = %state,
                    "mutation"
                );
            } else {
                info!(
                    target: "arbor::logger",
                    mutation = %record.kind,
                    payload = %record.payload,
                    "mutation"
                );
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModuleDefinition, StoreOptions};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::fmt;
    use std::sync::Arc;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    type Fields = BTreeMap<String, String>;

    /// Records the fields of every event under the logger target.
    #[derive(Clone, Default)]
    struct Capture {
        events: Arc<Mutex<Vec<Fields>>>,
    }

    struct FieldVisitor<'a>(&'a mut Fields);

    impl Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() != "arbor::logger" {
                return;
            }
            let mut fields = Fields::new();
            event.record(&mut FieldVisitor(&mut fields));
            self.events.lock().push(fields);
        }
    }

    fn store_with(logger: Logger) -> Store {
        Store::new(
            StoreOptions::new(
                ModuleDefinition::new()
                    .state(json!({ "n": 0 }))
                    .mutation("set", |state, payload| state["n"] = payload.clone()),
            )
            .plugin(logger),
        )
        .unwrap()
    }

    fn captured(logger: Logger, payloads: &[i64]) -> (Store, Vec<Fields>) {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        let store = tracing::subscriber::with_default(subscriber, || {
            let store = store_with(logger);
            for payload in payloads {
                store.commit("set", json!(payload)).unwrap();
            }
            store
        });

        let events = capture.events.lock().clone();
        (store, events)
    }

    #[test]
    fn logs_one_event_per_mutation() {
        let (store, events) = captured(Logger::new(), &[3, 4]);

        assert_eq!(store.state(), json!({ "n": 4 }));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["mutation"], "set");
        assert_eq!(events[0]["payload"], "3");
        assert_eq!(events[1]["payload"], "4");
        assert!(!events[0].contains_key("state"));
    }

    #[test]
    fn includes_state_when_asked() {
        let (_, events) = captured(Logger::new().with_state(true), &[7]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["state"], r#"{"n":7}"#);
        assert_eq!(events[0]["message"], "mutation");
    }
}
