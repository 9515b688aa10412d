//! Tests for the command registry and widget resynchronization.

use serde_json::json;
use std::sync::{Arc, Mutex};
use voiceplay::{CommandDescriptor, CommandRegistry, CommandSpec, ConnectionError, WidgetConnection};

/// Records every catalogue push as the list of action names it contained.
#[derive(Clone, Default)]
struct Pushes(Arc<Mutex<Vec<Vec<String>>>>);

impl Pushes {
    fn all(&self) -> Vec<Vec<String>> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

struct RecordingConnection {
    pushes: Pushes,
}

impl WidgetConnection for RecordingConnection {
    fn set_commands(&mut self, catalogue: &[CommandSpec]) {
        let actions = catalogue.iter().map(|s| s.action.clone()).collect();
        self.pushes.0.lock().unwrap().push(actions);
    }

    fn teardown(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }
}

fn noop_descriptor(action: &str, description: &str) -> CommandDescriptor {
    CommandDescriptor::new(
        action,
        description,
        json!({ "type": "object", "properties": {} }),
        Box::new(|_| Ok(())),
    )
}

#[test]
fn test_duplicate_registration_last_wins() {
    let mut registry = CommandRegistry::new();
    registry.register(noop_descriptor("foo", "first"));
    registry.register(noop_descriptor("foo", "second"));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.spec("foo").unwrap().description, "second");
}

#[test]
fn test_unregister_twice_is_noop() {
    let mut registry = CommandRegistry::new();
    registry.register(noop_descriptor("foo", "d"));

    registry.unregister("foo");
    assert!(registry.is_empty());

    // Second removal must not error or push.
    registry.unregister("foo");
    assert!(registry.is_empty());
}

#[test]
fn test_dispatch_routes_payload_to_handler() {
    let received: Arc<Mutex<Option<serde_json::Value>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&received);

    let mut registry = CommandRegistry::new();
    registry.register(CommandDescriptor::new(
        "echo",
        "records its payload",
        json!({ "type": "object" }),
        Box::new(move |payload| {
            *sink.lock().unwrap() = Some(payload);
            Ok(())
        }),
    ));

    registry.dispatch("echo", json!({ "value": 7 }));
    assert_eq!(*received.lock().unwrap(), Some(json!({ "value": 7 })));
}

#[test]
fn test_unknown_command_is_dropped() {
    let registry = CommandRegistry::new();
    // Must log and return, not panic or error.
    registry.dispatch("does_not_exist", json!({}));
}

#[test]
fn test_handler_error_is_contained() {
    let mut registry = CommandRegistry::new();
    registry.register(CommandDescriptor::new(
        "fails",
        "always errors",
        json!({ "type": "object" }),
        Box::new(|_| anyhow::bail!("handler exploded")),
    ));

    // The error must not cross the dispatch boundary.
    registry.dispatch("fails", json!({}));
}

#[test]
fn test_attach_pushes_current_catalogue() {
    let pushes = Pushes::default();
    let mut registry = CommandRegistry::new();
    registry.register(noop_descriptor("a", "d"));
    registry.register(noop_descriptor("b", "d"));

    registry.attach(Box::new(RecordingConnection {
        pushes: pushes.clone(),
    }));

    assert_eq!(pushes.all(), vec![vec!["a".to_string(), "b".to_string()]]);
}

#[test]
fn test_catalogue_resynced_on_every_change() {
    let pushes = Pushes::default();
    let mut registry = CommandRegistry::new();
    registry.attach(Box::new(RecordingConnection {
        pushes: pushes.clone(),
    }));
    assert_eq!(pushes.count(), 1); // attach pushes the (empty) catalogue

    registry.register(noop_descriptor("a", "d"));
    registry.register(noop_descriptor("b", "d"));
    registry.unregister("a");

    let all = pushes.all();
    assert_eq!(all.len(), 4);
    assert_eq!(all[1], vec!["a".to_string()]);
    assert_eq!(all[2], vec!["a".to_string(), "b".to_string()]);
    assert_eq!(all[3], vec!["b".to_string()]);

    // Removing an absent entry pushes nothing.
    registry.unregister("a");
    assert_eq!(pushes.count(), 4);
}

#[test]
fn test_detach_stops_pushes() {
    let pushes = Pushes::default();
    let mut registry = CommandRegistry::new();
    registry.attach(Box::new(RecordingConnection {
        pushes: pushes.clone(),
    }));

    let connection = registry.detach();
    assert!(connection.is_some());
    assert!(!registry.is_attached());

    registry.register(noop_descriptor("a", "d"));
    assert_eq!(pushes.count(), 1); // only the attach push
}
