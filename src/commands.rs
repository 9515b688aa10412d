//! Custom-command registry.
//!
//! The registry is the externally visible catalogue of invocable actions.
//! The hosted voice widget resolves an utterance to a registered action name
//! plus a structured payload; [`CommandRegistry::dispatch`] routes that back
//! to the in-process handler. Whenever the catalogue changes, the full set of
//! specs (names, descriptions, schemas; never handlers) is pushed to the
//! attached widget connection.

use crate::widget::WidgetConnection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, instrument, warn};

/// Handler invoked with the structured payload of a resolved utterance.
///
/// Handler errors are caught at the dispatch boundary and logged; they never
/// propagate back into the voice channel.
pub type CommandHandler = Box<dyn Fn(serde_json::Value) -> anyhow::Result<()> + Send + Sync>;

/// Externally visible part of a command registration.
#[derive(Debug, Clone, Serialize)]
pub struct CommandSpec {
    /// Unique action name, e.g. `make_tic_tac_toe_move`.
    pub action: String,
    /// Human-readable description; for game commands this embeds the
    /// grounding context so the NLU can resolve utterances against current
    /// state.
    pub description: String,
    /// JSON Schema of the payload.
    pub schema: serde_json::Value,
}

/// A registered command: spec plus local handler.
pub struct CommandDescriptor {
    /// The externally visible spec.
    pub spec: CommandSpec,
    /// The in-process handler.
    pub handler: CommandHandler,
}

impl CommandDescriptor {
    /// Creates a descriptor.
    pub fn new(
        action: impl Into<String>,
        description: impl Into<String>,
        schema: serde_json::Value,
        handler: CommandHandler,
    ) -> Self {
        Self {
            spec: CommandSpec {
                action: action.into(),
                description: description.into(),
                schema,
            },
            handler,
        }
    }
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Mapping from action name to command, kept in sync with the widget.
///
/// Constructed once per application session and passed by reference to
/// whatever needs to register or dispatch; there is no ambient global
/// registry.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandDescriptor>,
    connection: Option<Box<dyn WidgetConnection>>,
}

impl CommandRegistry {
    /// Creates an empty registry with no widget attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, overwriting any existing entry under the same
    /// action name: last registration wins, reflecting that the most recently
    /// mounted owner of a command is authoritative. Pushes the updated
    /// catalogue to the attached widget.
    #[instrument(skip(self, descriptor), fields(action = %descriptor.spec.action))]
    pub fn register(&mut self, descriptor: CommandDescriptor) {
        let action = descriptor.spec.action.clone();
        if self.commands.insert(action.clone(), descriptor).is_some() {
            debug!(action, "Replaced existing command registration");
        } else {
            debug!(action, "Registered command");
        }
        self.resync();
    }

    /// Removes a command and pushes the updated catalogue. A no-op, not an
    /// error, when the action is absent, so teardown stays idempotent.
    #[instrument(skip(self))]
    pub fn unregister(&mut self, action: &str) {
        if self.commands.remove(action).is_some() {
            debug!(action, "Unregistered command");
            self.resync();
        }
    }

    /// Routes an inbound invocation to the matching handler.
    ///
    /// An unknown action is logged and dropped: the invocation source is an
    /// external, untrusted channel and must not be able to raise errors into
    /// the caller. Handler failures are likewise contained here.
    #[instrument(skip(self, payload))]
    pub fn dispatch(&self, action: &str, payload: serde_json::Value) {
        let Some(descriptor) = self.commands.get(action) else {
            warn!(action, "Unknown command from voice channel, dropping");
            return;
        };

        debug!(action, "Dispatching command");
        if let Err(e) = (descriptor.handler)(payload) {
            error!(action, error = %e, "Command handler failed");
        }
    }

    /// The current externally visible catalogue.
    pub fn catalogue(&self) -> Vec<CommandSpec> {
        self.commands.values().map(|d| d.spec.clone()).collect()
    }

    /// Looks up the spec registered under an action name.
    pub fn spec(&self, action: &str) -> Option<&CommandSpec> {
        self.commands.get(action).map(|d| &d.spec)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Installs the widget connection and immediately pushes the catalogue.
    pub fn attach(&mut self, connection: Box<dyn WidgetConnection>) {
        self.connection = Some(connection);
        self.resync();
    }

    /// Removes and returns the widget connection, if any, so the caller can
    /// tear it down.
    pub fn detach(&mut self) -> Option<Box<dyn WidgetConnection>> {
        self.connection.take()
    }

    /// Whether a widget connection is attached.
    pub fn is_attached(&self) -> bool {
        self.connection.is_some()
    }

    fn resync(&mut self) {
        let catalogue: Vec<CommandSpec> = self.commands.values().map(|d| d.spec.clone()).collect();
        if let Some(connection) = &mut self.connection {
            connection.set_commands(&catalogue);
        }
    }
}
