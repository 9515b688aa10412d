//! Capability abstraction over the hosted voice/NLU widget.
//!
//! The real widget is an externally hosted service; the core only needs to
//! create a connection from a configuration, push the current command
//! catalogue at it, and tear it down. Everything behind those three calls is
//! opaque, which keeps the session testable with a stub connection.

use crate::commands::CommandSpec;
use crate::config::VoiceConfig;
use async_trait::async_trait;
use derive_more::{Display, Error};
use tracing::{debug, info, instrument};

/// Failure to create or tear down a widget connection.
#[derive(Debug, Clone, Display, Error)]
#[display("Connection error: {} at {}:{}", message, file, line)]
pub struct ConnectionError {
    /// Error message.
    pub message: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl ConnectionError {
    /// Creates a new connection error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Factory for widget connections.
#[async_trait]
pub trait VoiceWidget: Send + Sync {
    /// Establishes a connection parameterized by the given configuration.
    ///
    /// Awaited once at startup and again whenever the configuration changes
    /// (after the previous connection has been torn down).
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the hosted service cannot be reached
    /// or rejects the credentials. The application degrades to manual mode.
    async fn create(&self, config: &VoiceConfig) -> Result<Box<dyn WidgetConnection>, ConnectionError>;
}

/// An established connection to the hosted widget.
pub trait WidgetConnection: Send {
    /// Replaces the widget's command catalogue with the given set.
    ///
    /// Handlers stay local; only name, description, and schema cross the
    /// boundary. The channel debounces, so redundant pushes are harmless.
    fn set_commands(&mut self, catalogue: &[CommandSpec]);

    /// Releases the connection and any subscriptions it holds.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] on failure; callers treat teardown as
    /// best-effort and swallow the error.
    fn teardown(&mut self) -> Result<(), ConnectionError>;
}

/// Widget implementation that only logs, for the console demo and local runs
/// without credentials.
#[derive(Debug, Clone, Default)]
pub struct LoggingWidget;

#[async_trait]
impl VoiceWidget for LoggingWidget {
    #[instrument(skip(self, config), fields(app_url = %config.app_url(), language = %config.language_code()))]
    async fn create(&self, config: &VoiceConfig) -> Result<Box<dyn WidgetConnection>, ConnectionError> {
        info!("Creating logging widget connection");
        Ok(Box::new(LoggingConnection))
    }
}

/// Connection half of [`LoggingWidget`].
#[derive(Debug)]
pub struct LoggingConnection;

impl WidgetConnection for LoggingConnection {
    fn set_commands(&mut self, catalogue: &[CommandSpec]) {
        debug!(count = catalogue.len(), "Catalogue push");
        for spec in catalogue {
            debug!(action = %spec.action, "  command");
        }
    }

    fn teardown(&mut self) -> Result<(), ConnectionError> {
        info!("Logging widget connection torn down");
        Ok(())
    }
}
