//! Connectivity status types.

/// Coarse connection lifecycle state, published on a watch channel.
///
/// Process-lifetime only; the mirror is rebuilt from scratch on every
/// reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket, or the previous one is gone
    #[default]
    Disconnected,
    /// A connect attempt is in flight
    Connecting,
    /// Socket open; the initial status request has been issued
    Connected,
    /// The last session ended with an unexpected failure
    Error(String),
}

/// Severity of a status notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
    Error,
}

/// A `(severity, message)` notification for a host surface to display
/// connection health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub severity: Severity,
    pub message: String,
}

impl StatusEvent {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into() }
    }
}
