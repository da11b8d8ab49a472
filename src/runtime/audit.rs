//! Session lifecycle audit hooks.
//!
//! The session manager reports every state transition here so callers can
//! buffer, log, or assert on the sequence without touching the manager's
//! internals. A swap is reported as one `Swapped` record, never as a close
//! followed by an open.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

/// Distinct checkpoints emitted by the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAuditStage {
    /// A viewer with no panel got one.
    Opened,
    /// `open` pushed a different panel over the current one.
    Replaced,
    /// `swap` exchanged the current panel in place.
    Swapped,
    /// The viewer's panel and history were dropped.
    Closed,
    /// The current panel was popped back to its parent.
    Back,
    /// `open` was refused by the replace policy.
    OpenRefused,
    /// A host notification ran through the active panel's bus.
    Dispatched,
}

#[derive(Debug, Clone)]
pub struct SessionAuditEvent {
    pub timestamp: SystemTime,
    pub stage: SessionAuditStage,
    pub viewer: String,
    pub panel: Option<String>,
    pub details: Vec<(String, Value)>,
}

impl SessionAuditEvent {
    fn new(stage: SessionAuditStage, viewer: String) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            viewer,
            panel: None,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

pub struct SessionAuditEventBuilder {
    event: SessionAuditEvent,
}

impl SessionAuditEventBuilder {
    pub fn new(stage: SessionAuditStage, viewer: impl Into<String>) -> Self {
        Self {
            event: SessionAuditEvent::new(stage, viewer.into()),
        }
    }

    pub fn panel(&mut self, panel: impl Into<String>) -> &mut Self {
        self.event.panel = Some(panel.into());
        self
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> SessionAuditEvent {
        self.event
    }
}

pub trait PanelAudit: Send + Sync {
    fn record(&self, event: SessionAuditEvent);
}

#[derive(Debug, Default)]
pub struct NullPanelAudit;

impl PanelAudit for NullPanelAudit {
    fn record(&self, _event: SessionAuditEvent) {}
}

/// Buffers audit records in memory.
#[derive(Debug, Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<SessionAuditEvent>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<SessionAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl PanelAudit for RecordingAudit {
    fn record(&self, event: SessionAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
