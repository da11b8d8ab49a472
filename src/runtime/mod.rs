use std::sync::{Arc, Mutex};

use crate::interaction::{ActionResult, Interaction};
use crate::logging::Logger;
use crate::metrics::PanelMetrics;
use crate::panel::PanelId;

pub mod audit;
pub mod diagnostics;
pub mod sessions;

use audit::{NullPanelAudit, PanelAudit};

/// Configuration knobs for the session manager.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Optional structured logger used for lifecycle and dispatch records.
    pub logger: Option<Logger>,
    /// Metrics accumulator shared with the host.
    pub metrics: Option<Arc<Mutex<PanelMetrics>>>,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
    /// Receives one record per lifecycle transition.
    pub audit: Arc<dyn PanelAudit>,
    /// Maximum panels kept per viewer, current one included. Zero keeps all.
    pub history_limit: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            metrics_target: "slotboard::sessions.metrics".to_string(),
            audit: Arc::new(NullPanelAudit),
            history_limit: 16,
        }
    }
}

impl RuntimeConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(PanelMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<PanelMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_audit<A>(mut self, audit: Arc<A>) -> Self
    where
        A: PanelAudit + 'static,
    {
        self.audit = audit;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

/// A host interaction tagged with the panel surface it came from.
#[derive(Debug, Clone)]
pub struct Notification<I> {
    pub source: PanelId,
    pub interaction: Interaction<I>,
}

impl<I> Notification<I> {
    pub fn new(source: impl Into<PanelId>, interaction: Interaction<I>) -> Self {
        Self {
            source: source.into(),
            interaction,
        }
    }
}

/// What the host should do with the interaction it forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub result: ActionResult,
    /// A subscriber took the carried item.
    pub consumed: bool,
    /// False when the viewer had no panel or the source did not match it.
    pub routed: bool,
}

impl DispatchOutcome {
    pub(crate) fn unrouted() -> Self {
        Self {
            result: ActionResult::Pass,
            consumed: false,
            routed: false,
        }
    }

    /// True when the host should cancel its native handling.
    pub fn cancelled(&self) -> bool {
        !self.result.allows_action()
    }
}
