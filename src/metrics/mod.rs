use crate::interaction::ActionResult;
use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters collected by the session manager.
#[derive(Debug, Default, Clone)]
pub struct PanelMetrics {
    dispatches: u64,
    unrouted: u64,
    successes: u64,
    cancels: u64,
    opens: u64,
    swaps: u64,
    closes: u64,
    refused: u64,
}

impl PanelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&mut self, result: ActionResult) {
        self.dispatches = self.dispatches.saturating_add(1);
        match result {
            ActionResult::Success => self.successes = self.successes.saturating_add(1),
            ActionResult::Cancel => self.cancels = self.cancels.saturating_add(1),
            ActionResult::Pass => {}
        }
    }

    pub fn record_unrouted(&mut self) {
        self.unrouted = self.unrouted.saturating_add(1);
    }

    pub fn record_open(&mut self) {
        self.opens = self.opens.saturating_add(1);
    }

    pub fn record_swap(&mut self) {
        self.swaps = self.swaps.saturating_add(1);
    }

    pub fn record_close(&mut self) {
        self.closes = self.closes.saturating_add(1);
    }

    pub fn record_refused(&mut self) {
        self.refused = self.refused.saturating_add(1);
    }

    pub fn snapshot(&self, open_panels: usize) -> MetricSnapshot {
        MetricSnapshot {
            open_panels: open_panels as u64,
            dispatches: self.dispatches,
            unrouted: self.unrouted,
            successes: self.successes,
            cancels: self.cancels,
            opens: self.opens,
            swaps: self.swaps,
            closes: self.closes,
            refused: self.refused,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub open_panels: u64,
    pub dispatches: u64,
    pub unrouted: u64,
    pub successes: u64,
    pub cancels: u64,
    pub opens: u64,
    pub swaps: u64,
    pub closes: u64,
    pub refused: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "panel_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("open_panels".to_string(), json!(self.open_panels));
        map.insert("dispatches".to_string(), json!(self.dispatches));
        map.insert("unrouted".to_string(), json!(self.unrouted));
        map.insert("successes".to_string(), json!(self.successes));
        map.insert("cancels".to_string(), json!(self.cancels));
        map.insert("opens".to_string(), json!(self.opens));
        map.insert("swaps".to_string(), json!(self.swaps));
        map.insert("closes".to_string(), json!(self.closes));
        map.insert("refused".to_string(), json!(self.refused));
        map
    }
}
