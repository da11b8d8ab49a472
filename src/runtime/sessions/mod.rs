//! Per-viewer panel sessions.
//!
//! Each viewer owns at most one open panel plus a bounded stack of parents
//! that `back` returns to. Every mutation of one viewer's session happens
//! under that viewer's slot lock, so concurrent open/swap/close calls are
//! serialised per viewer while different viewers never contend beyond the
//! brief map lookup. No lock is held while subscribers or audit hooks run,
//! which lets a callback close or swap the very panel that is dispatching.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde_json::Value;

use crate::error::{PanelError, Result};
use crate::logging::{LogLevel, TARGET_SESSIONS, emit, json_kv};
use crate::metrics::{MetricSnapshot, PanelMetrics};
use crate::panel::{PanelContext, PanelHandle, PanelId};

use super::audit::{SessionAuditEventBuilder, SessionAuditStage};
use super::{DispatchOutcome, Notification, RuntimeConfig};

/// Acknowledgement returned by `open` and `swap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The viewer had no panel.
    Opened,
    /// The requested handle was already on top; nothing changed.
    AlreadyOpen,
    /// Another panel was open and has been replaced.
    Replaced { previous: PanelId },
}

/// Decides whether `open` without `force` may replace a viewer's panel.
///
/// Consulted while the viewer's session is locked; implementations must not
/// call back into the manager for the same viewer.
pub trait ReplacePolicy<V, I>: Send + Sync {
    fn allow_replace(
        &self,
        viewer: &V,
        current: &PanelHandle<V, I>,
        requested: &PanelHandle<V, I>,
    ) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysReplace;

impl<V, I> ReplacePolicy<V, I> for AlwaysReplace {
    fn allow_replace(&self, _: &V, _: &PanelHandle<V, I>, _: &PanelHandle<V, I>) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NeverReplace;

impl<V, I> ReplacePolicy<V, I> for NeverReplace {
    fn allow_replace(&self, _: &V, _: &PanelHandle<V, I>, _: &PanelHandle<V, I>) -> bool {
        false
    }
}

type SharedSlot<V, I> = Arc<Mutex<SessionSlot<V, I>>>;

struct SessionSlot<V, I> {
    /// Oldest first; the last entry is the open panel.
    history: Vec<Arc<PanelHandle<V, I>>>,
    /// Set once the slot has been unlinked from the map.
    retired: bool,
}

impl<V, I> SessionSlot<V, I> {
    fn new() -> Self {
        Self {
            history: Vec::new(),
            retired: false,
        }
    }

    fn current(&self) -> Option<&Arc<PanelHandle<V, I>>> {
        self.history.last()
    }

    fn push(&mut self, handle: Arc<PanelHandle<V, I>>, limit: usize) {
        self.history.push(handle);
        if limit > 0 && self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }
}

enum Transition {
    Opened,
    Unchanged,
    Replaced(PanelId),
    Refused(PanelId),
}

pub struct PanelManager<V, I> {
    sessions: RwLock<HashMap<V, SharedSlot<V, I>>>,
    policy: Arc<dyn ReplacePolicy<V, I>>,
    config: RuntimeConfig,
}

impl<V, I> Default for PanelManager<V, I>
where
    V: Clone + Eq + Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, I> PanelManager<V, I>
where
    V: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            policy: Arc::new(AlwaysReplace),
            config,
        }
    }

    pub fn with_replace_policy<P>(mut self, policy: P) -> Self
    where
        P: ReplacePolicy<V, I> + 'static,
    {
        self.policy = Arc::new(policy);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Show `handle` to `viewer`, pushing any open panel onto the history.
    ///
    /// With `force` the history is discarded and the replace policy is not
    /// consulted. Opening the handle that is already on top is a no-op.
    pub fn open(&self, viewer: V, handle: Arc<PanelHandle<V, I>>, force: bool) -> Result<OpenOutcome> {
        let limit = self.config.history_limit;
        let transition = self.with_live_slot(&viewer, |slot| {
            let Some(current) = slot.current().map(Arc::clone) else {
                slot.push(Arc::clone(&handle), limit);
                return Transition::Opened;
            };
            if Arc::ptr_eq(&current, &handle) {
                return Transition::Unchanged;
            }
            if !force && !self.policy.allow_replace(&viewer, &current, &handle) {
                return Transition::Refused(current.id().to_string());
            }
            if force {
                slot.history.clear();
            }
            slot.push(Arc::clone(&handle), limit);
            Transition::Replaced(current.id().to_string())
        })?;

        match transition {
            Transition::Opened => {
                self.record(SessionAuditStage::Opened, &viewer, handle.id(), Vec::new());
                Ok(OpenOutcome::Opened)
            }
            Transition::Unchanged => Ok(OpenOutcome::AlreadyOpen),
            Transition::Replaced(previous) => {
                self.record(
                    SessionAuditStage::Replaced,
                    &viewer,
                    handle.id(),
                    vec![json_kv("previous", previous.as_str()), json_kv("force", force)],
                );
                Ok(OpenOutcome::Replaced { previous })
            }
            Transition::Refused(current) => {
                self.record(
                    SessionAuditStage::OpenRefused,
                    &viewer,
                    handle.id(),
                    vec![json_kv("current", current.as_str())],
                );
                Err(PanelError::AlreadyOpen {
                    viewer: format!("{viewer:?}"),
                    current,
                    requested: handle.id().to_string(),
                })
            }
        }
    }

    /// Exchange the viewer's open panel for `handle` in one step.
    ///
    /// The replaced panel is dropped rather than kept as a parent, and no
    /// observer can see the viewer without a panel in between.
    pub fn swap(&self, viewer: V, handle: Arc<PanelHandle<V, I>>) -> Result<OpenOutcome> {
        let limit = self.config.history_limit;
        let transition = self.with_live_slot(&viewer, |slot| {
            let Some(current) = slot.current().map(Arc::clone) else {
                slot.push(Arc::clone(&handle), limit);
                return Transition::Opened;
            };
            if Arc::ptr_eq(&current, &handle) {
                return Transition::Unchanged;
            }
            slot.history.pop();
            slot.push(Arc::clone(&handle), limit);
            Transition::Replaced(current.id().to_string())
        })?;

        match transition {
            Transition::Opened => {
                self.record(SessionAuditStage::Opened, &viewer, handle.id(), Vec::new());
                Ok(OpenOutcome::Opened)
            }
            Transition::Replaced(previous) => {
                self.record(
                    SessionAuditStage::Swapped,
                    &viewer,
                    handle.id(),
                    vec![json_kv("previous", previous.as_str())],
                );
                Ok(OpenOutcome::Replaced { previous })
            }
            Transition::Unchanged | Transition::Refused(_) => Ok(OpenOutcome::AlreadyOpen),
        }
    }

    /// Close the viewer's panel and forget its history.
    ///
    /// Returns the handle that was open, or `None` when there was nothing to
    /// close.
    pub fn close(&self, viewer: &V) -> Result<Option<Arc<PanelHandle<V, I>>>> {
        let closed = {
            let mut sessions = self.write_sessions()?;
            match sessions.remove(viewer) {
                Some(slot) => {
                    // The slot is already out of the map; a poisoned one is still retired.
                    let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    guard.retired = true;
                    let top = guard.history.pop();
                    guard.history.clear();
                    top
                }
                None => None,
            }
        };

        if let Some(handle) = &closed {
            self.record(SessionAuditStage::Closed, viewer, handle.id(), Vec::new());
        }
        Ok(closed)
    }

    /// Pop the open panel and reveal its parent, if one was kept.
    ///
    /// Returns the panel now open. Popping the last panel leaves the viewer
    /// with nothing open.
    pub fn back(&self, viewer: &V) -> Result<Option<Arc<PanelHandle<V, I>>>> {
        let popped = self.with_existing_slot(viewer, |slot| {
            let left = slot.history.pop()?;
            Some((left, slot.current().map(Arc::clone)))
        })?;

        let Some((left, parent)) = popped.flatten() else {
            return Ok(None);
        };
        if parent.is_none() {
            self.prune(viewer)?;
        }

        let mut details = vec![json_kv("left", left.id())];
        if let Some(parent) = &parent {
            details.push(json_kv("parent", parent.id()));
        }
        self.record(SessionAuditStage::Back, viewer, left.id(), details);
        Ok(parent)
    }

    pub fn current(&self, viewer: &V) -> Option<Arc<PanelHandle<V, I>>> {
        let slot = self.sessions.read().ok()?.get(viewer).map(Arc::clone)?;
        let guard = slot.lock().ok()?;
        if guard.retired {
            return None;
        }
        guard.current().map(Arc::clone)
    }

    pub fn is_open(&self, viewer: &V) -> bool {
        self.current(viewer).is_some()
    }

    /// Panels kept for the viewer, oldest first, the open one last.
    pub fn history(&self, viewer: &V) -> Vec<PanelId> {
        let Some(slot) = self
            .sessions
            .read()
            .ok()
            .and_then(|sessions| sessions.get(viewer).map(Arc::clone))
        else {
            return Vec::new();
        };
        match slot.lock() {
            Ok(guard) if !guard.retired => guard
                .history
                .iter()
                .map(|handle| handle.id().to_string())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of viewers that currently have a panel open.
    pub fn open_count(&self) -> usize {
        let slots: Vec<SharedSlot<V, I>> = match self.sessions.read() {
            Ok(sessions) => sessions.values().map(Arc::clone).collect(),
            Err(_) => return 0,
        };
        slots
            .iter()
            .filter(|slot| {
                slot.lock()
                    .map(|guard| !guard.retired && !guard.history.is_empty())
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn viewers(&self) -> Vec<V> {
        self.sessions
            .read()
            .map(|sessions| sessions.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Close every session, e.g. on shutdown. Returns how many were open.
    pub fn close_all(&self) -> Result<usize> {
        let mut closed = 0;
        for viewer in self.viewers() {
            if self.close(&viewer)?.is_some() {
                closed += 1;
            }
        }
        Ok(closed)
    }

    /// Route a host interaction to the viewer's open panel.
    ///
    /// Notifications whose source is not the viewer's open panel are left
    /// alone and reported as unrouted with a `Pass` result.
    pub fn dispatch(&self, viewer: &V, notification: Notification<I>) -> DispatchOutcome {
        let Notification {
            source,
            mut interaction,
        } = notification;

        let handle = match self.current(viewer) {
            Some(handle) if handle.id() == source => handle,
            other => {
                self.with_metrics(PanelMetrics::record_unrouted);
                emit(
                    self.config.logger.as_ref(),
                    LogLevel::Trace,
                    TARGET_SESSIONS,
                    "notification_unrouted",
                    [
                        json_kv("viewer", format!("{viewer:?}")),
                        json_kv("source", source.as_str()),
                        json_kv(
                            "open",
                            other.map_or(Value::Null, |open| Value::from(open.id())),
                        ),
                    ],
                );
                return DispatchOutcome::unrouted();
            }
        };

        let ctx = PanelContext::new(viewer, &*handle).with_manager(self);
        let result = handle.bus().dispatch(&ctx, &mut interaction);
        self.with_metrics(|metrics| metrics.record_dispatch(result));

        let mut event = SessionAuditEventBuilder::new(SessionAuditStage::Dispatched, format!("{viewer:?}"));
        event
            .panel(handle.id())
            .detail("type", Value::from(interaction.interaction_type().as_str()))
            .detail("result", Value::from(format!("{result:?}")));
        self.config.audit.record(event.finish());

        DispatchOutcome {
            result,
            consumed: interaction.consumed(),
            routed: true,
        }
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let metrics = self.config.metrics.as_ref()?;
        let open = self.open_count();
        metrics.lock().ok().map(|guard| guard.snapshot(open))
    }

    /// Write a metrics snapshot to the configured logger.
    pub fn emit_metrics(&self) {
        let (Some(logger), Some(snapshot)) = (self.config.logger.as_ref(), self.metrics_snapshot())
        else {
            return;
        };
        let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
    }

    fn with_live_slot<R>(
        &self,
        viewer: &V,
        mut apply: impl FnMut(&mut SessionSlot<V, I>) -> R,
    ) -> Result<R> {
        loop {
            let slot = self.obtain_slot(viewer)?;
            let mut guard = lock_slot(&slot)?;
            if guard.retired {
                continue;
            }
            return Ok(apply(&mut *guard));
        }
    }

    fn with_existing_slot<R>(
        &self,
        viewer: &V,
        mut apply: impl FnMut(&mut SessionSlot<V, I>) -> R,
    ) -> Result<Option<R>> {
        loop {
            let Some(slot) = self.read_sessions()?.get(viewer).map(Arc::clone) else {
                return Ok(None);
            };
            let mut guard = lock_slot(&slot)?;
            if guard.retired {
                continue;
            }
            return Ok(Some(apply(&mut *guard)));
        }
    }

    fn obtain_slot(&self, viewer: &V) -> Result<SharedSlot<V, I>> {
        if let Some(slot) = self.read_sessions()?.get(viewer) {
            return Ok(Arc::clone(slot));
        }
        let mut sessions = self.write_sessions()?;
        let slot = sessions
            .entry(viewer.clone())
            .or_insert_with(|| Arc::new(Mutex::new(SessionSlot::new())));
        Ok(Arc::clone(slot))
    }

    /// Unlink the viewer's slot if it no longer holds any panel.
    fn prune(&self, viewer: &V) -> Result<()> {
        let mut sessions = self.write_sessions()?;
        let empty = match sessions.get(viewer) {
            Some(slot) => {
                let mut guard = lock_slot(slot)?;
                if guard.history.is_empty() {
                    guard.retired = true;
                }
                guard.retired
            }
            None => false,
        };
        if empty {
            sessions.remove(viewer);
        }
        Ok(())
    }

    fn read_sessions(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<V, SharedSlot<V, I>>>> {
        self.sessions.read().map_err(|_| PanelError::Poisoned)
    }

    fn write_sessions(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<V, SharedSlot<V, I>>>> {
        self.sessions.write().map_err(|_| PanelError::Poisoned)
    }

    fn with_metrics(&self, update: impl FnOnce(&mut PanelMetrics)) {
        if let Some(metrics) = &self.config.metrics {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut *guard);
            }
        }
    }

    fn record(&self, stage: SessionAuditStage, viewer: &V, panel: &str, details: Vec<(String, Value)>) {
        match stage {
            SessionAuditStage::Opened | SessionAuditStage::Replaced => {
                self.with_metrics(PanelMetrics::record_open)
            }
            SessionAuditStage::Swapped => self.with_metrics(PanelMetrics::record_swap),
            SessionAuditStage::Closed => self.with_metrics(PanelMetrics::record_close),
            SessionAuditStage::OpenRefused => self.with_metrics(PanelMetrics::record_refused),
            SessionAuditStage::Back | SessionAuditStage::Dispatched => {}
        }

        let viewer = format!("{viewer:?}");

        let level = match stage {
            SessionAuditStage::OpenRefused => LogLevel::Warn,
            _ => LogLevel::Info,
        };
        emit(
            self.config.logger.as_ref(),
            level,
            TARGET_SESSIONS,
            stage_message(stage),
            [json_kv("viewer", viewer.as_str()), json_kv("panel", panel)]
                .into_iter()
                .chain(details.iter().cloned()),
        );

        let mut event = SessionAuditEventBuilder::new(stage, viewer);
        event.panel(panel);
        for (key, value) in details {
            event.detail(key, value);
        }
        self.config.audit.record(event.finish());
    }
}

impl<V, I> fmt::Debug for PanelManager<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sessions = self.sessions.read().map(|sessions| sessions.len()).unwrap_or(0);
        f.debug_struct("PanelManager")
            .field("sessions", &sessions)
            .field("history_limit", &self.config.history_limit)
            .finish_non_exhaustive()
    }
}

fn lock_slot<V, I>(slot: &SharedSlot<V, I>) -> Result<MutexGuard<'_, SessionSlot<V, I>>> {
    slot.lock().map_err(|_| PanelError::Poisoned)
}

fn stage_message(stage: SessionAuditStage) -> &'static str {
    match stage {
        SessionAuditStage::Opened => "panel_opened",
        SessionAuditStage::Replaced => "panel_replaced",
        SessionAuditStage::Swapped => "panel_swapped",
        SessionAuditStage::Closed => "panel_closed",
        SessionAuditStage::Back => "panel_back",
        SessionAuditStage::OpenRefused => "panel_open_refused",
        SessionAuditStage::Dispatched => "notification_dispatched",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::OwnerToken;
    use crate::interaction::{
        ActionResult, ClickContext, ClickKind, Interaction, InteractionType, SlotItem,
    };
    use crate::layout::{GridLayout, SupportedSizes};
    use crate::logging::{Logger, MemorySink};
    use crate::runtime::audit::RecordingAudit;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    struct Coin(u32);

    impl SlotItem for Coin {
        fn amount(&self) -> u32 {
            self.0
        }
    }

    type Handle = Arc<PanelHandle<u32, Coin>>;

    fn handle(id: &str) -> Handle {
        let layout = GridLayout::resolve(
            &["AAA", "ABA", "AAA"],
            [('A', "frame"), ('B', "coin")],
            &SupportedSizes::new([9]),
        )
        .unwrap();
        Arc::new(PanelHandle::new(id, Arc::new(layout), |key: &str| {
            (key == "coin").then_some(Coin(1))
        }))
    }

    fn click(source: &str, slot: usize) -> Notification<Coin> {
        Notification::new(
            source,
            Interaction::Click(ClickContext::new(ClickKind::Left, [slot], None)),
        )
    }

    #[test]
    fn open_then_reopen_same_handle_is_noop() {
        let manager = PanelManager::new();
        let shop = handle("shop");
        assert_eq!(manager.open(1, Arc::clone(&shop), false).unwrap(), OpenOutcome::Opened);
        assert_eq!(manager.open(1, Arc::clone(&shop), false).unwrap(), OpenOutcome::AlreadyOpen);
        assert_eq!(manager.open(1, Arc::clone(&shop), true).unwrap(), OpenOutcome::AlreadyOpen);
        assert_eq!(manager.history(&1), vec!["shop".to_string()]);
        assert_eq!(manager.open_count(), 1);
    }

    #[test]
    fn open_over_existing_keeps_parent() {
        let manager = PanelManager::new();
        manager.open(1, handle("menu"), false).unwrap();
        let outcome = manager.open(1, handle("shop"), false).unwrap();
        assert_eq!(
            outcome,
            OpenOutcome::Replaced {
                previous: "menu".to_string()
            }
        );
        assert_eq!(manager.history(&1), vec!["menu".to_string(), "shop".to_string()]);
        assert_eq!(manager.current(&1).unwrap().id(), "shop");
    }

    #[test]
    fn refusing_policy_rejects_unforced_open() {
        let manager = PanelManager::new().with_replace_policy(NeverReplace);
        manager.open(1, handle("menu"), false).unwrap();

        let err = manager.open(1, handle("shop"), false).unwrap_err();
        match err {
            PanelError::AlreadyOpen { current, requested, .. } => {
                assert_eq!(current, "menu");
                assert_eq!(requested, "shop");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(manager.current(&1).unwrap().id(), "menu");

        assert!(matches!(
            manager.open(1, handle("shop"), true).unwrap(),
            OpenOutcome::Replaced { .. }
        ));
        assert_eq!(manager.history(&1), vec!["shop".to_string()]);
    }

    #[test]
    fn history_is_bounded() {
        let config = RuntimeConfig::default().with_history_limit(2);
        let manager = PanelManager::with_config(config);
        for id in ["a", "b", "c", "d"] {
            manager.open(5, handle(id), false).unwrap();
        }
        assert_eq!(manager.history(&5), vec!["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn swap_replaces_top_without_history() {
        let audit = Arc::new(RecordingAudit::new());
        let manager = PanelManager::with_config(RuntimeConfig::default().with_audit(Arc::clone(&audit)));

        assert_eq!(manager.swap(2, handle("menu")).unwrap(), OpenOutcome::Opened);
        assert_eq!(
            manager.swap(2, handle("bank")).unwrap(),
            OpenOutcome::Replaced {
                previous: "menu".to_string()
            }
        );
        assert_eq!(manager.history(&2), vec!["bank".to_string()]);
        assert_eq!(
            audit.stages(),
            vec![SessionAuditStage::Opened, SessionAuditStage::Swapped]
        );
    }

    #[test]
    fn close_forgets_session() {
        let manager = PanelManager::new();
        manager.open(3, handle("menu"), false).unwrap();
        manager.open(3, handle("shop"), false).unwrap();

        let closed = manager.close(&3).unwrap().unwrap();
        assert_eq!(closed.id(), "shop");
        assert!(!manager.is_open(&3));
        assert!(manager.history(&3).is_empty());
        assert!(manager.close(&3).unwrap().is_none());
        assert!(manager.back(&3).unwrap().is_none());
    }

    #[test]
    fn close_recovers_a_poisoned_session() {
        let manager = PanelManager::new();
        manager.open(5, handle("menu"), false).unwrap();

        let slot = manager
            .sessions
            .read()
            .unwrap()
            .get(&5)
            .map(Arc::clone)
            .unwrap();
        let poisoner = Arc::clone(&slot);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the session slot");
        })
        .join();
        assert!(slot.is_poisoned());

        let closed = manager.close(&5).unwrap().unwrap();
        assert_eq!(closed.id(), "menu");
        assert!(!manager.is_open(&5));
        assert!(manager.viewers().is_empty());

        assert_eq!(manager.open(5, handle("shop"), false).unwrap(), OpenOutcome::Opened);
        assert_eq!(manager.current(&5).unwrap().id(), "shop");
    }

    #[test]
    fn back_walks_the_history() {
        let manager = PanelManager::new();
        manager.open(4, handle("menu"), false).unwrap();
        manager.open(4, handle("shop"), false).unwrap();

        let parent = manager.back(&4).unwrap().unwrap();
        assert_eq!(parent.id(), "menu");
        assert_eq!(manager.current(&4).unwrap().id(), "menu");

        assert!(manager.back(&4).unwrap().is_none());
        assert!(!manager.is_open(&4));
        assert!(manager.viewers().is_empty());
    }

    #[test]
    fn viewers_are_independent() {
        let manager = PanelManager::new();
        let shared = handle("shop");
        manager.open(1, Arc::clone(&shared), false).unwrap();
        manager.open(2, Arc::clone(&shared), false).unwrap();
        manager.close(&1).unwrap();
        assert!(!manager.is_open(&1));
        assert!(manager.is_open(&2));
        assert_eq!(manager.close_all().unwrap(), 1);
        assert_eq!(manager.open_count(), 0);
    }

    #[test]
    fn dispatch_requires_matching_source() {
        let manager = PanelManager::new();
        let shop = handle("shop");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        shop.bus()
            .register_default(&OwnerToken::new("count"), InteractionType::Click, move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                ActionResult::Cancel
            });

        assert!(!manager.dispatch(&1, click("shop", 4)).routed);

        manager.open(1, Arc::clone(&shop), false).unwrap();
        let stale = manager.dispatch(&1, click("menu", 4));
        assert!(!stale.routed);
        assert_eq!(stale.result, ActionResult::Pass);

        let outcome = manager.dispatch(&1, click("shop", 4));
        assert!(outcome.routed);
        assert!(outcome.cancelled());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_can_close_its_own_panel() {
        let manager = PanelManager::new();
        let shop = handle("shop");
        shop.bus()
            .register_default(&OwnerToken::new("exit"), InteractionType::Click, |ctx, _| {
                if let Some(manager) = ctx.manager() {
                    manager.close(ctx.viewer()).unwrap();
                }
                ActionResult::Cancel
            });

        manager.open(9, Arc::clone(&shop), false).unwrap();
        let outcome = manager.dispatch(&9, click("shop", 0));
        assert!(outcome.cancelled());
        assert!(!manager.is_open(&9));
    }

    #[test]
    fn lifecycle_is_logged_and_counted() {
        let sink = MemorySink::new();
        let mut config = RuntimeConfig::default().with_logger(Logger::new(sink.clone()));
        config.enable_metrics();
        let manager = PanelManager::with_config(config);

        manager.open(1, handle("menu"), false).unwrap();
        manager.swap(1, handle("shop")).unwrap();
        manager.dispatch(&1, click("shop", 4));
        manager.dispatch(&1, click("menu", 4));
        manager.close(&1).unwrap();
        manager.emit_metrics();

        let messages = sink.messages();
        assert!(messages.contains(&"panel_opened".to_string()));
        assert!(messages.contains(&"panel_swapped".to_string()));
        assert!(messages.contains(&"panel_closed".to_string()));
        assert_eq!(messages.last().map(String::as_str), Some("panel_metrics"));

        let snapshot = manager.metrics_snapshot().unwrap();
        assert_eq!(snapshot.opens, 1);
        assert_eq!(snapshot.swaps, 1);
        assert_eq!(snapshot.closes, 1);
        assert_eq!(snapshot.dispatches, 1);
        assert_eq!(snapshot.unrouted, 1);
        assert_eq!(snapshot.open_panels, 0);
    }

    #[test]
    fn concurrent_transitions_keep_one_panel_per_viewer() {
        let manager = Arc::new(PanelManager::new());
        let handles: Vec<Handle> = ["a", "b", "c"].into_iter().map(handle).collect();

        let workers: Vec<_> = (0..6)
            .map(|worker| {
                let manager = Arc::clone(&manager);
                let handles = handles.clone();
                thread::spawn(move || {
                    for round in 0..200usize {
                        let pick = Arc::clone(&handles[(worker + round) % handles.len()]);
                        match round % 4 {
                            0 => {
                                manager.open(7, pick, false).unwrap();
                            }
                            1 => {
                                manager.swap(7, pick).unwrap();
                            }
                            2 => {
                                manager.back(&7).unwrap();
                            }
                            _ => {
                                manager.close(&7).unwrap();
                            }
                        }
                        assert!(manager.open_count() <= 1);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert!(manager.open_count() <= 1);
        if let Some(current) = manager.current(&7) {
            assert!(["a", "b", "c"].contains(&current.id()));
        }
    }
}
