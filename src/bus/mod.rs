//! Priority-ordered interaction bus, one per panel handle.
//!
//! Subscribers are kept per [`InteractionType`] in ascending priority order,
//! ties in registration order. Each bucket is an immutable `Arc<Vec<_>>`
//! replaced wholesale on every change, so a dispatch walks a stable snapshot
//! while other threads (or the callbacks themselves) register and
//! unregister. Changes become visible on the next dispatch.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::json;

use crate::interaction::{ActionResult, Interaction, InteractionType};
use crate::logging::{LogLevel, Logger, TARGET_BUS, emit, json_kv};
use crate::panel::PanelContext;

/// Conventional priority bands. Lower runs first; any `i32` is accepted.
pub struct Priority;

impl Priority {
    pub const HIGHEST: i32 = 0;
    pub const HIGH: i32 = 20;
    pub const NORMAL: i32 = 30;
    pub const LOW: i32 = 40;
    pub const LOWEST: i32 = 50;
}

/// Identity of a registrant, used for bulk unregistration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerToken(Arc<str>);

impl OwnerToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::from(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

pub type Callback<V, I> =
    Arc<dyn Fn(&PanelContext<'_, V, I>, &mut Interaction<I>) -> ActionResult + Send + Sync>;

pub struct Subscription<V, I> {
    owner: OwnerToken,
    interaction_type: InteractionType,
    priority: i32,
    sequence: u64,
    callback: Callback<V, I>,
}

impl<V, I> Subscription<V, I> {
    pub fn owner(&self) -> &OwnerToken {
        &self.owner
    }

    pub fn interaction_type(&self) -> InteractionType {
        self.interaction_type
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl<V, I> Clone for Subscription<V, I> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            interaction_type: self.interaction_type,
            priority: self.priority,
            sequence: self.sequence,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<V, I> fmt::Debug for Subscription<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("owner", &self.owner)
            .field("interaction_type", &self.interaction_type)
            .field("priority", &self.priority)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

/// A component that contributes several callbacks under one owner token.
pub trait EventSubscriber<V, I> {
    fn owner(&self) -> OwnerToken;

    fn register_events(&self, bus: &EventBus<V, I>);
}

type Table<V, I> = HashMap<InteractionType, Arc<Vec<Subscription<V, I>>>>;

pub struct EventBus<V, I> {
    table: RwLock<Table<V, I>>,
    sequence: AtomicU64,
    logger: Option<Logger>,
}

impl<V, I> Default for EventBus<V, I> {
    fn default() -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            logger: None,
        }
    }
}

impl<V, I> EventBus<V, I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn set_logger(&mut self, logger: Option<Logger>) {
        self.logger = logger;
    }

    pub fn register<F>(
        &self,
        owner: &OwnerToken,
        interaction_type: InteractionType,
        priority: i32,
        callback: F,
    ) where
        F: Fn(&PanelContext<'_, V, I>, &mut Interaction<I>) -> ActionResult + Send + Sync + 'static,
    {
        let callback: Callback<V, I> = Arc::new(callback);

        {
            let mut table = self.write();
            // Sequence is taken under the write lock so it matches table order.
            let subscription = Subscription {
                owner: owner.clone(),
                interaction_type,
                priority,
                sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
                callback,
            };
            let bucket = table.entry(interaction_type).or_default();
            let mut next: Vec<_> = bucket.iter().cloned().collect();
            next.push(subscription);
            // Stable: equal priorities keep registration order.
            next.sort_by_key(|sub| sub.priority);
            *bucket = Arc::new(next);
        }

        emit(
            self.logger.as_ref(),
            LogLevel::Trace,
            TARGET_BUS,
            "subscriber_registered",
            [
                json_kv("owner", owner.as_str()),
                json_kv("type", interaction_type.as_str()),
                json_kv("priority", priority),
            ],
        );
    }

    pub fn register_default<F>(&self, owner: &OwnerToken, interaction_type: InteractionType, callback: F)
    where
        F: Fn(&PanelContext<'_, V, I>, &mut Interaction<I>) -> ActionResult + Send + Sync + 'static,
    {
        self.register(owner, interaction_type, Priority::NORMAL, callback);
    }

    /// Let a component register all of its callbacks; returns its owner token.
    pub fn subscribe<S>(&self, subscriber: &S) -> OwnerToken
    where
        S: EventSubscriber<V, I> + ?Sized,
    {
        subscriber.register_events(self);
        subscriber.owner()
    }

    /// Remove every subscription held by `owner`. Unknown owners are a no-op.
    pub fn unregister(&self, owner: &OwnerToken) -> usize {
        let mut removed = 0;
        {
            let mut table = self.write();
            table.retain(|_, bucket| {
                let before = bucket.len();
                if bucket.iter().any(|sub| &sub.owner == owner) {
                    let kept: Vec<_> = bucket
                        .iter()
                        .filter(|sub| &sub.owner != owner)
                        .cloned()
                        .collect();
                    removed += before - kept.len();
                    *bucket = Arc::new(kept);
                }
                !bucket.is_empty()
            });
        }

        if removed > 0 {
            emit(
                self.logger.as_ref(),
                LogLevel::Trace,
                TARGET_BUS,
                "subscriber_unregistered",
                [json_kv("owner", owner.as_str()), json_kv("removed", removed)],
            );
        }
        removed
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Run `interaction` through its subscribers until one stops it.
    ///
    /// The context's result records each subscriber's answer in turn. A
    /// panicking callback unwinds through here untouched.
    pub fn dispatch(&self, ctx: &PanelContext<'_, V, I>, interaction: &mut Interaction<I>) -> ActionResult {
        let interaction_type = interaction.interaction_type();
        let Some(snapshot) = self.snapshot(interaction_type) else {
            return ActionResult::Pass;
        };

        let mut visited = 0usize;
        let mut outcome = ActionResult::Pass;
        for sub in snapshot.iter() {
            visited += 1;
            let result = (sub.callback)(ctx, interaction);
            interaction.set_result(result);
            if !result.is_pass() {
                outcome = result;
                break;
            }
        }

        emit(
            self.logger.as_ref(),
            LogLevel::Debug,
            TARGET_BUS,
            "interaction_dispatched",
            [
                json_kv("type", interaction_type.as_str()),
                json_kv("visited", visited),
                json_kv("subscribers", snapshot.len()),
                json_kv("result", json!(format!("{outcome:?}"))),
            ],
        );
        outcome
    }

    pub fn subscriber_count(&self, interaction_type: InteractionType) -> usize {
        self.read()
            .get(&interaction_type)
            .map_or(0, |bucket| bucket.len())
    }

    pub fn len(&self) -> usize {
        self.read().values().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Subscriptions for `interaction_type` in dispatch order.
    pub fn subscriptions(&self, interaction_type: InteractionType) -> Vec<Subscription<V, I>> {
        self.snapshot(interaction_type)
            .map(|bucket| bucket.to_vec())
            .unwrap_or_default()
    }

    fn snapshot(&self, interaction_type: InteractionType) -> Option<Arc<Vec<Subscription<V, I>>>> {
        self.read().get(&interaction_type).cloned()
    }

    // Buckets are swapped whole, so a guard recovered from poisoning is consistent.
    fn read(&self) -> RwLockReadGuard<'_, Table<V, I>> {
        self.table
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table<V, I>> {
        self.table
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V, I> fmt::Debug for EventBus<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.len())
            .finish_non_exhaustive()
    }
}
