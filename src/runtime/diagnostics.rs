use std::fmt;

use serde_json::{Value, json};

use crate::bus::{EventBus, EventSubscriber, OwnerToken, Priority};
use crate::interaction::{ActionResult, InteractionType};
use crate::logging::{LogLevel, Logger, TARGET_DIAGNOSTICS, event_with_fields, json_kv};

/// Logs every interaction a panel sees, before any other subscriber runs.
///
/// Always answers `Pass`, so attaching it never changes dispatch outcomes.
#[derive(Clone)]
pub struct InteractionLogger {
    owner: OwnerToken,
    logger: Logger,
    level: LogLevel,
    log_clicks: bool,
    log_drags: bool,
    log_drops: bool,
}

impl InteractionLogger {
    pub const PRIORITY: i32 = Priority::HIGHEST - 100;

    pub fn new(logger: Logger) -> Self {
        Self {
            owner: OwnerToken::new("diagnostics.interaction_logger"),
            logger,
            level: LogLevel::Debug,
            log_clicks: true,
            log_drags: true,
            log_drops: true,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn log_clicks(mut self, enabled: bool) -> Self {
        self.log_clicks = enabled;
        self
    }

    pub fn log_drags(mut self, enabled: bool) -> Self {
        self.log_drags = enabled;
        self
    }

    pub fn log_drops(mut self, enabled: bool) -> Self {
        self.log_drops = enabled;
        self
    }

    fn enabled_for(&self, interaction_type: InteractionType) -> bool {
        match interaction_type {
            InteractionType::Click => self.log_clicks,
            InteractionType::Drag => self.log_drags,
            InteractionType::Drop => self.log_drops,
        }
    }
}

impl<V, I> EventSubscriber<V, I> for InteractionLogger
where
    V: fmt::Debug,
{
    fn owner(&self) -> OwnerToken {
        self.owner.clone()
    }

    fn register_events(&self, bus: &EventBus<V, I>) {
        for interaction_type in InteractionType::ALL {
            if !self.enabled_for(interaction_type) {
                continue;
            }
            let logger = self.logger.clone();
            let level = self.level;
            bus.register(&self.owner, interaction_type, Self::PRIORITY, move |ctx, interaction| {
                let slots: Vec<usize> = interaction.affected_slots().iter().copied().collect();
                let kind = interaction
                    .click_kind()
                    .map_or(Value::Null, |kind| json!(format!("{kind:?}")));
                let event = event_with_fields(
                    level,
                    TARGET_DIAGNOSTICS,
                    &format!("interaction.{}", interaction_type.as_str()),
                    [
                        json_kv("panel", ctx.panel_id()),
                        json_kv("viewer", format!("{:?}", ctx.viewer())),
                        json_kv("slots", json!(slots)),
                        json_kv("kind", kind),
                        json_kv("has_payload", interaction.item().is_some()),
                    ],
                );
                let _ = logger.log_event(event);
                ActionResult::Pass
            });
        }
    }
}
