//! Interaction contexts handed through the event bus.
//!
//! A context is created per host notification, visited by subscribers, and
//! dropped once dispatch returns.

mod context;
mod rules;

pub use context::{
    ActionResult, ClickContext, ClickKind, DropContext, DropKind, Interaction, InteractionType,
    SlotItem,
};
pub use rules::ClickRules;
