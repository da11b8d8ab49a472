use std::collections::BTreeSet;
use std::sync::Arc;

use crate::bus::{EventBus, EventSubscriber, OwnerToken, Priority};
use crate::interaction::{ActionResult, ClickRules, InteractionType};

/// Cancels clicks and drags on owned slots whose gesture the rules reject.
///
/// Interactions that touch none of the owned slots pass through untouched.
#[derive(Debug, Clone)]
pub struct SlotGuard {
    owner: OwnerToken,
    slots: Arc<BTreeSet<usize>>,
    rules: Arc<ClickRules>,
    priority: i32,
}

impl SlotGuard {
    pub fn new(owner: impl Into<String>, slots: impl IntoIterator<Item = usize>, rules: ClickRules) -> Self {
        Self {
            owner: OwnerToken::new(owner),
            slots: Arc::new(slots.into_iter().collect()),
            rules: Arc::new(rules),
            priority: Priority::LOWEST,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn slots(&self) -> &BTreeSet<usize> {
        &self.slots
    }
}

impl<V, I> EventSubscriber<V, I> for SlotGuard {
    fn owner(&self) -> OwnerToken {
        self.owner.clone()
    }

    fn register_events(&self, bus: &EventBus<V, I>) {
        for interaction_type in [InteractionType::Click, InteractionType::Drag] {
            let slots = Arc::clone(&self.slots);
            let rules = Arc::clone(&self.rules);
            bus.register(&self.owner, interaction_type, self.priority, move |_, interaction| {
                let Some(kind) = interaction.click_kind() else {
                    return ActionResult::Pass;
                };
                let touches_owned = interaction
                    .affected_slots()
                    .iter()
                    .any(|slot| slots.contains(slot));
                if touches_owned && !rules.is_allowed(kind) {
                    ActionResult::Cancel
                } else {
                    ActionResult::Pass
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{ClickContext, ClickKind, Interaction, SlotItem};
    use crate::layout::{GridLayout, SupportedSizes};
    use crate::panel::PanelHandle;

    #[derive(Debug, Clone)]
    struct Stack(u32);

    impl SlotItem for Stack {
        fn amount(&self) -> u32 {
            self.0
        }
    }

    fn handle() -> PanelHandle<&'static str, Stack> {
        let layout = GridLayout::resolve(
            &["AAAAAAAAA", "ABBBBBBBA", "AAAAAAAAA"],
            [('A', "frame"), ('B', "input")],
            &SupportedSizes::chest(),
        )
        .unwrap();
        PanelHandle::new("deposit", Arc::new(layout), |_: &str| None::<Stack>)
    }

    #[test]
    fn rejects_disallowed_kinds_on_owned_slots() {
        let handle = handle();
        let inputs = handle.layout().slots_for("input");
        let guard = SlotGuard::new(
            "deposit.inputs",
            inputs,
            ClickRules::deny_all().allowing(ClickKind::Left),
        );
        handle.bus().subscribe(&guard);

        let mut shift = Interaction::Click(ClickContext::new(ClickKind::ShiftLeft, [10], None));
        assert_eq!(handle.dispatch(&"alex", &mut shift), ActionResult::Cancel);

        let mut left = Interaction::Click(ClickContext::new(ClickKind::Left, [10], None));
        assert_eq!(handle.dispatch(&"alex", &mut left), ActionResult::Pass);
    }

    #[test]
    fn ignores_foreign_slots() {
        let handle = handle();
        handle
            .bus()
            .subscribe(&SlotGuard::new("inputs", [10, 11], ClickRules::deny_all()));

        let mut click = Interaction::Click(ClickContext::new(ClickKind::Right, [0], None));
        assert_eq!(handle.dispatch(&"alex", &mut click), ActionResult::Pass);
    }

    #[test]
    fn drag_over_any_owned_slot_is_checked() {
        let handle = handle();
        handle.bus().subscribe(&SlotGuard::new(
            "inputs",
            [11, 12],
            ClickRules::deny_all().allowing(ClickKind::DragEven),
        ));

        let mut single = Interaction::Drag(ClickContext::new(
            ClickKind::DragSingle,
            [0, 12],
            Some(Stack(8)),
        ));
        assert_eq!(handle.dispatch(&"alex", &mut single), ActionResult::Cancel);

        let mut even = Interaction::Drag(ClickContext::new(ClickKind::DragEven, [11, 12], Some(Stack(8))));
        assert_eq!(handle.dispatch(&"alex", &mut even), ActionResult::Pass);
    }

    #[test]
    fn unregisters_as_one_owner() {
        let handle = handle();
        let token = handle
            .bus()
            .subscribe(&SlotGuard::new("inputs", [10], ClickRules::deny_all()));
        assert_eq!(handle.bus().unregister(&token), 2);
        assert!(handle.bus().is_empty());
    }
}
