use std::collections::BTreeSet;

/// Minimal view of a host content item: the core only ever needs its stack size.
pub trait SlotItem {
    fn amount(&self) -> u32;
}

/// Outcome of an interaction after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionResult {
    /// Handled; stop visiting subscribers and let the action proceed.
    Success,
    /// Not handled here; fall through to the next subscriber.
    Pass,
    /// Stop immediately and veto the underlying action.
    Cancel,
}

impl ActionResult {
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Whether the host should let the underlying mutation happen.
    pub fn allows_action(self) -> bool {
        !matches!(self, Self::Cancel)
    }
}

/// Tag used to key subscriber tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractionType {
    Click,
    Drag,
    Drop,
}

impl InteractionType {
    pub const ALL: [InteractionType; 3] = [Self::Click, Self::Drag, Self::Drop];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Drag => "drag",
            Self::Drop => "drop",
        }
    }
}

/// Physical click or drag gesture reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClickKind {
    Left,
    Right,
    ShiftLeft,
    ShiftRight,
    Middle,
    Double,
    NumberKey(u8),
    /// Drag that spreads the cursor stack evenly.
    DragEven,
    /// Drag that places one item per slot.
    DragSingle,
    Other,
}

/// Drop gesture: one item, or the whole cursor stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropKind {
    DropSingle,
    DropStack,
}

/// Context for a click (or drag) over one or more slots.
#[derive(Debug, Clone)]
pub struct ClickContext<I> {
    kind: ClickKind,
    affected_slots: BTreeSet<usize>,
    payload: Option<I>,
    result: ActionResult,
    consumed: bool,
}

impl<I> ClickContext<I> {
    pub fn new(kind: ClickKind, slots: impl IntoIterator<Item = usize>, payload: Option<I>) -> Self {
        Self {
            kind,
            affected_slots: slots.into_iter().collect(),
            payload,
            result: ActionResult::Pass,
            consumed: false,
        }
    }

    /// Override the host default the context starts with.
    pub fn with_result(mut self, result: ActionResult) -> Self {
        self.result = result;
        self
    }

    pub fn kind(&self) -> ClickKind {
        self.kind
    }

    pub fn affected_slots(&self) -> &BTreeSet<usize> {
        &self.affected_slots
    }

    pub fn affects_slots(&self) -> bool {
        !self.affected_slots.is_empty()
    }

    pub fn affects_slot(&self, slot: usize) -> bool {
        self.affected_slots.contains(&slot)
    }

    pub fn item(&self) -> Option<&I> {
        self.payload.as_ref()
    }

    /// Mark the payload as logically removed. The host clears it after dispatch.
    pub fn consume_item(&mut self) -> Option<&I> {
        self.consumed = true;
        self.payload.as_ref()
    }

    pub fn consumed(&self) -> bool {
        self.consumed
    }

    pub fn result(&self) -> ActionResult {
        self.result
    }

    pub fn set_result(&mut self, result: ActionResult) {
        self.result = result;
    }
}

impl<I: SlotItem> ClickContext<I> {
    pub fn has_item(&self) -> bool {
        self.payload.as_ref().is_some_and(|item| item.amount() > 0)
    }
}

/// Context for dropping the cursor item out of the panel.
#[derive(Debug, Clone)]
pub struct DropContext<I> {
    kind: DropKind,
    affected_slots: BTreeSet<usize>,
    payload: Option<I>,
    result: ActionResult,
    consumed: bool,
}

impl<I> DropContext<I> {
    pub fn new(kind: DropKind, slots: impl IntoIterator<Item = usize>, payload: Option<I>) -> Self {
        Self {
            kind,
            affected_slots: slots.into_iter().collect(),
            payload,
            result: ActionResult::Pass,
            consumed: false,
        }
    }

    pub fn with_result(mut self, result: ActionResult) -> Self {
        self.result = result;
        self
    }

    pub fn kind(&self) -> DropKind {
        self.kind
    }

    pub fn affected_slots(&self) -> &BTreeSet<usize> {
        &self.affected_slots
    }

    pub fn affects_slots(&self) -> bool {
        !self.affected_slots.is_empty()
    }

    pub fn affects_slot(&self, slot: usize) -> bool {
        self.affected_slots.contains(&slot)
    }

    pub fn item(&self) -> Option<&I> {
        self.payload.as_ref()
    }

    pub fn consume_item(&mut self) -> Option<&I> {
        self.consumed = true;
        self.payload.as_ref()
    }

    pub fn consumed(&self) -> bool {
        self.consumed
    }

    pub fn result(&self) -> ActionResult {
        self.result
    }

    pub fn set_result(&mut self, result: ActionResult) {
        self.result = result;
    }
}

impl<I: SlotItem> DropContext<I> {
    pub fn has_item(&self) -> bool {
        self.payload.as_ref().is_some_and(|item| item.amount() > 0)
    }

    /// Quantity leaving the cursor. A single drop is always one item,
    /// never derived from the stack size.
    pub fn amount(&self) -> u32 {
        match self.kind {
            DropKind::DropSingle => 1,
            DropKind::DropStack => self.payload.as_ref().map_or(0, SlotItem::amount),
        }
    }
}

/// A single host notification, tagged by interaction type.
#[derive(Debug, Clone)]
pub enum Interaction<I> {
    Click(ClickContext<I>),
    Drag(ClickContext<I>),
    Drop(DropContext<I>),
}

impl<I> Interaction<I> {
    pub fn interaction_type(&self) -> InteractionType {
        match self {
            Self::Click(_) => InteractionType::Click,
            Self::Drag(_) => InteractionType::Drag,
            Self::Drop(_) => InteractionType::Drop,
        }
    }

    pub fn affected_slots(&self) -> &BTreeSet<usize> {
        match self {
            Self::Click(ctx) | Self::Drag(ctx) => ctx.affected_slots(),
            Self::Drop(ctx) => ctx.affected_slots(),
        }
    }

    pub fn affects_slots(&self) -> bool {
        !self.affected_slots().is_empty()
    }

    pub fn affects_slot(&self, slot: usize) -> bool {
        self.affected_slots().contains(&slot)
    }

    pub fn item(&self) -> Option<&I> {
        match self {
            Self::Click(ctx) | Self::Drag(ctx) => ctx.item(),
            Self::Drop(ctx) => ctx.item(),
        }
    }

    pub fn consume_item(&mut self) -> Option<&I> {
        match self {
            Self::Click(ctx) | Self::Drag(ctx) => ctx.consume_item(),
            Self::Drop(ctx) => ctx.consume_item(),
        }
    }

    pub fn consumed(&self) -> bool {
        match self {
            Self::Click(ctx) | Self::Drag(ctx) => ctx.consumed(),
            Self::Drop(ctx) => ctx.consumed(),
        }
    }

    pub fn result(&self) -> ActionResult {
        match self {
            Self::Click(ctx) | Self::Drag(ctx) => ctx.result(),
            Self::Drop(ctx) => ctx.result(),
        }
    }

    pub fn set_result(&mut self, result: ActionResult) {
        match self {
            Self::Click(ctx) | Self::Drag(ctx) => ctx.set_result(result),
            Self::Drop(ctx) => ctx.set_result(result),
        }
    }

    /// Click kind for click and drag notifications.
    pub fn click_kind(&self) -> Option<ClickKind> {
        match self {
            Self::Click(ctx) | Self::Drag(ctx) => Some(ctx.kind()),
            Self::Drop(_) => None,
        }
    }
}
