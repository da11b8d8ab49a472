use std::collections::BTreeSet;

use super::context::ClickKind;

/// Which click gestures a slot accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClickRules {
    all: bool,
    allowed: BTreeSet<ClickKind>,
}

impl ClickRules {
    pub fn allow_all() -> Self {
        Self {
            all: true,
            allowed: BTreeSet::new(),
        }
    }

    pub fn deny_all() -> Self {
        Self::default()
    }

    pub fn allowing(mut self, kind: ClickKind) -> Self {
        self.allowed.insert(kind);
        self
    }

    pub fn allowing_all(mut self, kinds: impl IntoIterator<Item = ClickKind>) -> Self {
        self.allowed.extend(kinds);
        self
    }

    pub fn is_allowed(&self, kind: ClickKind) -> bool {
        self.all || self.allowed.contains(&kind)
    }
}
