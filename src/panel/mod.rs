//! Panel handles: a shared layout, a content provider, and an owned bus.
//!
//! A handle is defined once (typically at startup) and reused across many
//! open/close cycles for many viewers. Handles built from the same layout
//! still get independent buses.

mod guard;
mod registry;

use std::fmt;
use std::sync::Arc;

use crate::bus::EventBus;
use crate::error::Result;
use crate::interaction::{ActionResult, Interaction};
use crate::layout::GridLayout;
use crate::logging::Logger;
use crate::runtime::sessions::{OpenOutcome, PanelManager};

pub use guard::SlotGuard;
pub use registry::PanelRegistry;

/// Panel identifier, also used by hosts as the source surface identity.
pub type PanelId = String;

/// Produces the content item for a semantic key.
///
/// Queried on every render; implementations must not rely on call counts.
pub trait ContentProvider<I>: Send + Sync {
    fn provide(&self, key: &str) -> Option<I>;
}

impl<I, F> ContentProvider<I> for F
where
    F: Fn(&str) -> Option<I> + Send + Sync,
{
    fn provide(&self, key: &str) -> Option<I> {
        self(key)
    }
}

pub struct PanelHandle<V, I> {
    id: PanelId,
    title: String,
    layout: Arc<GridLayout>,
    provider: Arc<dyn ContentProvider<I>>,
    bus: EventBus<V, I>,
}

impl<V, I> PanelHandle<V, I> {
    pub fn new<P>(id: impl Into<PanelId>, layout: Arc<GridLayout>, provider: P) -> Self
    where
        P: ContentProvider<I> + 'static,
    {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            layout,
            provider: Arc::new(provider),
            bus: EventBus::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.bus.set_logger(Some(logger));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn layout(&self) -> &Arc<GridLayout> {
        &self.layout
    }

    pub fn bus(&self) -> &EventBus<V, I> {
        &self.bus
    }

    /// Content for every slot, in slot order; empty slots yield `None`.
    pub fn render(&self) -> Vec<Option<I>> {
        self.layout
            .slot_keys()
            .iter()
            .map(|key| key.as_deref().and_then(|key| self.provider.provide(key)))
            .collect()
    }

    pub fn render_slot(&self, index: usize) -> Option<I> {
        self.layout
            .key_at(index)
            .and_then(|key| self.provider.provide(key))
    }

    /// Dispatch outside any session, e.g. for previews or tests.
    pub fn dispatch(&self, viewer: &V, interaction: &mut Interaction<I>) -> ActionResult {
        self.bus.dispatch(&PanelContext::new(viewer, self), interaction)
    }
}

impl<V, I> PanelHandle<V, I>
where
    V: Clone + Eq + std::hash::Hash + fmt::Debug,
{
    pub fn open(
        self: &Arc<Self>,
        manager: &PanelManager<V, I>,
        viewer: V,
        force: bool,
    ) -> Result<OpenOutcome> {
        manager.open(viewer, Arc::clone(self), force)
    }

    pub fn swap(self: &Arc<Self>, manager: &PanelManager<V, I>, viewer: V) -> Result<OpenOutcome> {
        manager.swap(viewer, Arc::clone(self))
    }
}

impl<V, I> fmt::Debug for PanelHandle<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelHandle")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("shape", &self.layout.shape())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

/// What a subscriber sees besides the interaction itself.
pub struct PanelContext<'a, V, I> {
    viewer: &'a V,
    handle: &'a PanelHandle<V, I>,
    manager: Option<&'a PanelManager<V, I>>,
}

impl<'a, V, I> PanelContext<'a, V, I> {
    pub fn new(viewer: &'a V, handle: &'a PanelHandle<V, I>) -> Self {
        Self {
            viewer,
            handle,
            manager: None,
        }
    }

    pub fn with_manager(mut self, manager: &'a PanelManager<V, I>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn viewer(&self) -> &'a V {
        self.viewer
    }

    pub fn handle(&self) -> &'a PanelHandle<V, I> {
        self.handle
    }

    pub fn layout(&self) -> &'a GridLayout {
        self.handle.layout()
    }

    pub fn panel_id(&self) -> &'a str {
        self.handle.id()
    }

    /// The session manager that routed this interaction, if any.
    ///
    /// Callbacks may open, swap, or close panels through it; the manager
    /// holds no locks while subscribers run.
    pub fn manager(&self) -> Option<&'a PanelManager<V, I>> {
        self.manager
    }
}
