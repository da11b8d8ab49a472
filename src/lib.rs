//! Slot-grid panels driven by symbol layouts and a priority event bus.
//!
//! A panel is described once as rows of symbols plus a dictionary mapping
//! each symbol to a semantic key. The resolved [`GridLayout`] is shared by
//! every [`PanelHandle`] built from it; each handle owns its own
//! [`EventBus`], and the [`PanelManager`] keeps at most one handle open per
//! viewer while routing host interactions to it.

pub mod bus;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod paginate;
pub mod panel;
pub mod runtime;

pub use bus::{Callback, EventBus, EventSubscriber, OwnerToken, Priority, Subscription};
pub use error::{LayoutError, PanelError, Result};
pub use geometry::{GridShape, SlotPosition};
pub use interaction::{
    ActionResult, ClickContext, ClickKind, ClickRules, DropContext, DropKind, Interaction,
    InteractionType, SlotItem,
};
pub use layout::{GridLayout, LayoutCache, LayoutDefinition, SupportedSizes};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, PanelMetrics};
pub use paginate::Paginator;
pub use panel::{ContentProvider, PanelContext, PanelHandle, PanelId, PanelRegistry, SlotGuard};
pub use runtime::audit::{
    NullPanelAudit, PanelAudit, RecordingAudit, SessionAuditEvent, SessionAuditEventBuilder,
    SessionAuditStage,
};
pub use runtime::diagnostics::InteractionLogger;
pub use runtime::sessions::{AlwaysReplace, NeverReplace, OpenOutcome, PanelManager, ReplacePolicy};
pub use runtime::{DispatchOutcome, Notification, RuntimeConfig};
