//! Error module orchestrator.
//!
//! Layout failures happen once, at construction time; panel failures are
//! recoverable by the host (retry with `force`, pick another id).

mod types;

pub use types::{LayoutError, PanelError, Result};
