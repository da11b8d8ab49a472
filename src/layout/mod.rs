//! Layout module orchestrator.
//!
//! Downstream code imports layout types from here while the resolver,
//! the authored definition format, and the interning cache live in private
//! submodules.

mod cache;
mod core;
mod definition;

pub use cache::LayoutCache;
pub use core::{GridLayout, SupportedSizes};
pub use definition::LayoutDefinition;
