use thiserror::Error;

/// Unified result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Errors raised while resolving a grid definition.
///
/// Resolution is all-or-nothing: no partial layout is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("grid definition has no rows")]
    EmptyGrid,
    #[error("row {row} has {found} symbols, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("grid of {size} slots is not supported (supported: {supported:?})")]
    UnsupportedSize { size: usize, supported: Vec<usize> },
    #[error("bad dictionary: {0}")]
    BadDictionary(String),
}

/// Errors surfaced by panel handles, the registry, and the session manager.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("viewer {viewer} already has panel `{current}` open; refused `{requested}`")]
    AlreadyOpen {
        viewer: String,
        current: String,
        requested: String,
    },
    #[error("panel `{0}` is already registered")]
    DuplicatePanel(String),
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("panel state poisoned")]
    Poisoned,
}
