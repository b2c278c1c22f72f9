//! Error types for the visualizer front end.

use thiserror::Error;

/// Result type alias for front-end operations.
pub(crate) type Result<T> = std::result::Result<T, CliError>;

/// Front-end error types.
#[derive(Error, Debug)]
pub(crate) enum CliError {
    /// A request the workload generated could not be translated.
    #[error("translation failed: {0}")]
    Translate(#[from] mmu::TranslateError),

    /// The menu has no such option.
    #[error("unknown menu option {0} (0 shows the menu, 1 starts the visualizer)")]
    UnknownMenuOption(usize),
}
