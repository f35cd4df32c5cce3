//! Error type shared by the resolution engine and the coordinator

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A structured-data block is not valid JSON even after newline repair.
    #[error("structured data block {block} could not be parsed: {source}")]
    SchemaParse {
        block: usize,
        #[source]
        source: serde_json::Error,
    },

    /// `navigate_and_report` was called without a mounted coordinator.
    #[error("navigate_and_report must be used while a NavigationCoordinator is mounted")]
    MissingContext,

    #[error("invalid capture configuration: {0}")]
    InvalidConfig(#[source] serde_json::Error),

    #[error("data type of {kind} is not allowed for element data key '{key}'")]
    UnsupportedElementData { key: String, kind: &'static str },
}
