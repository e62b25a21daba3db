//! Search configuration and startup errors

use thiserror::Error;

/// Fatal errors, all raised before any worker starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Seed set is empty")]
    EmptySeedSet,

    #[error("Word at position {0} is empty")]
    EmptyWord(usize),

    #[error("Target address is empty")]
    EmptyTarget,

    #[error("Invalid worker count: {0}. Must be greater than 0")]
    InvalidWorkers(usize),

    #[error("Invalid batch size: {0}. Must be greater than 0")]
    InvalidBatchSize(usize),

    #[error("Invalid progress interval. Must be greater than 0 ms")]
    InvalidProgressInterval,

    #[error("Search space too large: orderings of {words} words overflow u128")]
    SearchSpaceTooLarge { words: usize },

    #[error("Failed to start search threads: {0}")]
    Spawn(String),
}
