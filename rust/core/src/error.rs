// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the dashboard core.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while shaping records or mutating view state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A group key must name at least one level.
    #[error("group key must have at least one level")]
    EmptyGroupKey,

    /// A selection chain must have at least one level.
    #[error("selection chain must have at least one level")]
    EmptyChain,

    /// The selection level does not exist in the chain.
    #[error("selection level {level} out of range (chain depth {depth})")]
    LevelOutOfRange { level: usize, depth: usize },

    /// A level was selected while its parent level is empty.
    #[error("cannot select level {level}: parent level {parent} has no selection")]
    ParentNotSelected { level: usize, parent: usize },

    /// A backend payload did not match the expected schema.
    #[error("malformed record: {0}")]
    Schema(#[from] serde_json::Error),

    /// Reading or writing the persisted store failed.
    #[error("store I/O error at {path}: {source}")]
    StoreIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The persisted store file is not a JSON object.
    #[error("store file {path} is corrupt: {reason}")]
    StoreFormat { path: String, reason: String },
}
