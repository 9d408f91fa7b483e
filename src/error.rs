// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("{0}")]
    Validation(String),

    #[error("Category already exists")]
    CategoryExists,

    #[error("Cannot delete category with associated transactions")]
    CategoryInUse,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A stored value could not be decoded (amount, date or type column).
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True when the caller sent something we refuse, as opposed to the store failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidWindow(_)
                | Error::Validation(_)
                | Error::CategoryExists
                | Error::CategoryInUse
                | Error::NotFound(_)
        )
    }
}
