//! The letters core: delivery gating (immediate vs. scheduled, read-triggered
//! sweep) and conversation thread reconstruction. Everything here runs
//! against `&dyn Store`, so the same logic serves the SQLite and the
//! in-memory backends.

pub mod gate;
pub mod thread;

use thiserror::Error;

use duet_store::StoreError;

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("{0}")]
    Validation(String),
    #[error("letter not found")]
    NotFound,
    #[error("{0}")]
    Permission(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub use gate::{Compose, compose, delete_letter, mark_read, sweep_due};
pub use thread::reconstruct;
