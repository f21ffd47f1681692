#![deny(warnings)]

//! Engine host for Business Tycoon.
//!
//! A [`Session`] owns the live game state for one player. It loads the game
//! at start, forwards player actions to the engine, feeds special-event
//! progress, saves after every day in the background and runs the periodic
//! checks when polled. Persistence failures never touch the in-memory state;
//! they fall back to the local cache.

mod config;
mod schedule;
mod session;

use thiserror::Error;

pub use config::{ConfigError, SessionConfig};
pub use schedule::{Clock, FixedClock, Schedule, SystemClock};
pub use session::{PollOutcome, Session};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] tycoon_core::CatalogError),
    #[error(transparent)]
    Store(#[from] persistence::StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
