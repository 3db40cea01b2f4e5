//! Note list synchronization.
//!
//! # Responsibility
//! - Keep an observer-visible note list consistent with a `NoteStore`.
//! - Define the presentation contract and the sync error taxonomy.

pub mod controller;
pub mod error;
pub mod observer;
