//! Note domain model.
//!
//! # Responsibility
//! - Define the data structures shared by validation, storage and sync.
//!
//! # Invariants
//! - Persisted notes are identified by a store-assigned `NoteId`.
//! - All note access is scoped by a `UserId`.

pub mod note;
