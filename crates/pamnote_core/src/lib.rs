//! Core domain logic for PamNote.
//! Owns note validation, session scoping and list synchronization against a
//! realtime note store.

pub mod db;
pub mod form;
pub mod logging;
pub mod model;
pub mod session;
pub mod store;
pub mod sync;

pub use form::{validate_create, validate_edit, FormField, FormMode, FormReport};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteFields, NoteId, NotePath, UserId};
pub use session::{AuthProvider, AuthRequired, AuthUser, Session};
pub use store::sqlite_store::SqliteNoteStore;
pub use store::{
    Completion, NoteStore, RequestId, StoreError, StoreErrorKind, StoreEvent, StoreOp,
    StoreResult, SubscriptionId,
};
pub use sync::controller::{NoteListController, SyncState};
pub use sync::error::{SyncError, SyncResult};
pub use sync::observer::{FailureKind, ListEvent, ListEventLog, ListObserver, Notice};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
