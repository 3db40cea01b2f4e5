//! Note store collaborator contract and implementations.
//!
//! # Responsibility
//! - Define the capability interface the sync controller writes through.
//! - Model asynchronous completion as queued `StoreEvent`s.
//!
//! # Invariants
//! - Every submitted request yields exactly one `Completed` event.
//! - Completions are never delivered from inside `submit`.
//! - Snapshots are full, ordered re-enumerations of one user's collection.
//! - A cancelled subscription delivers no further events.

use crate::model::note::{Note, NoteFields, NoteId, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle for one live snapshot subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Caller-chosen correlation id for one write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Failure category reported by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Addressed note does not exist.
    NotFound,
    /// Caller lost access to the collection.
    PermissionDenied,
    /// Transport to the store is unavailable.
    Disconnected,
    /// Any other backend failure.
    Backend,
}

impl StoreErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Disconnected => "disconnected",
            Self::Backend => "backend",
        }
    }
}

/// Error carried by failed completions and cancelled subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(id: &NoteId) -> Self {
        Self::new(StoreErrorKind::NotFound, format!("note not found: {id}"))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl Error for StoreError {}

/// One write operation against a user's collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Append a note; the store assigns its id.
    Create(NoteFields),
    /// Replace fields of an existing note.
    Update { id: NoteId, fields: NoteFields },
    /// Remove an existing note.
    Delete { id: NoteId },
}

impl StoreOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Successful outcome of one `StoreOp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Created(NoteId),
    Updated,
    Deleted,
}

/// Notification delivered by a store through `poll_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Full ordered collection after a change.
    Snapshot {
        subscription: SubscriptionId,
        notes: Vec<Note>,
    },
    /// Terminal subscription failure.
    SubscriptionCancelled {
        subscription: SubscriptionId,
        error: StoreError,
    },
    /// Terminal outcome of one submitted request.
    Completed {
        request: RequestId,
        outcome: StoreResult<Completion>,
    },
}

/// Capability interface of the remote note store.
pub trait NoteStore {
    /// Opens a snapshot subscription over `user_id`'s collection.
    fn subscribe(&mut self, user_id: &UserId) -> SubscriptionId;
    /// Closes a subscription; later events for it are dropped.
    fn unsubscribe(&mut self, subscription: SubscriptionId);
    /// Queues one write; the outcome arrives later as `Completed`.
    fn submit(&mut self, request: RequestId, user_id: &UserId, op: StoreOp);
    /// Drains events in delivery order.
    fn poll_events(&mut self) -> Vec<StoreEvent>;
}
