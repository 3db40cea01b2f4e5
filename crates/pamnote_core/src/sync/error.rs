//! Sync controller error taxonomy.

use crate::form::FormReport;
use crate::model::note::NoteId;
use crate::session::AuthRequired;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

/// Error returned by controller operations or reported to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Required form field empty; nothing was sent to the store.
    Validation(FormReport),
    /// No active session.
    AuthRequired,
    /// Store rejected or failed a create/update/delete.
    StoreWrite(StoreError),
    /// Snapshot subscription ended with a terminal error.
    StoreSubscription(StoreError),
    /// Position does not address a cached note.
    NotFoundInCache { position: usize, len: usize },
    /// Caller's last-known id no longer matches the note at `position`.
    StalePosition {
        position: usize,
        expected: NoteId,
        actual: NoteId,
    },
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(report) => write!(f, "{report}"),
            Self::AuthRequired => write!(f, "{AuthRequired}"),
            Self::StoreWrite(err) => write!(f, "store write failed: {err}"),
            Self::StoreSubscription(err) => write!(f, "note subscription failed: {err}"),
            Self::NotFoundInCache { position, len } => {
                write!(f, "no note at position {position} (cached notes: {len})")
            }
            Self::StalePosition {
                position,
                expected,
                actual,
            } => write!(
                f,
                "note at position {position} is `{actual}`, expected `{expected}`"
            ),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(report) => Some(report),
            Self::StoreWrite(err) | Self::StoreSubscription(err) => Some(err),
            Self::AuthRequired | Self::NotFoundInCache { .. } | Self::StalePosition { .. } => None,
        }
    }
}

impl From<FormReport> for SyncError {
    fn from(value: FormReport) -> Self {
        Self::Validation(value)
    }
}

impl From<AuthRequired> for SyncError {
    fn from(_: AuthRequired) -> Self {
        Self::AuthRequired
    }
}
