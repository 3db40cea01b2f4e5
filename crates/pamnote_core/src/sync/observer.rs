//! Presentation collaborator contract.
//!
//! # Responsibility
//! - Define the notifications a display layer receives from the controller.
//! - Provide `ListEventLog`, a recording observer for drivers and tests.

use crate::form::{FormMode, FormReport, FILL_ALL_FIELDS_MESSAGE, REQUIRED_LABEL};
use crate::model::note::{Note, NoteId};
use super::error::SyncError;

/// Category of a user-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    LoadFailed,
    CreateFailed,
    UpdateFailed,
    DeleteFailed,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadFailed => "load-failed",
            Self::CreateFailed => "create-failed",
            Self::UpdateFailed => "update-failed",
            Self::DeleteFailed => "delete-failed",
        }
    }

    /// Short message suitable for a toast.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::LoadFailed => "Failed to load notes.",
            Self::CreateFailed => "Failed to Add data",
            Self::UpdateFailed => "Failed to update note",
            Self::DeleteFailed => "Failed to delete note.",
        }
    }
}

/// Non-failure feedback for the display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Created(NoteId),
    Updated(NoteId),
    Deleted(NoteId),
    NothingToDelete,
    InvalidForm(FormReport),
}

impl Notice {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Created(_) => "Add data",
            Self::Updated(_) => "Note updated successfully",
            Self::Deleted(_) => "Note deleted successfully",
            Self::NothingToDelete => "No notes available to delete",
            Self::InvalidForm(report) => match report.mode {
                FormMode::Create => REQUIRED_LABEL,
                FormMode::Edit => FILL_ALL_FIELDS_MESSAGE,
            },
        }
    }
}

/// Receives cache and outcome notifications from `NoteListController`.
pub trait ListObserver {
    /// Cache was replaced wholesale; re-render everything.
    fn on_replaced(&mut self, notes: &[Note]);
    /// One cached note changed in place.
    fn on_changed(&mut self, position: usize, note: &Note);
    /// One cached note was removed.
    fn on_removed(&mut self, position: usize, id: &NoteId);
    /// A store call or the subscription failed.
    ///
    /// `error` is `SyncError::StoreWrite` for create/update/delete and
    /// `SyncError::StoreSubscription` for `FailureKind::LoadFailed`.
    fn on_failure(&mut self, kind: FailureKind, error: &SyncError);
    /// Success or local rejection feedback.
    fn on_notice(&mut self, _notice: &Notice) {}
}

/// Notification recorded by `ListEventLog`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    Replaced(Vec<Note>),
    Changed { position: usize, note: Note },
    Removed { position: usize, id: NoteId },
    Failed { kind: FailureKind, error: SyncError },
    Notice(Notice),
}

/// Observer that records every notification in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEventLog {
    events: Vec<ListEvent>,
}

impl ListEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ListEvent] {
        &self.events
    }

    /// Takes all recorded events, leaving the log empty.
    pub fn drain(&mut self) -> Vec<ListEvent> {
        std::mem::take(&mut self.events)
    }
}

impl ListObserver for ListEventLog {
    fn on_replaced(&mut self, notes: &[Note]) {
        self.events.push(ListEvent::Replaced(notes.to_vec()));
    }

    fn on_changed(&mut self, position: usize, note: &Note) {
        self.events.push(ListEvent::Changed {
            position,
            note: note.clone(),
        });
    }

    fn on_removed(&mut self, position: usize, id: &NoteId) {
        self.events.push(ListEvent::Removed {
            position,
            id: id.clone(),
        });
    }

    fn on_failure(&mut self, kind: FailureKind, error: &SyncError) {
        self.events.push(ListEvent::Failed {
            kind,
            error: error.clone(),
        });
    }

    fn on_notice(&mut self, notice: &Notice) {
        self.events.push(ListEvent::Notice(notice.clone()));
    }
}
