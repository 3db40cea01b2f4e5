//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its id-less draft shape.
//! - Provide the `notes/{userId}/{noteId}` address used by store collaborators.
//!
//! # Invariants
//! - A `Note` always carries a store-assigned `NoteId`; drafts never do.
//! - `NoteId` is immutable once assigned; updates replace fields only.
//! - Ids are unique within one user's collection.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque store-assigned note key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque user identifier supplied by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether the id is usable for scoping note access.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Editable note fields without identity.
///
/// Used both for newly composed notes and for the outgoing record of an
/// update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteFields {
    pub title: String,
    pub description: String,
}

impl NoteFields {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Persisted note as delivered in store snapshots.
///
/// Serialized in the store record shape: `title` + `description`, with the
/// record key exposed as `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "key")]
    pub id: NoteId,
    pub title: String,
    pub description: String,
}

impl Note {
    /// Binds draft fields to a store-assigned id.
    pub fn from_fields(id: NoteId, fields: NoteFields) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
        }
    }

    /// Returns a copy of the editable fields.
    pub fn fields(&self) -> NoteFields {
        NoteFields::new(self.title.clone(), self.description.clone())
    }

    /// Replaces title and description in place, keeping the id.
    pub fn apply_fields(&mut self, fields: &NoteFields) {
        self.title.clone_from(&fields.title);
        self.description.clone_from(&fields.description);
    }
}

/// Two-level store address `notes/{userId}/{noteId}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePath<'a> {
    pub user_id: &'a UserId,
    pub note_id: Option<&'a NoteId>,
}

impl<'a> NotePath<'a> {
    /// Address of a user's whole collection.
    pub fn collection(user_id: &'a UserId) -> Self {
        Self {
            user_id,
            note_id: None,
        }
    }

    /// Address of one note inside a user's collection.
    pub fn item(user_id: &'a UserId, note_id: &'a NoteId) -> Self {
        Self {
            user_id,
            note_id: Some(note_id),
        }
    }
}

impl Display for NotePath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.note_id {
            Some(note_id) => write!(f, "notes/{}/{}", self.user_id, note_id),
            None => write!(f, "notes/{}", self.user_id),
        }
    }
}
