//! Note form validation.
//!
//! # Responsibility
//! - Check required title/description fields before a store write.
//! - Report per-field failure so UI layers can annotate inputs.
//!
//! # Invariants
//! - Validation is pure and never fails; it always returns a `FormReport`.
//! - Create path checks raw emptiness: whitespace-only input passes.
//! - Edit path checks trimmed emptiness and submits the trimmed values.

use crate::model::note::NoteFields;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Per-field error label shown next to an empty input.
pub const REQUIRED_LABEL: &str = "Required";
/// Summary message for a rejected edit form.
pub const FILL_ALL_FIELDS_MESSAGE: &str = "Please fill all fields";

/// Field identity used in validation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
        }
    }
}

/// Which emptiness rule a form was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// New note submission; raw emptiness check.
    Create,
    /// Edit dialog submission; trimmed emptiness check.
    Edit,
}

/// Result of checking one note form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormReport {
    pub mode: FormMode,
    /// `true` when the title caused the failure.
    pub title_missing: bool,
    /// `true` when the description caused the failure.
    pub description_missing: bool,
}

impl FormReport {
    pub fn is_valid(&self) -> bool {
        !self.title_missing && !self.description_missing
    }

    /// Returns the failing fields in display order.
    pub fn missing_fields(&self) -> Vec<FormField> {
        let mut fields = Vec::new();
        if self.title_missing {
            fields.push(FormField::Title);
        }
        if self.description_missing {
            fields.push(FormField::Description);
        }
        fields
    }

    /// Per-field label for UI annotation, `None` when the field is fine.
    pub fn field_error(&self, field: FormField) -> Option<&'static str> {
        let missing = match field {
            FormField::Title => self.title_missing,
            FormField::Description => self.description_missing,
        };
        missing.then_some(REQUIRED_LABEL)
    }
}

impl Display for FormReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            return f.write_str("form is valid");
        }
        let names = self
            .missing_fields()
            .into_iter()
            .map(FormField::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "required field(s) empty: {names}")
    }
}

impl Error for FormReport {}

/// Checks a new-note form using raw emptiness.
pub fn validate_create(title: &str, description: &str) -> FormReport {
    FormReport {
        mode: FormMode::Create,
        title_missing: title.is_empty(),
        description_missing: description.is_empty(),
    }
}

/// Checks an edit form using trimmed emptiness.
pub fn validate_edit(title: &str, description: &str) -> FormReport {
    FormReport {
        mode: FormMode::Edit,
        title_missing: title.trim().is_empty(),
        description_missing: description.trim().is_empty(),
    }
}

/// Validates a new-note form and returns the fields to submit unchanged.
pub fn prepare_create(title: &str, description: &str) -> Result<NoteFields, FormReport> {
    let report = validate_create(title, description);
    if !report.is_valid() {
        return Err(report);
    }
    Ok(NoteFields::new(title, description))
}

/// Validates an edit form and returns the trimmed fields to submit.
pub fn prepare_edit(title: &str, description: &str) -> Result<NoteFields, FormReport> {
    let report = validate_edit(title, description);
    if !report.is_valid() {
        return Err(report);
    }
    Ok(NoteFields::new(title.trim(), description.trim()))
}
