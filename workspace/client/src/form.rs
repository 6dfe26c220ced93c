//! Form lifecycle shared by the pages.
//!
//! ```text
//! Idle --open--> Editing --begin_save--> Saving --finish--> Idle
//!                   ^                       |
//!                   +--------fail-----------+
//! ```
//!
//! Validation failures never leave `Editing`. While `Saving`, the form cannot be
//! reopened, cancelled or saved again.

use common::FieldErrors;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    Editing,
    Saving,
}

/// An open form: what it edits, the raw input and the messages shown with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenForm<D, M> {
    pub mode: M,
    pub draft: D,
    pub field_errors: FieldErrors,
    /// Store error shown above the form after a failed save.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form<D, M> {
    phase: FormPhase,
    open: Option<OpenForm<D, M>>,
}

impl<D, M> Default for Form<D, M> {
    fn default() -> Self {
        Self {
            phase: FormPhase::Idle,
            open: None,
        }
    }
}

impl<D, M> Form<D, M> {
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn current(&self) -> Option<&OpenForm<D, M>> {
        self.open.as_ref()
    }

    /// Whether the submit control is enabled.
    pub fn save_enabled(&self) -> bool {
        self.phase == FormPhase::Editing
    }

    /// Opens the form, replacing any form being edited.
    pub fn open(&mut self, mode: M, draft: D) -> Result<()> {
        if self.phase == FormPhase::Saving {
            return Err(ClientError::Busy);
        }
        self.open = Some(OpenForm {
            mode,
            draft,
            field_errors: FieldErrors::default(),
            error: None,
        });
        self.phase = FormPhase::Editing;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.phase == FormPhase::Saving {
            return Err(ClientError::Busy);
        }
        self.open = None;
        self.phase = FormPhase::Idle;
        Ok(())
    }

    /// The open form, available only while editing.
    pub fn editing(&self) -> Result<&OpenForm<D, M>> {
        match (self.phase, self.open.as_ref()) {
            (FormPhase::Saving, _) => Err(ClientError::Busy),
            (FormPhase::Editing, Some(open)) => Ok(open),
            _ => Err(ClientError::NoActiveForm),
        }
    }

    pub fn draft_mut(&mut self) -> Result<&mut D> {
        match (self.phase, self.open.as_mut()) {
            (FormPhase::Saving, _) => Err(ClientError::Busy),
            (FormPhase::Editing, Some(open)) => Ok(&mut open.draft),
            _ => Err(ClientError::NoActiveForm),
        }
    }

    /// Keeps the form editing and shows `errors` inline.
    pub fn reject(&mut self, errors: FieldErrors) {
        if let Some(open) = self.open.as_mut() {
            open.field_errors = errors;
            open.error = None;
        }
    }

    /// Enters `Saving`, clearing the messages of a previous attempt.
    pub fn begin_save(&mut self) -> Result<()> {
        match (self.phase, self.open.as_mut()) {
            (FormPhase::Saving, _) => Err(ClientError::Busy),
            (FormPhase::Editing, Some(open)) => {
                open.field_errors = FieldErrors::default();
                open.error = None;
                self.phase = FormPhase::Saving;
                Ok(())
            }
            _ => Err(ClientError::NoActiveForm),
        }
    }

    /// Returns to `Editing` with the draft untouched and `message` shown.
    pub fn fail(&mut self, message: impl Into<String>) {
        if let Some(open) = self.open.as_mut() {
            open.error = Some(message.into());
            self.phase = FormPhase::Editing;
        }
    }

    /// Closes the form after a successful save.
    pub fn finish(&mut self) {
        self.open = None;
        self.phase = FormPhase::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPhase {
    AwaitingConfirmation,
    Deleting,
}

/// A delete the user asked for but has not confirmed yet.
///
/// Nothing is sent to the store before `begin`, which the pages call only from
/// their confirm operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion<T> {
    subject: T,
    phase: DeletionPhase,
    error: Option<String>,
}

impl<T> PendingDeletion<T> {
    pub fn new(subject: T) -> Self {
        Self {
            subject,
            phase: DeletionPhase::AwaitingConfirmation,
            error: None,
        }
    }

    pub fn subject(&self) -> &T {
        &self.subject
    }

    pub fn phase(&self) -> DeletionPhase {
        self.phase
    }

    /// Error of the last confirmed attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_deleting(&self) -> bool {
        self.phase == DeletionPhase::Deleting
    }

    pub(crate) fn begin(&mut self) -> Result<()> {
        if self.is_deleting() {
            return Err(ClientError::Busy);
        }
        self.phase = DeletionPhase::Deleting;
        self.error = None;
        Ok(())
    }

    pub(crate) fn with_error(mut self, message: impl Into<String>) -> Self {
        self.phase = DeletionPhase::AwaitingConfirmation;
        self.error = Some(message.into());
        self
    }
}
