use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::model::{Employee, EmployeeDraft};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+$").expect("email pattern is valid")
});

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("'{value}' is not a valid email address")]
    InvalidEmail { value: String },

    #[error("salary must be a number")]
    InvalidSalary,
}

/// What a save should send.
#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    Create(EmployeeDraft),
    Update { id: String, draft: EmployeeDraft },
}

/// The record form. Creating and editing are mutually exclusive.
#[derive(Clone, Debug, PartialEq)]
pub enum Editor {
    Creating(EmployeeDraft),
    Editing { id: String, draft: EmployeeDraft },
}

impl Default for Editor {
    fn default() -> Self {
        Editor::Creating(EmployeeDraft::default())
    }
}

impl Editor {
    pub fn is_editing(&self) -> bool {
        matches!(self, Editor::Editing { .. })
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self {
            Editor::Editing { id, .. } => Some(id.as_str()),
            Editor::Creating(_) => None,
        }
    }

    pub fn draft(&self) -> &EmployeeDraft {
        match self {
            Editor::Creating(draft) | Editor::Editing { draft, .. } => draft,
        }
    }

    pub fn draft_mut(&mut self) -> &mut EmployeeDraft {
        match self {
            Editor::Creating(draft) | Editor::Editing { draft, .. } => draft,
        }
    }

    pub fn begin_edit(&mut self, employee: &Employee) {
        *self = Editor::Editing {
            id: employee.id.clone(),
            draft: employee.to_draft(),
        };
    }

    /// Back to an empty create form.
    pub fn reset(&mut self) {
        *self = Editor::default();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_draft(self.draft())
    }

    pub fn submission(&self) -> Result<Submission, ValidationError> {
        self.validate()?;
        Ok(match self {
            Editor::Creating(draft) => Submission::Create(draft.clone()),
            Editor::Editing { id, draft } => Submission::Update {
                id: id.clone(),
                draft: draft.clone(),
            },
        })
    }
}

pub fn validate_draft(draft: &EmployeeDraft) -> Result<(), ValidationError> {
    for (field, value) in [
        ("first name", &draft.first_name),
        ("last name", &draft.last_name),
        ("email", &draft.email),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::Missing { field });
        }
    }
    if !EMAIL_RE.is_match(draft.email.trim()) {
        return Err(ValidationError::InvalidEmail {
            value: draft.email.clone(),
        });
    }
    match draft.salary {
        None => Err(ValidationError::Missing { field: "salary" }),
        Some(salary) if !salary.is_finite() => Err(ValidationError::InvalidSalary),
        Some(_) => Ok(()),
    }
}
