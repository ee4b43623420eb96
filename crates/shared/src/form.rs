//! Work-item form model backing the detail modal.
//!
//! The form keeps raw input strings; [`WorkItemForm::validate`] turns them into a
//! typed [`WorkItemPayload`] or a set of per-field messages.
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Priority, Status, WorkItem};

pub const FIELD_TITLE: &str = "title";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_PRIORITY: &str = "priority";
pub const FIELD_DUE_DATE: &str = "dueDate";
pub const FIELD_ESTIMATED_HOURS: &str = "estimatedHours";

pub const TITLE_MAX_LEN: u64 = 200;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validated form payload handed to the save callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub location: Option<String>,
    pub deck_level: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[validate(range(min = 0.0))]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl WorkItemPayload {
    /// Due date as a UTC timestamp at midnight.
    pub fn due_date_utc(&self) -> Option<DateTime<Utc>> {
        self.due_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Due date to store over `current`: an unchanged calendar day keeps the
    /// stored time of day, a new day lands at midnight UTC.
    pub fn due_date_over(&self, current: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        match (self.due_date, current) {
            (Some(day), Some(at)) if at.date_naive() == day => Some(at),
            _ => self.due_date_utc(),
        }
    }

    /// Copy the form-editable fields onto an existing work item.
    /// Position, assignment and timestamps are left untouched.
    pub fn apply_to(&self, item: &mut WorkItem) {
        item.title = self.title.clone();
        item.description = self.description.clone();
        item.status = self.status;
        item.priority = self.priority;
        item.location = self.location.clone();
        item.deck_level = self.deck_level.clone();
        item.due_date = self.due_date_over(item.due_date);
        item.estimated_hours = self.estimated_hours;
        item.tags = self.tags.clone();
    }
}

/// Field name → message, ordered for stable rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemForm {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub location: String,
    pub deck_level: String,
    /// `YYYY-MM-DD`, as produced by a date input.
    pub due_date: String,
    pub estimated_hours: String,
    /// Comma-separated.
    pub tags: String,
}

impl Default for WorkItemForm {
    fn default() -> Self {
        Self::new_item()
    }
}

impl WorkItemForm {
    /// Blank form for the "new item" flow: status open, priority medium.
    pub fn new_item() -> Self {
        WorkItemForm {
            title: String::new(),
            description: String::new(),
            status: Status::default().as_str().to_string(),
            priority: Priority::default().as_str().to_string(),
            location: String::new(),
            deck_level: String::new(),
            due_date: String::new(),
            estimated_hours: String::new(),
            tags: String::new(),
        }
    }

    pub fn from_work_item(item: &WorkItem) -> Self {
        WorkItemForm {
            title: item.title.clone(),
            description: item.description.clone().unwrap_or_default(),
            status: item.status.as_str().to_string(),
            priority: item.priority.as_str().to_string(),
            location: item.location.clone().unwrap_or_default(),
            deck_level: item.deck_level.clone().unwrap_or_default(),
            due_date: item
                .due_date
                .map(|d| d.date_naive().format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            estimated_hours: item
                .estimated_hours
                .map(|h| h.to_string())
                .unwrap_or_default(),
            tags: item.tags.join(", "),
        }
    }

    pub fn validate(&self) -> Result<WorkItemPayload, FieldErrors> {
        let mut errors = FieldErrors::default();

        let status = self.status.parse::<Status>().unwrap_or_else(|_| {
            errors.add(FIELD_STATUS, "Choose a valid status");
            Status::default()
        });
        let priority = self.priority.parse::<Priority>().unwrap_or_else(|_| {
            errors.add(FIELD_PRIORITY, "Choose a valid priority");
            Priority::default()
        });

        let due_date = match non_empty(&self.due_date) {
            None => None,
            Some(raw) => match NaiveDate::parse_from_str(&raw, DATE_FORMAT) {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.add(FIELD_DUE_DATE, "Due date must be a date (YYYY-MM-DD)");
                    None
                }
            },
        };

        let estimated_hours = match non_empty(&self.estimated_hours) {
            None => None,
            Some(raw) => match raw.parse::<f64>() {
                Ok(h) if h.is_finite() => Some(h),
                _ => {
                    errors.add(FIELD_ESTIMATED_HOURS, "Estimated hours must be a number");
                    None
                }
            },
        };

        let payload = WorkItemPayload {
            title: self.title.trim().to_string(),
            description: non_empty(&self.description),
            status,
            priority,
            location: non_empty(&self.location),
            deck_level: non_empty(&self.deck_level),
            due_date,
            estimated_hours,
            tags: parse_tags(&self.tags),
        };

        if let Err(validation) = payload.validate() {
            let fields = validation.field_errors();
            if fields.contains_key("title") {
                let message = if payload.title.is_empty() {
                    "Title is required".to_string()
                } else {
                    format!("Title must be at most {TITLE_MAX_LEN} characters")
                };
                errors.add(FIELD_TITLE, message);
            }
            if fields.contains_key("estimated_hours") {
                errors.add(FIELD_ESTIMATED_HOURS, "Estimated hours cannot be negative");
            }
        }

        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(errors)
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Split comma-separated tags, trimming and dropping blanks and repeats.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

// ---------------------------------------------------------------------------
// Modal session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    Read,
    Edit,
}

/// What the host should do after the user cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalOutcome {
    /// Close the modal entirely (new-item flow).
    Close,
    /// Stay open, back in read mode with the previous values.
    Reverted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalSession {
    is_new: bool,
    mode: ModalMode,
    saved: WorkItemForm,
    form: WorkItemForm,
    errors: FieldErrors,
    saving: bool,
    save_error: Option<String>,
}

impl ModalSession {
    /// Open an existing item in read mode.
    pub fn view(item: &WorkItem) -> Self {
        let form = WorkItemForm::from_work_item(item);
        ModalSession {
            is_new: false,
            mode: ModalMode::Read,
            saved: form.clone(),
            form,
            errors: FieldErrors::default(),
            saving: false,
            save_error: None,
        }
    }

    /// Open the "new item" flow, directly in edit mode.
    pub fn new_item() -> Self {
        ModalSession {
            is_new: true,
            mode: ModalMode::Edit,
            saved: WorkItemForm::new_item(),
            form: WorkItemForm::new_item(),
            errors: FieldErrors::default(),
            saving: false,
            save_error: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn mode(&self) -> ModalMode {
        self.mode
    }

    pub fn form(&self) -> &WorkItemForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut WorkItemForm {
        &mut self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Message of the last failed save, cleared by the next submit.
    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub fn begin_edit(&mut self) {
        self.mode = ModalMode::Edit;
    }

    pub fn cancel(&mut self) -> ModalOutcome {
        self.form = self.saved.clone();
        self.errors = FieldErrors::default();
        self.saving = false;
        self.save_error = None;
        if self.is_new {
            ModalOutcome::Close
        } else {
            self.mode = ModalMode::Read;
            ModalOutcome::Reverted
        }
    }

    /// Validate the current input and hand back the payload to persist.
    /// The modal stays in edit mode until [`ModalSession::mark_saved`].
    pub fn submit(&mut self) -> Result<WorkItemPayload, FieldErrors> {
        self.save_error = None;
        match self.form.validate() {
            Ok(payload) => {
                self.errors = FieldErrors::default();
                self.saving = true;
                Ok(payload)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    /// The save went through; `item` is what the server now holds.
    pub fn mark_saved(&mut self, item: &WorkItem) {
        let form = WorkItemForm::from_work_item(item);
        self.saved = form.clone();
        self.form = form;
        self.is_new = false;
        self.mode = ModalMode::Read;
        self.errors = FieldErrors::default();
        self.saving = false;
        self.save_error = None;
    }

    /// The save was rejected. Input is kept for another attempt.
    pub fn save_failed(&mut self, message: impl Into<String>) {
        self.saving = false;
        self.save_error = Some(message.into());
    }
}
