use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when parsing an enumerated value from its wire string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Completed,
    Blocked,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Open,
        Status::InProgress,
        Status::Completed,
        Status::Blocked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
            Status::Blocked => "blocked",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
            Status::Blocked => "Blocked",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
    Archived,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Active,
        ProjectStatus::Completed,
        ProjectStatus::OnHold,
        ProjectStatus::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on-hold",
            ProjectStatus::Archived => "archived",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "project status",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    #[default]
    Crew,
    Viewer,
}

/// Pin position on the GA plan, in percent of the rendered image (0-100 on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinPosition {
    pub x: f64,
    pub y: f64,
}

impl PinPosition {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Build a position only when both axes are inside the plan.
    pub fn checked(x: f64, y: f64) -> Option<Self> {
        let in_range = |v: f64| (Self::MIN..=Self::MAX).contains(&v);
        (in_range(x) && in_range(y)).then_some(PinPosition { x, y })
    }

    /// Build a position, clamping both axes into the plan.
    pub fn clamped(x: f64, y: f64) -> Self {
        PinPosition {
            x: x.clamp(Self::MIN, Self::MAX),
            y: y.clamp(Self::MIN, Self::MAX),
        }
    }
}

/// Serializes `Option<PinPosition>` as the flat `pinX`/`pinY` pair used on the wire.
/// A record carrying only one of the two is rejected.
mod flat_pin {
    use super::PinPosition;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct PinFields {
        #[serde(default)]
        pin_x: Option<f64>,
        #[serde(default)]
        pin_y: Option<f64>,
    }

    pub fn serialize<S: Serializer>(pin: &Option<PinPosition>, ser: S) -> Result<S::Ok, S::Error> {
        PinFields {
            pin_x: pin.map(|p| p.x),
            pin_y: pin.map(|p| p.y),
        }
        .serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<PinPosition>, D::Error> {
        let fields = PinFields::deserialize(de)?;
        match (fields.pin_x, fields.pin_y) {
            (Some(x), Some(y)) => Ok(Some(PinPosition { x, y })),
            (None, None) => Ok(None),
            _ => Err(de::Error::custom(
                "pinX and pinY must both be set or both be null",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Custom fields
// ---------------------------------------------------------------------------

pub const CUSTOM_FIELD_MAX_ENTRIES: usize = 32;
pub const CUSTOM_FIELD_MAX_KEY_LEN: usize = 40;
pub const CUSTOM_FIELD_MAX_TEXT_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomFieldError {
    #[error("custom field key must be 1-40 characters of a-z, 0-9, '_' or '-': {0:?}")]
    InvalidKey(String),
    #[error("too many custom fields (max 32)")]
    TooMany,
    #[error("custom field {0:?} text exceeds 1000 characters")]
    TextTooLong(String),
    #[error("custom field {0:?} number must be finite")]
    NotFinite(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CustomFieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Date(NaiveDate),
}

/// Per-work-item extra fields. Open-ended keys, but every entry is checked
/// against the key charset and value bounds on insert and on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, CustomFieldValue>",
    into = "BTreeMap<String, CustomFieldValue>"
)]
pub struct CustomFields(BTreeMap<String, CustomFieldValue>);

impl CustomFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: CustomFieldValue) -> Result<(), CustomFieldError> {
        validate_custom_key(key)?;
        validate_custom_value(key, &value)?;
        if !self.0.contains_key(key) && self.0.len() >= CUSTOM_FIELD_MAX_ENTRIES {
            return Err(CustomFieldError::TooMany);
        }
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&CustomFieldValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<CustomFieldValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomFieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn validate_custom_key(key: &str) -> Result<(), CustomFieldError> {
    let valid = !key.is_empty()
        && key.len() <= CUSTOM_FIELD_MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CustomFieldError::InvalidKey(key.to_string()))
    }
}

fn validate_custom_value(key: &str, value: &CustomFieldValue) -> Result<(), CustomFieldError> {
    match value {
        CustomFieldValue::Text(s) if s.chars().count() > CUSTOM_FIELD_MAX_TEXT_LEN => {
            Err(CustomFieldError::TextTooLong(key.to_string()))
        }
        CustomFieldValue::Number(n) if !n.is_finite() => {
            Err(CustomFieldError::NotFinite(key.to_string()))
        }
        _ => Ok(()),
    }
}

impl TryFrom<BTreeMap<String, CustomFieldValue>> for CustomFields {
    type Error = CustomFieldError;

    fn try_from(map: BTreeMap<String, CustomFieldValue>) -> Result<Self, Self::Error> {
        if map.len() > CUSTOM_FIELD_MAX_ENTRIES {
            return Err(CustomFieldError::TooMany);
        }
        for (key, value) in &map {
            validate_custom_key(key)?;
            validate_custom_value(key, value)?;
        }
        Ok(CustomFields(map))
    }
}

impl From<CustomFields> for BTreeMap<String, CustomFieldValue> {
    fn from(fields: CustomFields) -> Self {
        fields.0
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One deck drawing of a vessel's general arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaDeck {
    pub id: String,
    pub name: String,
    pub level: i32,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub vessel_type: Option<String>,
    /// Length overall in meters.
    pub length: Option<f64>,
    pub flag: Option<String>,
    pub imo: Option<String>,
    pub image_url: Option<String>,
    pub ga_plan_url: Option<String>,
    #[serde(default)]
    pub ga_decks: Vec<GaDeck>,
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub vessel_id: Uuid,
    #[serde(default)]
    pub status: ProjectStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(flatten, with = "flat_pin")]
    pub pin: Option<PinPosition>,
    pub deck_level: Option<String>,
    pub location: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: CustomFields,
    #[serde(default)]
    pub order: i32,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkItem {
    /// A fresh, unplaced item with default status and priority.
    pub fn new(project_id: Uuid, id: Uuid, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        WorkItem {
            id,
            project_id,
            title: title.into(),
            description: None,
            status: Status::default(),
            priority: Priority::default(),
            pin: None,
            deck_level: None,
            location: None,
            assignee_id: None,
            due_date: None,
            estimated_hours: None,
            actual_hours: None,
            tags: Vec::new(),
            custom_fields: CustomFields::new(),
            order: 0,
            creator_id: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.pin.is_some()
    }

    /// Change status, keeping `completed_at` in step: stamped on the way into
    /// `Completed` (unless already set), cleared on the way out.
    pub fn set_status(&mut self, status: Status, now: DateTime<Utc>) {
        if status == Status::Completed {
            self.completed_at.get_or_insert(now);
        } else {
            self.completed_at = None;
        }
        self.status = status;
    }
}

/// Marker drawn on the GA plan for a placed work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub title: String,
    pub location: Option<String>,
    pub status: Status,
    pub priority: Priority,
}

impl Pin {
    /// `None` for items that are not placed on the plan.
    pub fn from_work_item(item: &WorkItem) -> Option<Self> {
        let pos = item.pin?;
        Some(Pin {
            id: item.id,
            x: pos.x,
            y: pos.y,
            title: item.title.clone(),
            location: item.location.clone(),
            status: item.status,
            priority: item.priority,
        })
    }
}

pub fn pins_for<'a>(items: impl IntoIterator<Item = &'a WorkItem>) -> Vec<Pin> {
    items.into_iter().filter_map(Pin::from_work_item).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub work_item_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub author_id: Uuid,
    #[serde(default)]
    pub mentions: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    pub work_item_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub file_size: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    StatusChanged,
    Moved,
    Commented,
    Deleted,
}

impl ActivityAction {
    /// Past-tense phrase for "<user> <verb> <item>" feed lines.
    pub fn verb(self) -> &'static str {
        match self {
            ActivityAction::Created => "created",
            ActivityAction::Updated => "updated",
            ActivityAction::StatusChanged => "changed the status of",
            ActivityAction::Moved => "moved",
            ActivityAction::Commented => "commented on",
            ActivityAction::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub work_item_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action: ActivityAction,
    #[serde(default)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Mention,
    Assignment,
    DueDate,
    StatusChange,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    pub link_url: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
