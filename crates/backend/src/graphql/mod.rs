use std::sync::Arc;

use async_graphql::{Context, Enum, InputObject, Json, MaybeUndefined, Object, SimpleObject, ID};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;
use yacht_shared::filter::WorkItemFilter;
use yacht_shared::form::WorkItemPayload;
use yacht_shared::models::{
    self, ActivityAction, ActivityEntry, Comment, CustomFields, NotificationKind, PinPosition,
    Priority, Status, WorkItem,
};

use crate::storage::{ChangeSet, Storage, StorageError};

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
pub enum GqlStatus {
    Open,
    InProgress,
    Completed,
    Blocked,
}

impl From<Status> for GqlStatus {
    fn from(s: Status) -> Self {
        match s {
            Status::Open => GqlStatus::Open,
            Status::InProgress => GqlStatus::InProgress,
            Status::Completed => GqlStatus::Completed,
            Status::Blocked => GqlStatus::Blocked,
        }
    }
}

impl From<GqlStatus> for Status {
    fn from(s: GqlStatus) -> Self {
        match s {
            GqlStatus::Open => Status::Open,
            GqlStatus::InProgress => Status::InProgress,
            GqlStatus::Completed => Status::Completed,
            GqlStatus::Blocked => Status::Blocked,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
pub enum GqlPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl From<Priority> for GqlPriority {
    fn from(p: Priority) -> Self {
        match p {
            Priority::Low => GqlPriority::Low,
            Priority::Medium => GqlPriority::Medium,
            Priority::High => GqlPriority::High,
            Priority::Critical => GqlPriority::Critical,
        }
    }
}

impl From<GqlPriority> for Priority {
    fn from(p: GqlPriority) -> Self {
        match p {
            GqlPriority::Low => Priority::Low,
            GqlPriority::Medium => Priority::Medium,
            GqlPriority::High => Priority::High,
            GqlPriority::Critical => Priority::Critical,
        }
    }
}

// GraphQL output types

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

#[derive(SimpleObject)]
pub struct GqlWorkItem {
    pub id: ID,
    pub project_id: ID,
    pub title: String,
    pub description: Option<String>,
    pub status: GqlStatus,
    pub priority: GqlPriority,
    pub pin_x: Option<f64>,
    pub pin_y: Option<f64>,
    pub deck_level: Option<String>,
    pub location: Option<String>,
    pub assignee_id: Option<ID>,
    pub due_date: Option<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub tags: Vec<String>,
    pub custom_fields: Json<CustomFields>,
    pub order: i32,
    pub creator_id: Option<ID>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl From<WorkItem> for GqlWorkItem {
    fn from(w: WorkItem) -> Self {
        GqlWorkItem {
            id: ID(w.id.to_string()),
            project_id: ID(w.project_id.to_string()),
            title: w.title,
            description: w.description,
            status: w.status.into(),
            priority: w.priority.into(),
            pin_x: w.pin.map(|p| p.x),
            pin_y: w.pin.map(|p| p.y),
            deck_level: w.deck_level,
            location: w.location,
            assignee_id: w.assignee_id.map(|id| ID(id.to_string())),
            due_date: w.due_date.map(rfc3339),
            estimated_hours: w.estimated_hours,
            actual_hours: w.actual_hours,
            tags: w.tags,
            custom_fields: Json(w.custom_fields),
            order: w.order,
            creator_id: w.creator_id.map(|id| ID(id.to_string())),
            created_at: rfc3339(w.created_at),
            updated_at: rfc3339(w.updated_at),
            completed_at: w.completed_at.map(rfc3339),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlUser {
    pub id: ID,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<models::User> for GqlUser {
    fn from(u: models::User) -> Self {
        GqlUser {
            id: ID(u.id.to_string()),
            name: u.name,
            email: u.email,
            avatar_url: u.avatar_url,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlDeck {
    pub id: String,
    pub name: String,
    pub level: i32,
    pub image_url: String,
}

#[derive(SimpleObject)]
pub struct GqlVessel {
    pub id: ID,
    pub name: String,
    pub vessel_type: Option<String>,
    pub length: Option<f64>,
    pub flag: Option<String>,
    pub ga_plan_url: Option<String>,
    pub decks: Vec<GqlDeck>,
}

impl From<models::Vessel> for GqlVessel {
    fn from(v: models::Vessel) -> Self {
        GqlVessel {
            id: ID(v.id.to_string()),
            name: v.name,
            vessel_type: v.vessel_type,
            length: v.length,
            flag: v.flag,
            ga_plan_url: v.ga_plan_url,
            decks: v
                .ga_decks
                .into_iter()
                .map(|d| GqlDeck {
                    id: d.id,
                    name: d.name,
                    level: d.level,
                    image_url: d.image_url,
                })
                .collect(),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlComment {
    pub id: ID,
    pub work_item_id: ID,
    pub parent_id: Option<ID>,
    pub content: String,
    pub author_id: ID,
    pub created_at: String,
}

impl From<Comment> for GqlComment {
    fn from(c: Comment) -> Self {
        GqlComment {
            id: ID(c.id.to_string()),
            work_item_id: ID(c.work_item_id.to_string()),
            parent_id: c.parent_id.map(|id| ID(id.to_string())),
            content: c.content,
            author_id: ID(c.author_id.to_string()),
            created_at: rfc3339(c.created_at),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlNotification {
    pub id: ID,
    pub kind: String,
    pub title: String,
    pub message: Option<String>,
    pub link_url: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<models::Notification> for GqlNotification {
    fn from(n: models::Notification) -> Self {
        let kind = serde_json::to_value(n.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        GqlNotification {
            id: ID(n.id.to_string()),
            kind,
            title: n.title,
            message: n.message,
            link_url: n.link_url,
            is_read: n.is_read,
            created_at: rfc3339(n.created_at),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlActivity {
    pub id: ID,
    pub work_item_id: Option<ID>,
    pub user_id: Option<ID>,
    pub action: String,
    pub details: Json<serde_json::Value>,
    pub created_at: String,
}

impl From<ActivityEntry> for GqlActivity {
    fn from(e: ActivityEntry) -> Self {
        let action = serde_json::to_value(e.action)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        GqlActivity {
            id: ID(e.id.to_string()),
            work_item_id: e.work_item_id.map(|id| ID(id.to_string())),
            user_id: e.user_id.map(|id| ID(id.to_string())),
            action,
            details: Json(e.details),
            created_at: rfc3339(e.created_at),
        }
    }
}

// Input types

#[derive(InputObject, Default)]
pub struct WorkItemFilterInput {
    pub status: Option<Vec<GqlStatus>>,
    pub priority: Option<Vec<GqlPriority>>,
    pub assignee_id: Option<ID>,
    pub tags: Option<Vec<String>>,
    pub deck_level: Option<String>,
    pub search: Option<String>,
}

#[derive(InputObject)]
pub struct CreateWorkItemInput {
    pub project_id: ID,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<GqlStatus>,
    pub priority: Option<GqlPriority>,
    pub pin_x: Option<f64>,
    pub pin_y: Option<f64>,
    pub deck_level: Option<String>,
    pub location: Option<String>,
    pub assignee_id: Option<ID>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub due_date: Option<String>,
    pub estimated_hours: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub custom_fields: Option<Json<CustomFields>>,
    /// Acting user, recorded as creator.
    pub user_id: Option<ID>,
}

/// Partial update. Omitted fields are left alone; explicit `null` clears.
#[derive(InputObject)]
pub struct UpdateWorkItemInput {
    pub id: ID,
    pub title: Option<String>,
    pub description: MaybeUndefined<String>,
    pub status: Option<GqlStatus>,
    pub priority: Option<GqlPriority>,
    pub pin_x: MaybeUndefined<f64>,
    pub pin_y: MaybeUndefined<f64>,
    pub deck_level: MaybeUndefined<String>,
    pub location: MaybeUndefined<String>,
    pub assignee_id: MaybeUndefined<ID>,
    pub due_date: MaybeUndefined<String>,
    pub estimated_hours: MaybeUndefined<f64>,
    pub actual_hours: MaybeUndefined<f64>,
    pub tags: Option<Vec<String>>,
    pub custom_fields: Option<Json<CustomFields>>,
    /// Overrides the automatic completion stamp.
    pub completed_at: MaybeUndefined<String>,
    pub user_id: Option<ID>,
}

#[derive(InputObject)]
pub struct AddAttachmentInput {
    pub work_item_id: ID,
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub file_size: Option<u64>,
    pub uploaded_by: Option<ID>,
}

#[derive(InputObject)]
pub struct AddCommentInput {
    pub work_item_id: ID,
    pub author_id: ID,
    pub content: String,
    pub parent_id: Option<ID>,
    pub mentions: Option<Vec<ID>>,
}

// Helpers

fn parse_id(id: &ID) -> async_graphql::Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| async_graphql::Error::new(format!("Invalid id: {}", id.0)))
}

fn parse_opt_id(id: Option<&ID>) -> async_graphql::Result<Option<Uuid>> {
    id.map(parse_id).transpose()
}

fn parse_timestamp(raw: &str) -> async_graphql::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| async_graphql::Error::new(format!("Invalid date: {raw}")))
}

fn storage_err(e: StorageError) -> async_graphql::Error {
    tracing::error!(error = %e, "Storage error");
    async_graphql::Error::new("Internal server error")
}

fn check_hours(label: &str, hours: Option<f64>) -> async_graphql::Result<()> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => Err(async_graphql::Error::new(format!(
            "{label} must be a non-negative number"
        ))),
        _ => Ok(()),
    }
}

/// Both coordinates or neither, each within the plan.
fn pin_from(x: Option<f64>, y: Option<f64>) -> async_graphql::Result<Option<PinPosition>> {
    match (x, y) {
        (None, None) => Ok(None),
        (Some(x), Some(y)) => PinPosition::checked(x, y).map(Some).ok_or_else(|| {
            async_graphql::Error::new("Pin coordinates must be between 0 and 100")
        }),
        _ => Err(async_graphql::Error::new(
            "pinX and pinY must both be set or both be null",
        )),
    }
}

fn apply<T>(field: MaybeUndefined<T>, target: &mut Option<T>) {
    match field {
        MaybeUndefined::Undefined => {}
        MaybeUndefined::Null => *target = None,
        MaybeUndefined::Value(v) => *target = Some(v),
    }
}

fn map_maybe<T, U>(
    field: MaybeUndefined<T>,
    f: impl FnOnce(T) -> async_graphql::Result<U>,
) -> async_graphql::Result<MaybeUndefined<U>> {
    Ok(match field {
        MaybeUndefined::Undefined => MaybeUndefined::Undefined,
        MaybeUndefined::Null => MaybeUndefined::Null,
        MaybeUndefined::Value(v) => MaybeUndefined::Value(f(v)?),
    })
}

fn validate_payload(payload: &WorkItemPayload) -> async_graphql::Result<()> {
    if let Err(errors) = payload.validate() {
        let fields = errors.field_errors();
        if fields.contains_key("title") {
            return Err(async_graphql::Error::new(
                "Title is required and must be at most 200 characters",
            ));
        }
        return Err(async_graphql::Error::new(errors.to_string()));
    }
    Ok(())
}

fn activity(
    action: ActivityAction,
    item: &WorkItem,
    user_id: Option<Uuid>,
    details: serde_json::Value,
) -> ActivityEntry {
    tracing::debug!(work_item = %item.id, action = ?action, "Recording activity");
    ActivityEntry {
        id: Uuid::new_v4(),
        work_item_id: Some(item.id),
        project_id: Some(item.project_id),
        user_id,
        action,
        details,
        created_at: Utc::now(),
    }
}

fn notification(
    user_id: Uuid,
    kind: NotificationKind,
    title: String,
    item: &WorkItem,
) -> models::Notification {
    models::Notification {
        id: Uuid::new_v4(),
        user_id,
        kind,
        title,
        message: Some(item.title.clone()),
        link_url: Some(format!("/projects/{}", item.project_id)),
        is_read: false,
        created_at: Utc::now(),
    }
}

/// Notification for a newly assigned user, if the assignee changed.
fn assignment_notice(item: &WorkItem, previous: Option<Uuid>) -> Option<models::Notification> {
    match item.assignee_id {
        Some(assignee) if Some(assignee) != previous => Some(notification(
            assignee,
            NotificationKind::Assignment,
            format!("You have been assigned: {}", item.title),
            item,
        )),
        _ => None,
    }
}

/// Position after the last item of the project.
fn next_order(siblings: &[WorkItem]) -> i32 {
    siblings.iter().map(|w| w.order).max().map_or(0, |last| last + 1)
}

fn require_user(storage: &Storage, id: Option<Uuid>) -> async_graphql::Result<()> {
    if let Some(id) = id {
        if storage.get_user(id).map_err(storage_err)?.is_none() {
            return Err(async_graphql::Error::new(format!("Unknown user: {id}")));
        }
    }
    Ok(())
}

fn load_item(storage: &Storage, id: &ID) -> async_graphql::Result<WorkItem> {
    storage
        .get_work_item(parse_id(id)?)
        .map_err(storage_err)?
        .ok_or_else(|| async_graphql::Error::new("Work item not found"))
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn work_item(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<GqlWorkItem>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let item = storage.get_work_item(parse_id(&id)?).map_err(storage_err)?;
        Ok(item.map(GqlWorkItem::from))
    }

    async fn work_items(
        &self,
        ctx: &Context<'_>,
        project_id: ID,
        filter: Option<WorkItemFilterInput>,
    ) -> async_graphql::Result<Vec<GqlWorkItem>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let f = filter.unwrap_or_default();
        let filter = WorkItemFilter {
            status: f.status.unwrap_or_default().into_iter().map(Status::from).collect(),
            priority: f
                .priority
                .unwrap_or_default()
                .into_iter()
                .map(Priority::from)
                .collect(),
            assignee_id: parse_opt_id(f.assignee_id.as_ref())?,
            tags: f.tags.unwrap_or_default(),
            deck_level: f.deck_level,
            search: f.search,
        };
        let items = storage
            .work_items_for_project(parse_id(&project_id)?)
            .map_err(storage_err)?;
        Ok(items
            .into_iter()
            .filter(|w| filter.matches(w))
            .map(GqlWorkItem::from)
            .collect())
    }

    async fn vessels(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlVessel>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let mut vessels = storage.list_vessels().map_err(storage_err)?;
        vessels.retain(|v| !v.is_archived);
        vessels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vessels.into_iter().map(GqlVessel::from).collect())
    }

    async fn users(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlUser>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let mut users = storage.list_users().map_err(storage_err)?;
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users.into_iter().map(GqlUser::from).collect())
    }

    async fn comments(
        &self,
        ctx: &Context<'_>,
        work_item_id: ID,
    ) -> async_graphql::Result<Vec<GqlComment>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let comments = storage
            .comments_for(parse_id(&work_item_id)?)
            .map_err(storage_err)?;
        Ok(comments.into_iter().map(GqlComment::from).collect())
    }

    async fn notifications(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
        unread_only: Option<bool>,
    ) -> async_graphql::Result<Vec<GqlNotification>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let list = storage
            .notifications_for(parse_id(&user_id)?, unread_only.unwrap_or(false))
            .map_err(storage_err)?;
        Ok(list.into_iter().map(GqlNotification::from).collect())
    }

    async fn activity(
        &self,
        ctx: &Context<'_>,
        project_id: Option<ID>,
        limit: Option<i32>,
    ) -> async_graphql::Result<Vec<GqlActivity>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let limit = limit.map_or(DEFAULT_ACTIVITY_LIMIT, |l| l.max(0) as usize);
        let entries = storage
            .recent_activity(parse_opt_id(project_id.as_ref())?, limit)
            .map_err(storage_err)?;
        Ok(entries.into_iter().map(GqlActivity::from).collect())
    }
}

// Mutation root

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_work_item(
        &self,
        ctx: &Context<'_>,
        input: CreateWorkItemInput,
    ) -> async_graphql::Result<GqlWorkItem> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let project_id = parse_id(&input.project_id)?;
        if storage.get_project(project_id).map_err(storage_err)?.is_none() {
            return Err(async_graphql::Error::new("Project not found"));
        }
        let user_id = parse_opt_id(input.user_id.as_ref())?;
        let assignee_id = parse_opt_id(input.assignee_id.as_ref())?;
        require_user(storage, assignee_id)?;

        let due_date = input.due_date.as_deref().map(parse_timestamp).transpose()?;
        let payload = WorkItemPayload {
            title: input.title.trim().to_string(),
            description: input.description,
            status: input.status.map(Status::from).unwrap_or_default(),
            priority: input.priority.map(Priority::from).unwrap_or_default(),
            location: input.location,
            deck_level: input.deck_level,
            due_date: due_date.map(|d| d.date_naive()),
            estimated_hours: input.estimated_hours,
            tags: input.tags.unwrap_or_default(),
        };
        validate_payload(&payload)?;
        check_hours("Estimated hours", payload.estimated_hours)?;
        let pin = pin_from(input.pin_x, input.pin_y)?;

        let now = Utc::now();
        let mut item = WorkItem::new(project_id, Uuid::new_v4(), payload.title.clone(), now);
        payload.apply_to(&mut item);
        // Keep the caller's exact timestamp rather than the date-only form
        item.due_date = due_date;
        item.set_status(payload.status, now);
        item.pin = pin;
        item.assignee_id = assignee_id;
        item.creator_id = user_id;
        item.custom_fields = input.custom_fields.map(|j| j.0).unwrap_or_default();
        item.order = next_order(
            &storage
                .work_items_for_project(project_id)
                .map_err(storage_err)?,
        );

        let mut changes = ChangeSet::with_work_item(item.clone());
        changes.activity.push(activity(
            ActivityAction::Created,
            &item,
            user_id,
            serde_json::json!({ "title": item.title }),
        ));
        changes.notifications.extend(assignment_notice(&item, None));
        storage.commit(&changes).map_err(storage_err)?;
        tracing::info!(work_item = %item.id, project = %project_id, "Created work item");

        Ok(GqlWorkItem::from(item))
    }

    async fn update_work_item(
        &self,
        ctx: &Context<'_>,
        input: UpdateWorkItemInput,
    ) -> async_graphql::Result<GqlWorkItem> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let mut item = load_item(storage, &input.id)?;
        let user_id = parse_opt_id(input.user_id.as_ref())?;
        let previous_status = item.status;
        let previous_assignee = item.assignee_id;
        let now = Utc::now();

        if let Some(title) = input.title {
            item.title = title.trim().to_string();
        }
        apply(input.description, &mut item.description);
        if let Some(priority) = input.priority {
            item.priority = priority.into();
        }
        apply(input.deck_level, &mut item.deck_level);
        apply(input.location, &mut item.location);

        let assignee = map_maybe(input.assignee_id, |id| parse_id(&id))?;
        if let MaybeUndefined::Value(id) = assignee {
            require_user(storage, Some(id))?;
        }
        apply(assignee, &mut item.assignee_id);

        let due = map_maybe(input.due_date, |raw| parse_timestamp(&raw))?;
        apply(due, &mut item.due_date);
        apply(input.estimated_hours, &mut item.estimated_hours);
        apply(input.actual_hours, &mut item.actual_hours);
        check_hours("Estimated hours", item.estimated_hours)?;
        check_hours("Actual hours", item.actual_hours)?;

        if let Some(tags) = input.tags {
            item.tags = yacht_shared::form::parse_tags(&tags.join(","));
        }
        if let Some(fields) = input.custom_fields {
            item.custom_fields = fields.0;
        }

        match (input.pin_x, input.pin_y) {
            (MaybeUndefined::Undefined, MaybeUndefined::Undefined) => {}
            (MaybeUndefined::Null, MaybeUndefined::Null) => item.pin = None,
            (MaybeUndefined::Value(x), MaybeUndefined::Value(y)) => {
                item.pin = pin_from(Some(x), Some(y))?;
            }
            _ => {
                return Err(async_graphql::Error::new(
                    "pinX and pinY must both be set or both be null",
                ))
            }
        }

        if let Some(status) = input.status {
            item.set_status(status.into(), now);
        }
        let completed = map_maybe(input.completed_at, |raw| parse_timestamp(&raw))?;
        apply(completed, &mut item.completed_at);

        let check = WorkItemPayload {
            title: item.title.clone(),
            description: None,
            status: item.status,
            priority: item.priority,
            location: None,
            deck_level: None,
            due_date: None,
            estimated_hours: item.estimated_hours,
            tags: vec![],
        };
        validate_payload(&check)?;

        item.updated_at = now;

        let entry = if item.status != previous_status {
            activity(
                ActivityAction::StatusChanged,
                &item,
                user_id,
                serde_json::json!({
                    "from": previous_status.as_str(),
                    "to": item.status.as_str(),
                }),
            )
        } else {
            activity(
                ActivityAction::Updated,
                &item,
                user_id,
                serde_json::json!({ "title": item.title }),
            )
        };
        let mut changes = ChangeSet::with_work_item(item.clone());
        changes.activity.push(entry);
        changes
            .notifications
            .extend(assignment_notice(&item, previous_assignee));
        storage.commit(&changes).map_err(storage_err)?;

        Ok(GqlWorkItem::from(item))
    }

    /// Move a pin. Coordinates outside the plan are clamped onto its edge.
    async fn move_work_item_pin(
        &self,
        ctx: &Context<'_>,
        id: ID,
        x: f64,
        y: f64,
        user_id: Option<ID>,
    ) -> async_graphql::Result<GqlWorkItem> {
        if !x.is_finite() || !y.is_finite() {
            return Err(async_graphql::Error::new("Pin coordinates must be numbers"));
        }
        let storage = ctx.data::<Arc<Storage>>()?;
        let mut item = load_item(storage, &id)?;
        let from = item.pin;
        let to = PinPosition::clamped(x, y);
        item.pin = Some(to);
        item.updated_at = Utc::now();

        let mut changes = ChangeSet::with_work_item(item.clone());
        changes.activity.push(activity(
            ActivityAction::Moved,
            &item,
            parse_opt_id(user_id.as_ref())?,
            serde_json::json!({ "from": from, "to": to }),
        ));
        storage.commit(&changes).map_err(storage_err)?;
        Ok(GqlWorkItem::from(item))
    }

    async fn delete_work_item(
        &self,
        ctx: &Context<'_>,
        id: ID,
        user_id: Option<ID>,
    ) -> async_graphql::Result<bool> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let Some(item) = storage.get_work_item(parse_id(&id)?).map_err(storage_err)? else {
            return Ok(false);
        };
        let log = activity(
            ActivityAction::Deleted,
            &item,
            parse_opt_id(user_id.as_ref())?,
            serde_json::json!({ "title": item.title }),
        );
        let removed = storage
            .delete_work_item(item.id, Some(&log))
            .map_err(storage_err)?;
        if removed {
            tracing::info!(work_item = %item.id, "Deleted work item");
        }
        Ok(removed)
    }

    async fn add_comment(
        &self,
        ctx: &Context<'_>,
        input: AddCommentInput,
    ) -> async_graphql::Result<GqlComment> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let item = load_item(storage, &input.work_item_id)?;
        let author_id = parse_id(&input.author_id)?;
        require_user(storage, Some(author_id))?;
        let content = input.content.trim().to_string();
        if content.is_empty() {
            return Err(async_graphql::Error::new("Comment cannot be empty"));
        }
        let mentions = input
            .mentions
            .unwrap_or_default()
            .iter()
            .map(parse_id)
            .collect::<async_graphql::Result<Vec<_>>>()?;

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            work_item_id: item.id,
            parent_id: parse_opt_id(input.parent_id.as_ref())?,
            content,
            author_id,
            mentions: mentions.clone(),
            created_at: now,
            updated_at: now,
        };
        let mut changes = ChangeSet {
            comments: vec![comment.clone()],
            ..Default::default()
        };
        changes.activity.push(activity(
            ActivityAction::Commented,
            &item,
            Some(author_id),
            serde_json::json!({ "commentId": comment.id }),
        ));
        for user in mentions.iter().filter(|u| **u != author_id) {
            changes.notifications.push(notification(
                *user,
                NotificationKind::Mention,
                format!("You were mentioned on: {}", item.title),
                &item,
            ));
        }
        if let Some(assignee) = item.assignee_id {
            if assignee != author_id && !mentions.contains(&assignee) {
                changes.notifications.push(notification(
                    assignee,
                    NotificationKind::Comment,
                    format!("New comment on: {}", item.title),
                    &item,
                ));
            }
        }
        storage.commit(&changes).map_err(storage_err)?;

        Ok(GqlComment::from(comment))
    }

    /// Attach an already-uploaded file to a work item by URL.
    async fn add_attachment(
        &self,
        ctx: &Context<'_>,
        input: AddAttachmentInput,
    ) -> async_graphql::Result<ID> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let item = load_item(storage, &input.work_item_id)?;
        let uploaded_by = parse_opt_id(input.uploaded_by.as_ref())?;
        if input.file_name.trim().is_empty() || input.file_url.trim().is_empty() {
            return Err(async_graphql::Error::new("File name and URL are required"));
        }
        let attachment = models::Attachment {
            id: Uuid::new_v4(),
            work_item_id: Some(item.id),
            comment_id: None,
            file_name: input.file_name,
            file_type: input.file_type,
            file_url: input.file_url,
            file_size: input.file_size,
            thumbnail_url: None,
            uploaded_by,
            created_at: Utc::now(),
        };
        let entry = activity(
            ActivityAction::Updated,
            &item,
            uploaded_by,
            serde_json::json!({ "attachment": attachment.file_name }),
        );
        let id = ID(attachment.id.to_string());
        storage
            .commit(&ChangeSet {
                attachments: vec![attachment],
                activity: vec![entry],
                ..Default::default()
            })
            .map_err(storage_err)?;
        Ok(id)
    }

    /// Notification state is per-user bookkeeping and leaves the activity log alone.
    async fn mark_notification_read(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let Some(mut n) = storage.get_notification(parse_id(&id)?).map_err(storage_err)? else {
            return Ok(false);
        };
        n.is_read = true;
        storage.put_notification(&n).map_err(storage_err)?;
        Ok(true)
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, MutationRoot, async_graphql::EmptySubscription>;

pub fn build_schema(storage: Arc<Storage>) -> Schema {
    async_graphql::Schema::build(QueryRoot, MutationRoot, async_graphql::EmptySubscription)
        .data(storage)
        .finish()
}
