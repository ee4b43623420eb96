use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use yacht_shared::models::{
    ActivityEntry, Attachment, Comment, Notification, Project, User, Vessel, WorkItem,
};

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

const USERS: JsonTable = TableDefinition::new("users");
const VESSELS: JsonTable = TableDefinition::new("vessels");
const PROJECTS: JsonTable = TableDefinition::new("projects");
const WORK_ITEMS: JsonTable = TableDefinition::new("work_items");
const COMMENTS: JsonTable = TableDefinition::new("comments");
const ATTACHMENTS: JsonTable = TableDefinition::new("attachments");
const ACTIVITY: JsonTable = TableDefinition::new("activity_log");
const NOTIFICATIONS: JsonTable = TableDefinition::new("notifications");

const ALL_TABLES: [JsonTable; 8] = [
    USERS,
    VESSELS,
    PROJECTS,
    WORK_ITEMS,
    COMMENTS,
    ATTACHMENTS,
    ACTIVITY,
    NOTIFICATIONS,
];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to open database: {0}")]
    Open(#[from] redb::DatabaseError),
    #[error("transaction failed: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("table access failed: {0}")]
    Table(#[from] redb::TableError),
    #[error("storage failure: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("commit failed: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("corrupt record: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Everything written by [`Storage::seed_if_empty`].
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedData {
    pub users: Vec<User>,
    pub vessels: Vec<Vessel>,
    pub projects: Vec<Project>,
    pub work_items: Vec<WorkItem>,
    pub comments: Vec<Comment>,
}

/// Records written together by [`Storage::commit`]: either all land or none do.
#[derive(Debug, Default)]
pub struct ChangeSet {
    pub work_items: Vec<WorkItem>,
    pub comments: Vec<Comment>,
    pub attachments: Vec<Attachment>,
    pub notifications: Vec<Notification>,
    pub activity: Vec<ActivityEntry>,
}

impl ChangeSet {
    pub fn with_work_item(item: WorkItem) -> Self {
        ChangeSet {
            work_items: vec![item],
            ..Default::default()
        }
    }
}

pub struct Storage {
    db: Database,
}

fn put_in<T: Serialize>(
    txn: &WriteTransaction,
    table: JsonTable,
    id: Uuid,
    value: &T,
) -> StorageResult<()> {
    let json = serde_json::to_vec(value)?;
    let key = id.to_string();
    let mut t = txn.open_table(table)?;
    t.insert(key.as_str(), json.as_slice())?;
    Ok(())
}

impl Storage {
    pub fn open(path: &Path) -> StorageResult<Arc<Self>> {
        let db = Database::create(path)?;

        // Ensure tables exist so readers never hit a missing table
        let write_txn = db.begin_write()?;
        for table in ALL_TABLES {
            write_txn.open_table(table)?;
        }
        write_txn.commit()?;

        Ok(Arc::new(Storage { db }))
    }

    fn put<T: Serialize>(&self, table: JsonTable, id: Uuid, value: &T) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        put_in(&write_txn, table, id, value)?;
        write_txn.commit()?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, table: JsonTable, id: Uuid) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        let key = id.to_string();
        match t.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn list<T: DeserializeOwned>(&self, table: JsonTable) -> StorageResult<Vec<T>> {
        self.list_where(table, |_: &T| true)
    }

    fn list_where<T: DeserializeOwned>(
        &self,
        table: JsonTable,
        keep: impl Fn(&T) -> bool,
    ) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        let mut out = Vec::new();
        for entry in t.iter()? {
            let (_, value) = entry?;
            let record: T = serde_json::from_slice(value.value())?;
            if keep(&record) {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn count(&self, table: JsonTable) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        Ok(t.len()?)
    }

    // Users

    pub fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        self.get(USERS, id)
    }

    pub fn list_users(&self) -> StorageResult<Vec<User>> {
        self.list(USERS)
    }

    // Vessels

    pub fn get_vessel(&self, id: Uuid) -> StorageResult<Option<Vessel>> {
        self.get(VESSELS, id)
    }

    pub fn list_vessels(&self) -> StorageResult<Vec<Vessel>> {
        self.list(VESSELS)
    }

    // Projects

    pub fn get_project(&self, id: Uuid) -> StorageResult<Option<Project>> {
        self.get(PROJECTS, id)
    }

    pub fn list_projects(&self) -> StorageResult<Vec<Project>> {
        self.list(PROJECTS)
    }

    pub fn count_projects(&self) -> StorageResult<u64> {
        self.count(PROJECTS)
    }

    // Work items

    pub fn get_work_item(&self, id: Uuid) -> StorageResult<Option<WorkItem>> {
        self.get(WORK_ITEMS, id)
    }

    pub fn list_work_items(&self) -> StorageResult<Vec<WorkItem>> {
        self.list(WORK_ITEMS)
    }

    /// Items of one project, in board order then creation order.
    pub fn work_items_for_project(&self, project_id: Uuid) -> StorageResult<Vec<WorkItem>> {
        let mut items: Vec<WorkItem> =
            self.list_where(WORK_ITEMS, |w: &WorkItem| w.project_id == project_id)?;
        items.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
        Ok(items)
    }

    /// Remove a work item together with its comments and attachments.
    /// Remove a work item with its comments and attachments. `log` is written in
    /// the same transaction, and only when something was removed.
    pub fn delete_work_item(&self, id: Uuid, log: Option<&ActivityEntry>) -> StorageResult<bool> {
        let comment_ids: Vec<Uuid> = self
            .comments_for(id)?
            .into_iter()
            .map(|c| c.id)
            .collect();
        let attachment_ids: Vec<Uuid> = self
            .list_where(ATTACHMENTS, |a: &Attachment| a.work_item_id == Some(id))?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut items = write_txn.open_table(WORK_ITEMS)?;
            let key = id.to_string();
            let result = items.remove(key.as_str())?;
            result.is_some()
        };
        {
            let mut comments = write_txn.open_table(COMMENTS)?;
            for cid in &comment_ids {
                comments.remove(cid.to_string().as_str())?;
            }
            let mut attachments = write_txn.open_table(ATTACHMENTS)?;
            for aid in &attachment_ids {
                attachments.remove(aid.to_string().as_str())?;
            }
        }
        if let Some(entry) = log.filter(|_| removed) {
            put_in(&write_txn, ACTIVITY, entry.id, entry)?;
        }
        write_txn.commit()?;
        Ok(removed)
    }

    // Comments and attachments

    pub fn comments_for(&self, work_item_id: Uuid) -> StorageResult<Vec<Comment>> {
        let mut comments: Vec<Comment> =
            self.list_where(COMMENTS, |c: &Comment| c.work_item_id == work_item_id)?;
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    pub fn count_comments(&self, work_item_id: Uuid) -> StorageResult<usize> {
        Ok(self.comments_for(work_item_id)?.len())
    }

    pub fn count_attachments(&self, work_item_id: Uuid) -> StorageResult<usize> {
        Ok(self
            .list_where(ATTACHMENTS, |a: &Attachment| a.work_item_id == Some(work_item_id))?
            .len())
    }

    // Activity log

    /// Most recent first. `None` returns activity across all projects.
    pub fn recent_activity(
        &self,
        project_id: Option<Uuid>,
        limit: usize,
    ) -> StorageResult<Vec<ActivityEntry>> {
        let mut entries: Vec<ActivityEntry> = self.list_where(ACTIVITY, |e: &ActivityEntry| {
            project_id.is_none() || e.project_id == project_id
        })?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    // Notifications

    pub fn put_notification(&self, notification: &Notification) -> StorageResult<()> {
        self.put(NOTIFICATIONS, notification.id, notification)
    }

    pub fn get_notification(&self, id: Uuid) -> StorageResult<Option<Notification>> {
        self.get(NOTIFICATIONS, id)
    }

    pub fn notifications_for(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> StorageResult<Vec<Notification>> {
        let mut list: Vec<Notification> = self.list_where(NOTIFICATIONS, |n: &Notification| {
            n.user_id == user_id && (!unread_only || !n.is_read)
        })?;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    /// Write every record of `changes` in one transaction.
    pub fn commit(&self, changes: &ChangeSet) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        for item in &changes.work_items {
            put_in(&write_txn, WORK_ITEMS, item.id, item)?;
        }
        for comment in &changes.comments {
            put_in(&write_txn, COMMENTS, comment.id, comment)?;
        }
        for attachment in &changes.attachments {
            put_in(&write_txn, ATTACHMENTS, attachment.id, attachment)?;
        }
        for notification in &changes.notifications {
            put_in(&write_txn, NOTIFICATIONS, notification.id, notification)?;
        }
        for entry in &changes.activity {
            put_in(&write_txn, ACTIVITY, entry.id, entry)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Write the demo data in one transaction, unless any project already exists.
    /// Returns whether anything was written.
    pub fn seed_if_empty(&self, seed: &SeedData) -> StorageResult<bool> {
        if self.count_projects()? > 0 {
            return Ok(false);
        }
        let write_txn = self.db.begin_write()?;
        for user in &seed.users {
            put_in(&write_txn, USERS, user.id, user)?;
        }
        for vessel in &seed.vessels {
            put_in(&write_txn, VESSELS, vessel.id, vessel)?;
        }
        for project in &seed.projects {
            put_in(&write_txn, PROJECTS, project.id, project)?;
        }
        for item in &seed.work_items {
            put_in(&write_txn, WORK_ITEMS, item.id, item)?;
        }
        for comment in &seed.comments {
            put_in(&write_txn, COMMENTS, comment.id, comment)?;
        }
        write_txn.commit()?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use yacht_shared::models::{ActivityAction, NotificationKind, PinPosition, ProjectStatus};

    pub(crate) fn temp_storage() -> (tempfile::TempDir, Arc<Storage>) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("test.redb")).unwrap();
        (dir, storage)
    }

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn project(id: u128) -> Project {
        Project {
            id: Uuid::from_u128(id),
            name: format!("Project {id}"),
            description: None,
            vessel_id: Uuid::nil(),
            status: ProjectStatus::Active,
            start_date: None,
            end_date: None,
            created_by: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn test_work_item_round_trip() {
        let (_dir, storage) = temp_storage();
        let mut item = WorkItem::new(Uuid::from_u128(1), Uuid::new_v4(), "Safety check", ts());
        item.priority = yacht_shared::models::Priority::High;
        item.pin = PinPosition::checked(15.0, 45.0);
        storage.commit(&ChangeSet::with_work_item(item.clone())).unwrap();

        let back = storage.get_work_item(item.id).unwrap().unwrap();
        assert_eq!(back, item);
        assert_eq!(back.description, None);
        assert_eq!(back.due_date, None);
        assert!(storage.get_work_item(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_work_items_for_project_filters_and_orders() {
        let (_dir, storage) = temp_storage();
        let p = Uuid::from_u128(1);
        let mut second = WorkItem::new(p, Uuid::new_v4(), "second", ts());
        second.order = 2;
        let mut first = WorkItem::new(p, Uuid::new_v4(), "first", ts() + Duration::hours(1));
        first.order = 1;
        let other = WorkItem::new(Uuid::from_u128(2), Uuid::new_v4(), "elsewhere", ts());
        for w in [&second, &first, &other] {
            storage.commit(&ChangeSet::with_work_item(w.clone())).unwrap();
        }
        let titles: Vec<String> = storage
            .work_items_for_project(p)
            .unwrap()
            .into_iter()
            .map(|w| w.title)
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(storage.list_work_items().unwrap().len(), 3);
    }

    #[test]
    fn test_delete_work_item_cascades_comments() {
        let (_dir, storage) = temp_storage();
        let item = WorkItem::new(Uuid::nil(), Uuid::new_v4(), "Antifouling", ts());
        storage.commit(&ChangeSet::with_work_item(item.clone())).unwrap();
        let comment = Comment {
            id: Uuid::new_v4(),
            work_item_id: item.id,
            parent_id: None,
            content: "Ordered paint".into(),
            author_id: Uuid::nil(),
            mentions: vec![],
            created_at: ts(),
            updated_at: ts(),
        };
        storage
            .commit(&ChangeSet {
                comments: vec![comment],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(storage.count_comments(item.id).unwrap(), 1);

        let log = ActivityEntry {
            id: Uuid::new_v4(),
            work_item_id: Some(item.id),
            project_id: Some(item.project_id),
            user_id: None,
            action: ActivityAction::Deleted,
            details: serde_json::json!({ "title": item.title }),
            created_at: ts(),
        };
        assert!(storage.delete_work_item(item.id, Some(&log)).unwrap());
        assert!(!storage.delete_work_item(item.id, Some(&log)).unwrap());
        assert_eq!(storage.count_comments(item.id).unwrap(), 0);
        assert_eq!(storage.recent_activity(None, 10).unwrap(), vec![log]);
    }

    #[test]
    fn test_commit_writes_item_activity_and_notification_together() {
        let (_dir, storage) = temp_storage();
        let user = Uuid::from_u128(7);
        let item = WorkItem::new(Uuid::from_u128(1), Uuid::new_v4(), "Tender service", ts());
        let mut changes = ChangeSet::with_work_item(item.clone());
        changes.activity.push(ActivityEntry {
            id: Uuid::new_v4(),
            work_item_id: Some(item.id),
            project_id: Some(item.project_id),
            user_id: Some(user),
            action: ActivityAction::Created,
            details: serde_json::Value::Null,
            created_at: ts(),
        });
        changes.notifications.push(Notification {
            id: Uuid::new_v4(),
            user_id: user,
            kind: NotificationKind::Assignment,
            title: "Assigned".into(),
            message: None,
            link_url: None,
            is_read: false,
            created_at: ts(),
        });
        storage.commit(&changes).unwrap();

        assert_eq!(storage.get_work_item(item.id).unwrap(), Some(item));
        assert_eq!(storage.recent_activity(Some(Uuid::from_u128(1)), 10).unwrap().len(), 1);
        assert_eq!(storage.notifications_for(user, true).unwrap().len(), 1);
    }

    #[test]
    fn test_seed_only_when_empty() {
        let (_dir, storage) = temp_storage();
        let seed = SeedData {
            projects: vec![project(1), project(2)],
            ..Default::default()
        };
        assert!(storage.seed_if_empty(&seed).unwrap());
        assert_eq!(storage.count_projects().unwrap(), 2);

        let more = SeedData {
            projects: vec![project(3)],
            ..Default::default()
        };
        assert!(!storage.seed_if_empty(&more).unwrap());
        assert_eq!(storage.count_projects().unwrap(), 2);
    }

    #[test]
    fn test_recent_activity_newest_first_and_limited() {
        let (_dir, storage) = temp_storage();
        let p = Some(Uuid::from_u128(1));
        for h in 0..5 {
            let entry = ActivityEntry {
                id: Uuid::new_v4(),
                work_item_id: None,
                project_id: p,
                user_id: None,
                action: ActivityAction::Updated,
                details: serde_json::json!({ "n": h }),
                created_at: ts() + Duration::hours(h),
            };
            storage
                .commit(&ChangeSet {
                    activity: vec![entry],
                    ..Default::default()
                })
                .unwrap();
        }
        let recent = storage.recent_activity(p, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].details["n"], 4);
        assert!(storage
            .recent_activity(Some(Uuid::from_u128(2)), 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unread_notifications() {
        let (_dir, storage) = temp_storage();
        let user = Uuid::from_u128(7);
        let mut n = Notification {
            id: Uuid::new_v4(),
            user_id: user,
            kind: NotificationKind::Assignment,
            title: "Assigned".into(),
            message: None,
            link_url: None,
            is_read: false,
            created_at: ts(),
        };
        storage.put_notification(&n).unwrap();
        assert_eq!(storage.notifications_for(user, true).unwrap().len(), 1);
        n.is_read = true;
        storage.put_notification(&n).unwrap();
        assert!(storage.notifications_for(user, true).unwrap().is_empty());
        assert_eq!(storage.notifications_for(user, false).unwrap().len(), 1);
    }
}
