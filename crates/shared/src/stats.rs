//! Aggregates served by the data routes and rendered by the dashboard.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    ActivityAction, ActivityEntry, Priority, Project, ProjectStatus, Status, User, Vessel, WorkItem,
};

/// Items due within this many days count as "due soon".
pub const DUE_SOON_DAYS: i64 = 7;

pub const DEFAULT_FEED_LIMIT: usize = 10;
pub const DEFAULT_UPCOMING_LIMIT: usize = 6;

/// Whole-number completion percentage, `0` for an empty project.
pub fn progress_percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}

/// Open items whose due date has already passed.
pub fn is_overdue(item: &WorkItem, now: DateTime<Utc>) -> bool {
    item.status == Status::Open && item.due_date.is_some_and(|due| due < now)
}

pub fn is_due_soon(item: &WorkItem, now: DateTime<Utc>) -> bool {
    let horizon = now + Duration::days(DUE_SOON_DAYS);
    item.status != Status::Completed
        && item.due_date.is_some_and(|due| due >= now && due <= horizon)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
}

impl StatusCounts {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a WorkItem>) -> Self {
        let mut counts = StatusCounts::default();
        for item in items {
            counts.total += 1;
            match item.status {
                Status::Open => counts.open += 1,
                Status::InProgress => counts.in_progress += 1,
                Status::Completed => counts.completed += 1,
                Status::Blocked => counts.blocked += 1,
            }
        }
        counts
    }

    pub fn progress(&self) -> u32 {
        progress_percent(self.completed, self.total)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl PriorityBreakdown {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a WorkItem>) -> Self {
        let mut b = PriorityBreakdown::default();
        for item in items {
            match item.priority {
                Priority::Low => b.low += 1,
                Priority::Medium => b.medium += 1,
                Priority::High => b.high += 1,
                Priority::Critical => b.critical += 1,
            }
        }
        b
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCounts {
    pub total: usize,
    pub active: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_work_items: usize,
    pub open_items: usize,
    pub in_progress_items: usize,
    pub completed_items: usize,
    pub blocked_items: usize,
    pub overdue_items: usize,
    pub due_soon: usize,
    pub priority_breakdown: PriorityBreakdown,
    pub projects: ProjectCounts,
}

impl DashboardStats {
    pub fn compute(items: &[WorkItem], projects: &[Project], now: DateTime<Utc>) -> Self {
        let counts = StatusCounts::from_items(items);
        DashboardStats {
            total_work_items: counts.total,
            open_items: counts.open,
            in_progress_items: counts.in_progress,
            completed_items: counts.completed,
            blocked_items: counts.blocked,
            overdue_items: items.iter().filter(|i| is_overdue(i, now)).count(),
            due_soon: items.iter().filter(|i| is_due_soon(i, now)).count(),
            priority_breakdown: PriorityBreakdown::from_items(items),
            projects: ProjectCounts {
                total: projects.len(),
                active: projects
                    .iter()
                    .filter(|p| p.status == ProjectStatus::Active)
                    .count(),
            },
        }
    }
}

/// Row of the project list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    /// Vessel name, absent if the vessel record is gone.
    pub vessel: Option<String>,
    pub status: ProjectStatus,
    pub progress: u32,
    pub work_items: usize,
    pub completed: usize,
    pub due_date: Option<DateTime<Utc>>,
}

impl ProjectSummary {
    pub fn new(project: &Project, vessel: Option<&Vessel>, items: &[WorkItem]) -> Self {
        let counts = StatusCounts::from_items(items);
        ProjectSummary {
            id: project.id,
            name: project.name.clone(),
            vessel: vessel.map(|v| v.name.clone()),
            status: project.status,
            progress: counts.progress(),
            work_items: counts.total,
            completed: counts.completed,
            due_date: project.end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        UserSummary {
            id: u.id,
            name: u.name.clone(),
            avatar_url: u.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub vessel_type: Option<String>,
    pub ga_plan_url: Option<String>,
}

impl From<&Vessel> for VesselSummary {
    fn from(v: &Vessel) -> Self {
        VesselSummary {
            id: v.id,
            name: v.name.clone(),
            vessel_type: v.vessel_type.clone(),
            ga_plan_url: v.ga_plan_url.clone(),
        }
    }
}

/// Work item with its people resolved and its counters filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemDetails {
    #[serde(flatten)]
    pub item: WorkItem,
    pub assignee: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    #[serde(default)]
    pub comments_count: usize,
    #[serde(default)]
    pub attachments_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub vessel: Option<VesselSummary>,
    pub work_items: Vec<WorkItemDetails>,
    pub stats: StatusCounts,
}

impl ProjectDetail {
    pub fn new(project: Project, vessel: Option<&Vessel>, work_items: Vec<WorkItemDetails>) -> Self {
        let stats = StatusCounts::from_items(work_items.iter().map(|d| &d.item));
        ProjectDetail {
            project,
            vessel: vessel.map(VesselSummary::from),
            work_items,
            stats,
        }
    }
}

/// Line of the dashboard activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFeedEntry {
    pub id: Uuid,
    pub action: ActivityAction,
    pub user: Option<UserSummary>,
    pub work_item_id: Option<Uuid>,
    /// Current title, or the one recorded with the entry once the item is gone.
    pub work_item_title: Option<String>,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ActivityFeedEntry {
    pub fn new(entry: &ActivityEntry, user: Option<&User>, item: Option<&WorkItem>) -> Self {
        let recorded_title = entry
            .details
            .get("title")
            .and_then(|t| t.as_str())
            .map(str::to_string);
        ActivityFeedEntry {
            id: entry.id,
            action: entry.action,
            user: user.map(UserSummary::from),
            work_item_id: entry.work_item_id,
            work_item_title: item.map(|w| w.title.clone()).or(recorded_title),
            project_id: entry.project_id,
            created_at: entry.created_at,
        }
    }
}

/// Card of the "upcoming tasks" panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingItem {
    pub id: Uuid,
    pub title: String,
    pub project_id: Uuid,
    pub project_name: Option<String>,
    pub vessel: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
}

impl UpcomingItem {
    /// `None` when the item has no due date.
    pub fn new(item: &WorkItem, project: Option<&Project>, vessel: Option<&Vessel>) -> Option<Self> {
        Some(UpcomingItem {
            id: item.id,
            title: item.title.clone(),
            project_id: item.project_id,
            project_name: project.map(|p| p.name.clone()),
            vessel: vessel.map(|v| v.name.clone()),
            status: item.status,
            priority: item.priority,
            due_date: item.due_date?,
        })
    }
}

/// Items due soon, earliest first, at most `limit` of them.
pub fn upcoming<'a>(items: &'a [WorkItem], now: DateTime<Utc>, limit: usize) -> Vec<&'a WorkItem> {
    let mut due: Vec<&WorkItem> = items.iter().filter(|w| is_due_soon(w, now)).collect();
    due.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.title.cmp(&b.title)));
    due.truncate(limit);
    due
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn item(n: u128, status: Status) -> WorkItem {
        let mut w = WorkItem::new(Uuid::nil(), Uuid::from_u128(n), format!("item {n}"), now());
        w.status = status;
        w
    }

    fn project(status: ProjectStatus) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Annual Refit 2024".into(),
            description: None,
            vessel_id: Uuid::nil(),
            status,
            start_date: None,
            end_date: None,
            created_by: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(7, 8), 88);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(5, 5), 100);
    }

    #[test]
    fn test_overdue_only_for_open_items() {
        let past = now() - Duration::days(1);
        let mut open = item(1, Status::Open);
        open.due_date = Some(past);
        let mut done = item(2, Status::Completed);
        done.due_date = Some(past);
        let mut future = item(3, Status::Open);
        future.due_date = Some(now() + Duration::days(1));
        let undated = item(4, Status::Open);

        assert!(is_overdue(&open, now()));
        assert!(!is_overdue(&done, now()));
        assert!(!is_overdue(&future, now()));
        assert!(!is_overdue(&undated, now()));
    }

    #[test]
    fn test_due_soon_window() {
        let mut soon = item(1, Status::InProgress);
        soon.due_date = Some(now() + Duration::days(3));
        let mut edge = item(2, Status::Blocked);
        edge.due_date = Some(now() + Duration::days(DUE_SOON_DAYS));
        let mut later = item(3, Status::Open);
        later.due_date = Some(now() + Duration::days(8));
        let mut done = item(4, Status::Completed);
        done.due_date = Some(now() + Duration::days(1));

        assert!(is_due_soon(&soon, now()));
        assert!(is_due_soon(&edge, now()));
        assert!(!is_due_soon(&later, now()));
        assert!(!is_due_soon(&done, now()));
    }

    #[test]
    fn test_dashboard_stats() {
        let mut overdue = item(1, Status::Open);
        overdue.due_date = Some(now() - Duration::hours(2));
        overdue.priority = Priority::Critical;
        let mut done_late = item(2, Status::Completed);
        done_late.due_date = Some(now() - Duration::hours(2));
        let items = vec![overdue, done_late, item(3, Status::InProgress), item(4, Status::Blocked)];
        let projects = vec![
            project(ProjectStatus::Active),
            project(ProjectStatus::OnHold),
            project(ProjectStatus::Active),
        ];

        let s = DashboardStats::compute(&items, &projects, now());
        assert_eq!(s.total_work_items, 4);
        assert_eq!(s.open_items, 1);
        assert_eq!(s.in_progress_items, 1);
        assert_eq!(s.completed_items, 1);
        assert_eq!(s.blocked_items, 1);
        assert_eq!(s.overdue_items, 1);
        assert_eq!(s.priority_breakdown.critical, 1);
        assert_eq!(s.priority_breakdown.medium, 3);
        assert_eq!(s.projects, ProjectCounts { total: 3, active: 2 });

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["totalWorkItems"], 4);
        assert_eq!(json["overdueItems"], 1);
        assert_eq!(json["projects"]["active"], 2);
    }

    #[test]
    fn test_project_summary_shape() {
        let p = project(ProjectStatus::Active);
        let mut items: Vec<WorkItem> = (0..8).map(|n| item(n, Status::Completed)).collect();
        items[0].status = Status::Open;
        let s = ProjectSummary::new(&p, None, &items);
        assert_eq!(s.progress, 88);
        assert_eq!(s.work_items, 8);
        assert_eq!(s.completed, 7);

        let json = serde_json::to_value(&s).unwrap();
        for key in ["id", "name", "vessel", "progress", "workItems", "completed", "dueDate"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_project_detail_round_trip() {
        let p = project(ProjectStatus::Active);
        let mut placed = item(1, Status::Open);
        placed.pin = crate::models::PinPosition::checked(15.0, 45.0);
        let details = vec![
            WorkItemDetails {
                item: placed,
                assignee: None,
                created_by: None,
                comments_count: 2,
                attachments_count: 0,
            },
            WorkItemDetails {
                item: item(2, Status::Completed),
                assignee: None,
                created_by: None,
                comments_count: 0,
                attachments_count: 1,
            },
        ];
        let detail = ProjectDetail::new(p, None, details);
        assert_eq!(detail.stats.total, 2);
        assert_eq!(detail.stats.completed, 1);

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Annual Refit 2024");
        assert_eq!(json["workItems"][0]["pinX"], 15.0);
        assert_eq!(json["workItems"][0]["commentsCount"], 2);
        assert!(json["workItems"][1]["pinX"].is_null());
        assert_eq!(json["stats"]["inProgress"], 0);

        let back: ProjectDetail = serde_json::from_value(json).unwrap();
        assert_eq!(back, detail);
    }

    #[test]
    fn test_upcoming_sorted_and_limited() {
        let mut far = item(1, Status::Open);
        far.due_date = Some(now() + Duration::days(6));
        let mut near = item(2, Status::InProgress);
        near.due_date = Some(now() + Duration::hours(5));
        let mut done = item(3, Status::Completed);
        done.due_date = Some(now() + Duration::hours(1));
        let mut past = item(4, Status::Open);
        past.due_date = Some(now() - Duration::hours(1));
        let mut mid = item(5, Status::Blocked);
        mid.due_date = Some(now() + Duration::days(2));
        let items = vec![far, near, done, past, item(6, Status::Open), mid];

        let titles: Vec<&str> = upcoming(&items, now(), 10).iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["item 2", "item 5", "item 1"]);
        assert_eq!(upcoming(&items, now(), 2).len(), 2);
    }

    #[test]
    fn test_feed_entry_falls_back_to_recorded_title() {
        let entry = ActivityEntry {
            id: Uuid::from_u128(9),
            work_item_id: Some(Uuid::from_u128(1)),
            project_id: Some(Uuid::nil()),
            user_id: None,
            action: ActivityAction::Deleted,
            details: serde_json::json!({ "title": "Tender service" }),
            created_at: now(),
        };
        let gone = ActivityFeedEntry::new(&entry, None, None);
        assert_eq!(gone.work_item_title.as_deref(), Some("Tender service"));
        assert!(gone.user.is_none());

        let live = item(1, Status::Open);
        let current = ActivityFeedEntry::new(&entry, None, Some(&live));
        assert_eq!(current.work_item_title.as_deref(), Some("item 1"));

        let json = serde_json::to_value(&current).unwrap();
        assert_eq!(json["action"], "deleted");
        assert_eq!(json["workItemTitle"], "item 1");
    }
}
