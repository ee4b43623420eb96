use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use yacht_shared::filter::ProjectFilter;
use yacht_shared::models::{User, WorkItem};
use yacht_shared::stats::{
    upcoming, ActivityFeedEntry, DashboardStats, ProjectDetail, ProjectSummary, UpcomingItem,
    UserSummary, WorkItemDetails, DEFAULT_FEED_LIMIT, DEFAULT_UPCOMING_LIMIT,
};

use crate::error::{ApiError, ApiResult};
use crate::storage::Storage;

/// REST data routes consumed by the dashboard and project pages.
pub fn api_router(storage: Arc<Storage>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/dashboard/stats", get(dashboard_stats))
        .route("/api/dashboard/activity", get(dashboard_activity))
        .route("/api/dashboard/upcoming", get(dashboard_upcoming))
        .route("/api/projects", get(list_projects))
        .route("/api/projects/{id}", get(project_detail))
        .with_state(storage)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn dashboard_stats(State(storage): State<Arc<Storage>>) -> ApiResult<Json<DashboardStats>> {
    let items = storage.list_work_items()?;
    let projects = storage.list_projects()?;
    Ok(Json(DashboardStats::compute(&items, &projects, Utc::now())))
}

#[derive(Debug, Default, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

async fn dashboard_activity(
    State(storage): State<Arc<Storage>>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ActivityFeedEntry>>> {
    let Query(query) = query?;
    let entries = storage.recent_activity(None, query.limit.unwrap_or(DEFAULT_FEED_LIMIT))?;

    let users: HashMap<Uuid, User> = storage
        .list_users()?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let mut feed = Vec::with_capacity(entries.len());
    for entry in &entries {
        let item = match entry.work_item_id {
            Some(id) => storage.get_work_item(id)?,
            None => None,
        };
        let user = entry.user_id.and_then(|id| users.get(&id));
        feed.push(ActivityFeedEntry::new(entry, user, item.as_ref()));
    }
    Ok(Json(feed))
}

async fn dashboard_upcoming(
    State(storage): State<Arc<Storage>>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<UpcomingItem>>> {
    let Query(query) = query?;
    let items = storage.list_work_items()?;
    let projects: HashMap<Uuid, _> = storage
        .list_projects()?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let vessels: HashMap<Uuid, _> = storage
        .list_vessels()?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);
    let list = upcoming(&items, Utc::now(), limit)
        .into_iter()
        .filter_map(|item| {
            let project = projects.get(&item.project_id);
            let vessel = project.and_then(|p| vessels.get(&p.vessel_id));
            UpcomingItem::new(item, project, vessel)
        })
        .collect();
    Ok(Json(list))
}

async fn list_projects(
    State(storage): State<Arc<Storage>>,
    query: Result<Query<ProjectFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<ProjectSummary>>> {
    let Query(filter) = query?;
    let mut projects: Vec<_> = storage
        .list_projects()?
        .into_iter()
        .filter(|p| filter.matches(p))
        .collect();
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));
    projects.truncate(filter.limit());

    let vessels: HashMap<Uuid, _> = storage
        .list_vessels()?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();
    let mut by_project: HashMap<Uuid, Vec<WorkItem>> = HashMap::new();
    for item in storage.list_work_items()? {
        by_project.entry(item.project_id).or_default().push(item);
    }

    let summaries = projects
        .iter()
        .map(|p| {
            let items = by_project.get(&p.id).map(Vec::as_slice).unwrap_or_default();
            ProjectSummary::new(p, vessels.get(&p.vessel_id), items)
        })
        .collect();
    Ok(Json(summaries))
}

async fn project_detail(
    State(storage): State<Arc<Storage>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectDetail>> {
    // A malformed id cannot name a project; answer the same as an unknown one
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound("Project"))?;
    let project = storage
        .get_project(id)?
        .ok_or(ApiError::NotFound("Project"))?;
    let vessel = storage.get_vessel(project.vessel_id)?;

    let users: HashMap<Uuid, User> = storage
        .list_users()?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let summary = |id: Option<Uuid>| id.and_then(|id| users.get(&id)).map(UserSummary::from);

    let mut details = Vec::new();
    for item in storage.work_items_for_project(id)? {
        details.push(WorkItemDetails {
            assignee: summary(item.assignee_id),
            created_by: summary(item.creator_id),
            comments_count: storage.count_comments(item.id)?,
            attachments_count: storage.count_attachments(item.id)?,
            item,
        });
    }

    Ok(Json(ProjectDetail::new(project, vessel.as_ref(), details)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::temp_storage;
    use crate::storage::SeedData;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use chrono::{DateTime, Duration};
    use tower::ServiceExt;
    use crate::storage::ChangeSet;
    use yacht_shared::models::{
        ActivityAction, ActivityEntry, Priority, Project, ProjectStatus, Status, Vessel,
    };

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    const VESSEL: Uuid = Uuid::from_u128(0xa);
    const PROJECT: Uuid = Uuid::from_u128(0xb);
    const EMPTY_PROJECT: Uuid = Uuid::from_u128(0xc);
    const CAPTAIN: Uuid = Uuid::from_u128(0xd);

    fn project(id: Uuid, name: &str, created_at: DateTime<Utc>) -> Project {
        Project {
            id,
            name: name.into(),
            description: None,
            vessel_id: VESSEL,
            status: ProjectStatus::Active,
            start_date: Some(ts()),
            end_date: Some(ts() + Duration::days(45)),
            created_by: Some(CAPTAIN),
            created_at,
            updated_at: created_at,
        }
    }

    fn fixture() -> SeedData {
        let mut items = Vec::new();
        for n in 0..8u128 {
            let mut w = WorkItem::new(PROJECT, Uuid::from_u128(100 + n), format!("task {n}"), ts());
            w.status = if n == 0 { Status::Open } else { Status::Completed };
            w.order = n as i32;
            items.push(w);
        }
        // Open and overdue
        items[0].due_date = Some(Utc::now() - Duration::days(1));
        items[0].assignee_id = Some(CAPTAIN);
        items[0].creator_id = Some(CAPTAIN);
        // Completed with the same due date does not count
        items[1].due_date = items[0].due_date;

        SeedData {
            users: vec![User {
                id: CAPTAIN,
                email: "captain@yacht.com".into(),
                name: "Captain Paul".into(),
                avatar_url: None,
                role: Default::default(),
                created_at: ts(),
                updated_at: ts(),
            }],
            vessels: vec![Vessel {
                id: VESSEL,
                name: "M/Y Aurora".into(),
                vessel_type: Some("Motor Yacht".into()),
                length: Some(45.0),
                flag: Some("Cayman Islands".into()),
                imo: None,
                image_url: None,
                ga_plan_url: Some("/static/yacht-ga-plan.svg".into()),
                ga_decks: vec![],
                owner_id: Some(CAPTAIN),
                is_archived: false,
                created_at: ts(),
                updated_at: ts(),
            }],
            projects: vec![
                project(PROJECT, "Annual Refit 2024", ts() + Duration::hours(1)),
                project(EMPTY_PROJECT, "Interior Refresh", ts()),
            ],
            work_items: items,
            comments: vec![],
        }
    }

    fn app() -> (tempfile::TempDir, Router) {
        let (dir, storage) = temp_storage();
        storage.seed_if_empty(&fixture()).unwrap();
        (dir, api_router(storage))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = app();
        let (status, body) = get_json(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let (_dir, app) = app();
        let (status, body) = get_json(app, "/api/dashboard/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalWorkItems"], 8);
        assert_eq!(body["openItems"], 1);
        assert_eq!(body["completedItems"], 7);
        assert_eq!(body["inProgressItems"], 0);
        assert_eq!(body["blockedItems"], 0);
        assert_eq!(body["overdueItems"], 1);
        assert_eq!(body["projects"]["total"], 2);
        assert_eq!(body["projects"]["active"], 2);
    }

    #[tokio::test]
    async fn test_project_list_progress() {
        let (_dir, app) = app();
        let (status, body) = get_json(app, "/api/projects").await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);

        // Newest first
        assert_eq!(list[0]["name"], "Annual Refit 2024");
        assert_eq!(list[0]["vessel"], "M/Y Aurora");
        assert_eq!(list[0]["progress"], 88);
        assert_eq!(list[0]["workItems"], 8);
        assert_eq!(list[0]["completed"], 7);
        assert!(list[0]["dueDate"].is_string());

        assert_eq!(list[1]["progress"], 0);
        assert_eq!(list[1]["workItems"], 0);
    }

    #[tokio::test]
    async fn test_project_list_filters_and_limit() {
        let (_dir, app) = app();
        let (_, body) = get_json(app.clone(), "/api/projects?search=interior").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        let (_, body) = get_json(app.clone(), "/api/projects?limit=1").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        let (_, body) = get_json(app, "/api/projects?status=archived").await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_project_detail() {
        let (_dir, app) = app();
        let (status, body) = get_json(app, &format!("/api/projects/{PROJECT}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Annual Refit 2024");
        assert_eq!(body["vessel"]["name"], "M/Y Aurora");
        assert_eq!(body["vessel"]["gaPlanUrl"], "/static/yacht-ga-plan.svg");
        assert_eq!(body["stats"]["total"], 8);
        assert_eq!(body["stats"]["completed"], 7);

        let items = body["workItems"].as_array().unwrap();
        assert_eq!(items.len(), 8);
        assert_eq!(items[0]["title"], "task 0");
        assert_eq!(items[0]["assignee"]["name"], "Captain Paul");
        assert_eq!(items[0]["createdBy"]["name"], "Captain Paul");
        assert_eq!(items[0]["commentsCount"], 0);
        assert!(items[1]["assignee"].is_null());
    }

    #[tokio::test]
    async fn test_project_detail_not_found() {
        let (_dir, app) = app();
        let unknown = Uuid::from_u128(0xdead);
        for uri in [format!("/api/projects/{unknown}"), "/api/projects/not-a-uuid".to_string()] {
            let (status, body) = get_json(app.clone(), &uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({ "error": "Project not found" }));
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic_500() {
        let resp = ApiError::Storage(crate::storage::StorageError::Json(
            serde_json::from_str::<Value>("{").unwrap_err(),
        ))
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_bad_query_is_json_400() {
        let (_dir, app) = app();
        for uri in [
            "/api/projects?limit=abc",
            "/api/dashboard/activity?limit=-1",
            "/api/dashboard/upcoming?limit=many",
        ] {
            let (status, body) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_dashboard_activity_feed() {
        let (_dir, storage) = temp_storage();
        storage.seed_if_empty(&fixture()).unwrap();
        let entry = |n: u128, action, item: Option<u128>, details: Value| ActivityEntry {
            id: Uuid::from_u128(n),
            work_item_id: item.map(Uuid::from_u128),
            project_id: Some(PROJECT),
            user_id: Some(CAPTAIN),
            action,
            details,
            created_at: ts() + Duration::minutes(n as i64),
        };
        let changes = ChangeSet {
            activity: vec![
                entry(1, ActivityAction::Created, Some(100), json!({ "title": "task 0" })),
                entry(2, ActivityAction::Deleted, Some(999), json!({ "title": "Hull polish" })),
                entry(3, ActivityAction::Commented, Some(101), json!({})),
            ],
            ..Default::default()
        };
        storage.commit(&changes).unwrap();
        let app = api_router(storage);

        let (status, body) = get_json(app.clone(), "/api/dashboard/activity").await;
        assert_eq!(status, StatusCode::OK);
        let feed = body.as_array().unwrap();
        assert_eq!(feed.len(), 3);
        // Newest first
        assert_eq!(feed[0]["action"], "commented");
        assert_eq!(feed[0]["workItemTitle"], "task 1");
        assert_eq!(feed[0]["user"]["name"], "Captain Paul");
        // Deleted items keep the title recorded with the entry
        assert_eq!(feed[1]["workItemTitle"], "Hull polish");
        assert_eq!(feed[2]["action"], "created");

        let (_, body) = get_json(app, "/api/dashboard/activity?limit=1").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_upcoming() {
        let mut seed = fixture();
        seed.work_items[2].status = Status::InProgress;
        seed.work_items[2].priority = Priority::High;
        seed.work_items[2].due_date = Some(Utc::now() + Duration::days(3));
        seed.work_items[3].status = Status::Open;
        seed.work_items[3].due_date = Some(Utc::now() + Duration::days(1));
        // Beyond the window
        seed.work_items[4].status = Status::Open;
        seed.work_items[4].due_date = Some(Utc::now() + Duration::days(10));
        // Completed items never show
        seed.work_items[5].due_date = Some(Utc::now() + Duration::days(2));

        let (_dir, storage) = temp_storage();
        storage.seed_if_empty(&seed).unwrap();
        let app = api_router(storage);

        let (status, body) = get_json(app.clone(), "/api/dashboard/upcoming").await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        // Overdue task 0 is not upcoming
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["title"], "task 3");
        assert_eq!(list[1]["title"], "task 2");
        assert_eq!(list[1]["priority"], "high");
        assert_eq!(list[1]["projectName"], "Annual Refit 2024");
        assert_eq!(list[1]["vessel"], "M/Y Aurora");
        assert!(list[1]["dueDate"].is_string());

        let (_, body) = get_json(app, "/api/dashboard/upcoming?limit=1").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
