use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yacht_shared::filter::ProjectFilter;
use yacht_shared::form::WorkItemPayload;
use yacht_shared::models::{PinPosition, Priority, Status};
use yacht_shared::stats::{
    ActivityFeedEntry, DashboardStats, ProjectDetail, ProjectSummary, UpcomingItem,
};

/// GraphQL enum value for a work item status.
pub fn gql_status(status: Status) -> &'static str {
    match status {
        Status::Open => "OPEN",
        Status::InProgress => "IN_PROGRESS",
        Status::Completed => "COMPLETED",
        Status::Blocked => "BLOCKED",
    }
}

pub fn gql_priority(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "LOW",
        Priority::Medium => "MEDIUM",
        Priority::High => "HIGH",
        Priority::Critical => "CRITICAL",
    }
}

/// Build the variables JSON for a create work item mutation.
pub fn build_create_variables(
    project_id: Uuid,
    payload: &WorkItemPayload,
    pin: Option<PinPosition>,
) -> serde_json::Value {
    serde_json::json!({
        "input": {
            "projectId": project_id,
            "title": payload.title,
            "description": payload.description,
            "status": gql_status(payload.status),
            "priority": gql_priority(payload.priority),
            "location": payload.location,
            "deckLevel": payload.deck_level,
            "dueDate": payload.due_date,
            "estimatedHours": payload.estimated_hours,
            "tags": payload.tags,
            "pinX": pin.map(|p| p.x),
            "pinY": pin.map(|p| p.y),
        }
    })
}

/// Build the variables JSON for an update mutation. Every form field is sent,
/// so a blanked optional input clears the stored value. The pin is left alone.
/// `current_due` is the stored due date; its time of day survives when the
/// form keeps the same day.
pub fn build_update_variables(
    id: Uuid,
    payload: &WorkItemPayload,
    current_due: Option<DateTime<Utc>>,
) -> serde_json::Value {
    let due = payload.due_date_over(current_due).map(|d| d.to_rfc3339());
    serde_json::json!({
        "input": {
            "id": id,
            "title": payload.title,
            "description": payload.description,
            "status": gql_status(payload.status),
            "priority": gql_priority(payload.priority),
            "location": payload.location,
            "deckLevel": payload.deck_level,
            "dueDate": due,
            "estimatedHours": payload.estimated_hours,
            "tags": payload.tags,
        }
    })
}

/// Absolute URL of the project list with the filter encoded as query parameters.
pub fn project_list_url(origin: &str, filter: &ProjectFilter) -> Result<reqwest::Url, String> {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(status) = filter.status {
        params.push(("status", status.as_str().to_string()));
    }
    if let Some(vessel) = filter.vessel_id {
        params.push(("vesselId", vessel.to_string()));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
    }
    if let Some(limit) = filter.limit {
        params.push(("limit", limit.to_string()));
    }
    let base = format!("{origin}/api/projects");
    let url = if params.is_empty() {
        reqwest::Url::parse(&base)
    } else {
        reqwest::Url::parse_with_params(&base, &params)
    };
    url.map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

/// Error body of the REST routes.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn origin() -> Result<String, String> {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .ok_or_else(|| "Browser window unavailable".to_string())
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(format!("{}/graphql", origin()?))
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;

    if let Some(errors) = gql_resp.errors {
        if let Some(first) = errors.into_iter().next() {
            return Err(first.message);
        }
    }

    gql_resp.data.ok_or_else(|| "No data returned".to_string())
}

/// GET a REST resource. `Ok(None)` means the server answered 404.
async fn get_json<T: for<'de> Deserialize<'de>>(url: reqwest::Url) -> Result<Option<T>, String> {
    let resp = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = resp.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        return Err(message);
    }
    resp.json().await.map(Some).map_err(|e| e.to_string())
}

fn api_url(path: &str) -> Result<reqwest::Url, String> {
    reqwest::Url::parse(&format!("{}{}", origin()?, path)).map_err(|e| e.to_string())
}

// REST reads

pub async fn fetch_stats() -> Result<DashboardStats, String> {
    get_json(api_url("/api/dashboard/stats")?)
        .await?
        .ok_or_else(|| "Stats unavailable".to_string())
}

pub async fn fetch_activity(limit: usize) -> Result<Vec<ActivityFeedEntry>, String> {
    let url = api_url(&format!("/api/dashboard/activity?limit={limit}"))?;
    Ok(get_json(url).await?.unwrap_or_default())
}

pub async fn fetch_upcoming(limit: usize) -> Result<Vec<UpcomingItem>, String> {
    let url = api_url(&format!("/api/dashboard/upcoming?limit={limit}"))?;
    Ok(get_json(url).await?.unwrap_or_default())
}

pub async fn fetch_projects(filter: ProjectFilter) -> Result<Vec<ProjectSummary>, String> {
    let url = project_list_url(&origin()?, &filter)?;
    Ok(get_json(url).await?.unwrap_or_default())
}

pub async fn fetch_project(id: &str) -> Result<Option<ProjectDetail>, String> {
    get_json(api_url(&format!("/api/projects/{id}"))?).await
}

// GraphQL mutations

#[derive(Debug, Clone, Deserialize)]
pub struct SavedItem {
    pub id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub create_work_item: SavedItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub update_work_item: SavedItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub move_work_item_pin: SavedItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub delete_work_item: bool,
}

pub async fn create_work_item(
    project_id: Uuid,
    payload: &WorkItemPayload,
    pin: Option<PinPosition>,
) -> Result<Uuid, String> {
    let resp: CreateResponse = query(
        r#"mutation($input: CreateWorkItemInput!) { createWorkItem(input: $input) { id } }"#,
        Some(build_create_variables(project_id, payload, pin)),
    )
    .await?;
    Ok(resp.create_work_item.id)
}

pub async fn update_work_item(
    id: Uuid,
    payload: &WorkItemPayload,
    current_due: Option<DateTime<Utc>>,
) -> Result<Uuid, String> {
    let resp: UpdateResponse = query(
        r#"mutation($input: UpdateWorkItemInput!) { updateWorkItem(input: $input) { id } }"#,
        Some(build_update_variables(id, payload, current_due)),
    )
    .await?;
    Ok(resp.update_work_item.id)
}

pub async fn move_pin(id: Uuid, to: PinPosition) -> Result<Uuid, String> {
    let resp: MoveResponse = query(
        r#"mutation($id: ID!, $x: Float!, $y: Float!) { moveWorkItemPin(id: $id, x: $x, y: $y) { id } }"#,
        Some(serde_json::json!({ "id": id, "x": to.x, "y": to.y })),
    )
    .await?;
    Ok(resp.move_work_item_pin.id)
}

pub async fn delete_work_item(id: Uuid) -> Result<bool, String> {
    let resp: DeleteResponse = query(
        r#"mutation($id: ID!) { deleteWorkItem(id: $id) }"#,
        Some(serde_json::json!({ "id": id })),
    )
    .await?;
    Ok(resp.delete_work_item)
}
