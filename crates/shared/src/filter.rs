use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Priority, Project, ProjectStatus, Status, WorkItem};

/// Default page size of the project list.
pub const DEFAULT_PROJECT_LIMIT: usize = 10;

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Criteria for narrowing a project's work items. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkItemFilter {
    pub status: Vec<Status>,
    pub priority: Vec<Priority>,
    pub assignee_id: Option<Uuid>,
    /// Item must carry every listed tag.
    pub tags: Vec<String>,
    pub deck_level: Option<String>,
    /// Case-insensitive match on title, description or location.
    pub search: Option<String>,
}

impl WorkItemFilter {
    pub fn matches(&self, item: &WorkItem) -> bool {
        if !self.status.is_empty() && !self.status.contains(&item.status) {
            return false;
        }
        if !self.priority.is_empty() && !self.priority.contains(&item.priority) {
            return false;
        }
        if self.assignee_id.is_some() && item.assignee_id != self.assignee_id {
            return false;
        }
        if !self.tags.iter().all(|t| item.tags.contains(t)) {
            return false;
        }
        if let Some(deck) = &self.deck_level {
            if item.deck_level.as_deref() != Some(deck.as_str()) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                contains_ci(&item.title, q)
                    || item.description.as_deref().is_some_and(|d| contains_ci(d, q))
                    || item.location.as_deref().is_some_and(|l| contains_ci(l, q))
            }
            _ => true,
        }
    }
}

/// Query parameters of the project list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub vessel_id: Option<Uuid>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        if self.status.is_some_and(|s| s != project.status) {
            return false;
        }
        if self.vessel_id.is_some_and(|v| v != project.vessel_id) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                contains_ci(&project.name, q)
                    || project.description.as_deref().is_some_and(|d| contains_ci(d, q))
            }
            _ => true,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PROJECT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn item() -> WorkItem {
        let mut w = WorkItem::new(Uuid::nil(), Uuid::from_u128(1), "Replace bilge pump", ts());
        w.location = Some("Engine Room".into());
        w.deck_level = Some("lower-deck".into());
        w.tags = vec!["engine".into(), "pumps".into()];
        w.priority = Priority::High;
        w
    }

    #[test]
    fn test_empty_filter_matches() {
        assert!(WorkItemFilter::default().matches(&item()));
    }

    #[test]
    fn test_status_and_priority_sets() {
        let f = WorkItemFilter {
            status: vec![Status::Open, Status::Blocked],
            priority: vec![Priority::High],
            ..Default::default()
        };
        assert!(f.matches(&item()));
        let f = WorkItemFilter {
            priority: vec![Priority::Low, Priority::Critical],
            ..Default::default()
        };
        assert!(!f.matches(&item()));
    }

    #[test]
    fn test_tags_require_all() {
        let mut f = WorkItemFilter {
            tags: vec!["engine".into()],
            ..Default::default()
        };
        assert!(f.matches(&item()));
        f.tags.push("paint".into());
        assert!(!f.matches(&item()));
    }

    #[test]
    fn test_search_is_case_insensitive_over_location() {
        let f = WorkItemFilter {
            search: Some("engine room".into()),
            ..Default::default()
        };
        assert!(f.matches(&item()));
        let f = WorkItemFilter {
            search: Some("galley".into()),
            ..Default::default()
        };
        assert!(!f.matches(&item()));
    }

    #[test]
    fn test_assignee_and_deck() {
        let f = WorkItemFilter {
            assignee_id: Some(Uuid::from_u128(9)),
            ..Default::default()
        };
        assert!(!f.matches(&item()));
        let f = WorkItemFilter {
            deck_level: Some("lower-deck".into()),
            ..Default::default()
        };
        assert!(f.matches(&item()));
    }

    #[test]
    fn test_project_filter_from_query_json() {
        let f: ProjectFilter =
            serde_json::from_str(r#"{"status":"on-hold","search":"refit"}"#).unwrap();
        assert_eq!(f.status, Some(ProjectStatus::OnHold));
        assert_eq!(f.limit(), DEFAULT_PROJECT_LIMIT);

        let project = Project {
            id: Uuid::nil(),
            name: "Annual Refit 2024".into(),
            description: None,
            vessel_id: Uuid::nil(),
            status: ProjectStatus::OnHold,
            start_date: None,
            end_date: None,
            created_by: None,
            created_at: ts(),
            updated_at: ts(),
        };
        assert!(f.matches(&project));
        let other = ProjectFilter {
            vessel_id: Some(Uuid::from_u128(3)),
            ..Default::default()
        };
        assert!(!other.matches(&project));
    }
}
