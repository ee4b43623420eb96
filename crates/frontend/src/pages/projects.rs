use dioxus::logger::tracing;
use dioxus::prelude::*;
use yacht_shared::filter::ProjectFilter;
use yacht_shared::models::ProjectStatus;
use yacht_shared::stats::ProjectSummary;

use crate::api;
use crate::Route;

fn status_label(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Active => "Active",
        ProjectStatus::Completed => "Completed",
        ProjectStatus::OnHold => "On Hold",
        ProjectStatus::Archived => "Archived",
    }
}

fn counts_label(summary: &ProjectSummary) -> String {
    format!("{} / {} items done", summary.completed, summary.work_items)
}

#[component]
pub fn ProjectRow(summary: ProjectSummary) -> Element {
    let due = summary
        .due_date
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "No due date".to_string());
    let vessel = summary.vessel.clone().unwrap_or_else(|| "Unknown vessel".to_string());
    let counts = counts_label(&summary);
    let badge = format!("badge project-{}", summary.status.as_str());

    rsx! {
        Link {
            class: "project-row",
            to: Route::ProjectPage { id: summary.id.to_string() },
            div { class: "row-main",
                p { class: "row-title", "{summary.name}" }
                p { class: "row-sub muted", "{vessel} · {due}" }
            }
            span { class: "{badge}", {status_label(summary.status)} }
            div { class: "row-progress",
                div { class: "progress-bar",
                    div { class: "progress-fill", style: "width: {summary.progress}%;" }
                }
                span { class: "muted", "{summary.progress}% · {counts}" }
            }
        }
    }
}

#[component]
pub fn ProjectList(projects: Vec<ProjectSummary>) -> Element {
    if projects.is_empty() {
        return rsx! { p { class: "muted", "No projects found." } };
    }
    rsx! {
        div { class: "project-list",
            for summary in projects {
                ProjectRow { key: "{summary.id}", summary }
            }
        }
    }
}

#[component]
pub fn Projects() -> Element {
    let mut search = use_signal(String::new);
    let mut status = use_signal(String::new);

    let projects = use_resource(move || {
        let filter = ProjectFilter {
            status: status.read().parse().ok(),
            search: Some(search.read().clone()),
            ..Default::default()
        };
        async move {
            let result = api::fetch_projects(filter).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "Failed to load projects");
            }
            result
        }
    });

    rsx! {
        div { class: "page projects-page",
            div { class: "page-header",
                h1 { "Projects" }
            }
            div { class: "list-filters",
                input {
                    r#type: "search",
                    placeholder: "Search projects…",
                    value: "{search}",
                    oninput: move |evt: Event<FormData>| search.set(evt.value()),
                }
                select {
                    value: "{status}",
                    onchange: move |evt: Event<FormData>| status.set(evt.value()),
                    option { value: "", "All statuses" }
                    for s in ProjectStatus::ALL {
                        option { value: s.as_str(), {status_label(s)} }
                    }
                }
            }
            match &*projects.read() {
                None => rsx! { p { class: "muted", "Loading projects…" } },
                Some(Err(e)) => rsx! { p { class: "error", "Could not load projects: {e}" } },
                Some(Ok(list)) => rsx! { ProjectList { projects: list.clone() } },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_counts_label() {
        let summary = ProjectSummary {
            id: Uuid::from_u128(1),
            name: "Annual Refit 2024".into(),
            vessel: Some("M/Y Aurora".into()),
            status: ProjectStatus::Active,
            progress: 88,
            work_items: 8,
            completed: 7,
            due_date: None,
        };
        assert_eq!(counts_label(&summary), "7 / 8 items done");
    }

    #[test]
    fn test_every_project_status_has_a_label() {
        for s in ProjectStatus::ALL {
            assert!(!status_label(s).is_empty());
        }
    }
}
