use dioxus::prelude::*;
use yacht_shared::stats::{progress_percent, DashboardStats, StatusCounts};

#[component]
pub fn StatCard(title: String, value: String, description: String, tone: String) -> Element {
    rsx! {
        div { class: "stat-card tone-{tone}",
            div { class: "stat-title", "{title}" }
            div { class: "stat-value", "{value}" }
            p { class: "stat-description", "{description}" }
        }
    }
}

/// Headline cards of the dashboard.
#[component]
pub fn DashboardCards(stats: DashboardStats) -> Element {
    let completion = progress_percent(stats.completed_items, stats.total_work_items);
    rsx! {
        div { class: "stat-grid",
            StatCard {
                title: "Open Items",
                value: stats.open_items.to_string(),
                description: "Waiting to be started",
                tone: "blue",
            }
            StatCard {
                title: "In Progress",
                value: stats.in_progress_items.to_string(),
                description: "Currently being worked on",
                tone: "yellow",
            }
            StatCard {
                title: "Completed",
                value: stats.completed_items.to_string(),
                description: format!("{completion}% of {} items", stats.total_work_items),
                tone: "green",
            }
            StatCard {
                title: "Blocked",
                value: stats.blocked_items.to_string(),
                description: "Need attention",
                tone: "red",
            }
        }
        div { class: "stat-grid secondary",
            StatCard {
                title: "Overdue",
                value: stats.overdue_items.to_string(),
                description: "Open past their due date",
                tone: "red",
            }
            StatCard {
                title: "Due Soon",
                value: stats.due_soon.to_string(),
                description: "Due within the next week",
                tone: "gold",
            }
            StatCard {
                title: "Active Projects",
                value: format!("{} / {}", stats.projects.active, stats.projects.total),
                description: "Active of all projects",
                tone: "ocean",
            }
            StatCard {
                title: "Critical",
                value: stats.priority_breakdown.critical.to_string(),
                description: "Critical-priority items",
                tone: "red",
            }
        }
    }
}

/// Status breakdown of a single project, with a progress bar.
#[component]
pub fn ProjectStatsBar(stats: StatusCounts) -> Element {
    let progress = stats.progress();
    rsx! {
        div { class: "project-stats",
            div { class: "progress-bar",
                div { class: "progress-fill", style: "width: {progress}%;" }
            }
            div { class: "project-stats-row",
                span { "{progress}% complete" }
                span { class: "status-open", "{stats.open} open" }
                span { class: "status-in-progress", "{stats.in_progress} in progress" }
                span { class: "status-completed", "{stats.completed} completed" }
                span { class: "status-blocked", "{stats.blocked} blocked" }
            }
        }
    }
}
