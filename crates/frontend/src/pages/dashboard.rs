use dioxus::logger::tracing;
use dioxus::prelude::*;
use yacht_shared::filter::ProjectFilter;
use yacht_shared::stats::{DEFAULT_FEED_LIMIT, DEFAULT_UPCOMING_LIMIT};

use crate::api;
use crate::components::dashboard_panels::{ActivityFeed, UpcomingTasks};
use crate::components::stats_cards::DashboardCards;
use crate::pages::projects::ProjectList;
use crate::Route;

const RECENT_PROJECTS: usize = 5;

#[component]
pub fn Dashboard() -> Element {
    let stats = use_resource(|| async {
        let result = api::fetch_stats().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Failed to load dashboard stats");
        }
        result
    });
    let recent = use_resource(|| async {
        let filter = ProjectFilter {
            limit: Some(RECENT_PROJECTS),
            ..Default::default()
        };
        let result = api::fetch_projects(filter).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Failed to load recent projects");
        }
        result
    });
    let activity = use_resource(|| async {
        let result = api::fetch_activity(DEFAULT_FEED_LIMIT).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Failed to load recent activity");
        }
        result
    });
    let upcoming = use_resource(|| async {
        let result = api::fetch_upcoming(DEFAULT_UPCOMING_LIMIT).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Failed to load upcoming tasks");
        }
        result
    });

    rsx! {
        div { class: "page dashboard-page",
            div { class: "page-header",
                h1 { "Dashboard" }
                p { class: "muted", "Maintenance overview across the fleet" }
            }

            match &*stats.read() {
                None => rsx! { p { class: "muted", "Loading statistics…" } },
                Some(Err(e)) => rsx! { p { class: "error", "Could not load statistics: {e}" } },
                Some(Ok(s)) => rsx! { DashboardCards { stats: s.clone() } },
            }

            div { class: "dashboard-columns",
                div { class: "panel",
                    h3 { "Recent Activity" }
                    match &*activity.read() {
                        None => rsx! { p { class: "muted", "Loading activity…" } },
                        Some(Err(e)) => rsx! { p { class: "error", "Could not load activity: {e}" } },
                        Some(Ok(entries)) => rsx! { ActivityFeed { entries: entries.clone() } },
                    }
                }
                div { class: "panel",
                    h3 { "Upcoming Tasks" }
                    match &*upcoming.read() {
                        None => rsx! { p { class: "muted", "Loading tasks…" } },
                        Some(Err(e)) => rsx! { p { class: "error", "Could not load tasks: {e}" } },
                        Some(Ok(items)) => rsx! { UpcomingTasks { items: items.clone() } },
                    }
                }
            }

            div { class: "panel",
                div { class: "panel-header",
                    h3 { "Recent Projects" }
                    Link { to: Route::Projects {}, "View all →" }
                }
                match &*recent.read() {
                    None => rsx! { p { class: "muted", "Loading projects…" } },
                    Some(Err(e)) => rsx! { p { class: "error", "Could not load projects: {e}" } },
                    Some(Ok(list)) => rsx! { ProjectList { projects: list.clone() } },
                }
            }
        }
    }
}
