use chrono::{DateTime, Utc};
use dioxus::prelude::*;
use yacht_shared::stats::{ActivityFeedEntry, UpcomingItem};

use crate::Route;

/// "just now", "5m ago", "3h ago", "2d ago", then the calendar date.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        then.format("%b %-d").to_string()
    }
}

/// Up to two initials for the avatar bubble.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

fn feed_line(entry: &ActivityFeedEntry) -> (String, String) {
    let who = entry
        .user
        .as_ref()
        .map_or_else(|| "Someone".to_string(), |u| u.name.clone());
    let what = entry
        .work_item_title
        .clone()
        .unwrap_or_else(|| "a work item".to_string());
    (who, format!("{} {what}", entry.action.verb()))
}

#[component]
fn FeedRow(entry: ActivityFeedEntry, now: DateTime<Utc>) -> Element {
    let (who, what) = feed_line(&entry);
    let avatar = initials(&who);
    let when = relative_time(entry.created_at, now);
    rsx! {
        li { class: "activity-entry",
            span { class: "avatar", "{avatar}" }
            div { class: "activity-text",
                p {
                    strong { "{who}" }
                    " "
                    if let Some(id) = entry.project_id {
                        Link { to: Route::ProjectPage { id: id.to_string() }, "{what}" }
                    } else {
                        span { "{what}" }
                    }
                }
                span { class: "muted", "{when}" }
            }
        }
    }
}

#[component]
pub fn ActivityFeed(entries: Vec<ActivityFeedEntry>) -> Element {
    if entries.is_empty() {
        return rsx! { p { class: "muted", "No activity yet." } };
    }
    let now = Utc::now();
    rsx! {
        ul { class: "activity-feed",
            for entry in entries {
                FeedRow { key: "{entry.id}", entry, now }
            }
        }
    }
}

#[component]
fn UpcomingCard(item: UpcomingItem) -> Element {
    let priority = item.priority.as_str();
    let label = item.priority.label();
    let due = item.due_date.format("%b %-d").to_string();
    let vessel = item.vessel.clone().or(item.project_name.clone());
    rsx! {
        Link {
            class: "upcoming-card",
            to: Route::ProjectPage { id: item.project_id.to_string() },
            div { class: "upcoming-meta",
                span { class: "badge priority-{priority}", "{label}" }
                span { class: "muted", "{due}" }
            }
            p { class: "row-title", "{item.title}" }
            if let Some(vessel) = vessel {
                p { class: "row-sub muted", "{vessel}" }
            }
        }
    }
}

#[component]
pub fn UpcomingTasks(items: Vec<UpcomingItem>) -> Element {
    if items.is_empty() {
        return rsx! { p { class: "muted", "Nothing due in the next 7 days." } };
    }
    rsx! {
        div { class: "upcoming-list",
            for item in items {
                UpcomingCard { key: "{item.id}", item }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;
    use yacht_shared::models::ActivityAction;
    use yacht_shared::stats::UserSummary;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_relative_time() {
        assert_eq!(relative_time(now() - Duration::seconds(20), now()), "just now");
        assert_eq!(relative_time(now() - Duration::minutes(5), now()), "5m ago");
        assert_eq!(relative_time(now() - Duration::hours(3), now()), "3h ago");
        assert_eq!(relative_time(now() - Duration::days(2), now()), "2d ago");
        assert_eq!(relative_time(now() - Duration::days(30), now()), "Feb 14");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Captain Paul"), "CP");
        assert_eq!(initials("first officer james"), "FO");
        assert_eq!(initials("Marco"), "M");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_feed_line() {
        let mut entry = ActivityFeedEntry {
            id: Uuid::from_u128(1),
            action: ActivityAction::Commented,
            user: Some(UserSummary {
                id: Uuid::from_u128(2),
                name: "Captain Paul".into(),
                avatar_url: None,
            }),
            work_item_id: Some(Uuid::from_u128(3)),
            work_item_title: Some("Replace bilge pump".into()),
            project_id: None,
            created_at: now(),
        };
        assert_eq!(
            feed_line(&entry),
            ("Captain Paul".to_string(), "commented on Replace bilge pump".to_string())
        );

        entry.user = None;
        entry.work_item_title = None;
        entry.action = ActivityAction::Deleted;
        assert_eq!(
            feed_line(&entry),
            ("Someone".to_string(), "deleted a work item".to_string())
        );
    }
}
