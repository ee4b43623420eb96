use dioxus::logger::tracing;
use dioxus::prelude::*;
use uuid::Uuid;
use yacht_shared::filter::WorkItemFilter;
use yacht_shared::form::{ModalSession, WorkItemPayload};
use yacht_shared::models::{pins_for, PinPosition, Status, WorkItem};
use yacht_shared::stats::{ProjectDetail, WorkItemDetails};

use crate::api;
use crate::components::plan_viewer::PlanViewer;
use crate::components::stats_cards::ProjectStatsBar;
use crate::components::work_item_modal::WorkItemModal;
use crate::Route;

/// Plan drawing used when a vessel has none on record.
const FALLBACK_PLAN: &str = "/static/yacht-ga-plan.svg";

/// What the work item modal is showing.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ModalTarget {
    Existing(Uuid),
    /// New item, optionally already placed on the plan.
    New(Option<PinPosition>),
}

impl ModalTarget {
    fn key(&self) -> String {
        match self {
            ModalTarget::Existing(id) => id.to_string(),
            ModalTarget::New(_) => "new".to_string(),
        }
    }
}

fn list_filter(search: &str, status: &str) -> WorkItemFilter {
    let search = search.trim();
    WorkItemFilter {
        status: status.parse::<Status>().into_iter().collect(),
        search: (!search.is_empty()).then(|| search.to_string()),
        ..Default::default()
    }
}

fn find_item(project: Option<&ProjectDetail>, id: Uuid) -> Option<WorkItem> {
    project?
        .work_items
        .iter()
        .find(|d| d.item.id == id)
        .map(|d| d.item.clone())
}

/// Fresh modal session for `target`.
fn session_for(target: ModalTarget, project: Option<&ProjectDetail>) -> ModalSession {
    match target {
        ModalTarget::Existing(id) => find_item(project, id)
            .map_or_else(ModalSession::new_item, |item| ModalSession::view(&item)),
        ModalTarget::New(_) => ModalSession::new_item(),
    }
}

fn due_label(details: &WorkItemDetails) -> Option<String> {
    details
        .item
        .due_date
        .map(|d| format!("Due {}", d.format("%b %-d")))
}

#[component]
pub fn ProjectPage(id: String) -> Element {
    let mut detail = use_resource(move || {
        let id = id.clone();
        async move {
            let result = api::fetch_project(&id).await;
            if let Err(e) = &result {
                tracing::error!(project = %id, error = %e, "Failed to load project");
            }
            result
        }
    });

    let mut editing = use_signal(|| false);
    let mut selected = use_signal(|| None::<Uuid>);
    let mut modal = use_signal(|| None::<ModalTarget>);
    let mut session = use_signal(ModalSession::new_item);
    let mut notice = use_signal(|| None::<String>);
    let mut search = use_signal(String::new);
    let mut status_filter = use_signal(String::new);

    let loaded: Option<Result<Option<ProjectDetail>, String>> = detail.read().as_ref().cloned();
    let project = match loaded {
        None => return rsx! { div { class: "page loading", "Loading project…" } },
        Some(Err(e)) => {
            return rsx! {
                div { class: "page error",
                    h2 { "Could not load project" }
                    p { "{e}" }
                    Link { to: Route::Projects {}, "← Back to projects" }
                }
            }
        }
        Some(Ok(None)) => {
            return rsx! {
                div { class: "page not-found",
                    h2 { "Project not found" }
                    Link { to: Route::Projects {}, "← Back to projects" }
                }
            }
        }
        Some(Ok(Some(project))) => project,
    };

    let project_id = project.project.id;
    let pins = pins_for(project.work_items.iter().map(|d| &d.item));
    let plan_url = project
        .vessel
        .as_ref()
        .and_then(|v| v.ga_plan_url.clone())
        .unwrap_or_else(|| FALLBACK_PLAN.to_string());
    let vessel_name = project
        .vessel
        .as_ref()
        .map(|v| v.name.clone())
        .unwrap_or_default();
    let filter = list_filter(&search.read(), &status_filter.read());
    let visible: Vec<WorkItemDetails> = project
        .work_items
        .iter()
        .filter(|d| filter.matches(&d.item))
        .cloned()
        .collect();
    let modal_target = *modal.read();
    let modal_item = match modal_target {
        Some(ModalTarget::Existing(id)) => project.work_items.iter().find(|d| d.item.id == id).cloned(),
        _ => None,
    };

    let mut report = move |action: &str, e: String| {
        tracing::error!(error = %e, "Failed to {action}");
        notice.set(Some(format!("Could not {action}: {e}")));
    };

    let mut open_modal = move |target: ModalTarget| {
        let fresh = {
            let loaded = detail.peek();
            let project = loaded.as_ref().and_then(|r| r.as_ref().ok()).and_then(Option::as_ref);
            session_for(target, project)
        };
        session.set(fresh);
        modal.set(Some(target));
    };

    let on_save = move |payload: WorkItemPayload| {
        let Some(target) = *modal.peek() else { return };
        let current = match target {
            ModalTarget::Existing(id) => {
                let loaded = detail.peek();
                find_item(loaded.as_ref().and_then(|r| r.as_ref().ok()).and_then(Option::as_ref), id)
            }
            ModalTarget::New(_) => None,
        };
        spawn(async move {
            let result = match target {
                ModalTarget::New(pin) => api::create_work_item(project_id, &payload, pin).await,
                ModalTarget::Existing(id) => {
                    let due = current.as_ref().and_then(|w| w.due_date);
                    api::update_work_item(id, &payload, due).await
                }
            };
            match (result, current) {
                (Ok(id), Some(mut item)) => {
                    tracing::info!(work_item = %id, "Saved work item");
                    payload.apply_to(&mut item);
                    session.write().mark_saved(&item);
                    notice.set(None);
                    detail.restart();
                }
                (Ok(id), None) => {
                    tracing::info!(work_item = %id, "Created work item");
                    modal.set(None);
                    selected.set(Some(id));
                    notice.set(None);
                    detail.restart();
                }
                (Err(e), _) => {
                    tracing::error!(error = %e, "Failed to save work item");
                    session.write().save_failed(e);
                }
            }
        });
    };

    let on_delete = move |_: ()| {
        let Some(ModalTarget::Existing(id)) = *modal.peek() else { return };
        spawn(async move {
            match api::delete_work_item(id).await {
                Ok(_) => {
                    modal.set(None);
                    selected.set(None);
                    detail.restart();
                }
                Err(e) => report("delete work item", e),
            }
        });
    };

    let on_pin_move = move |(id, to): (Uuid, PinPosition)| {
        spawn(async move {
            match api::move_pin(id, to).await {
                Ok(_) => detail.restart(),
                Err(e) => report("move pin", e),
            }
        });
    };

    rsx! {
        div { class: "page project-page",
            div { class: "page-header",
                Link { class: "back-link", to: Route::Projects {}, "←" }
                div {
                    h1 { "{project.project.name}" }
                    p { class: "muted", "{vessel_name}" }
                }
                div { class: "header-actions",
                    button {
                        class: "secondary",
                        onclick: move |_| open_modal(ModalTarget::New(None)),
                        "New Item"
                    }
                    button {
                        class: if *editing.read() { "active" } else { "secondary" },
                        onclick: move |_| {
                            let next = !*editing.read();
                            editing.set(next);
                        },
                        if *editing.read() { "Done Editing" } else { "Edit Plan" }
                    }
                }
            }

            if let Some(message) = notice.cloned() {
                div { class: "notice",
                    span { "{message}" }
                    button { class: "icon secondary", onclick: move |_| notice.set(None), "✕" }
                }
            }

            div { class: "project-layout",
                div { class: "plan-pane",
                    PlanViewer {
                        image_url: plan_url,
                        pins,
                        selected: *selected.read(),
                        editing: *editing.read(),
                        on_pin_click: move |id: Uuid| {
                            selected.set(Some(id));
                            open_modal(ModalTarget::Existing(id));
                        },
                        on_pin_move,
                        on_pin_add: move |at: PinPosition| open_modal(ModalTarget::New(Some(at))),
                    }
                }

                aside { class: "project-side",
                    div { class: "panel",
                        h3 { "Project Progress" }
                        ProjectStatsBar { stats: project.stats }
                    }

                    div { class: "panel",
                        h3 { "Work Items" }
                        div { class: "list-filters",
                            input {
                                r#type: "search",
                                placeholder: "Search…",
                                value: "{search}",
                                oninput: move |evt: Event<FormData>| search.set(evt.value()),
                            }
                            select {
                                value: "{status_filter}",
                                onchange: move |evt: Event<FormData>| status_filter.set(evt.value()),
                                option { value: "", "All statuses" }
                                for s in Status::ALL {
                                    option { value: s.as_str(), {s.label()} }
                                }
                            }
                        }
                        if visible.is_empty() {
                            p { class: "muted", "No work items match." }
                        }
                        for d in visible {
                            button {
                                key: "{d.item.id}",
                                class: if *selected.read() == Some(d.item.id) { "work-item-row selected" } else { "work-item-row" },
                                onclick: move |_| {
                                    selected.set(Some(d.item.id));
                                    open_modal(ModalTarget::Existing(d.item.id));
                                },
                                div { class: "row-main",
                                    p { class: "row-title", "{d.item.title}" }
                                    p { class: "row-sub muted",
                                        {d.item.location.clone().unwrap_or_default()}
                                        if let Some(due) = due_label(&d) { " · {due}" }
                                        if !d.item.is_placed() { " · not on plan" }
                                    }
                                }
                                span { class: "badge status-{d.item.status}", {d.item.status.label()} }
                            }
                        }
                    }
                }
            }

            if let Some(target) = modal_target {
                WorkItemModal {
                    key: "{target.key()}",
                    item: modal_item,
                    session,
                    on_save,
                    on_close: move |_: ()| modal.set(None),
                    on_delete,
                }
            }
        }
    }
}
