use dioxus::prelude::*;
use yacht_shared::form::{
    ModalMode, ModalOutcome, ModalSession, WorkItemPayload, FIELD_DUE_DATE,
    FIELD_ESTIMATED_HOURS, FIELD_PRIORITY, FIELD_STATUS, FIELD_TITLE,
};
use yacht_shared::models::{Priority, Status};
use yacht_shared::stats::WorkItemDetails;

/// Read-mode text for an optional form value.
fn shown(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        "—".to_string()
    } else {
        value.to_string()
    }
}

fn status_label(raw: &str) -> &'static str {
    raw.parse::<Status>().map(Status::label).unwrap_or("Unknown")
}

fn priority_label(raw: &str) -> &'static str {
    raw.parse::<Priority>().map(Priority::label).unwrap_or("Unknown")
}

#[component]
fn FieldError(message: Option<String>) -> Element {
    match message {
        Some(message) => rsx! { p { class: "field-error", "{message}" } },
        None => rsx! {},
    }
}

/// View, edit or create a single work item.
///
/// The host owns `session` and opens it with [`ModalSession::view`] or
/// [`ModalSession::new_item`]. Saving hands the validated payload to `on_save`;
/// the host persists it and reports back through `mark_saved` or `save_failed`.
#[component]
pub fn WorkItemModal(
    item: Option<WorkItemDetails>,
    session: Signal<ModalSession>,
    on_save: EventHandler<WorkItemPayload>,
    on_close: EventHandler<()>,
    on_delete: EventHandler<()>,
) -> Element {
    let mut session = session;
    let current = session.read().clone();
    let form = current.form().clone();
    let errors = current.errors().clone();
    let save_error = current.save_error().map(str::to_string);
    let saving = current.is_saving();
    let error = |field: &str| errors.get(field).map(str::to_string);
    let heading = if current.is_new() {
        "New Work Item".to_string()
    } else {
        form.title.clone()
    };

    rsx! {
        div {
            class: "modal-backdrop",
            onclick: move |_| on_close.call(()),

            div {
                class: "modal",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                div { class: "modal-header",
                    h2 { "{heading}" }
                    button {
                        class: "icon secondary",
                        title: "Close",
                        onclick: move |_| on_close.call(()),
                        "✕"
                    }
                }

                match current.mode() {
                    ModalMode::Read => rsx! {
                        dl { class: "modal-fields",
                            dt { "Status" }
                            dd { span { class: "badge status-{form.status}", {status_label(&form.status)} } }
                            dt { "Priority" }
                            dd { span { class: "badge priority-{form.priority}", {priority_label(&form.priority)} } }
                            dt { "Description" }
                            dd { {shown(&form.description)} }
                            dt { "Location" }
                            dd { {shown(&form.location)} }
                            dt { "Deck" }
                            dd { {shown(&form.deck_level)} }
                            dt { "Due date" }
                            dd { {shown(&form.due_date)} }
                            dt { "Estimated hours" }
                            dd { {shown(&form.estimated_hours)} }
                            dt { "Tags" }
                            dd { {shown(&form.tags)} }
                            if let Some(details) = &item {
                                dt { "Assignee" }
                                dd { {details.assignee.as_ref().map(|u| u.name.clone()).unwrap_or_else(|| "Unassigned".into())} }
                                dt { "Created by" }
                                dd { {details.created_by.as_ref().map(|u| u.name.clone()).unwrap_or_else(|| "—".into())} }
                                dt { "Activity" }
                                dd { "{details.comments_count} comments · {details.attachments_count} attachments" }
                            }
                        }
                        div { class: "modal-actions",
                            button {
                                class: "danger",
                                onclick: move |_| on_delete.call(()),
                                "Delete"
                            }
                            button {
                                onclick: move |_| session.write().begin_edit(),
                                "Edit"
                            }
                        }
                    },
                    ModalMode::Edit => rsx! {
                        form {
                            class: "modal-form",
                            onsubmit: move |evt: Event<FormData>| {
                                evt.prevent_default();
                                if session.peek().is_saving() {
                                    return;
                                }
                                let result = session.write().submit();
                                if let Ok(payload) = result {
                                    on_save.call(payload);
                                }
                            },

                            label { "Title"
                                input {
                                    r#type: "text",
                                    value: "{form.title}",
                                    oninput: move |evt: Event<FormData>| session.write().form_mut().title = evt.value(),
                                }
                            }
                            FieldError { message: error(FIELD_TITLE) }

                            label { "Description"
                                textarea {
                                    value: "{form.description}",
                                    oninput: move |evt: Event<FormData>| session.write().form_mut().description = evt.value(),
                                }
                            }

                            div { class: "form-row",
                                label { "Status"
                                    select {
                                        value: "{form.status}",
                                        onchange: move |evt: Event<FormData>| session.write().form_mut().status = evt.value(),
                                        for s in Status::ALL {
                                            option {
                                                value: s.as_str(),
                                                selected: form.status == s.as_str(),
                                                {s.label()}
                                            }
                                        }
                                    }
                                    FieldError { message: error(FIELD_STATUS) }
                                }
                                label { "Priority"
                                    select {
                                        value: "{form.priority}",
                                        onchange: move |evt: Event<FormData>| session.write().form_mut().priority = evt.value(),
                                        for p in Priority::ALL {
                                            option {
                                                value: p.as_str(),
                                                selected: form.priority == p.as_str(),
                                                {p.label()}
                                            }
                                        }
                                    }
                                    FieldError { message: error(FIELD_PRIORITY) }
                                }
                            }

                            div { class: "form-row",
                                label { "Location"
                                    input {
                                        r#type: "text",
                                        value: "{form.location}",
                                        oninput: move |evt: Event<FormData>| session.write().form_mut().location = evt.value(),
                                    }
                                }
                                label { "Deck"
                                    input {
                                        r#type: "text",
                                        value: "{form.deck_level}",
                                        oninput: move |evt: Event<FormData>| session.write().form_mut().deck_level = evt.value(),
                                    }
                                }
                            }

                            div { class: "form-row",
                                label { "Due date"
                                    input {
                                        r#type: "date",
                                        value: "{form.due_date}",
                                        oninput: move |evt: Event<FormData>| session.write().form_mut().due_date = evt.value(),
                                    }
                                    FieldError { message: error(FIELD_DUE_DATE) }
                                }
                                label { "Estimated hours"
                                    input {
                                        r#type: "text",
                                        inputmode: "decimal",
                                        value: "{form.estimated_hours}",
                                        oninput: move |evt: Event<FormData>| session.write().form_mut().estimated_hours = evt.value(),
                                    }
                                    FieldError { message: error(FIELD_ESTIMATED_HOURS) }
                                }
                            }

                            label { "Tags"
                                input {
                                    r#type: "text",
                                    placeholder: "engine, safety",
                                    value: "{form.tags}",
                                    oninput: move |evt: Event<FormData>| session.write().form_mut().tags = evt.value(),
                                }
                            }

                            if let Some(message) = save_error {
                                p { class: "field-error", "Could not save: {message}" }
                            }

                            div { class: "modal-actions",
                                button {
                                    r#type: "button",
                                    class: "secondary",
                                    onclick: move |_| {
                                        let outcome = session.write().cancel();
                                        if outcome == ModalOutcome::Close {
                                            on_close.call(());
                                        }
                                    },
                                    "Cancel"
                                }
                                button {
                                    r#type: "submit",
                                    disabled: saving,
                                    if saving { "Saving…" } else { "Save" }
                                }
                            }
                        }
                    },
                }
            }
        }
    }
}
