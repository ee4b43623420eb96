use dioxus::html::input_data::keyboard_types::Modifiers;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use uuid::Uuid;
use yacht_shared::models::{Pin, PinPosition};
use yacht_shared::placement::PlacementState;
use yacht_shared::view::{self, PointerButton, ViewState};

use crate::components::pin_marker::{NewPinMarker, PinMarker};
use crate::coords;

const VIEWPORT_ID: &str = "plan-viewport";
const SURFACE_ID: &str = "plan-surface";
const IMAGE_ID: &str = "plan-image";

/// Toolbar readout of how many pins are on the plan.
pub fn pin_count_label(count: usize) -> String {
    if count == 1 {
        "1 pin".to_string()
    } else {
        format!("{count} pins")
    }
}

fn pointer_button(button: Option<MouseButton>) -> Option<PointerButton> {
    match button? {
        MouseButton::Primary => Some(PointerButton::Primary),
        MouseButton::Auxiliary => Some(PointerButton::Middle),
        MouseButton::Secondary => Some(PointerButton::Secondary),
        _ => None,
    }
}

fn viewport_class(view: &ViewState, placement: &PlacementState) -> &'static str {
    if placement.is_adding() {
        "plan-viewport adding"
    } else if view.is_panning() {
        "plan-viewport panning"
    } else {
        "plan-viewport"
    }
}

/// Deck plan with a pan/zoom transform and the work item pins on top.
///
/// The viewer owns only its view and add-pin state. Clicks, drags and
/// confirmed placements are reported through the handlers; the caller decides
/// what to persist.
#[component]
pub fn PlanViewer(
    image_url: String,
    pins: Vec<Pin>,
    selected: Option<Uuid>,
    editing: bool,
    on_pin_click: EventHandler<Uuid>,
    on_pin_move: EventHandler<(Uuid, PinPosition)>,
    on_pin_add: EventHandler<PinPosition>,
) -> Element {
    let mut view = use_signal(ViewState::new);
    let mut placement = use_signal(PlacementState::new);

    use_effect(use_reactive!(|(editing,)| {
        if !editing && placement.peek().is_adding() {
            placement.write().set_editing(false);
        }
    }));

    let state = view.read().clone();
    let adding = editing && placement.read().is_adding();
    let provisional = placement.read().provisional().filter(|_| editing);
    let surface_style = coords::surface_transform(&state);
    let class = viewport_class(&state, &placement.read());
    let count_label = pin_count_label(pins.len());
    let zoom_label = format!("{}%", state.zoom_percent());

    rsx! {
        div { class: "plan-viewer",
            div { class: "plan-toolbar",
                div { class: "toolbar-group",
                    button {
                        class: "icon",
                        title: "Zoom in",
                        disabled: !state.can_zoom_in(),
                        onclick: move |_| view.write().zoom_in(),
                        "+"
                    }
                    span { class: "zoom-readout", "{zoom_label}" }
                    button {
                        class: "icon",
                        title: "Zoom out",
                        disabled: !state.can_zoom_out(),
                        onclick: move |_| view.write().zoom_out(),
                        "−"
                    }
                    button {
                        class: "icon",
                        title: "Reset view",
                        onclick: move |_| view.write().reset(),
                        "⤢"
                    }
                }
                if editing {
                    div { class: "toolbar-group",
                        button {
                            class: if adding { "icon active" } else { "icon" },
                            title: "Add pin",
                            onclick: move |_| placement.write().toggle(),
                            "📍"
                        }
                    }
                }
            }

            div { class: "pin-count", "{count_label}" }

            if adding {
                div { class: "placement-hint", "Click on the plan to place a new work item pin" }
            }

            div {
                id: VIEWPORT_ID,
                class: "{class}",

                onwheel: move |evt: Event<WheelData>| {
                    let modifier = evt
                        .modifiers()
                        .intersects(Modifiers::CONTROL | Modifiers::META);
                    let delta_y = coords::wheel_delta_y(evt.data().delta());
                    if view.write().wheel(delta_y, modifier) {
                        evt.prevent_default();
                    }
                },

                onmousedown: move |evt: Event<MouseData>| {
                    let Some(button) = pointer_button(evt.trigger_button()) else { return };
                    let alt = evt.modifiers().contains(Modifiers::ALT);
                    if view::is_pan_trigger(button, alt, placement.read().is_adding()) {
                        evt.prevent_default();
                        let client = evt.client_coordinates();
                        view.write().begin_pan(client.x, client.y);
                    }
                },

                onmousemove: move |evt: Event<MouseData>| {
                    if !view.read().is_panning() {
                        return;
                    }
                    let client = evt.client_coordinates();
                    view.write().pan_to(client.x, client.y);
                },

                onmouseup: move |_| view.write().end_pan(),
                onmouseleave: move |_| view.write().end_pan(),

                onclick: move |evt: Event<MouseData>| {
                    if !editing || !placement.read().is_adding() {
                        return;
                    }
                    let client = evt.client_coordinates();
                    let position = coords::element_rect(IMAGE_ID)
                        .and_then(|image| view::pointer_to_percent(client.x, client.y, image));
                    placement.write().click(position);
                },

                div {
                    id: SURFACE_ID,
                    class: "plan-surface",
                    style: "{surface_style}",

                    img {
                        id: IMAGE_ID,
                        src: "{image_url}",
                        alt: "GA plan",
                        draggable: false,
                    }

                    for pin in pins.iter() {
                        PinMarker {
                            key: "{pin.id}",
                            pin: pin.clone(),
                            selected: selected == Some(pin.id),
                            draggable: editing,
                            surface_id: SURFACE_ID,
                            on_click: on_pin_click,
                            on_move: on_pin_move,
                        }
                    }

                    if let Some(position) = provisional {
                        NewPinMarker {
                            position,
                            on_confirm: move |_| {
                                if let Some(confirmed) = placement.write().confirm() {
                                    on_pin_add.call(confirmed);
                                }
                            },
                        }
                    }
                }
            }
        }
    }
}
