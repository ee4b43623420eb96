use dioxus::prelude::*;
use uuid::Uuid;
use yacht_shared::models::{Pin, PinPosition, Priority, Status};
use yacht_shared::view;

use crate::coords;

/// Glyph drawn inside the marker body for each priority.
pub fn priority_icon(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "✓",
        Priority::Medium => "◷",
        Priority::High => "!",
        Priority::Critical => "✕",
    }
}

/// CSS classes of a marker: priority drives the icon color, status the border.
pub fn marker_class(priority: Priority, status: Status, selected: bool) -> String {
    let mut class = format!(
        "pin-marker priority-{} status-{}",
        priority.as_str(),
        status.as_str()
    );
    if selected {
        class.push_str(" selected");
    }
    if priority == Priority::Critical {
        class.push_str(" pulse");
    }
    class
}

/// Hover text: the title, then the location when one is recorded.
pub fn tooltip_text(pin: &Pin) -> String {
    match pin.location.as_deref().map(str::trim) {
        Some(location) if !location.is_empty() => format!("{} · {location}", pin.title),
        _ => pin.title.clone(),
    }
}

/// A placed work item. Drag ends are measured against the `surface_id` element.
#[component]
pub fn PinMarker(
    pin: Pin,
    selected: bool,
    draggable: bool,
    surface_id: &'static str,
    on_click: EventHandler<Uuid>,
    on_move: EventHandler<(Uuid, PinPosition)>,
) -> Element {
    let id = pin.id;
    let class = marker_class(pin.priority, pin.status, selected);
    let style = coords::marker_style(PinPosition { x: pin.x, y: pin.y });
    let icon = priority_icon(pin.priority);
    let hover = tooltip_text(&pin);

    rsx! {
        div {
            class: "{class}",
            style: "{style}",
            title: "{hover}",
            draggable: draggable,
            onclick: move |evt: Event<MouseData>| {
                evt.stop_propagation();
                on_click.call(id);
            },
            ondragend: move |evt: Event<DragData>| {
                if !draggable {
                    return;
                }
                let client = evt.client_coordinates();
                let Some(surface) = coords::element_rect(surface_id) else { return };
                if let Some(to) = view::drag_end_percent(client.x, client.y, surface) {
                    on_move.call((id, to));
                }
            },
            div { class: "pin-body",
                span { class: "pin-icon", "{icon}" }
            }
            div { class: "pin-pointer" }
            div { class: "pin-tooltip",
                span { class: "pin-tooltip-title", "{pin.title}" }
                if let Some(location) = pin.location.clone() {
                    span { class: "pin-tooltip-location", "{location}" }
                }
            }
        }
    }
}

/// Provisional marker shown while placing a new pin. Clicking it confirms.
#[component]
pub fn NewPinMarker(position: PinPosition, on_confirm: EventHandler<PinPosition>) -> Element {
    let style = coords::marker_style(position);
    rsx! {
        div {
            class: "pin-marker provisional",
            style: "{style}",
            title: "Click to confirm",
            onclick: move |evt: Event<MouseData>| {
                evt.stop_propagation();
                on_confirm.call(position);
            },
            div { class: "pin-body", span { class: "pin-icon", "+" } }
            div { class: "pin-pointer" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_class_reflects_priority_and_status() {
        assert_eq!(
            marker_class(Priority::High, Status::InProgress, false),
            "pin-marker priority-high status-in-progress"
        );
    }

    #[test]
    fn test_selected_marker_class() {
        let class = marker_class(Priority::Low, Status::Open, true);
        assert!(class.ends_with(" selected"));
    }

    #[test]
    fn test_critical_marker_pulses() {
        let class = marker_class(Priority::Critical, Status::Blocked, false);
        assert!(class.contains("priority-critical"));
        assert!(class.contains("status-blocked"));
        assert!(class.contains("pulse"));
        assert!(!marker_class(Priority::High, Status::Blocked, false).contains("pulse"));
    }

    fn pin(location: Option<&str>) -> Pin {
        Pin {
            id: Uuid::from_u128(1),
            x: 40.0,
            y: 55.0,
            title: "Replace bilge pump".into(),
            location: location.map(str::to_string),
            status: Status::Open,
            priority: Priority::High,
        }
    }

    #[test]
    fn test_tooltip_includes_location() {
        assert_eq!(tooltip_text(&pin(Some("Engine room"))), "Replace bilge pump · Engine room");
        assert_eq!(tooltip_text(&pin(None)), "Replace bilge pump");
        assert_eq!(tooltip_text(&pin(Some("  "))), "Replace bilge pump");
    }

    #[test]
    fn test_every_priority_has_an_icon() {
        for p in Priority::ALL {
            assert!(!priority_icon(p).is_empty());
        }
    }
}
