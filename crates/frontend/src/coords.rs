use dioxus::html::geometry::WheelDelta;
use yacht_shared::models::PinPosition;
use yacht_shared::view::{ImageRect, ViewState};

/// Bounding rect of a DOM element in client pixels.
pub fn element_rect(id: &str) -> Option<ImageRect> {
    let document = web_sys::window()?.document()?;
    let rect = document.get_element_by_id(id)?.get_bounding_client_rect();
    Some(ImageRect {
        left: rect.left(),
        top: rect.top(),
        width: rect.width(),
        height: rect.height(),
    })
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
pub fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

/// CSS transform of the plan surface: pan first, then scale from the top-left corner.
pub fn surface_transform(view: &ViewState) -> String {
    format!(
        "transform: translate({}px, {}px) scale({}); transform-origin: 0 0;",
        view.pan_x, view.pan_y, view.zoom
    )
}

/// Absolute placement of a marker whose tip sits on `pos`.
pub fn marker_style(pos: PinPosition) -> String {
    format!("left: {}%; top: {}%;", pos.x, pos.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_delta_units() {
        assert_eq!(wheel_delta_y(WheelDelta::pixels(0.0, -120.0, 0.0)), -120.0);
        assert_eq!(wheel_delta_y(WheelDelta::lines(0.0, 3.0, 0.0)), 120.0);
        assert_eq!(wheel_delta_y(WheelDelta::pages(0.0, 1.0, 0.0)), 400.0);
    }

    #[test]
    fn test_surface_transform_default() {
        assert_eq!(
            surface_transform(&ViewState::new()),
            "transform: translate(0px, 0px) scale(1); transform-origin: 0 0;"
        );
    }

    #[test]
    fn test_surface_transform_after_zoom_and_pan() {
        let mut view = ViewState::new();
        view.zoom_in();
        view.begin_pan(10.0, 10.0);
        view.pan_to(40.0, -15.0);
        assert_eq!(
            surface_transform(&view),
            "transform: translate(30px, -25px) scale(1.25); transform-origin: 0 0;"
        );
    }

    #[test]
    fn test_marker_style() {
        let style = marker_style(PinPosition { x: 12.5, y: 80.0 });
        assert_eq!(style, "left: 12.5%; top: 80%;");
    }
}
