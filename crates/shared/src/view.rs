//! GA-plan viewer transform state.
//!
//! Zoom is a plain scale factor bounded to [`ZOOM_MIN`, `ZOOM_MAX`] and moved in
//! fixed [`ZOOM_STEP`] increments. Pan is a pixel offset applied before the scale.
//! Requests outside the bounds clamp silently; nothing here ever errors.
use serde::{Deserialize, Serialize};

use crate::models::PinPosition;

pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.25;
pub const ZOOM_DEFAULT: f64 = 1.0;

/// Pointer buttons relevant to the plan viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Whether a pointer-down should start a pan gesture: middle-button drag, or
/// primary-button drag with the modifier held. Never while placing a pin.
pub fn is_pan_trigger(button: PointerButton, modifier_held: bool, adding_pin: bool) -> bool {
    if adding_pin {
        return false;
    }
    match button {
        PointerButton::Middle => true,
        PointerButton::Primary => modifier_held,
        PointerButton::Secondary => false,
    }
}

/// Anchor captured when a pan gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanGesture {
    anchor_x: f64,
    anchor_y: f64,
}

impl PanGesture {
    pub fn begin(pointer_x: f64, pointer_y: f64, pan_x: f64, pan_y: f64) -> Self {
        PanGesture {
            anchor_x: pointer_x - pan_x,
            anchor_y: pointer_y - pan_y,
        }
    }

    /// Pan offset for the current pointer position.
    pub fn offset(&self, pointer_x: f64, pointer_y: f64) -> (f64, f64) {
        (pointer_x - self.anchor_x, pointer_y - self.anchor_y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    /// Selected deck drawing. Carried through but not yet used to switch images.
    pub active_deck: Option<String>,
    #[serde(skip)]
    pan: Option<PanGesture>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            zoom: ZOOM_DEFAULT,
            pan_x: 0.0,
            pan_y: 0.0,
            active_deck: None,
            pan: None,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-ZOOM_STEP);
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom < ZOOM_MAX
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > ZOOM_MIN
    }

    /// Zoom level as a whole percentage for the toolbar readout.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Handle a wheel event. Only zooms while the modifier is held; scrolling
    /// up (negative delta) zooms in. Returns `true` when the event was consumed.
    pub fn wheel(&mut self, delta_y: f64, modifier_held: bool) -> bool {
        if !modifier_held {
            return false;
        }
        if delta_y > 0.0 {
            self.zoom_out();
        } else {
            self.zoom_in();
        }
        true
    }

    pub fn begin_pan(&mut self, pointer_x: f64, pointer_y: f64) {
        self.pan = Some(PanGesture::begin(pointer_x, pointer_y, self.pan_x, self.pan_y));
    }

    /// Track the pointer while a pan is active. No-op otherwise.
    pub fn pan_to(&mut self, pointer_x: f64, pointer_y: f64) {
        if let Some(gesture) = self.pan {
            let (x, y) = gesture.offset(pointer_x, pointer_y);
            self.pan_x = x;
            self.pan_y = y;
        }
    }

    /// Release the pan gesture (pointer up or pointer leaving the surface).
    pub fn end_pan(&mut self) {
        self.pan = None;
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    pub fn reset(&mut self) {
        *self = ViewState::default();
    }
}

/// Bounding box of a rendered element in client (viewport) pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ImageRect {
    fn raw_percent(&self, client_x: f64, client_y: f64) -> Option<(f64, f64)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some((
            (client_x - self.left) / self.width * 100.0,
            (client_y - self.top) / self.height * 100.0,
        ))
    }
}

/// Map a pointer position to plan percentages using the rendered image rect.
///
/// The rect already reflects the current zoom/pan transform, so no inverse
/// transform is applied. Positions outside the image (either axis outside
/// `[0, 100]`) are rejected.
pub fn pointer_to_percent(client_x: f64, client_y: f64, image: ImageRect) -> Option<PinPosition> {
    let (x, y) = image.raw_percent(client_x, client_y)?;
    PinPosition::checked(x, y)
}

/// Percent position at the end of a pin drag, relative to the plan surface.
/// Always inside `[0, 100]`; only a zero-sized surface yields `None`.
pub fn drag_end_percent(client_x: f64, client_y: f64, surface: ImageRect) -> Option<PinPosition> {
    let (x, y) = surface.raw_percent(client_x, client_y)?;
    Some(PinPosition::clamped(x, y))
}
