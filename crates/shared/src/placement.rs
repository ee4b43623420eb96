use crate::models::PinPosition;

/// Add-pin mode of the plan viewer.
///
/// While adding, a click on the plan drops a provisional marker; clicking the
/// provisional marker confirms it. Toggling the mode in either direction throws
/// away anything not yet confirmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementState {
    adding: bool,
    provisional: Option<PinPosition>,
}

impl PlacementState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.adding = !self.adding;
        self.provisional = None;
    }

    pub fn is_adding(&self) -> bool {
        self.adding
    }

    pub fn provisional(&self) -> Option<PinPosition> {
        self.provisional
    }

    /// Register a click on the plan. `position` is `None` when the click landed
    /// outside the image. Returns `true` if a provisional marker was (re)placed.
    pub fn click(&mut self, position: Option<PinPosition>) -> bool {
        match position {
            Some(p) if self.adding => {
                self.provisional = Some(p);
                true
            }
            _ => false,
        }
    }

    /// Commit the provisional marker, leaving add mode.
    pub fn confirm(&mut self) -> Option<PinPosition> {
        let position = self.provisional.take()?;
        self.adding = false;
        Some(position)
    }

    pub fn cancel(&mut self) {
        self.adding = false;
        self.provisional = None;
    }

    /// Follow the host's edit mode. Leaving edit mode ends add mode and drops
    /// any provisional marker; entering it changes nothing.
    pub fn set_editing(&mut self, editing: bool) {
        if !editing {
            self.cancel();
        }
    }
}
