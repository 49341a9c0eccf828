//! Movement intent.
//!
//! Intents represent the movement commands currently held by the player or requested
//! through the programmatic API (NPC scripting). The state machine reads them once per
//! frame.

/// Flat set of movement command flags.
///
/// # Example
///
/// ```rust
/// use locomotion::Intent;
///
/// let mut intent = Intent::default();
/// intent.walk = true;
/// intent.speed_modifier = true;
/// assert!(intent.any_movement());
///
/// intent.reset();
/// assert!(!intent.any_movement());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intent {
    pub walk: bool,
    pub walk_back: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    /// One-shot request: stays set until the jump it started has landed.
    pub jump: bool,
    /// Run / fast variants.
    pub speed_modifier: bool,
}

impl Intent {
    /// Clear every flag.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Any directional command (jump and the speed modifier excluded).
    pub fn any_movement(&self) -> bool {
        self.walk
            || self.walk_back
            || self.turn_left
            || self.turn_right
            || self.strafe_left
            || self.strafe_right
    }

    pub fn is_strafing(&self) -> bool {
        self.strafe_left || self.strafe_right
    }

    pub fn is_turning(&self) -> bool {
        self.turn_left || self.turn_right
    }
}
