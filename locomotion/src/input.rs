//! Keyboard mapping.
//!
//! Key names are matched case-insensitively against the action table's bindings. Arrow
//! keys, shift and capslock are built in and cannot be rebound.

use crate::action::{ActionKind, ActionTable};
use crate::constants::UNBOUND_KEY;
use crate::intent::Intent;

/// What a key does to the intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    Jump,
    /// Capslock: toggles the speed modifier on key down.
    ToggleSpeed,
    /// Shift: speed modifier while held.
    Speed,
    Walk,
    WalkBack,
    TurnLeft,
    TurnRight,
    StrafeLeft,
    StrafeRight,
}

fn bound(table: &ActionTable, kind: ActionKind, key: &str) -> bool {
    let binding = &table.get(kind).key;
    binding != UNBOUND_KEY && *binding == key
}

/// Map a key name to its command. Bindings are checked in a fixed order, so a key bound
/// to two actions triggers the first one.
pub fn resolve_key(table: &ActionTable, key: &str) -> Option<KeyCommand> {
    let key = key.to_lowercase();
    let key = key.as_str();
    if bound(table, ActionKind::IdleJump, key) {
        return Some(KeyCommand::Jump);
    }
    let command = match key {
        "capslock" => KeyCommand::ToggleSpeed,
        "shift" => KeyCommand::Speed,
        "up" | "arrowup" => KeyCommand::Walk,
        "left" | "arrowleft" => KeyCommand::TurnLeft,
        "right" | "arrowright" => KeyCommand::TurnRight,
        "down" | "arrowdown" => KeyCommand::WalkBack,
        _ if bound(table, ActionKind::Walk, key) => KeyCommand::Walk,
        _ if bound(table, ActionKind::TurnLeft, key) => KeyCommand::TurnLeft,
        _ if bound(table, ActionKind::TurnRight, key) => KeyCommand::TurnRight,
        _ if bound(table, ActionKind::WalkBack, key) => KeyCommand::WalkBack,
        _ if bound(table, ActionKind::StrafeLeft, key) => KeyCommand::StrafeLeft,
        _ if bound(table, ActionKind::StrafeRight, key) => KeyCommand::StrafeRight,
        _ => return None,
    };
    Some(command)
}

/// Keyboard listening state.
///
/// `enabled` is the user preference saved in the settings; `listening` follows it while
/// the controller runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keyboard {
    pub enabled: bool,
    pub listening: bool,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            enabled: true,
            listening: false,
        }
    }
}

impl Keyboard {
    /// Apply a key press. Auto-repeats and keys without a command are ignored.
    pub fn key_down(
        &self,
        table: &ActionTable,
        intent: &mut Intent,
        key: &str,
        repeat: bool,
    ) -> Option<KeyCommand> {
        if !self.listening || repeat {
            return None;
        }
        let command = resolve_key(table, key)?;
        match command {
            KeyCommand::Jump => intent.jump = true,
            KeyCommand::ToggleSpeed => intent.speed_modifier = !intent.speed_modifier,
            KeyCommand::Speed => intent.speed_modifier = true,
            KeyCommand::Walk => intent.walk = true,
            KeyCommand::WalkBack => intent.walk_back = true,
            KeyCommand::TurnLeft => intent.turn_left = true,
            KeyCommand::TurnRight => intent.turn_right = true,
            KeyCommand::StrafeLeft => intent.strafe_left = true,
            KeyCommand::StrafeRight => intent.strafe_right = true,
        }
        Some(command)
    }

    /// Apply a key release. The jump request is one-shot and survives its key.
    pub fn key_up(&self, table: &ActionTable, intent: &mut Intent, key: &str) -> Option<KeyCommand> {
        if !self.listening {
            return None;
        }
        let command = resolve_key(table, key)?;
        match command {
            KeyCommand::Jump | KeyCommand::ToggleSpeed => {}
            KeyCommand::Speed => intent.speed_modifier = false,
            KeyCommand::Walk => intent.walk = false,
            KeyCommand::WalkBack => intent.walk_back = false,
            KeyCommand::TurnLeft => intent.turn_left = false,
            KeyCommand::TurnRight => intent.turn_right = false,
            KeyCommand::StrafeLeft => intent.strafe_left = false,
            KeyCommand::StrafeRight => intent.strafe_right = false,
        }
        Some(command)
    }
}
