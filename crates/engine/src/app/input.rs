use winit::keyboard::KeyCode;

use crate::sim::{Command, Direction};

/// Gameplay keys of the fixed key table. Pause, save, load and render-rate
/// keys are frame-level and handled by the loop runner instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PickOption(u8),
    ToggleInventory,
    ToggleQuests,
    QuickHeal,
    UseSelected,
    Buy,
    Mount,
    Escape,
}

impl InputAction {
    pub fn command(self) -> Command {
        match self {
            InputAction::MoveUp => Command::Move(Direction::Up),
            InputAction::MoveDown => Command::Move(Direction::Down),
            InputAction::MoveLeft => Command::Move(Direction::Left),
            InputAction::MoveRight => Command::Move(Direction::Right),
            InputAction::PickOption(index) => Command::PickOption(index as usize),
            InputAction::ToggleInventory => Command::ToggleInventory,
            InputAction::ToggleQuests => Command::ToggleQuests,
            InputAction::QuickHeal => Command::QuickHeal,
            InputAction::UseSelected => Command::UseSelected,
            InputAction::Buy => Command::Buy,
            InputAction::Mount => Command::Mount,
            InputAction::Escape => Command::Escape,
        }
    }
}

pub fn action_for_key(code: KeyCode) -> Option<InputAction> {
    let action = match code {
        KeyCode::KeyZ | KeyCode::ArrowUp => InputAction::MoveUp,
        KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveDown,
        KeyCode::KeyQ | KeyCode::ArrowLeft => InputAction::MoveLeft,
        KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
        KeyCode::Digit1 | KeyCode::Numpad1 => InputAction::PickOption(0),
        KeyCode::Digit2 | KeyCode::Numpad2 => InputAction::PickOption(1),
        KeyCode::Digit3 | KeyCode::Numpad3 => InputAction::PickOption(2),
        KeyCode::Digit4 | KeyCode::Numpad4 => InputAction::PickOption(3),
        KeyCode::Digit5 | KeyCode::Numpad5 => InputAction::PickOption(4),
        KeyCode::Digit6 | KeyCode::Numpad6 => InputAction::PickOption(5),
        KeyCode::KeyI => InputAction::ToggleInventory,
        KeyCode::KeyY => InputAction::ToggleQuests,
        KeyCode::KeyH => InputAction::QuickHeal,
        KeyCode::KeyU => InputAction::UseSelected,
        KeyCode::KeyB => InputAction::Buy,
        KeyCode::KeyM => InputAction::Mount,
        KeyCode::Escape => InputAction::Escape,
        _ => return None,
    };
    Some(action)
}

/// The single held gameplay key. The most recent press wins; releasing any
/// other key leaves it in place.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct HeldKey {
    held: Option<(KeyCode, InputAction)>,
}

impl HeldKey {
    pub(crate) fn press(&mut self, code: KeyCode) {
        if let Some(action) = action_for_key(code) {
            self.held = Some((code, action));
        }
    }

    pub(crate) fn release(&mut self, code: KeyCode) {
        if matches!(self.held, Some((held_code, _)) if held_code == code) {
            self.held = None;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.held = None;
    }

    pub(crate) fn action(&self) -> Option<InputAction> {
        self.held.map(|(_, action)| action)
    }
}

/// Input as seen by one logic tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    held: Option<InputAction>,
}

impl InputSnapshot {
    pub fn new(held: Option<InputAction>) -> Self {
        Self { held }
    }

    pub fn held(&self) -> Option<InputAction> {
        self.held
    }

    pub fn held_command(&self) -> Option<Command> {
        self.held.map(InputAction::command)
    }
}
