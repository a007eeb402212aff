#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    TriggerHorde,
    Quit,
}

const ACTION_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::TriggerHorde => 0,
            InputAction::Quit => 1,
        }
    }
}

/// Per-tick view of the input devices: which actions are held, and which
/// went from released to held since the previous tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_pressed(mut self, action: InputAction) -> Self {
        self.held.set(action, true);
        self.pressed.set(action, true);
        self
    }
}

/// Turns raw held states into press edges so that holding a key fires once.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    previous: ActionStates,
}

impl EdgeDetector {
    pub fn observe(&mut self, held: ActionStates) -> InputSnapshot {
        let mut pressed = ActionStates::default();
        for action in [InputAction::TriggerHorde, InputAction::Quit] {
            pressed.set(action, held.is_down(action) && !self.previous.is_down(action));
        }
        self.previous = held;
        InputSnapshot { held, pressed }
    }
}
