#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Interact,
    Confirm,
    Back,
    ToggleMap,
    ToggleInfo,
}

const ACTION_COUNT: usize = 9;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Interact,
        InputAction::Confirm,
        InputAction::Back,
        InputAction::ToggleMap,
        InputAction::ToggleInfo,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
            InputAction::Confirm => 5,
            InputAction::Back => 6,
            InputAction::ToggleMap => 7,
            InputAction::ToggleInfo => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn clear(&mut self) {
        self.down = [false; ACTION_COUNT];
    }
}

/// Input state for a single simulation tick: which actions are held, and
/// which went from released to pressed since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(held: ActionStates, pressed: ActionStates) -> Self {
        Self { held, pressed }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.held.set(action, true);
        self.pressed.set(action, true);
        self
    }

    /// Tile step requested by the held direction keys. Opposing keys cancel,
    /// so the result is one of nine combinations in `[-1, 1]^2`.
    pub fn movement_delta(&self) -> (i32, i32) {
        let mut dx = 0;
        let mut dy = 0;
        if self.is_down(InputAction::MoveUp) {
            dy -= 1;
        }
        if self.is_down(InputAction::MoveDown) {
            dy += 1;
        }
        if self.is_down(InputAction::MoveLeft) {
            dx -= 1;
        }
        if self.is_down(InputAction::MoveRight) {
            dx += 1;
        }
        (dx, dy)
    }
}
