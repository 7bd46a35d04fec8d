use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Identity of a physical key, as reported by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const SHIFT: KeyCode = KeyCode(16);
    pub const CONTROL: KeyCode = KeyCode(17);
    pub const ALT: KeyCode = KeyCode(18);
    pub const META: KeyCode = KeyCode(157);

    /// Key code conventionally used for a character key (its upper-case code point).
    pub fn for_char(ch: char) -> Self {
        let upper = ch.to_ascii_uppercase();
        KeyCode(upper as u32)
    }
}

/// Modifier state captured together with a key or pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn control() -> Self {
        Self {
            control: true,
            ..Self::NONE
        }
    }
}

/// Which of the three key event classes an event belongs to.
///
/// `Typed` is stateless; `Pressed` and `Released` drive the held-key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPhase {
    Typed,
    Pressed,
    Released,
}

/// A raw keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub phase: KeyPhase,
    pub code: KeyCode,
    /// Character produced by the key, if any.
    pub ch: Option<char>,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn typed(ch: char) -> Self {
        Self {
            phase: KeyPhase::Typed,
            code: KeyCode::for_char(ch),
            ch: Some(ch),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pressed(ch: char) -> Self {
        Self {
            phase: KeyPhase::Pressed,
            code: KeyCode::for_char(ch),
            ch: Some(ch),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn released(ch: char) -> Self {
        Self {
            phase: KeyPhase::Released,
            code: KeyCode::for_char(ch),
            ch: Some(ch),
            modifiers: Modifiers::NONE,
        }
    }

    /// A key without a character (modifiers, arrows, function keys).
    pub fn key(phase: KeyPhase, code: KeyCode) -> Self {
        Self {
            phase,
            code,
            ch: None,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Checks the event is well-formed. Typed events must carry a character.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.phase == KeyPhase::Typed && self.ch.is_none() {
            return Err(EventError::TypedWithoutChar(self.code));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerPhase {
    Pressed,
    Released,
    Clicked,
    Entered,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    None,
    Primary,
    Secondary,
    Middle,
}

/// A raw pointer event. The position is in world pixel space: the
/// presentation subtracts its own window decorations before forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: IVec2,
    pub button: PointerButton,
    pub click_count: u32,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, x: i32, y: i32) -> Self {
        let (button, click_count) = match phase {
            PointerPhase::Clicked => (PointerButton::Primary, 1),
            PointerPhase::Pressed | PointerPhase::Released => (PointerButton::Primary, 0),
            PointerPhase::Entered | PointerPhase::Exited => (PointerButton::None, 0),
        };
        Self {
            phase,
            position: IVec2::new(x, y),
            button,
            click_count,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn click(x: i32, y: i32) -> Self {
        Self::new(PointerPhase::Clicked, x, y)
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    /// Clicks must count at least one click.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.phase == PointerPhase::Clicked && self.click_count == 0 {
            return Err(EventError::ClickWithoutCount);
        }
        Ok(())
    }
}

/// Lifecycle notifications from the window hosting the active world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowEvent {
    Opened,
    Closing,
    Closed,
    Iconified,
    Deiconified,
    Activated,
    Deactivated,
}

/// Reasons a raw event is rejected at capture time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("typed key event for code {0:?} carries no character")]
    TypedWithoutChar(KeyCode),
    #[error("click event with a click count of zero")]
    ClickWithoutCount,
}
