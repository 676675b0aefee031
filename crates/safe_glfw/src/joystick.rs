//! Joysticks and gamepads
//!
//! Joysticks live in sixteen fixed native slots. A [`Joystick`] names a slot;
//! every query asks the native layer whether something is connected there.

use std::marker::PhantomData;
use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorChannel, GlfwResult};
use crate::input::Action;
use crate::mapping::{native_enum, NativeEnum};
use crate::session::{self, Session};

native_enum! {
    /// Native joystick slots
    pub enum JoystickId {
        /// Slot 1
        Joystick1 = 0,
        /// Slot 2
        Joystick2 = 1,
        /// Slot 3
        Joystick3 = 2,
        /// Slot 4
        Joystick4 = 3,
        /// Slot 5
        Joystick5 = 4,
        /// Slot 6
        Joystick6 = 5,
        /// Slot 7
        Joystick7 = 6,
        /// Slot 8
        Joystick8 = 7,
        /// Slot 9
        Joystick9 = 8,
        /// Slot 10
        Joystick10 = 9,
        /// Slot 11
        Joystick11 = 10,
        /// Slot 12
        Joystick12 = 11,
        /// Slot 13
        Joystick13 = 12,
        /// Slot 14
        Joystick14 = 13,
        /// Slot 15
        Joystick15 = 14,
        /// Slot 16
        Joystick16 = 15,
    }
}

native_enum! {
    /// Buttons of the standard gamepad layout
    pub enum GamepadButton {
        /// Bottom face button (Cross on PlayStation layouts)
        A = 0,
        /// Right face button (Circle)
        B = 1,
        /// Left face button (Square)
        X = 2,
        /// Top face button (Triangle)
        Y = 3,
        /// Left shoulder
        LeftBumper = 4,
        /// Right shoulder
        RightBumper = 5,
        /// Back / select
        Back = 6,
        /// Start
        Start = 7,
        /// Guide / home
        Guide = 8,
        /// Left stick press
        LeftThumb = 9,
        /// Right stick press
        RightThumb = 10,
        /// D-pad up
        DpadUp = 11,
        /// D-pad right
        DpadRight = 12,
        /// D-pad down
        DpadDown = 13,
        /// D-pad left
        DpadLeft = 14,
    }
}

native_enum! {
    /// Axes of the standard gamepad layout
    pub enum GamepadAxis {
        /// Left stick horizontal
        LeftX = 0,
        /// Left stick vertical
        LeftY = 1,
        /// Right stick horizontal
        RightX = 2,
        /// Right stick vertical
        RightY = 3,
        /// Left trigger
        LeftTrigger = 4,
        /// Right trigger
        RightTrigger = 5,
    }
}

bitflags! {
    /// Direction bits of a joystick hat; empty when centered
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct JoystickHat: u8 {
        /// Up
        const UP = 0x01;
        /// Right
        const RIGHT = 0x02;
        /// Down
        const DOWN = 0x04;
        /// Left
        const LEFT = 0x08;
    }
}

/// Gamepad state mapped onto the standard layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamepadState {
    buttons: [Action; 15],
    axes: [f32; 6],
}

impl GamepadState {
    /// Action of one button; never [`Action::Repeat`]
    pub fn button(&self, button: GamepadButton) -> Action {
        self.buttons[slot_index(button.to_native())]
    }

    /// Value of one axis in -1.0..=1.0
    pub fn axis(&self, axis: GamepadAxis) -> f32 {
        self.axes[slot_index(axis.to_native())]
    }
}

fn slot_index(code: i32) -> usize {
    usize::try_from(code).unwrap_or_default()
}

fn action_from_byte(value: u8) -> Action {
    if value == 0 {
        Action::Release
    } else {
        Action::Press
    }
}

/// A joystick slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Joystick {
    id: JoystickId,
    _not_send: PhantomData<*const ()>,
}

impl Joystick {
    /// Refer to a slot; nothing needs to be connected there
    pub const fn new(id: JoystickId) -> Self {
        Self {
            id,
            _not_send: PhantomData,
        }
    }

    /// Every slot with a joystick connected
    pub fn connected() -> GlfwResult<Vec<Self>> {
        let session = session::require()?;
        Ok(JoystickId::ALL
            .iter()
            .filter(|id| session.native().joystick_present(id.to_native()))
            .map(|&id| Self::new(id))
            .collect())
    }

    /// Slot this joystick refers to
    pub const fn id(&self) -> JoystickId {
        self.id
    }

    fn query(&self) -> GlfwResult<(Rc<Session>, i32)> {
        Ok((session::require()?, self.id.to_native()))
    }

    /// Whether a joystick is connected in this slot
    pub fn is_present(&self) -> GlfwResult<bool> {
        let (session, jid) = self.query()?;
        Ok(session.native().joystick_present(jid))
    }

    /// Name; `None` when nothing is connected
    pub fn name(&self) -> GlfwResult<Option<String>> {
        let (session, jid) = self.query()?;
        Ok(session.native().joystick_name(jid))
    }

    /// SDL-compatible GUID; `None` when nothing is connected
    pub fn guid(&self) -> GlfwResult<Option<String>> {
        let (session, jid) = self.query()?;
        Ok(session.native().joystick_guid(jid))
    }

    /// Axis values; empty when nothing is connected
    pub fn axes(&self) -> GlfwResult<Vec<f32>> {
        let (session, jid) = self.query()?;
        Ok(session.native().joystick_axes(jid))
    }

    /// Button actions; empty when nothing is connected
    pub fn buttons(&self) -> GlfwResult<Vec<Action>> {
        let (session, jid) = self.query()?;
        Ok(session.native().joystick_buttons(jid).into_iter().map(action_from_byte).collect())
    }

    /// Hat directions; empty when nothing is connected
    pub fn hats(&self) -> GlfwResult<Vec<JoystickHat>> {
        let (session, jid) = self.query()?;
        Ok(session
            .native()
            .joystick_hats(jid)
            .into_iter()
            .map(JoystickHat::from_bits_truncate)
            .collect())
    }

    /// Whether the joystick has a gamepad mapping
    pub fn is_gamepad(&self) -> GlfwResult<bool> {
        let (session, jid) = self.query()?;
        Ok(session.native().joystick_is_gamepad(jid))
    }

    /// Name of the gamepad mapping
    pub fn gamepad_name(&self) -> GlfwResult<Option<String>> {
        let (session, jid) = self.query()?;
        Ok(session.native().gamepad_name(jid))
    }

    /// Gamepad state; `None` when not connected or not mapped
    ///
    /// A native error raised by the query is reported as a platform error.
    pub fn gamepad_state(&self) -> GlfwResult<Option<GamepadState>> {
        let (session, jid) = self.query()?;
        ErrorChannel::clear();
        let Some(raw) = session.native().gamepad_state(jid) else {
            return ErrorChannel::take().map_or(Ok(None), |error| Err(error.into_platform()));
        };
        Ok(Some(GamepadState {
            buttons: raw.buttons.map(action_from_byte),
            axes: raw.axes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GlfwError;
    use crate::native::{MockNative, RawGamepadState};
    use crate::session::Library;
    use approx::assert_relative_eq;

    #[test]
    fn test_queries_require_session() {
        let joystick = Joystick::new(JoystickId::Joystick1);
        assert!(matches!(joystick.is_present(), Err(GlfwError::NotInitialized)));
    }

    #[test]
    fn test_absent_joystick() {
        let _serial = crate::session::serial();
        let _library = Library::init(MockNative::new()).unwrap();
        let joystick = Joystick::new(JoystickId::Joystick3);
        assert!(!joystick.is_present().unwrap());
        assert!(joystick.name().unwrap().is_none());
        assert!(joystick.axes().unwrap().is_empty());
        assert!(joystick.gamepad_state().unwrap().is_none());
    }

    #[test]
    fn test_connected_gamepad() {
        let _serial = crate::session::serial();
        let mock = MockNative::new();
        let mut state = RawGamepadState::default();
        state.buttons[GamepadButton::Start.to_native() as usize] = 1;
        state.axes[GamepadAxis::RightTrigger.to_native() as usize] = 0.5;
        mock.connect_joystick(2, "Pad", vec![0.25, -1.0], vec![1, 0], vec![0x03]);
        mock.map_gamepad(2, "Xbox Controller", state);
        let _library = Library::init(mock.clone()).unwrap();

        assert_eq!(Joystick::connected().unwrap(), [Joystick::new(JoystickId::Joystick3)]);

        let joystick = Joystick::new(JoystickId::Joystick3);
        assert_eq!(joystick.name().unwrap().as_deref(), Some("Pad"));
        assert_eq!(joystick.buttons().unwrap(), [Action::Press, Action::Release]);
        assert_eq!(joystick.hats().unwrap(), [JoystickHat::UP | JoystickHat::RIGHT]);
        assert!(joystick.is_gamepad().unwrap());

        let gamepad = joystick.gamepad_state().unwrap().unwrap();
        assert_eq!(gamepad.button(GamepadButton::Start), Action::Press);
        assert_eq!(gamepad.button(GamepadButton::A), Action::Release);
        assert_relative_eq!(gamepad.axis(GamepadAxis::RightTrigger), 0.5);
    }
}
