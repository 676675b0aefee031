//! Keyboard, mouse and input-mode types

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{GlfwError, GlfwResult};
use crate::mapping::{decode, decode_bool, encode_bool, native_enum, NativeEnum};

native_enum! {
    /// Key and button actions
    pub enum Action {
        /// The key or button was released
        Release = 0,
        /// The key or button was pressed
        Press = 1,
        /// The key was held down until it repeated
        Repeat = 2,
    }
}

/// Mouse buttons
///
/// The first eight buttons have names. Platforms that report more (see
/// [`InputMode::UnlimitedMouseButtons`]) deliver them as [`MouseButton::Other`]
/// with their zero-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MouseButton {
    /// Left mouse button (button 1)
    Left,
    /// Right mouse button (button 2)
    Right,
    /// Middle mouse button (button 3)
    Middle,
    /// Button 4
    Button4,
    /// Button 5
    Button5,
    /// Button 6
    Button6,
    /// Button 7
    Button7,
    /// Button 8
    Button8,
    /// A button beyond the eighth, by zero-based index
    Other(u32),
}

impl MouseButton {
    const NAMED: [Self; 8] = [
        Self::Left,
        Self::Right,
        Self::Middle,
        Self::Button4,
        Self::Button5,
        Self::Button6,
        Self::Button7,
        Self::Button8,
    ];

    /// Native button index
    pub fn to_native(self) -> i32 {
        match self {
            Self::Other(index) => i32::try_from(index).unwrap_or(i32::MAX),
            named => Self::NAMED.iter().position(|&button| button == named).map_or(0, |index| index as i32),
        }
    }

    /// Button for a native index; negative indices fail to decode
    pub fn from_native(code: i32) -> GlfwResult<Self> {
        let index = u32::try_from(code).map_err(|_| GlfwError::Decode {
            enumeration: "MouseButton",
            code,
        })?;
        Ok(Self::NAMED.get(index as usize).copied().unwrap_or(Self::Other(index)))
    }

    /// Whether the native library keeps pollable state for this button
    pub const fn is_named(self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

native_enum! {
    /// Keyboard keys, named after the US layout
    pub enum Key {
        /// A key the platform could not map
        Unknown = -1,
        /// Space
        Space = 32,
        /// '
        Apostrophe = 39,
        /// ,
        Comma = 44,
        /// -
        Minus = 45,
        /// .
        Period = 46,
        /// /
        Slash = 47,
        /// 0
        Num0 = 48,
        /// 1
        Num1 = 49,
        /// 2
        Num2 = 50,
        /// 3
        Num3 = 51,
        /// 4
        Num4 = 52,
        /// 5
        Num5 = 53,
        /// 6
        Num6 = 54,
        /// 7
        Num7 = 55,
        /// 8
        Num8 = 56,
        /// 9
        Num9 = 57,
        /// ;
        Semicolon = 59,
        /// =
        Equal = 61,
        /// A key
        A = 65,
        /// B key
        B = 66,
        /// C key
        C = 67,
        /// D key
        D = 68,
        /// E key
        E = 69,
        /// F key
        F = 70,
        /// G key
        G = 71,
        /// H key
        H = 72,
        /// I key
        I = 73,
        /// J key
        J = 74,
        /// K key
        K = 75,
        /// L key
        L = 76,
        /// M key
        M = 77,
        /// N key
        N = 78,
        /// O key
        O = 79,
        /// P key
        P = 80,
        /// Q key
        Q = 81,
        /// R key
        R = 82,
        /// S key
        S = 83,
        /// T key
        T = 84,
        /// U key
        U = 85,
        /// V key
        V = 86,
        /// W key
        W = 87,
        /// X key
        X = 88,
        /// Y key
        Y = 89,
        /// Z key
        Z = 90,
        /// [
        LeftBracket = 91,
        /// \
        Backslash = 92,
        /// ]
        RightBracket = 93,
        /// `
        GraveAccent = 96,
        /// Non-US #1
        World1 = 161,
        /// Non-US #2
        World2 = 162,
        /// Escape
        Escape = 256,
        /// Enter
        Enter = 257,
        /// Tab
        Tab = 258,
        /// Backspace
        Backspace = 259,
        /// Insert
        Insert = 260,
        /// Delete
        Delete = 261,
        /// Right arrow
        Right = 262,
        /// Left arrow
        Left = 263,
        /// Down arrow
        Down = 264,
        /// Up arrow
        Up = 265,
        /// Page up
        PageUp = 266,
        /// Page down
        PageDown = 267,
        /// Home
        Home = 268,
        /// End
        End = 269,
        /// Caps lock
        CapsLock = 280,
        /// Scroll lock
        ScrollLock = 281,
        /// Num lock
        NumLock = 282,
        /// Print screen
        PrintScreen = 283,
        /// Pause
        Pause = 284,
        /// F1
        F1 = 290,
        /// F2
        F2 = 291,
        /// F3
        F3 = 292,
        /// F4
        F4 = 293,
        /// F5
        F5 = 294,
        /// F6
        F6 = 295,
        /// F7
        F7 = 296,
        /// F8
        F8 = 297,
        /// F9
        F9 = 298,
        /// F10
        F10 = 299,
        /// F11
        F11 = 300,
        /// F12
        F12 = 301,
        /// F13
        F13 = 302,
        /// F14
        F14 = 303,
        /// F15
        F15 = 304,
        /// F16
        F16 = 305,
        /// F17
        F17 = 306,
        /// F18
        F18 = 307,
        /// F19
        F19 = 308,
        /// F20
        F20 = 309,
        /// F21
        F21 = 310,
        /// F22
        F22 = 311,
        /// F23
        F23 = 312,
        /// F24
        F24 = 313,
        /// F25
        F25 = 314,
        /// Keypad 0
        Kp0 = 320,
        /// Keypad 1
        Kp1 = 321,
        /// Keypad 2
        Kp2 = 322,
        /// Keypad 3
        Kp3 = 323,
        /// Keypad 4
        Kp4 = 324,
        /// Keypad 5
        Kp5 = 325,
        /// Keypad 6
        Kp6 = 326,
        /// Keypad 7
        Kp7 = 327,
        /// Keypad 8
        Kp8 = 328,
        /// Keypad 9
        Kp9 = 329,
        /// Keypad .
        KpDecimal = 330,
        /// Keypad /
        KpDivide = 331,
        /// Keypad *
        KpMultiply = 332,
        /// Keypad -
        KpSubtract = 333,
        /// Keypad +
        KpAdd = 334,
        /// Keypad enter
        KpEnter = 335,
        /// Keypad =
        KpEqual = 336,
        /// Left shift
        LeftShift = 340,
        /// Left control
        LeftControl = 341,
        /// Left alt
        LeftAlt = 342,
        /// Left super
        LeftSuper = 343,
        /// Right shift
        RightShift = 344,
        /// Right control
        RightControl = 345,
        /// Right alt
        RightAlt = 346,
        /// Right super
        RightSuper = 347,
        /// Menu
        Menu = 348,
    }
}

bitflags! {
    /// Modifier keys held during a key or mouse button event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: i32 {
        /// A shift key was held
        const SHIFT = 0x0001;
        /// A control key was held
        const CONTROL = 0x0002;
        /// An alt key was held
        const ALT = 0x0004;
        /// A super key was held
        const SUPER = 0x0008;
        /// Caps lock was on (requires the lock-key-mods input mode)
        const CAPS_LOCK = 0x0010;
        /// Num lock was on (requires the lock-key-mods input mode)
        const NUM_LOCK = 0x0020;
    }
}

impl Modifiers {
    /// Decode native modifier bits; bits outside the declared set are dropped
    pub fn from_native(bits: i32) -> Self {
        let mods = Self::from_bits_truncate(bits);
        if mods.bits() != bits {
            log::trace!("dropping undeclared modifier bits {:#x}", bits & !Self::all().bits());
        }
        mods
    }
}

native_enum! {
    /// Per-window input modes
    pub enum InputMode {
        /// Cursor visibility and capture
        Cursor = 0x0003_3001,
        /// Key presses stay reported until polled
        StickyKeys = 0x0003_3002,
        /// Mouse button presses stay reported until polled
        StickyMouseButtons = 0x0003_3003,
        /// Report caps/num lock in modifier bits
        LockKeyMods = 0x0003_3004,
        /// Unscaled, unaccelerated mouse motion while the cursor is disabled
        RawMouseMotion = 0x0003_3005,
        /// Report buttons beyond the last named one
        UnlimitedMouseButtons = 0x0003_3006,
    }
}

native_enum! {
    /// Values of the cursor input mode
    pub enum CursorMode {
        /// Visible and free
        Normal = 0x0003_4001,
        /// Hidden while over the content area
        Hidden = 0x0003_4002,
        /// Hidden and locked to the window, for virtual camera control
        Disabled = 0x0003_4003,
        /// Visible but confined to the content area
        Captured = 0x0003_4004,
    }
}

/// A typed input mode together with its value
///
/// Pairing the mode with its value makes mismatches (a cursor mode on a
/// boolean mode, or the reverse) unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModeSetting {
    /// Cursor mode
    Cursor(CursorMode),
    /// Sticky keys on/off
    StickyKeys(bool),
    /// Sticky mouse buttons on/off
    StickyMouseButtons(bool),
    /// Lock-key modifier reporting on/off
    LockKeyMods(bool),
    /// Raw mouse motion on/off
    RawMouseMotion(bool),
    /// Unlimited mouse buttons on/off
    UnlimitedMouseButtons(bool),
}

impl InputModeSetting {
    /// The mode this setting applies to
    pub const fn mode(self) -> InputMode {
        match self {
            Self::Cursor(_) => InputMode::Cursor,
            Self::StickyKeys(_) => InputMode::StickyKeys,
            Self::StickyMouseButtons(_) => InputMode::StickyMouseButtons,
            Self::LockKeyMods(_) => InputMode::LockKeyMods,
            Self::RawMouseMotion(_) => InputMode::RawMouseMotion,
            Self::UnlimitedMouseButtons(_) => InputMode::UnlimitedMouseButtons,
        }
    }

    /// Native (mode, value) pair
    pub fn to_native(self) -> (i32, i32) {
        let value = match self {
            Self::Cursor(mode) => mode.to_native(),
            Self::StickyKeys(on)
            | Self::StickyMouseButtons(on)
            | Self::LockKeyMods(on)
            | Self::RawMouseMotion(on)
            | Self::UnlimitedMouseButtons(on) => encode_bool(on),
        };
        (self.mode().to_native(), value)
    }

    /// Rebuild a setting from the native value reported for `mode`
    pub fn from_native(mode: InputMode, value: i32) -> GlfwResult<Self> {
        Ok(match mode {
            InputMode::Cursor => Self::Cursor(decode(value)?),
            InputMode::StickyKeys => Self::StickyKeys(decode_bool(value)?),
            InputMode::StickyMouseButtons => Self::StickyMouseButtons(decode_bool(value)?),
            InputMode::LockKeyMods => Self::LockKeyMods(decode_bool(value)?),
            InputMode::RawMouseMotion => Self::RawMouseMotion(decode_bool(value)?),
            InputMode::UnlimitedMouseButtons => Self::UnlimitedMouseButtons(decode_bool(value)?),
        })
    }
}

/// Reject [`Key::Unknown`] where a concrete key is required
pub(crate) fn require_known_key(key: Key) -> GlfwResult<i32> {
    if key == Key::Unknown {
        return Err(GlfwError::configuration(
            "key",
            key,
            "the unknown key cannot be queried",
        ));
    }
    Ok(key.to_native())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_round_trip<T: NativeEnum + std::fmt::Debug>() {
        for &value in T::ALL {
            assert_eq!(decode::<T>(value.to_native()).unwrap(), value);
        }
    }

    #[test]
    fn test_enumerations_round_trip() {
        assert_round_trip::<Action>();
        assert_round_trip::<Key>();
        assert_round_trip::<InputMode>();
        assert_round_trip::<CursorMode>();
    }

    #[test]
    fn test_documented_key_codes_decode() {
        // Every code the native layer documents for keys, encoded back unchanged.
        let documented = [-1, 32, 39, 65, 90, 96, 161, 162, 256, 269, 280, 284, 290, 314, 320, 336, 340, 348];
        for code in documented {
            let key: Key = decode(code).unwrap();
            assert_eq!(key.to_native(), code);
        }
        assert!(decode::<Key>(33).is_err());
    }

    #[test]
    fn test_mouse_button_indices() {
        for (index, button) in MouseButton::NAMED.into_iter().enumerate() {
            assert_eq!(button.to_native(), index as i32);
            assert_eq!(MouseButton::from_native(index as i32).unwrap(), button);
        }
        assert_eq!(MouseButton::from_native(8).unwrap(), MouseButton::Other(8));
        assert_eq!(MouseButton::Other(11).to_native(), 11);
        assert!(matches!(MouseButton::from_native(-1), Err(GlfwError::Decode { code: -1, .. })));
    }

    #[test]
    fn test_escape_code() {
        assert_eq!(Key::Escape.to_native(), 256);
        assert_eq!(decode::<Action>(1).unwrap(), Action::Press);
    }

    #[test]
    fn test_modifier_bits() {
        let mods = Modifiers::from_native(0x0001 | 0x0004);
        assert!(mods.contains(Modifiers::SHIFT | Modifiers::ALT));
        assert!(!mods.contains(Modifiers::CONTROL));

        let truncated = Modifiers::from_native(0x0100 | 0x0002);
        assert_eq!(truncated, Modifiers::CONTROL);
    }

    #[test]
    fn test_input_mode_setting_round_trip() {
        let settings = [
            InputModeSetting::Cursor(CursorMode::Disabled),
            InputModeSetting::StickyKeys(true),
            InputModeSetting::RawMouseMotion(false),
        ];
        for setting in settings {
            let (mode, value) = setting.to_native();
            let mode = decode::<InputMode>(mode).unwrap();
            assert_eq!(InputModeSetting::from_native(mode, value).unwrap(), setting);
        }
    }

    #[test]
    fn test_input_mode_rejects_mismatched_value() {
        assert!(InputModeSetting::from_native(InputMode::StickyKeys, 0x0003_4001).is_err());
        assert!(InputModeSetting::from_native(InputMode::Cursor, 1).is_err());
    }

    #[test]
    fn test_unknown_key_is_not_queryable() {
        assert!(require_known_key(Key::Unknown).is_err());
        assert_eq!(require_known_key(Key::Space).unwrap(), 32);
    }
}
