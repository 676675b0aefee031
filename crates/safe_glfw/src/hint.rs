//! Window hints and their validation
//!
//! Each hint belongs to exactly one value domain, declared once in
//! [`HINT_TABLE`]. [`validate`] is the single entry point that checks a
//! hint/value pair against that table and translates it into the native
//! representation; a rejected pair never reaches the native hint setter.

use std::ffi::CString;
use std::fmt;

use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};

use crate::error::{GlfwError, GlfwResult};
use crate::mapping::{encode_bool, native_enum, NativeEnum};

/// Integer hint value meaning "no preference"
pub const DONT_CARE: i32 = -1;

/// Position hint value meaning "let the window system place the window"
pub const ANY_POSITION: i32 = i32::MIN;

native_enum! {
    /// Window creation hints
    #[serde(rename_all = "snake_case")]
    pub enum WindowHint {
        /// Give the window input focus on creation
        Focused = 0x0002_0001,
        /// Allow the user to resize the window
        Resizable = 0x0002_0003,
        /// Show the window on creation
        Visible = 0x0002_0004,
        /// Draw window decorations
        Decorated = 0x0002_0005,
        /// Iconify a full screen window when it loses focus
        AutoIconify = 0x0002_0006,
        /// Keep the window above other windows
        Floating = 0x0002_0007,
        /// Maximize the window on creation
        Maximized = 0x0002_0008,
        /// Center the cursor over a new full screen window
        CenterCursor = 0x0002_0009,
        /// Make the framebuffer transparent
        TransparentFramebuffer = 0x0002_000A,
        /// Focus the window whenever it is shown
        FocusOnShow = 0x0002_000C,
        /// Let mouse input pass through the window
        MousePassthrough = 0x0002_000D,
        /// Initial x position
        PositionX = 0x0002_000E,
        /// Initial y position
        PositionY = 0x0002_000F,
        /// Red channel depth
        RedBits = 0x0002_1001,
        /// Green channel depth
        GreenBits = 0x0002_1002,
        /// Blue channel depth
        BlueBits = 0x0002_1003,
        /// Alpha channel depth
        AlphaBits = 0x0002_1004,
        /// Depth buffer depth
        DepthBits = 0x0002_1005,
        /// Stencil buffer depth
        StencilBits = 0x0002_1006,
        /// Accumulation buffer red depth
        AccumRedBits = 0x0002_1007,
        /// Accumulation buffer green depth
        AccumGreenBits = 0x0002_1008,
        /// Accumulation buffer blue depth
        AccumBlueBits = 0x0002_1009,
        /// Accumulation buffer alpha depth
        AccumAlphaBits = 0x0002_100A,
        /// Number of auxiliary buffers
        AuxBuffers = 0x0002_100B,
        /// Stereoscopic rendering
        Stereo = 0x0002_100C,
        /// Multisample count
        Samples = 0x0002_100D,
        /// sRGB-capable framebuffer
        SrgbCapable = 0x0002_100E,
        /// Refresh rate of a full screen window
        RefreshRate = 0x0002_100F,
        /// Double buffering
        Doublebuffer = 0x0002_1010,
        /// Client API to create a context for
        ClientApi = 0x0002_2001,
        /// Requested context major version
        ContextVersionMajor = 0x0002_2002,
        /// Requested context minor version
        ContextVersionMinor = 0x0002_2003,
        /// Context robustness strategy
        ContextRobustness = 0x0002_2005,
        /// Forward-compatible OpenGL context
        #[serde(rename = "opengl_forward_compat")]
        OpenGlForwardCompat = 0x0002_2006,
        /// Debug context
        ContextDebug = 0x0002_2007,
        /// OpenGL profile
        #[serde(rename = "opengl_profile")]
        OpenGlProfile = 0x0002_2008,
        /// Context release behavior
        ContextReleaseBehavior = 0x0002_2009,
        /// Context without error reporting
        ContextNoError = 0x0002_200A,
        /// Context creation API
        ContextCreationApi = 0x0002_200B,
        /// Resize the content area with the monitor content scale
        ScaleToMonitor = 0x0002_200C,
        /// Scale the framebuffer on high-DPI displays
        ScaleFramebuffer = 0x0002_200D,
        /// Full resolution framebuffer on Retina displays (legacy name)
        CocoaRetinaFramebuffer = 0x0002_3001,
        /// Frame name for autosaving the window frame (macOS)
        CocoaFrameName = 0x0002_3002,
        /// Automatic graphics switching (macOS)
        CocoaGraphicsSwitching = 0x0002_3003,
        /// ICCCM class name (X11)
        #[serde(rename = "x11_class_name")]
        X11ClassName = 0x0002_4001,
        /// ICCCM instance name (X11)
        #[serde(rename = "x11_instance_name")]
        X11InstanceName = 0x0002_4002,
        /// Alt/F10 keyboard menu (Win32)
        #[serde(rename = "win32_keyboard_menu")]
        Win32KeyboardMenu = 0x0002_5001,
        /// Honour the show command of the process (Win32)
        #[serde(rename = "win32_showdefault")]
        Win32ShowDefault = 0x0002_5002,
        /// Application id (Wayland)
        WaylandAppId = 0x0002_6001,
    }
}

native_enum! {
    /// Values of [`WindowHint::ClientApi`]
    #[serde(rename_all = "snake_case")]
    pub enum ClientApi {
        /// No context (Vulkan and other APIs)
        NoApi = 0,
        /// OpenGL
        #[serde(rename = "opengl")]
        OpenGl = 0x0003_0001,
        /// OpenGL ES
        #[serde(rename = "opengl_es")]
        OpenGlEs = 0x0003_0002,
    }
}

native_enum! {
    /// Values of [`WindowHint::ContextCreationApi`]
    #[serde(rename_all = "snake_case")]
    pub enum ContextCreationApi {
        /// Native platform API
        Native = 0x0003_6001,
        /// EGL
        Egl = 0x0003_6002,
        /// `OSMesa`
        #[serde(rename = "osmesa")]
        OsMesa = 0x0003_6003,
    }
}

native_enum! {
    /// Values of [`WindowHint::ContextRobustness`]
    #[serde(rename_all = "snake_case")]
    pub enum ContextRobustness {
        /// No robustness
        NoRobustness = 0,
        /// Robust, without reset notification
        NoResetNotification = 0x0003_1001,
        /// Robust, losing the context on reset
        LoseContextOnReset = 0x0003_1002,
    }
}

native_enum! {
    /// Values of [`WindowHint::OpenGlProfile`]
    #[serde(rename_all = "snake_case")]
    pub enum OpenGlProfile {
        /// Unspecified profile
        Any = 0,
        /// Core profile
        Core = 0x0003_2001,
        /// Compatibility profile
        Compat = 0x0003_2002,
    }
}

native_enum! {
    /// Values of [`WindowHint::ContextReleaseBehavior`]
    #[serde(rename_all = "snake_case")]
    pub enum ReleaseBehavior {
        /// Platform default
        Any = 0,
        /// Flush the pipeline when the context is released
        Flush = 0x0003_5001,
        /// Do nothing on release
        None = 0x0003_5002,
    }
}

/// Value domain of a hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintDomain {
    /// Native boolean (0 or 1)
    Boolean,
    /// Integer in `min..=max`, or the sentinel if one is declared
    Integer {
        /// Smallest accepted value
        min: i32,
        /// Largest accepted value
        max: i32,
        /// Out-of-range value with a special meaning
        sentinel: Option<i32>,
    },
    /// One of a finite set of codes from one enumeration
    Enumerated {
        /// Enumeration the codes come from
        enumeration: &'static str,
        /// Accepted codes
        codes: &'static [i32],
    },
    /// UTF-8 string without interior NUL
    String,
}

/// One row of the hint table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintRecord {
    /// Hint identifier
    pub hint: WindowHint,
    /// Domain its values must fall in
    pub domain: HintDomain,
}

const BUFFER_BITS: HintDomain = HintDomain::Integer {
    min: 0,
    max: i32::MAX,
    sentinel: Some(DONT_CARE),
};

const POSITION: HintDomain = HintDomain::Integer {
    min: i32::MIN + 1,
    max: i32::MAX,
    sentinel: Some(ANY_POSITION),
};

const fn boolean(hint: WindowHint) -> HintRecord {
    HintRecord {
        hint,
        domain: HintDomain::Boolean,
    }
}

const fn integer(hint: WindowHint, domain: HintDomain) -> HintRecord {
    HintRecord { hint, domain }
}

const fn string(hint: WindowHint) -> HintRecord {
    HintRecord {
        hint,
        domain: HintDomain::String,
    }
}

const fn enumerated<E: NativeEnum>(hint: WindowHint) -> HintRecord {
    HintRecord {
        hint,
        domain: HintDomain::Enumerated {
            enumeration: E::NAME,
            codes: E::CODES,
        },
    }
}

/// Every window hint and its domain
pub static HINT_TABLE: &[HintRecord] = &[
    boolean(WindowHint::Focused),
    boolean(WindowHint::Resizable),
    boolean(WindowHint::Visible),
    boolean(WindowHint::Decorated),
    boolean(WindowHint::AutoIconify),
    boolean(WindowHint::Floating),
    boolean(WindowHint::Maximized),
    boolean(WindowHint::CenterCursor),
    boolean(WindowHint::TransparentFramebuffer),
    boolean(WindowHint::FocusOnShow),
    boolean(WindowHint::MousePassthrough),
    integer(WindowHint::PositionX, POSITION),
    integer(WindowHint::PositionY, POSITION),
    integer(WindowHint::RedBits, BUFFER_BITS),
    integer(WindowHint::GreenBits, BUFFER_BITS),
    integer(WindowHint::BlueBits, BUFFER_BITS),
    integer(WindowHint::AlphaBits, BUFFER_BITS),
    integer(WindowHint::DepthBits, BUFFER_BITS),
    integer(WindowHint::StencilBits, BUFFER_BITS),
    integer(WindowHint::AccumRedBits, BUFFER_BITS),
    integer(WindowHint::AccumGreenBits, BUFFER_BITS),
    integer(WindowHint::AccumBlueBits, BUFFER_BITS),
    integer(WindowHint::AccumAlphaBits, BUFFER_BITS),
    integer(WindowHint::AuxBuffers, BUFFER_BITS),
    boolean(WindowHint::Stereo),
    integer(WindowHint::Samples, BUFFER_BITS),
    boolean(WindowHint::SrgbCapable),
    integer(WindowHint::RefreshRate, BUFFER_BITS),
    boolean(WindowHint::Doublebuffer),
    enumerated::<ClientApi>(WindowHint::ClientApi),
    integer(
        WindowHint::ContextVersionMajor,
        HintDomain::Integer { min: 1, max: 4, sentinel: None },
    ),
    integer(
        WindowHint::ContextVersionMinor,
        HintDomain::Integer { min: 0, max: 6, sentinel: None },
    ),
    enumerated::<ContextRobustness>(WindowHint::ContextRobustness),
    boolean(WindowHint::OpenGlForwardCompat),
    boolean(WindowHint::ContextDebug),
    enumerated::<OpenGlProfile>(WindowHint::OpenGlProfile),
    enumerated::<ReleaseBehavior>(WindowHint::ContextReleaseBehavior),
    boolean(WindowHint::ContextNoError),
    enumerated::<ContextCreationApi>(WindowHint::ContextCreationApi),
    boolean(WindowHint::ScaleToMonitor),
    boolean(WindowHint::ScaleFramebuffer),
    boolean(WindowHint::CocoaRetinaFramebuffer),
    string(WindowHint::CocoaFrameName),
    boolean(WindowHint::CocoaGraphicsSwitching),
    string(WindowHint::X11ClassName),
    string(WindowHint::X11InstanceName),
    boolean(WindowHint::Win32KeyboardMenu),
    boolean(WindowHint::Win32ShowDefault),
    string(WindowHint::WaylandAppId),
];

impl WindowHint {
    /// Table row for this hint
    pub fn record(self) -> &'static HintRecord {
        HINT_TABLE
            .iter()
            .find(|record| record.hint == self)
            .unwrap_or_else(|| unreachable!("{self:?} is missing from the hint table"))
    }

    /// Domain of this hint
    pub fn domain(self) -> HintDomain {
        self.record().domain
    }
}

/// A hint value, tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintValue {
    /// Boolean
    Bool(bool),
    /// Plain integer
    Int(i32),
    /// Code of a typed enumeration
    Enum {
        /// Enumeration the code belongs to
        enumeration: &'static str,
        /// Native code
        code: i32,
    },
    /// String
    Str(String),
}

impl HintValue {
    /// Tag a typed enumeration value
    pub fn from_enum<T: NativeEnum>(value: T) -> Self {
        Self::Enum {
            enumeration: T::NAME,
            code: value.to_native(),
        }
    }
}

impl fmt::Display for HintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Enum { enumeration, code } => write!(f, "{enumeration}(0x{code:X})"),
            Self::Str(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<bool> for HintValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for HintValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for HintValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for HintValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<ClientApi> for HintValue {
    fn from(value: ClientApi) -> Self {
        Self::from_enum(value)
    }
}

impl From<ContextCreationApi> for HintValue {
    fn from(value: ContextCreationApi) -> Self {
        Self::from_enum(value)
    }
}

impl From<ContextRobustness> for HintValue {
    fn from(value: ContextRobustness) -> Self {
        Self::from_enum(value)
    }
}

impl From<OpenGlProfile> for HintValue {
    fn from(value: OpenGlProfile) -> Self {
        Self::from_enum(value)
    }
}

impl From<ReleaseBehavior> for HintValue {
    fn from(value: ReleaseBehavior) -> Self {
        Self::from_enum(value)
    }
}

/// A validated hint value in native form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeHintValue {
    /// Passed to the integer hint setter
    Int(i32),
    /// Passed to the string hint setter
    Str(CString),
}

fn reject(hint: WindowHint, value: &HintValue, reason: impl Into<String>) -> GlfwError {
    GlfwError::Configuration {
        key: format!("{hint:?}"),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Check a hint/value pair against the hint table and translate it
pub fn validate(hint: WindowHint, value: &HintValue) -> GlfwResult<NativeHintValue> {
    match (hint.domain(), value) {
        (HintDomain::Boolean, HintValue::Bool(on)) => Ok(NativeHintValue::Int(encode_bool(*on))),
        (HintDomain::Boolean, HintValue::Int(raw @ (0 | 1))) => Ok(NativeHintValue::Int(*raw)),
        (HintDomain::Boolean, _) => Err(reject(hint, value, "expects a boolean (true/false or 0/1)")),

        (HintDomain::Integer { min, max, sentinel }, HintValue::Int(raw)) => {
            if (min..=max).contains(raw) || sentinel == Some(*raw) {
                Ok(NativeHintValue::Int(*raw))
            } else {
                let reason = match sentinel {
                    Some(sentinel) => format!("expects an integer in {min}..={max} or {sentinel}"),
                    None => format!("expects an integer in {min}..={max}"),
                };
                Err(reject(hint, value, reason))
            }
        }
        (HintDomain::Integer { .. }, _) => Err(reject(hint, value, "expects an integer")),

        (HintDomain::Enumerated { enumeration, codes }, HintValue::Enum { enumeration: given, code }) => {
            if *given != enumeration {
                Err(reject(hint, value, format!("expects a {enumeration} value, got {given}")))
            } else if codes.contains(code) {
                Ok(NativeHintValue::Int(*code))
            } else {
                Err(reject(hint, value, format!("is not an accepted {enumeration} code")))
            }
        }
        (HintDomain::Enumerated { enumeration, codes }, HintValue::Int(code)) => {
            if codes.contains(code) {
                Ok(NativeHintValue::Int(*code))
            } else {
                Err(reject(hint, value, format!("is not an accepted {enumeration} code")))
            }
        }
        (HintDomain::Enumerated { enumeration, .. }, _) => {
            Err(reject(hint, value, format!("expects a {enumeration} value")))
        }

        (HintDomain::String, HintValue::Str(text)) => CString::new(text.as_str())
            .map(NativeHintValue::Str)
            .map_err(|_| reject(hint, value, "string contains an interior NUL byte")),
        (HintDomain::String, _) => Err(reject(hint, value, "expects a string")),
    }
}

/// A hint value as written in a configuration file
///
/// Enumerated hints are written by name (`client_api = "no_api"`) and
/// resolved against the hint's enumeration by [`HintSetting::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HintSetting {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Enumeration value name or string hint value
    Text(String),
}

fn enum_by_name<T>(hint: WindowHint, name: &str) -> GlfwResult<HintValue>
where
    T: NativeEnum + for<'de> Deserialize<'de>,
{
    let deserializer: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
        name.into_deserializer();
    T::deserialize(deserializer)
        .map(HintValue::from_enum)
        .map_err(|err| GlfwError::configuration(format!("{hint:?}"), name, err.to_string()))
}

impl HintSetting {
    /// Resolve into a typed value for `hint`
    ///
    /// Only the textual form needs the hint: names map to the hint's
    /// enumeration, anything else is passed through for [`validate`] to judge.
    pub fn resolve(&self, hint: WindowHint) -> GlfwResult<HintValue> {
        match self {
            Self::Bool(value) => Ok(HintValue::Bool(*value)),
            Self::Int(value) => Ok(HintValue::Int(*value)),
            Self::Text(text) => match hint {
                WindowHint::ClientApi => enum_by_name::<ClientApi>(hint, text),
                WindowHint::ContextCreationApi => enum_by_name::<ContextCreationApi>(hint, text),
                WindowHint::ContextRobustness => enum_by_name::<ContextRobustness>(hint, text),
                WindowHint::OpenGlProfile => enum_by_name::<OpenGlProfile>(hint, text),
                WindowHint::ContextReleaseBehavior => enum_by_name::<ReleaseBehavior>(hint, text),
                _ => Ok(HintValue::Str(text.clone())),
            },
        }
    }
}
