//! Contract of the native windowing library
//!
//! [`NativeLibrary`] mirrors the C API one call per entry point: raw handles
//! in, raw handles or plain values out, a single global callback slot per
//! event category, a per-window user-data slot and an out-of-band error
//! query. Nothing here validates or owns anything; that is the job of the
//! wrappers built on top.
//!
//! Two implementations exist: [`MockNative`], an instrumented in-memory
//! library used for headless testing, and the GLFW backend behind the
//! `glfw-backend` feature.

use std::ffi::{c_char, c_int, c_uint, c_void, CStr};
use std::sync::Arc;

pub mod mock;

#[cfg(feature = "glfw-backend")]
pub(crate) mod glfw;

pub use mock::{MockCall, MockEvent, MockNative};

/// Opaque native window
#[repr(C)]
pub struct RawWindow {
    _private: [u8; 0],
}

/// Opaque native cursor
#[repr(C)]
pub struct RawCursor {
    _private: [u8; 0],
}

/// Opaque native monitor
#[repr(C)]
pub struct RawMonitor {
    _private: [u8; 0],
}

/// Image layout expected by the native cursor and icon setters
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawImage {
    /// Width in pixels
    pub width: c_int,
    /// Height in pixels
    pub height: c_int,
    /// RGBA8 pixels, row-major, top-left first
    pub pixels: *const u8,
}

/// Video mode as reported by the native layer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawVideoMode {
    /// Width in screen coordinates
    pub width: c_int,
    /// Height in screen coordinates
    pub height: c_int,
    /// Red channel bit depth
    pub red_bits: c_int,
    /// Green channel bit depth
    pub green_bits: c_int,
    /// Blue channel bit depth
    pub blue_bits: c_int,
    /// Refresh rate in Hz
    pub refresh_rate: c_int,
}

/// Gamepad state as reported by the native layer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawGamepadState {
    /// Button actions, indexed by gamepad button code
    pub buttons: [u8; 15],
    /// Axis values in -1.0..=1.0, indexed by gamepad axis code
    pub axes: [f32; 6],
}

/// Gamma ramp channels, one entry per ramp step
///
/// The native layout keeps three pointers and a shared size; this copy owns
/// its channels, so their lengths are checked before it crosses back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawGammaRamp {
    /// Red channel
    pub red: Vec<u16>,
    /// Green channel
    pub green: Vec<u16>,
    /// Blue channel
    pub blue: Vec<u16>,
}

/// Key callback: window, key, scancode, action, mods
pub type KeyFn = extern "C" fn(*mut RawWindow, c_int, c_int, c_int, c_int);
/// Character callback: window, codepoint
pub type CharFn = extern "C" fn(*mut RawWindow, c_uint);
/// Mouse button callback: window, button, action, mods
pub type MouseButtonFn = extern "C" fn(*mut RawWindow, c_int, c_int, c_int);
/// Cursor position callback: window, x, y
pub type CursorPosFn = extern "C" fn(*mut RawWindow, f64, f64);
/// Cursor enter callback: window, entered
pub type CursorEnterFn = extern "C" fn(*mut RawWindow, c_int);
/// Scroll callback: window, x offset, y offset
pub type ScrollFn = extern "C" fn(*mut RawWindow, f64, f64);
/// Window position callback: window, x, y
pub type WindowPosFn = extern "C" fn(*mut RawWindow, c_int, c_int);
/// Window size callback: window, width, height
pub type WindowSizeFn = extern "C" fn(*mut RawWindow, c_int, c_int);
/// Window close request callback
pub type WindowCloseFn = extern "C" fn(*mut RawWindow);
/// Window refresh callback
pub type WindowRefreshFn = extern "C" fn(*mut RawWindow);
/// Window focus callback: window, focused
pub type WindowFocusFn = extern "C" fn(*mut RawWindow, c_int);
/// Window iconify callback: window, iconified
pub type WindowIconifyFn = extern "C" fn(*mut RawWindow, c_int);
/// Window maximize callback: window, maximized
pub type WindowMaximizeFn = extern "C" fn(*mut RawWindow, c_int);
/// Framebuffer size callback: window, width, height
pub type FramebufferSizeFn = extern "C" fn(*mut RawWindow, c_int, c_int);
/// Content scale callback: window, x scale, y scale
pub type ContentScaleFn = extern "C" fn(*mut RawWindow, f32, f32);
/// File drop callback: window, path count, UTF-8 paths
pub type DropFn = extern "C" fn(*mut RawWindow, c_int, *mut *const c_char);
/// Monitor connection callback: monitor, event
pub type MonitorFn = extern "C" fn(*mut RawMonitor, c_int);
/// Joystick connection callback: joystick id, event
pub type JoystickFn = extern "C" fn(c_int, c_int);
/// Error callback: code, description
pub type ErrorFn = extern "C" fn(c_int, *const c_char);

/// Event categories, one native callback slot each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Key press/release/repeat
    Key,
    /// Unicode character input
    Char,
    /// Mouse button press/release
    MouseButton,
    /// Cursor movement
    CursorPos,
    /// Cursor entering or leaving the content area
    CursorEnter,
    /// Scroll wheel or touchpad scroll
    Scroll,
    /// Window moved
    WindowPos,
    /// Window resized
    WindowSize,
    /// Close requested
    WindowClose,
    /// Contents need redrawing
    WindowRefresh,
    /// Focus gained or lost
    WindowFocus,
    /// Iconified or restored
    WindowIconify,
    /// Maximized or restored
    WindowMaximize,
    /// Framebuffer resized
    FramebufferSize,
    /// Content scale changed
    ContentScale,
    /// Files dropped on the window
    Drop,
    /// Monitor connected or disconnected
    Monitor,
    /// Joystick connected or disconnected
    Joystick,
    /// Native error reported
    Error,
}

impl EventKind {
    /// Every category
    pub const ALL: [Self; 19] = [
        Self::Key,
        Self::Char,
        Self::MouseButton,
        Self::CursorPos,
        Self::CursorEnter,
        Self::Scroll,
        Self::WindowPos,
        Self::WindowSize,
        Self::WindowClose,
        Self::WindowRefresh,
        Self::WindowFocus,
        Self::WindowIconify,
        Self::WindowMaximize,
        Self::FramebufferSize,
        Self::ContentScale,
        Self::Drop,
        Self::Monitor,
        Self::Joystick,
        Self::Error,
    ];

    /// Whether the native library keeps this callback per window
    pub const fn is_per_window(self) -> bool {
        !matches!(self, Self::Monitor | Self::Joystick | Self::Error)
    }
}

/// A native callback slot value, tagged with its category
///
/// `None` clears the slot. [`NativeLibrary::set_callback`] returns the
/// previous value of the same category.
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub enum RawCallback {
    Key(Option<KeyFn>),
    Char(Option<CharFn>),
    MouseButton(Option<MouseButtonFn>),
    CursorPos(Option<CursorPosFn>),
    CursorEnter(Option<CursorEnterFn>),
    Scroll(Option<ScrollFn>),
    WindowPos(Option<WindowPosFn>),
    WindowSize(Option<WindowSizeFn>),
    WindowClose(Option<WindowCloseFn>),
    WindowRefresh(Option<WindowRefreshFn>),
    WindowFocus(Option<WindowFocusFn>),
    WindowIconify(Option<WindowIconifyFn>),
    WindowMaximize(Option<WindowMaximizeFn>),
    FramebufferSize(Option<FramebufferSizeFn>),
    ContentScale(Option<ContentScaleFn>),
    Drop(Option<DropFn>),
    Monitor(Option<MonitorFn>),
    Joystick(Option<JoystickFn>),
    Error(Option<ErrorFn>),
}

impl RawCallback {
    /// Category of this slot value
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Key(_) => EventKind::Key,
            Self::Char(_) => EventKind::Char,
            Self::MouseButton(_) => EventKind::MouseButton,
            Self::CursorPos(_) => EventKind::CursorPos,
            Self::CursorEnter(_) => EventKind::CursorEnter,
            Self::Scroll(_) => EventKind::Scroll,
            Self::WindowPos(_) => EventKind::WindowPos,
            Self::WindowSize(_) => EventKind::WindowSize,
            Self::WindowClose(_) => EventKind::WindowClose,
            Self::WindowRefresh(_) => EventKind::WindowRefresh,
            Self::WindowFocus(_) => EventKind::WindowFocus,
            Self::WindowIconify(_) => EventKind::WindowIconify,
            Self::WindowMaximize(_) => EventKind::WindowMaximize,
            Self::FramebufferSize(_) => EventKind::FramebufferSize,
            Self::ContentScale(_) => EventKind::ContentScale,
            Self::Drop(_) => EventKind::Drop,
            Self::Monitor(_) => EventKind::Monitor,
            Self::Joystick(_) => EventKind::Joystick,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// Empty slot value of the given category
    pub const fn empty(kind: EventKind) -> Self {
        match kind {
            EventKind::Key => Self::Key(None),
            EventKind::Char => Self::Char(None),
            EventKind::MouseButton => Self::MouseButton(None),
            EventKind::CursorPos => Self::CursorPos(None),
            EventKind::CursorEnter => Self::CursorEnter(None),
            EventKind::Scroll => Self::Scroll(None),
            EventKind::WindowPos => Self::WindowPos(None),
            EventKind::WindowSize => Self::WindowSize(None),
            EventKind::WindowClose => Self::WindowClose(None),
            EventKind::WindowRefresh => Self::WindowRefresh(None),
            EventKind::WindowFocus => Self::WindowFocus(None),
            EventKind::WindowIconify => Self::WindowIconify(None),
            EventKind::WindowMaximize => Self::WindowMaximize(None),
            EventKind::FramebufferSize => Self::FramebufferSize(None),
            EventKind::ContentScale => Self::ContentScale(None),
            EventKind::Drop => Self::Drop(None),
            EventKind::Monitor => Self::Monitor(None),
            EventKind::Joystick => Self::Joystick(None),
            EventKind::Error => Self::Error(None),
        }
    }

    /// Whether the slot value holds a function
    pub const fn is_set(&self) -> bool {
        match self {
            Self::Key(f) => f.is_some(),
            Self::Char(f) => f.is_some(),
            Self::MouseButton(f) => f.is_some(),
            Self::CursorPos(f) => f.is_some(),
            Self::CursorEnter(f) => f.is_some(),
            Self::Scroll(f) => f.is_some(),
            Self::WindowPos(f) => f.is_some(),
            Self::WindowSize(f) => f.is_some(),
            Self::WindowClose(f) => f.is_some(),
            Self::WindowRefresh(f) => f.is_some(),
            Self::WindowFocus(f) => f.is_some(),
            Self::WindowIconify(f) => f.is_some(),
            Self::WindowMaximize(f) => f.is_some(),
            Self::FramebufferSize(f) => f.is_some(),
            Self::ContentScale(f) => f.is_some(),
            Self::Drop(f) => f.is_some(),
            Self::Monitor(f) => f.is_some(),
            Self::Joystick(f) => f.is_some(),
            Self::Error(f) => f.is_some(),
        }
    }

    /// Address of the held function, for identity checks
    pub fn address(&self) -> Option<usize> {
        match *self {
            Self::Key(f) => f.map(|f| f as usize),
            Self::Char(f) => f.map(|f| f as usize),
            Self::MouseButton(f) => f.map(|f| f as usize),
            Self::CursorPos(f) => f.map(|f| f as usize),
            Self::CursorEnter(f) => f.map(|f| f as usize),
            Self::Scroll(f) => f.map(|f| f as usize),
            Self::WindowPos(f) => f.map(|f| f as usize),
            Self::WindowSize(f) => f.map(|f| f as usize),
            Self::WindowClose(f) => f.map(|f| f as usize),
            Self::WindowRefresh(f) => f.map(|f| f as usize),
            Self::WindowFocus(f) => f.map(|f| f as usize),
            Self::WindowIconify(f) => f.map(|f| f as usize),
            Self::WindowMaximize(f) => f.map(|f| f as usize),
            Self::FramebufferSize(f) => f.map(|f| f as usize),
            Self::ContentScale(f) => f.map(|f| f as usize),
            Self::Drop(f) => f.map(|f| f as usize),
            Self::Monitor(f) => f.map(|f| f as usize),
            Self::Joystick(f) => f.map(|f| f as usize),
            Self::Error(f) => f.map(|f| f as usize),
        }
    }
}

/// The part of the native library that may be driven from any thread
///
/// Posting an empty event is the one native entry point documented as
/// callable from every thread; it wakes a blocked wait on the main thread.
pub trait NativeWaker: Send + Sync {
    /// Post an empty event to the event queue
    fn post_empty_event(&self);
}

/// The native windowing library
///
/// Handles passed in must have been produced by the same implementation and
/// still be live; the wrappers in this crate guarantee that, which is why
/// the GLFW implementation is never handed out directly. All calls happen on
/// the thread that called [`NativeLibrary::init`].
pub trait NativeLibrary {
    // Lifecycle and errors

    /// Initialize the library; false on failure (details via the error channel)
    fn init(&self) -> bool;
    /// Tear the library down, destroying every remaining window and cursor
    fn terminate(&self);
    /// Poll and clear the last error for this thread
    fn last_error(&self) -> Option<(c_int, String)>;
    /// Seconds since initialization
    fn time(&self) -> f64;
    /// Thread-safe handle for waking a blocked wait
    fn waker(&self) -> Arc<dyn NativeWaker>;
    /// Address of a client API function for the current context; null when unsupported
    fn proc_address(&self, name: &CStr) -> *const c_void;

    // Hints

    /// Reset all window hints to their defaults
    fn default_window_hints(&self);
    /// Set an integer-valued window hint
    fn window_hint(&self, hint: c_int, value: c_int);
    /// Set a string-valued window hint
    fn window_hint_string(&self, hint: c_int, value: &CStr);

    // Callbacks

    /// Install a global callback for one category, returning the previous one
    fn set_callback(&self, callback: RawCallback) -> RawCallback;

    // Windows

    /// Create a window; null on failure
    fn create_window(
        &self,
        width: c_int,
        height: c_int,
        title: &CStr,
        monitor: *mut RawMonitor,
        share: *mut RawWindow,
    ) -> *mut RawWindow;
    /// Destroy a window
    fn destroy_window(&self, window: *mut RawWindow);
    /// Store the per-window user pointer
    fn set_window_user_pointer(&self, window: *mut RawWindow, pointer: *mut c_void);
    /// Read the per-window user pointer; null for unknown windows
    fn window_user_pointer(&self, window: *mut RawWindow) -> *mut c_void;
    /// Close flag
    fn window_should_close(&self, window: *mut RawWindow) -> bool;
    /// Set the close flag
    fn set_window_should_close(&self, window: *mut RawWindow, value: bool);
    /// Set the title
    fn set_window_title(&self, window: *mut RawWindow, title: &CStr);
    /// Content area position
    fn window_pos(&self, window: *mut RawWindow) -> (c_int, c_int);
    /// Move the content area
    fn set_window_pos(&self, window: *mut RawWindow, x: c_int, y: c_int);
    /// Content area size
    fn window_size(&self, window: *mut RawWindow) -> (c_int, c_int);
    /// Resize the content area
    fn set_window_size(&self, window: *mut RawWindow, width: c_int, height: c_int);
    /// Size limits; `DONT_CARE` disables a bound
    fn set_window_size_limits(
        &self,
        window: *mut RawWindow,
        min_width: c_int,
        min_height: c_int,
        max_width: c_int,
        max_height: c_int,
    );
    /// Aspect ratio; `DONT_CARE` for both disables it
    fn set_window_aspect_ratio(&self, window: *mut RawWindow, numer: c_int, denom: c_int);
    /// Framebuffer size in pixels
    fn framebuffer_size(&self, window: *mut RawWindow) -> (c_int, c_int);
    /// Frame edges: left, top, right, bottom
    fn window_frame_size(&self, window: *mut RawWindow) -> (c_int, c_int, c_int, c_int);
    /// Content scale
    fn window_content_scale(&self, window: *mut RawWindow) -> (f32, f32);
    /// Opacity
    fn window_opacity(&self, window: *mut RawWindow) -> f32;
    /// Set opacity
    fn set_window_opacity(&self, window: *mut RawWindow, opacity: f32);
    /// Iconify
    fn iconify_window(&self, window: *mut RawWindow);
    /// Restore from iconified or maximized
    fn restore_window(&self, window: *mut RawWindow);
    /// Maximize
    fn maximize_window(&self, window: *mut RawWindow);
    /// Show
    fn show_window(&self, window: *mut RawWindow);
    /// Hide
    fn hide_window(&self, window: *mut RawWindow);
    /// Focus
    fn focus_window(&self, window: *mut RawWindow);
    /// Request user attention
    fn request_window_attention(&self, window: *mut RawWindow);
    /// Monitor of a full screen window; null when windowed
    fn window_monitor(&self, window: *mut RawWindow) -> *mut RawMonitor;
    /// Switch between full screen (non-null monitor) and windowed mode
    #[allow(clippy::too_many_arguments)]
    fn set_window_monitor(
        &self,
        window: *mut RawWindow,
        monitor: *mut RawMonitor,
        x: c_int,
        y: c_int,
        width: c_int,
        height: c_int,
        refresh_rate: c_int,
    );
    /// Read a window attribute
    fn window_attrib(&self, window: *mut RawWindow, attrib: c_int) -> c_int;
    /// Write a window attribute
    fn set_window_attrib(&self, window: *mut RawWindow, attrib: c_int, value: c_int);
    /// Read an input mode
    fn input_mode(&self, window: *mut RawWindow, mode: c_int) -> c_int;
    /// Write an input mode
    fn set_input_mode(&self, window: *mut RawWindow, mode: c_int, value: c_int);
    /// Last reported action of a key
    fn key(&self, window: *mut RawWindow, key: c_int) -> c_int;
    /// Last reported action of a mouse button
    fn mouse_button(&self, window: *mut RawWindow, button: c_int) -> c_int;
    /// Cursor position relative to the content area
    fn cursor_pos(&self, window: *mut RawWindow) -> (f64, f64);
    /// Move the cursor
    fn set_cursor_pos(&self, window: *mut RawWindow, x: f64, y: f64);
    /// Set the cursor image; null restores the default arrow
    fn set_cursor(&self, window: *mut RawWindow, cursor: *mut RawCursor);
    /// Make the window's context current; null detaches
    fn make_context_current(&self, window: *mut RawWindow);
    /// Swap front and back buffers
    fn swap_buffers(&self, window: *mut RawWindow);
    /// Set the window icon from candidate images; empty restores the default
    fn set_window_icon(&self, window: *mut RawWindow, images: &[RawImage]);
    /// Clipboard contents as UTF-8; `None` when empty or not text
    fn clipboard_string(&self, window: *mut RawWindow) -> Option<String>;
    /// Replace the clipboard contents
    fn set_clipboard_string(&self, window: *mut RawWindow, text: &CStr);

    // Cursors

    /// Create a cursor from an image; null on failure
    fn create_cursor(&self, image: &RawImage, x_hot: c_int, y_hot: c_int) -> *mut RawCursor;
    /// Create a standard cursor; null on failure
    fn create_standard_cursor(&self, shape: c_int) -> *mut RawCursor;
    /// Destroy a cursor
    fn destroy_cursor(&self, cursor: *mut RawCursor);

    // Monitors

    /// Connected monitors, primary first
    fn monitors(&self) -> Vec<*mut RawMonitor>;
    /// Primary monitor; null when none is connected
    fn primary_monitor(&self) -> *mut RawMonitor;
    /// Virtual position of the viewport
    fn monitor_pos(&self, monitor: *mut RawMonitor) -> (c_int, c_int);
    /// Work area: x, y, width, height
    fn monitor_workarea(&self, monitor: *mut RawMonitor) -> (c_int, c_int, c_int, c_int);
    /// Physical size in millimetres
    fn monitor_physical_size(&self, monitor: *mut RawMonitor) -> (c_int, c_int);
    /// Content scale
    fn monitor_content_scale(&self, monitor: *mut RawMonitor) -> (f32, f32);
    /// Human-readable name
    fn monitor_name(&self, monitor: *mut RawMonitor) -> Option<String>;
    /// Current video mode
    fn video_mode(&self, monitor: *mut RawMonitor) -> Option<RawVideoMode>;
    /// Supported video modes
    fn video_modes(&self, monitor: *mut RawMonitor) -> Vec<RawVideoMode>;
    /// Generate and apply a gamma ramp from an exponent
    fn set_gamma(&self, monitor: *mut RawMonitor, gamma: f32);
    /// Current gamma ramp
    fn gamma_ramp(&self, monitor: *mut RawMonitor) -> Option<RawGammaRamp>;
    /// Apply a gamma ramp; every channel has the same length
    fn set_gamma_ramp(&self, monitor: *mut RawMonitor, ramp: &RawGammaRamp);

    // Joysticks

    /// Whether a joystick occupies the slot
    fn joystick_present(&self, jid: c_int) -> bool;
    /// Joystick name
    fn joystick_name(&self, jid: c_int) -> Option<String>;
    /// SDL-compatible GUID
    fn joystick_guid(&self, jid: c_int) -> Option<String>;
    /// Axis values
    fn joystick_axes(&self, jid: c_int) -> Vec<f32>;
    /// Button actions
    fn joystick_buttons(&self, jid: c_int) -> Vec<u8>;
    /// Hat bit masks
    fn joystick_hats(&self, jid: c_int) -> Vec<u8>;
    /// Whether the joystick has a gamepad mapping
    fn joystick_is_gamepad(&self, jid: c_int) -> bool;
    /// Gamepad mapping name
    fn gamepad_name(&self, jid: c_int) -> Option<String>;
    /// Gamepad state; `None` when not a gamepad or not present
    fn gamepad_state(&self, jid: c_int) -> Option<RawGamepadState>;
    /// Add SDL gamepad mappings; false on failure
    fn update_gamepad_mappings(&self, mappings: &CStr) -> bool;

    // Event pump

    /// Process pending events and return
    fn poll_events(&self);
    /// Block until at least one event arrives
    fn wait_events(&self);
    /// Block until an event arrives or the timeout in seconds elapses
    fn wait_events_timeout(&self, timeout: f64);
    /// Wake a blocked wait from the event queue
    fn post_empty_event(&self) {
        self.waker().post_empty_event();
    }
}
