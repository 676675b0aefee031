//! Windows
//!
//! A [`Window`] exclusively owns its native window and its callback table.
//! The native user pointer of the window refers back to that table so the
//! global trampolines can find it. Destruction runs in a fixed order: clear
//! the back-reference, clear every callback slot, destroy the native window.

use std::ffi::{c_int, CString};
use std::ptr::{self, NonNull};
use std::rc::Rc;

use crate::callback::{
    CharCallback, ContentScaleCallback, CursorEnterCallback, CursorPosCallback, DropCallback,
    FramebufferSizeCallback, KeyCallback, MouseButtonCallback, ScrollCallback, WindowCallbacks,
    WindowCloseCallback, WindowFocusCallback, WindowIconifyCallback, WindowMaximizeCallback,
    WindowPosCallback, WindowRefreshCallback, WindowSizeCallback,
};
use crate::cursor::{Cursor, Image};
use crate::error::{ErrorCode, GlfwError, GlfwResult};
use crate::handle::{Deleter, Owned};
use crate::hint::{self, HintValue, NativeHintValue, WindowHint, DONT_CARE};
use crate::input::{
    require_known_key, Action, InputMode, InputModeSetting, Key, Modifiers, MouseButton,
};
use crate::mapping::{decode, decode_bool, encode, encode_bool, native_enum};
use crate::monitor::Monitor;
use crate::native::{EventKind, RawImage, RawWindow};
use crate::session::{self, Session};

native_enum! {
    /// Window attributes readable after creation
    pub enum WindowAttribute {
        /// Has input focus
        Focused = 0x0002_0001,
        /// Iconified
        Iconified = 0x0002_0002,
        /// User-resizable
        Resizable = 0x0002_0003,
        /// Visible
        Visible = 0x0002_0004,
        /// Has decorations
        Decorated = 0x0002_0005,
        /// Iconifies on focus loss in full screen
        AutoIconify = 0x0002_0006,
        /// Always on top
        Floating = 0x0002_0007,
        /// Maximized
        Maximized = 0x0002_0008,
        /// Framebuffer is transparent
        TransparentFramebuffer = 0x0002_000A,
        /// Cursor is over the content area
        Hovered = 0x0002_000B,
        /// Takes focus when shown
        FocusOnShow = 0x0002_000C,
        /// Mouse input passes through
        MousePassthrough = 0x0002_000D,
        /// Double buffered
        Doublebuffer = 0x0002_1010,
        /// Client API of the context
        ClientApi = 0x0002_2001,
        /// Context major version
        ContextVersionMajor = 0x0002_2002,
        /// Context minor version
        ContextVersionMinor = 0x0002_2003,
        /// Context revision
        ContextRevision = 0x0002_2004,
        /// Context robustness strategy
        ContextRobustness = 0x0002_2005,
        /// Forward-compatible OpenGL context
        OpenGlForwardCompat = 0x0002_2006,
        /// Debug context
        ContextDebug = 0x0002_2007,
        /// OpenGL profile
        OpenGlProfile = 0x0002_2008,
        /// Context release behavior
        ContextReleaseBehavior = 0x0002_2009,
        /// Context reports no errors
        ContextNoError = 0x0002_200A,
        /// Context creation API
        ContextCreationApi = 0x0002_200B,
    }
}

impl WindowAttribute {
    /// Whether the attribute can be changed after creation
    pub const fn is_settable(self) -> bool {
        matches!(
            self,
            Self::Resizable
                | Self::Decorated
                | Self::AutoIconify
                | Self::Floating
                | Self::FocusOnShow
                | Self::MousePassthrough
        )
    }
}

/// Sizes of the window frame around the content area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameSize {
    /// Left edge
    pub left: i32,
    /// Top edge, including the title bar
    pub top: i32,
    /// Right edge
    pub right: i32,
    /// Bottom edge
    pub bottom: i32,
}

fn dimension(key: &str, value: u32) -> GlfwResult<c_int> {
    match c_int::try_from(value) {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(GlfwError::configuration(key, value, "must be between 1 and i32::MAX")),
    }
}

fn unsigned(value: c_int) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[derive(Debug, Clone, Copy)]
struct WindowDeleter {
    epoch: u64,
}

impl Deleter<RawWindow> for WindowDeleter {
    fn delete(&mut self, handle: NonNull<RawWindow>) {
        match session::with_epoch(self.epoch) {
            Some(session) => {
                session.native().destroy_window(handle.as_ptr());
                log::debug!("destroyed window {handle:p}");
            }
            None => log::debug!("window {handle:p} was reclaimed by library termination"),
        }
    }
}

/// Window construction parameters
///
/// Every hint is validated before any native call is made, so a rejected
/// hint leaves the native hint state untouched.
#[derive(Debug, Clone)]
pub struct WindowBuilder<'a> {
    width: u32,
    height: u32,
    title: String,
    hints: Vec<(WindowHint, HintValue)>,
    reset_hints: bool,
    monitor: Option<&'a Monitor>,
    share: Option<&'a Window>,
}

impl<'a> WindowBuilder<'a> {
    /// Start a windowed-mode window of the given content size
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            hints: Vec::new(),
            reset_hints: false,
            monitor: None,
            share: None,
        }
    }

    /// Add a hint; later hints for the same key win
    #[must_use]
    pub fn hint(mut self, hint: WindowHint, value: impl Into<HintValue>) -> Self {
        self.hints.push((hint, value.into()));
        self
    }

    /// Reset every native hint to its default before applying this builder's hints
    #[must_use]
    pub fn default_hints(mut self) -> Self {
        self.reset_hints = true;
        self
    }

    /// Create a full screen window on `monitor`
    #[must_use]
    pub fn fullscreen(mut self, monitor: &'a Monitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Share context objects with `window`
    #[must_use]
    pub fn share(mut self, window: &'a Window) -> Self {
        self.share = Some(window);
        self
    }

    /// Hints collected so far
    pub fn hints(&self) -> &[(WindowHint, HintValue)] {
        &self.hints
    }

    /// Validate everything, apply the hints and create the window
    pub fn build(self) -> GlfwResult<Window> {
        let session = session::require()?;

        let width = dimension("width", self.width)?;
        let height = dimension("height", self.height)?;
        let title = CString::new(self.title.as_str())
            .map_err(|_| GlfwError::configuration("title", &self.title, "contains a NUL byte"))?;
        let hints = self
            .hints
            .iter()
            .map(|(hint, value)| Ok((*hint, hint::validate(*hint, value)?)))
            .collect::<GlfwResult<Vec<(WindowHint, NativeHintValue)>>>()?;
        let monitor = self.monitor.map(Monitor::checked).transpose()?.map_or(ptr::null_mut(), |(_, raw)| raw);
        let share = self.share.map(Window::raw).transpose()?.map_or(ptr::null_mut(), |(_, raw)| raw);

        let native = session.native();
        if self.reset_hints {
            native.default_window_hints();
        }
        for (hint, value) in &hints {
            session::apply_hint(native, *hint, value);
        }

        let epoch = session.epoch();
        let handle = Owned::create(
            || native.create_window(width, height, &title, monitor, share),
            WindowDeleter { epoch },
        )?;
        let raw = handle.get()?.as_ptr();

        let callbacks = Rc::new(WindowCallbacks::default());
        native.set_window_user_pointer(raw, Rc::as_ptr(&callbacks).cast_mut().cast());

        log::debug!("created window {raw:p} ({}x{}, {:?})", self.width, self.height, self.title);
        Ok(Window {
            handle,
            callbacks,
            epoch,
        })
    }
}

/// An owned native window
pub struct Window {
    handle: Owned<RawWindow, WindowDeleter>,
    callbacks: Rc<WindowCallbacks>,
    epoch: u64,
}

macro_rules! window_callbacks {
    ($(
        $(#[$meta:meta])*
        $set:ident / $unset:ident => $slot:ident: $alias:ident($($arg:ty),*) on $kind:ident;
    )+) => {
        impl Window {
            $(
                $(#[$meta])*
                ///
                /// Returns the callback registered before. Replacing the
                /// callback from inside its own invocation returns `None`; the
                /// running callback is dropped once it returns.
                pub fn $set<F>(&mut self, callback: F) -> GlfwResult<Option<Box<$alias>>>
                where
                    F: FnMut($($arg),*) + 'static,
                {
                    let (session, _) = self.raw()?;
                    session.ensure_installed(EventKind::$kind);
                    Ok(self.callbacks.$slot.replace(Some(Box::new(callback))))
                }

                /// Clear the matching callback, returning it
                pub fn $unset(&mut self) -> GlfwResult<Option<Box<$alias>>> {
                    self.raw()?;
                    Ok(self.callbacks.$slot.replace(None))
                }
            )+
        }
    };
}

window_callbacks! {
    /// Key press, release and repeat
    set_key_callback / unset_key_callback => key: KeyCallback(Key, i32, Action, Modifiers) on Key;
    /// Unicode character input
    set_char_callback / unset_char_callback => char: CharCallback(char) on Char;
    /// Mouse button press and release
    set_mouse_button_callback / unset_mouse_button_callback
        => mouse_button: MouseButtonCallback(MouseButton, Action, Modifiers) on MouseButton;
    /// Cursor movement
    set_cursor_pos_callback / unset_cursor_pos_callback => cursor_pos: CursorPosCallback(f64, f64) on CursorPos;
    /// Cursor entering or leaving the content area
    set_cursor_enter_callback / unset_cursor_enter_callback
        => cursor_enter: CursorEnterCallback(bool) on CursorEnter;
    /// Scrolling
    set_scroll_callback / unset_scroll_callback => scroll: ScrollCallback(f64, f64) on Scroll;
    /// Window moved
    set_pos_callback / unset_pos_callback => window_pos: WindowPosCallback(i32, i32) on WindowPos;
    /// Window resized
    set_size_callback / unset_size_callback => window_size: WindowSizeCallback(u32, u32) on WindowSize;
    /// Close requested
    set_close_callback / unset_close_callback => window_close: WindowCloseCallback() on WindowClose;
    /// Contents need redrawing
    set_refresh_callback / unset_refresh_callback => window_refresh: WindowRefreshCallback() on WindowRefresh;
    /// Focus gained or lost
    set_focus_callback / unset_focus_callback => window_focus: WindowFocusCallback(bool) on WindowFocus;
    /// Iconified or restored
    set_iconify_callback / unset_iconify_callback => window_iconify: WindowIconifyCallback(bool) on WindowIconify;
    /// Maximized or restored
    set_maximize_callback / unset_maximize_callback
        => window_maximize: WindowMaximizeCallback(bool) on WindowMaximize;
    /// Framebuffer resized
    set_framebuffer_size_callback / unset_framebuffer_size_callback
        => framebuffer_size: FramebufferSizeCallback(u32, u32) on FramebufferSize;
    /// Content scale changed
    set_content_scale_callback / unset_content_scale_callback
        => content_scale: ContentScaleCallback(f32, f32) on ContentScale;
    /// Files dropped on the window
    set_drop_callback / unset_drop_callback => drop: DropCallback(Vec<std::path::PathBuf>) on Drop;
}

impl Window {
    /// Create a windowed-mode window with the current hints
    pub fn new(width: u32, height: u32, title: &str) -> GlfwResult<Self> {
        WindowBuilder::new(width, height, title).build()
    }

    /// Start building a window
    pub fn builder<'a>(width: u32, height: u32, title: impl Into<String>) -> WindowBuilder<'a> {
        WindowBuilder::new(width, height, title)
    }

    /// Live session and raw handle; fails once destroyed or stale
    fn raw(&self) -> GlfwResult<(Rc<Session>, *mut RawWindow)> {
        let handle = self.handle.get()?;
        let session = session::require_epoch(self.epoch)?;
        Ok((session, handle.as_ptr()))
    }

    /// Native handle, for handing to graphics APIs
    pub fn raw_handle(&self) -> GlfwResult<*mut RawWindow> {
        self.raw().map(|(_, raw)| raw)
    }

    /// Destroy the window now; every later operation is invalid use
    pub fn destroy(&mut self) {
        let Ok(handle) = self.handle.get() else {
            return;
        };
        if let Some(session) = session::with_epoch(self.epoch) {
            session.native().set_window_user_pointer(handle.as_ptr(), ptr::null_mut());
        }
        self.callbacks.close_all();
        self.handle.reset();
    }

    /// Whether the window has been destroyed
    pub const fn is_destroyed(&self) -> bool {
        self.handle.is_null()
    }

    /// Close flag
    pub fn should_close(&self) -> GlfwResult<bool> {
        let (session, raw) = self.raw()?;
        Ok(session.native().window_should_close(raw))
    }

    /// Set or clear the close flag
    pub fn set_should_close(&mut self, value: bool) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().set_window_should_close(raw, value);
        Ok(())
    }

    /// Change the title
    pub fn set_title(&mut self, title: &str) -> GlfwResult<()> {
        let title_c =
            CString::new(title).map_err(|_| GlfwError::configuration("title", title, "contains a NUL byte"))?;
        let (session, raw) = self.raw()?;
        session.native().set_window_title(raw, &title_c);
        Ok(())
    }

    /// Position of the content area in screen coordinates
    pub fn position(&self) -> GlfwResult<(i32, i32)> {
        let (session, raw) = self.raw()?;
        Ok(session.native().window_pos(raw))
    }

    /// Move the content area
    pub fn set_position(&mut self, x: i32, y: i32) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().set_window_pos(raw, x, y);
        Ok(())
    }

    /// Size of the content area in screen coordinates
    pub fn size(&self) -> GlfwResult<(u32, u32)> {
        let (session, raw) = self.raw()?;
        let (width, height) = session.native().window_size(raw);
        Ok((unsigned(width), unsigned(height)))
    }

    /// Resize the content area
    pub fn set_size(&mut self, width: u32, height: u32) -> GlfwResult<()> {
        let width = dimension("width", width)?;
        let height = dimension("height", height)?;
        let (session, raw) = self.raw()?;
        session.native().set_window_size(raw, width, height);
        Ok(())
    }

    /// Limit the content area size; `None` leaves that bound open
    pub fn set_size_limits(&mut self, min: Option<(u32, u32)>, max: Option<(u32, u32)>) -> GlfwResult<()> {
        if let (Some(min), Some(max)) = (min, max) {
            if min.0 > max.0 || min.1 > max.1 {
                return Err(GlfwError::configuration("size limits", (min, max), "minimum exceeds maximum"));
            }
        }
        let bound = |key: &str, limit: Option<(u32, u32)>| -> GlfwResult<(c_int, c_int)> {
            limit.map_or(Ok((DONT_CARE, DONT_CARE)), |(width, height)| {
                Ok((dimension(key, width)?, dimension(key, height)?))
            })
        };
        let (min_width, min_height) = bound("minimum size", min)?;
        let (max_width, max_height) = bound("maximum size", max)?;
        let (session, raw) = self.raw()?;
        session.native().set_window_size_limits(raw, min_width, min_height, max_width, max_height);
        Ok(())
    }

    /// Lock the content area to `numer:denom`; `None` unlocks it
    pub fn set_aspect_ratio(&mut self, ratio: Option<(u32, u32)>) -> GlfwResult<()> {
        let (numer, denom) = match ratio {
            Some((numer, denom)) => (dimension("aspect numerator", numer)?, dimension("aspect denominator", denom)?),
            None => (DONT_CARE, DONT_CARE),
        };
        let (session, raw) = self.raw()?;
        session.native().set_window_aspect_ratio(raw, numer, denom);
        Ok(())
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> GlfwResult<(u32, u32)> {
        let (session, raw) = self.raw()?;
        let (width, height) = session.native().framebuffer_size(raw);
        Ok((unsigned(width), unsigned(height)))
    }

    /// Frame sizes around the content area
    pub fn frame_size(&self) -> GlfwResult<FrameSize> {
        let (session, raw) = self.raw()?;
        let (left, top, right, bottom) = session.native().window_frame_size(raw);
        Ok(FrameSize {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Ratio between the current DPI and the platform default
    pub fn content_scale(&self) -> GlfwResult<(f32, f32)> {
        let (session, raw) = self.raw()?;
        Ok(session.native().window_content_scale(raw))
    }

    /// Opacity in 0.0..=1.0
    pub fn opacity(&self) -> GlfwResult<f32> {
        let (session, raw) = self.raw()?;
        Ok(session.native().window_opacity(raw))
    }

    /// Set the opacity; values outside 0.0..=1.0 are rejected
    pub fn set_opacity(&mut self, opacity: f32) -> GlfwResult<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(GlfwError::configuration("opacity", opacity, "must lie in 0.0..=1.0"));
        }
        let (session, raw) = self.raw()?;
        session.native().set_window_opacity(raw, opacity);
        Ok(())
    }

    /// Iconify (minimize)
    pub fn iconify(&mut self) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().iconify_window(raw);
        Ok(())
    }

    /// Restore from iconified or maximized
    pub fn restore(&mut self) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().restore_window(raw);
        Ok(())
    }

    /// Maximize
    pub fn maximize(&mut self) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().maximize_window(raw);
        Ok(())
    }

    /// Make visible
    pub fn show(&mut self) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().show_window(raw);
        Ok(())
    }

    /// Hide
    pub fn hide(&mut self) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().hide_window(raw);
        Ok(())
    }

    /// Bring to front and give input focus
    pub fn focus(&mut self) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().focus_window(raw);
        Ok(())
    }

    /// Ask for the user's attention without taking focus
    pub fn request_attention(&mut self) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().request_window_attention(raw);
        Ok(())
    }

    /// Monitor of a full screen window; `None` when windowed
    pub fn monitor(&self) -> GlfwResult<Option<Monitor>> {
        let (session, raw) = self.raw()?;
        Ok(Monitor::from_raw(session.native().window_monitor(raw), session.epoch()))
    }

    /// Switch to full screen on `monitor`; `None` keeps the current refresh rate
    pub fn set_fullscreen(
        &mut self,
        monitor: &Monitor,
        size: (u32, u32),
        refresh_rate: Option<u32>,
    ) -> GlfwResult<()> {
        let width = dimension("width", size.0)?;
        let height = dimension("height", size.1)?;
        let refresh_rate = match refresh_rate {
            Some(rate) => dimension("refresh rate", rate)?,
            None => DONT_CARE,
        };
        let (_, monitor) = monitor.checked()?;
        let (session, raw) = self.raw()?;
        session.native().set_window_monitor(raw, monitor, 0, 0, width, height, refresh_rate);
        Ok(())
    }

    /// Switch to windowed mode at the given position and size
    pub fn set_windowed(&mut self, position: (i32, i32), size: (u32, u32)) -> GlfwResult<()> {
        let width = dimension("width", size.0)?;
        let height = dimension("height", size.1)?;
        let (session, raw) = self.raw()?;
        session
            .native()
            .set_window_monitor(raw, ptr::null_mut(), position.0, position.1, width, height, DONT_CARE);
        Ok(())
    }

    /// Raw value of an attribute
    pub fn attribute(&self, attribute: WindowAttribute) -> GlfwResult<i32> {
        let (session, raw) = self.raw()?;
        Ok(session.native().window_attrib(raw, encode(attribute)))
    }

    /// Value of a boolean attribute
    pub fn flag(&self, attribute: WindowAttribute) -> GlfwResult<bool> {
        decode_bool(self.attribute(attribute)?)
    }

    /// Change one of the settable boolean attributes
    pub fn set_attribute(&mut self, attribute: WindowAttribute, value: bool) -> GlfwResult<()> {
        if !attribute.is_settable() {
            return Err(GlfwError::configuration(
                format!("{attribute:?}"),
                value,
                "attribute is read-only after creation",
            ));
        }
        let (session, raw) = self.raw()?;
        session.native().set_window_attrib(raw, encode(attribute), encode_bool(value));
        Ok(())
    }

    /// Current setting of an input mode
    pub fn input_mode(&self, mode: InputMode) -> GlfwResult<InputModeSetting> {
        let (session, raw) = self.raw()?;
        InputModeSetting::from_native(mode, session.native().input_mode(raw, encode(mode)))
    }

    /// Change an input mode
    pub fn set_input_mode(&mut self, setting: InputModeSetting) -> GlfwResult<()> {
        let (mode, value) = setting.to_native();
        let (session, raw) = self.raw()?;
        session.native().set_input_mode(raw, mode, value);
        Ok(())
    }

    /// Last reported state of a key
    pub fn key(&self, key: Key) -> GlfwResult<Action> {
        let code = require_known_key(key)?;
        let (session, raw) = self.raw()?;
        decode(session.native().key(raw, code))
    }

    /// Last reported state of a mouse button
    ///
    /// Only the eight named buttons keep pollable state; buttons beyond them
    /// are reported through the mouse button callback alone.
    pub fn mouse_button(&self, button: MouseButton) -> GlfwResult<Action> {
        if !button.is_named() {
            return Err(GlfwError::configuration(
                "mouse button",
                button,
                "only the first eight buttons can be polled",
            ));
        }
        let (session, raw) = self.raw()?;
        decode(session.native().mouse_button(raw, button.to_native()))
    }

    /// Cursor position relative to the content area
    pub fn cursor_pos(&self) -> GlfwResult<(f64, f64)> {
        let (session, raw) = self.raw()?;
        Ok(session.native().cursor_pos(raw))
    }

    /// Move the cursor within the content area
    pub fn set_cursor_pos(&mut self, x: f64, y: f64) -> GlfwResult<()> {
        if !x.is_finite() || !y.is_finite() {
            return Err(GlfwError::configuration("cursor position", (x, y), "must be finite"));
        }
        let (session, raw) = self.raw()?;
        session.native().set_cursor_pos(raw, x, y);
        Ok(())
    }

    /// Use `cursor` over the content area; `None` restores the default arrow
    ///
    /// The cursor must outlive its use by this window.
    pub fn set_cursor(&mut self, cursor: Option<&Cursor>) -> GlfwResult<()> {
        let cursor = cursor.map(Cursor::raw).transpose()?.unwrap_or(ptr::null_mut());
        let (session, raw) = self.raw()?;
        session.native().set_cursor(raw, cursor);
        Ok(())
    }

    /// Make this window's context current on the calling thread
    pub fn make_context_current(&self) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().make_context_current(raw);
        Ok(())
    }

    /// Swap the front and back buffers
    pub fn swap_buffers(&mut self) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        session.native().swap_buffers(raw);
        Ok(())
    }

    /// Set the window icon from candidate images
    ///
    /// The platform picks the size closest to what it needs. An empty slice
    /// restores the default icon. Platforms without window icons report a
    /// platform error.
    pub fn set_icon(&mut self, images: &[Image]) -> GlfwResult<()> {
        let (session, raw) = self.raw()?;
        let raw_images: Vec<RawImage> = images.iter().map(Image::as_raw).collect();
        session::checked(|| session.native().set_window_icon(raw, &raw_images))?;
        log::debug!("set {} icon image(s) on window {raw:p}", images.len());
        Ok(())
    }

    /// Clipboard contents as text
    ///
    /// `Ok(None)` when the clipboard is empty or holds no text.
    pub fn clipboard(&self) -> GlfwResult<Option<String>> {
        let (session, raw) = self.raw()?;
        match session::checked(|| session.native().clipboard_string(raw)) {
            Err(GlfwError::Platform {
                code: ErrorCode::FormatUnavailable,
                ..
            }) => Ok(None),
            other => other,
        }
    }

    /// Put text on the clipboard
    pub fn set_clipboard(&self, text: &str) -> GlfwResult<()> {
        let text = CString::new(text)
            .map_err(|err| GlfwError::configuration("clipboard text", err.nul_position(), "contains a NUL byte"))?;
        let (session, raw) = self.raw()?;
        session::checked(|| session.native().set_clipboard_string(raw, &text))
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("handle", &self.handle)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorShape;
    use crate::hint::ClientApi;
    use crate::input::CursorMode;
    use crate::native::{MockCall, MockNative, RawVideoMode};
    use crate::session::Library;
    use approx::assert_relative_eq;

    fn setup() -> (MockNative, Library) {
        let mock = MockNative::new();
        let library = Library::init(mock.clone()).unwrap();
        (mock, library)
    }

    #[test]
    fn test_new_window_tracks_size_and_title() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let window = Window::new(640, 480, "Demo").unwrap();
        assert_eq!(window.size().unwrap(), (640, 480));
        assert_eq!(mock.window_title(window.raw_handle().unwrap()).as_deref(), Some("Demo"));
        assert!(!window.should_close().unwrap());
    }

    #[test]
    fn test_invalid_dimensions_rejected_before_native_call() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        assert!(matches!(Window::new(0, 480, "Zero"), Err(GlfwError::Configuration { .. })));
        assert!(Window::new(640, 480, "nul\0title").is_err());
        assert_eq!(mock.count(|call| matches!(call, MockCall::CreateWindow { .. })), 0);
    }

    #[test]
    fn test_builder_applies_hints_then_creates() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let window = Window::builder(320, 200, "Hinted")
            .default_hints()
            .hint(WindowHint::Resizable, false)
            .hint(WindowHint::ClientApi, ClientApi::NoApi)
            .build()
            .unwrap();

        assert!(!window.flag(WindowAttribute::Resizable).unwrap());
        assert_eq!(window.attribute(WindowAttribute::ClientApi).unwrap(), 0);
        assert_eq!(mock.count(|call| matches!(call, MockCall::DefaultWindowHints)), 1);
        assert_eq!(mock.count(|call| matches!(call, MockCall::WindowHint(..))), 2);
    }

    #[test]
    fn test_builder_rejects_bad_hint_without_touching_native_state() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let result = Window::builder(320, 200, "Bad")
            .hint(WindowHint::Decorated, true)
            .hint(WindowHint::ContextVersionMajor, 99)
            .build();
        assert!(matches!(result, Err(GlfwError::Configuration { .. })));
        assert_eq!(mock.count(|call| matches!(call, MockCall::WindowHint(..))), 0);
        assert_eq!(mock.count(|call| matches!(call, MockCall::CreateWindow { .. })), 0);
    }

    #[test]
    fn test_destroyed_window_reports_invalid_use() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let mut window = Window::new(100, 100, "Short-lived").unwrap();
        window.destroy();
        window.destroy();

        assert!(window.is_destroyed());
        assert!(matches!(window.size(), Err(GlfwError::InvalidUse(_))));
        assert!(matches!(window.set_key_callback(|_, _, _, _| {}), Err(GlfwError::InvalidUse(_))));
        drop(window);
        assert_eq!(mock.count(|call| matches!(call, MockCall::DestroyWindow(_))), 1);
    }

    #[test]
    fn test_settable_attributes() {
        let _serial = crate::session::serial();
        let (_mock, _library) = setup();
        let mut window = Window::new(100, 100, "Attributes").unwrap();
        window.set_attribute(WindowAttribute::Floating, true).unwrap();
        assert!(window.flag(WindowAttribute::Floating).unwrap());
        assert!(window.set_attribute(WindowAttribute::Focused, true).is_err());
    }

    #[test]
    fn test_geometry_validation() {
        let _serial = crate::session::serial();
        let (_mock, _library) = setup();
        let mut window = Window::new(100, 100, "Geometry").unwrap();
        assert!(window.set_opacity(1.5).is_err());
        assert!(window.set_opacity(f32::NAN).is_err());
        window.set_opacity(0.5).unwrap();
        assert_relative_eq!(window.opacity().unwrap(), 0.5);

        assert!(window.set_size_limits(Some((200, 200)), Some((100, 100))).is_err());
        window.set_size_limits(Some((50, 50)), None).unwrap();
        assert!(window.set_aspect_ratio(Some((16, 0))).is_err());
        window.set_aspect_ratio(Some((16, 9))).unwrap();

        window.set_size(800, 600).unwrap();
        assert_eq!(window.size().unwrap(), (800, 600));
        assert_eq!(window.framebuffer_size().unwrap(), (800, 600));
    }

    #[test]
    fn test_input_modes_and_state() {
        let _serial = crate::session::serial();
        let (_mock, _library) = setup();
        let mut window = Window::new(100, 100, "Input").unwrap();
        window.set_input_mode(InputModeSetting::Cursor(CursorMode::Disabled)).unwrap();
        assert_eq!(
            window.input_mode(InputMode::Cursor).unwrap(),
            InputModeSetting::Cursor(CursorMode::Disabled)
        );
        assert_eq!(window.key(Key::Space).unwrap(), Action::Release);
        assert!(window.key(Key::Unknown).is_err());
        assert_eq!(window.mouse_button(MouseButton::Left).unwrap(), Action::Release);
    }

    #[test]
    fn test_cursor_and_fullscreen() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        mock.add_monitor(
            "Panel",
            RawVideoMode {
                width: 1280,
                height: 800,
                red_bits: 8,
                green_bits: 8,
                blue_bits: 8,
                refresh_rate: 60,
            },
        );
        let mut window = Window::new(100, 100, "Modes").unwrap();

        let cursor = Cursor::standard(CursorShape::Crosshair).unwrap();
        window.set_cursor(Some(&cursor)).unwrap();
        window.set_cursor(None).unwrap();

        let monitor = Monitor::primary().unwrap().unwrap();
        assert!(window.monitor().unwrap().is_none());
        window.set_fullscreen(&monitor, (1280, 800), None).unwrap();
        assert_eq!(window.monitor().unwrap(), Some(monitor));
        window.set_windowed((10, 10), (100, 100)).unwrap();
        assert!(window.monitor().unwrap().is_none());
    }

    #[test]
    fn test_icon_images() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let mut window = Window::new(64, 64, "icon").unwrap();
        let raw = window.raw_handle().unwrap();
        let small = Image::new(16, 16, vec![0xff; 16 * 16 * 4]).unwrap();
        let large = Image::new(32, 32, vec![0x80; 32 * 32 * 4]).unwrap();

        window.set_icon(&[small, large]).unwrap();
        assert_eq!(mock.window_icon_sizes(raw).unwrap(), [(16, 16), (32, 32)]);

        window.set_icon(&[]).unwrap();
        assert!(mock.window_icon_sizes(raw).unwrap().is_empty());
    }

    #[test]
    fn test_clipboard_text() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let window = Window::new(64, 64, "clipboard").unwrap();

        assert_eq!(window.clipboard().unwrap(), None);
        window.set_clipboard("copied text").unwrap();
        assert_eq!(window.clipboard().unwrap().as_deref(), Some("copied text"));
        assert_eq!(mock.clipboard().as_deref(), Some("copied text"));

        assert!(matches!(window.set_clipboard("nul\0byte"), Err(GlfwError::Configuration { .. })));
        assert_eq!(mock.count(|call| matches!(call, MockCall::SetClipboardString(_))), 1);
    }
}
