//! Per-window callbacks on top of one global native slot per event category
//!
//! The native layer keeps a single function pointer per event category. This
//! module installs one `extern "C"` trampoline per category (once per
//! session, see [`crate::session`]) and routes every event to the window it
//! belongs to through the window's native user pointer, which points at that
//! window's [`WindowCallbacks`] table.
//!
//! The user pointer is a back-reference only: it never keeps the table
//! alive. [`crate::Window`] clears it before the table or the native window
//! is released, so an event that still arrives for a destroyed window finds
//! nothing and is dropped.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::ffi::{c_char, c_int, c_uint, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{ErrorChannel, NativeError};
use crate::input::{Action, Key, Modifiers, MouseButton};
use crate::joystick::{Joystick, JoystickId};
use crate::mapping::decode;
use crate::monitor::{ConnectionEvent, Monitor};
use crate::native::{EventKind, RawCallback, RawMonitor, RawWindow};
use crate::session;

/// Key events: key, platform scancode, action, modifiers
pub type KeyCallback = dyn FnMut(Key, i32, Action, Modifiers);
/// Unicode character input
pub type CharCallback = dyn FnMut(char);
/// Mouse button events: button, action, modifiers
pub type MouseButtonCallback = dyn FnMut(MouseButton, Action, Modifiers);
/// Cursor position in screen coordinates relative to the content area
pub type CursorPosCallback = dyn FnMut(f64, f64);
/// Cursor entered (`true`) or left (`false`) the content area
pub type CursorEnterCallback = dyn FnMut(bool);
/// Scroll offsets
pub type ScrollCallback = dyn FnMut(f64, f64);
/// Window position of the content area
pub type WindowPosCallback = dyn FnMut(i32, i32);
/// Window size of the content area
pub type WindowSizeCallback = dyn FnMut(u32, u32);
/// Close requested; the close flag is already set
pub type WindowCloseCallback = dyn FnMut();
/// Contents need redrawing
pub type WindowRefreshCallback = dyn FnMut();
/// Focus gained (`true`) or lost
pub type WindowFocusCallback = dyn FnMut(bool);
/// Iconified (`true`) or restored
pub type WindowIconifyCallback = dyn FnMut(bool);
/// Maximized (`true`) or restored
pub type WindowMaximizeCallback = dyn FnMut(bool);
/// Framebuffer size in pixels
pub type FramebufferSizeCallback = dyn FnMut(u32, u32);
/// Content scale
pub type ContentScaleCallback = dyn FnMut(f32, f32);
/// Paths dropped on the window
pub type DropCallback = dyn FnMut(Vec<PathBuf>);
/// Monitor connected or disconnected
pub type MonitorCallback = dyn FnMut(Monitor, ConnectionEvent);
/// Joystick connected or disconnected
pub type JoystickCallback = dyn FnMut(Joystick, ConnectionEvent);
/// Native error reported
pub type ErrorCallback = dyn FnMut(&NativeError);

/// Storage for one callback of one event category
///
/// While a callback runs it is taken out of its slot. If the slot is
/// replaced or cleared during that call, the running callback is dropped
/// once it returns instead of being put back.
pub struct CallbackSlot<F: ?Sized> {
    callback: RefCell<Option<Box<F>>>,
    version: Cell<u64>,
    closed: Cell<bool>,
}

impl<F: ?Sized> CallbackSlot<F> {
    /// An empty slot
    pub const fn new() -> Self {
        Self {
            callback: RefCell::new(None),
            version: Cell::new(0),
            closed: Cell::new(false),
        }
    }

    /// Store `callback`, returning what was stored before
    ///
    /// Called from inside the stored callback this returns `None`, since the
    /// running callback is out of the slot.
    pub fn replace(&self, callback: Option<Box<F>>) -> Option<Box<F>> {
        self.version.set(self.version.get().wrapping_add(1));
        std::mem::replace(&mut *self.callback.borrow_mut(), callback)
    }

    /// Whether a callback is stored
    pub fn is_set(&self) -> bool {
        self.callback.borrow().is_some()
    }

    /// Drop the stored callback and refuse to store a running one again
    pub(crate) fn close(&self) {
        self.closed.set(true);
        drop(self.replace(None));
    }

    /// Run the stored callback, if any; returns whether one ran
    pub(crate) fn invoke(&self, call: impl FnOnce(&mut F)) -> bool {
        let Some(mut callback) = self.callback.borrow_mut().take() else {
            return false;
        };
        let version = self.version.get();

        guarded(|| call(&mut callback));

        if self.version.get() == version && !self.closed.get() {
            *self.callback.borrow_mut() = Some(callback);
        }
        true
    }
}

impl<F: ?Sized> Default for CallbackSlot<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback table of one window; the target of its back-reference
#[derive(Default)]
pub struct WindowCallbacks {
    pub(crate) key: CallbackSlot<KeyCallback>,
    pub(crate) char: CallbackSlot<CharCallback>,
    pub(crate) mouse_button: CallbackSlot<MouseButtonCallback>,
    pub(crate) cursor_pos: CallbackSlot<CursorPosCallback>,
    pub(crate) cursor_enter: CallbackSlot<CursorEnterCallback>,
    pub(crate) scroll: CallbackSlot<ScrollCallback>,
    pub(crate) window_pos: CallbackSlot<WindowPosCallback>,
    pub(crate) window_size: CallbackSlot<WindowSizeCallback>,
    pub(crate) window_close: CallbackSlot<WindowCloseCallback>,
    pub(crate) window_refresh: CallbackSlot<WindowRefreshCallback>,
    pub(crate) window_focus: CallbackSlot<WindowFocusCallback>,
    pub(crate) window_iconify: CallbackSlot<WindowIconifyCallback>,
    pub(crate) window_maximize: CallbackSlot<WindowMaximizeCallback>,
    pub(crate) framebuffer_size: CallbackSlot<FramebufferSizeCallback>,
    pub(crate) content_scale: CallbackSlot<ContentScaleCallback>,
    pub(crate) drop: CallbackSlot<DropCallback>,
}

impl WindowCallbacks {
    /// Clear every slot; used when the window is destroyed
    pub(crate) fn close_all(&self) {
        self.key.close();
        self.char.close();
        self.mouse_button.close();
        self.cursor_pos.close();
        self.cursor_enter.close();
        self.scroll.close();
        self.window_pos.close();
        self.window_size.close();
        self.window_close.close();
        self.window_refresh.close();
        self.window_focus.close();
        self.window_iconify.close();
        self.window_maximize.close();
        self.framebuffer_size.close();
        self.content_scale.close();
        self.drop.close();
    }
}

/// Callbacks that belong to the session rather than to a window
#[derive(Default)]
pub(crate) struct SessionCallbacks {
    pub(crate) monitor: CallbackSlot<MonitorCallback>,
    pub(crate) joystick: CallbackSlot<JoystickCallback>,
    pub(crate) error: CallbackSlot<ErrorCallback>,
}

thread_local! {
    static PENDING_PANIC: RefCell<Option<Box<dyn Any + Send>>> = const { RefCell::new(None) };
}

/// Run a user callback without letting a panic unwind into native code
///
/// The first panic is kept and resumed by [`resume_pending_panic`] once the
/// event pump has returned to Rust.
fn guarded(call: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
        log::error!("callback panicked inside the event pump; resuming once it returns");
        PENDING_PANIC.with(|pending| {
            pending.borrow_mut().get_or_insert(payload);
        });
    }
}

/// Re-raise a panic caught inside a trampoline
pub(crate) fn resume_pending_panic() {
    if let Some(payload) = PENDING_PANIC.with(|pending| pending.borrow_mut().take()) {
        panic::resume_unwind(payload);
    }
}

/// Native slot value holding the trampoline for `kind`
pub(crate) const fn trampoline(kind: EventKind) -> RawCallback {
    match kind {
        EventKind::Key => RawCallback::Key(Some(key_trampoline)),
        EventKind::Char => RawCallback::Char(Some(char_trampoline)),
        EventKind::MouseButton => RawCallback::MouseButton(Some(mouse_button_trampoline)),
        EventKind::CursorPos => RawCallback::CursorPos(Some(cursor_pos_trampoline)),
        EventKind::CursorEnter => RawCallback::CursorEnter(Some(cursor_enter_trampoline)),
        EventKind::Scroll => RawCallback::Scroll(Some(scroll_trampoline)),
        EventKind::WindowPos => RawCallback::WindowPos(Some(window_pos_trampoline)),
        EventKind::WindowSize => RawCallback::WindowSize(Some(window_size_trampoline)),
        EventKind::WindowClose => RawCallback::WindowClose(Some(window_close_trampoline)),
        EventKind::WindowRefresh => RawCallback::WindowRefresh(Some(window_refresh_trampoline)),
        EventKind::WindowFocus => RawCallback::WindowFocus(Some(window_focus_trampoline)),
        EventKind::WindowIconify => RawCallback::WindowIconify(Some(window_iconify_trampoline)),
        EventKind::WindowMaximize => RawCallback::WindowMaximize(Some(window_maximize_trampoline)),
        EventKind::FramebufferSize => RawCallback::FramebufferSize(Some(framebuffer_size_trampoline)),
        EventKind::ContentScale => RawCallback::ContentScale(Some(content_scale_trampoline)),
        EventKind::Drop => RawCallback::Drop(Some(drop_trampoline)),
        EventKind::Monitor => RawCallback::Monitor(Some(monitor_trampoline)),
        EventKind::Joystick => RawCallback::Joystick(Some(joystick_trampoline)),
        EventKind::Error => RawCallback::Error(Some(error_trampoline)),
    }
}

/// Follow the back-reference of `window` to its callback table
fn resolve(window: *mut RawWindow) -> Option<Rc<WindowCallbacks>> {
    let session = session::current()?;
    let pointer = session.native().window_user_pointer(window).cast::<WindowCallbacks>();
    if pointer.is_null() {
        return None;
    }
    // SAFETY: the user pointer is only ever set by `Window` to `Rc::as_ptr` of
    // its own table, and cleared before that `Rc` is released. Taking a
    // strong count keeps the table alive if the window is dropped from
    // inside its own callback.
    unsafe {
        Rc::increment_strong_count(pointer);
        Some(Rc::from_raw(pointer))
    }
}

fn dispatch<F: ?Sized>(
    kind: EventKind,
    window: *mut RawWindow,
    slot: impl FnOnce(&WindowCallbacks) -> &CallbackSlot<F>,
    call: impl FnOnce(&mut F),
) {
    match resolve(window) {
        Some(table) => {
            slot(&table).invoke(call);
        }
        None => log::trace!("dropping {kind:?} event for unknown window {window:p}"),
    }
}

fn dimension(value: c_int) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

extern "C" fn key_trampoline(
    window: *mut RawWindow,
    key: c_int,
    scancode: c_int,
    action: c_int,
    mods: c_int,
) {
    let (Ok(typed_key), Ok(typed_action)) = (decode::<Key>(key), decode::<Action>(action)) else {
        log::warn!("dropping key event with unmapped codes key={key} action={action}");
        return;
    };
    let mods = Modifiers::from_native(mods);
    dispatch(EventKind::Key, window, |table| &table.key, |callback| {
        callback(typed_key, scancode, typed_action, mods);
    });
}

extern "C" fn char_trampoline(window: *mut RawWindow, codepoint: c_uint) {
    let Some(character) = char::from_u32(codepoint) else {
        log::warn!("dropping char event with invalid codepoint {codepoint:#x}");
        return;
    };
    dispatch(EventKind::Char, window, |table| &table.char, |callback| callback(character));
}

extern "C" fn mouse_button_trampoline(window: *mut RawWindow, button: c_int, action: c_int, mods: c_int) {
    let (Ok(typed_button), Ok(typed_action)) = (MouseButton::from_native(button), decode::<Action>(action)) else {
        log::warn!("dropping mouse button event with unmapped codes button={button} action={action}");
        return;
    };
    let mods = Modifiers::from_native(mods);
    dispatch(EventKind::MouseButton, window, |table| &table.mouse_button, |callback| {
        callback(typed_button, typed_action, mods);
    });
}

extern "C" fn cursor_pos_trampoline(window: *mut RawWindow, x: f64, y: f64) {
    dispatch(EventKind::CursorPos, window, |table| &table.cursor_pos, |callback| callback(x, y));
}

extern "C" fn cursor_enter_trampoline(window: *mut RawWindow, entered: c_int) {
    dispatch(EventKind::CursorEnter, window, |table| &table.cursor_enter, |callback| {
        callback(entered != 0);
    });
}

extern "C" fn scroll_trampoline(window: *mut RawWindow, x: f64, y: f64) {
    dispatch(EventKind::Scroll, window, |table| &table.scroll, |callback| callback(x, y));
}

extern "C" fn window_pos_trampoline(window: *mut RawWindow, x: c_int, y: c_int) {
    dispatch(EventKind::WindowPos, window, |table| &table.window_pos, |callback| callback(x, y));
}

extern "C" fn window_size_trampoline(window: *mut RawWindow, width: c_int, height: c_int) {
    dispatch(EventKind::WindowSize, window, |table| &table.window_size, |callback| {
        callback(dimension(width), dimension(height));
    });
}

extern "C" fn window_close_trampoline(window: *mut RawWindow) {
    dispatch(EventKind::WindowClose, window, |table| &table.window_close, |callback| callback());
}

extern "C" fn window_refresh_trampoline(window: *mut RawWindow) {
    dispatch(EventKind::WindowRefresh, window, |table| &table.window_refresh, |callback| callback());
}

extern "C" fn window_focus_trampoline(window: *mut RawWindow, focused: c_int) {
    dispatch(EventKind::WindowFocus, window, |table| &table.window_focus, |callback| {
        callback(focused != 0);
    });
}

extern "C" fn window_iconify_trampoline(window: *mut RawWindow, iconified: c_int) {
    dispatch(EventKind::WindowIconify, window, |table| &table.window_iconify, |callback| {
        callback(iconified != 0);
    });
}

extern "C" fn window_maximize_trampoline(window: *mut RawWindow, maximized: c_int) {
    dispatch(EventKind::WindowMaximize, window, |table| &table.window_maximize, |callback| {
        callback(maximized != 0);
    });
}

extern "C" fn framebuffer_size_trampoline(window: *mut RawWindow, width: c_int, height: c_int) {
    dispatch(EventKind::FramebufferSize, window, |table| &table.framebuffer_size, |callback| {
        callback(dimension(width), dimension(height));
    });
}

extern "C" fn content_scale_trampoline(window: *mut RawWindow, x: f32, y: f32) {
    dispatch(EventKind::ContentScale, window, |table| &table.content_scale, |callback| callback(x, y));
}

extern "C" fn drop_trampoline(window: *mut RawWindow, count: c_int, paths: *mut *const c_char) {
    let count = usize::try_from(count).unwrap_or(0);
    let paths = if paths.is_null() || count == 0 {
        Vec::new()
    } else {
        // SAFETY: the native layer passes `count` valid NUL-terminated strings
        // that stay alive for the duration of this call.
        unsafe { std::slice::from_raw_parts(paths, count) }
            .iter()
            .filter(|path| !path.is_null())
            .map(|&path| PathBuf::from(unsafe { CStr::from_ptr(path) }.to_string_lossy().into_owned()))
            .collect()
    };
    dispatch(EventKind::Drop, window, |table| &table.drop, |callback| callback(paths));
}

extern "C" fn monitor_trampoline(monitor: *mut RawMonitor, event: c_int) {
    let Some(session) = session::current() else {
        return;
    };
    let (Some(monitor), Ok(event)) = (Monitor::from_raw(monitor, session.epoch()), decode::<ConnectionEvent>(event)) else {
        log::warn!("dropping monitor event with null monitor or unmapped event {event}");
        return;
    };
    session.callbacks().monitor.invoke(|callback| callback(monitor, event));
}

extern "C" fn joystick_trampoline(jid: c_int, event: c_int) {
    let Some(session) = session::current() else {
        return;
    };
    let (Ok(id), Ok(event)) = (decode::<JoystickId>(jid), decode::<ConnectionEvent>(event)) else {
        log::warn!("dropping joystick event with unmapped codes jid={jid} event={event}");
        return;
    };
    session.callbacks().joystick.invoke(|callback| callback(Joystick::new(id), event));
}

/// Feeds the error channel; installed before native initialization
pub(crate) extern "C" fn error_trampoline(code: c_int, description: *const c_char) {
    let description = if description.is_null() {
        String::new()
    } else {
        // SAFETY: the native layer passes a NUL-terminated string valid for this call.
        unsafe { CStr::from_ptr(description) }.to_string_lossy().into_owned()
    };
    let error = NativeError::new(code, description);
    ErrorChannel::record(error.clone());

    if let Some(session) = session::current() {
        session.callbacks().error.invoke(|callback| callback(&error));
    }
}
