//! GLFW backend
//!
//! Drives the C API through the bindings in `glfw::ffi`, which also build and
//! link the native library. The opaque handle types here and in `ffi` are
//! both zero-sized stand-ins for the same C structs, so handles are cast
//! between them at the call boundary. GLFW keeps window callbacks per
//! window, while [`NativeLibrary`] exposes one slot per category, so this
//! backend remembers the installed window callbacks and applies them to every
//! window it creates.
//!
//! Every unsafe call below relies on the same contract: handles come from
//! this backend and are still live, which the safe wrappers guarantee.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ffi::{c_char, c_int, c_uint, c_ushort, c_void, CStr};
use std::mem;
use std::ptr;
use std::sync::Arc;

use glfw::ffi;

use super::{
    EventKind, NativeLibrary, NativeWaker, RawCallback, RawCursor, RawGamepadState, RawGammaRamp, RawImage,
    RawMonitor, RawVideoMode, RawWindow,
};

/// Native gamma ramp layout
#[repr(C)]
struct GammaRampLayout {
    red: *mut c_ushort,
    green: *mut c_ushort,
    blue: *mut c_ushort,
    size: c_uint,
}

/// Copy a native string that stays valid only until the next call
fn owned_string(string: *const c_char) -> Option<String> {
    if string.is_null() {
        return None;
    }
    // SAFETY: GLFW returns NUL-terminated UTF-8 or null.
    Some(unsafe { CStr::from_ptr(string) }.to_string_lossy().into_owned())
}

/// Copy a native array described by a pointer and a count
fn owned_array<T: Copy>(data: *const T, count: c_int) -> Vec<T> {
    let count = usize::try_from(count).unwrap_or(0);
    if data.is_null() || count == 0 {
        return Vec::new();
    }
    // SAFETY: GLFW reports `count` valid elements behind `data`.
    unsafe { std::slice::from_raw_parts(data, count) }.to_vec()
}

/// Swap one per-window callback through its `ffi` setter
///
/// The callback types here and in `ffi` differ only in the opaque window
/// pointer type, so the function pointers are reinterpreted both ways.
macro_rules! swap {
    ($setter:ident, $variant:ident, $window:expr, $callback:expr) => {
        // SAFETY: `$window` is live and the signatures are ABI-identical.
        RawCallback::$variant(unsafe { mem::transmute(ffi::$setter($window.cast(), mem::transmute($callback))) })
    };
}

/// Install `callback` on one window, returning the callback it replaced
fn swap_window_callback(window: *mut RawWindow, callback: RawCallback) -> RawCallback {
    match callback {
        RawCallback::Key(f) => swap!(glfwSetKeyCallback, Key, window, f),
        RawCallback::Char(f) => swap!(glfwSetCharCallback, Char, window, f),
        RawCallback::MouseButton(f) => swap!(glfwSetMouseButtonCallback, MouseButton, window, f),
        RawCallback::CursorPos(f) => swap!(glfwSetCursorPosCallback, CursorPos, window, f),
        RawCallback::CursorEnter(f) => swap!(glfwSetCursorEnterCallback, CursorEnter, window, f),
        RawCallback::Scroll(f) => swap!(glfwSetScrollCallback, Scroll, window, f),
        RawCallback::WindowPos(f) => swap!(glfwSetWindowPosCallback, WindowPos, window, f),
        RawCallback::WindowSize(f) => swap!(glfwSetWindowSizeCallback, WindowSize, window, f),
        RawCallback::WindowClose(f) => swap!(glfwSetWindowCloseCallback, WindowClose, window, f),
        RawCallback::WindowRefresh(f) => swap!(glfwSetWindowRefreshCallback, WindowRefresh, window, f),
        RawCallback::WindowFocus(f) => swap!(glfwSetWindowFocusCallback, WindowFocus, window, f),
        RawCallback::WindowIconify(f) => swap!(glfwSetWindowIconifyCallback, WindowIconify, window, f),
        RawCallback::WindowMaximize(f) => swap!(glfwSetWindowMaximizeCallback, WindowMaximize, window, f),
        RawCallback::FramebufferSize(f) => swap!(glfwSetFramebufferSizeCallback, FramebufferSize, window, f),
        RawCallback::ContentScale(f) => swap!(glfwSetWindowContentScaleCallback, ContentScale, window, f),
        RawCallback::Drop(f) => swap!(glfwSetDropCallback, Drop, window, f),
        session_level @ (RawCallback::Monitor(_) | RawCallback::Joystick(_) | RawCallback::Error(_)) => {
            RawCallback::empty(session_level.kind())
        }
    }
}

/// Posts empty events from any thread
struct GlfwWaker;

impl NativeWaker for GlfwWaker {
    fn post_empty_event(&self) {
        unsafe { ffi::glfwPostEmptyEvent() }
    }
}

/// The GLFW C library
#[derive(Default)]
pub(crate) struct GlfwNative {
    window_callbacks: RefCell<BTreeMap<EventKind, RawCallback>>,
    windows: RefCell<Vec<*mut RawWindow>>,
}

impl GlfwNative {
    /// Callback currently remembered for a per-window category
    fn window_callback(&self, kind: EventKind) -> RawCallback {
        self.window_callbacks
            .borrow()
            .get(&kind)
            .copied()
            .unwrap_or(RawCallback::empty(kind))
    }
}

impl NativeLibrary for GlfwNative {
    fn init(&self) -> bool {
        unsafe { ffi::glfwInit() != 0 }
    }

    fn terminate(&self) {
        self.windows.borrow_mut().clear();
        self.window_callbacks.borrow_mut().clear();
        unsafe { ffi::glfwTerminate() }
    }

    fn last_error(&self) -> Option<(c_int, String)> {
        let mut description = ptr::null();
        let code = unsafe { ffi::glfwGetError(&mut description) };
        (code != 0).then(|| (code, owned_string(description).unwrap_or_default()))
    }

    fn time(&self) -> f64 {
        unsafe { ffi::glfwGetTime() }
    }

    fn waker(&self) -> Arc<dyn NativeWaker> {
        Arc::new(GlfwWaker)
    }

    fn proc_address(&self, name: &CStr) -> *const c_void {
        unsafe { ffi::glfwGetProcAddress(name.as_ptr()) as *const c_void }
    }

    fn default_window_hints(&self) {
        unsafe { ffi::glfwDefaultWindowHints() }
    }

    fn window_hint(&self, hint: c_int, value: c_int) {
        unsafe { ffi::glfwWindowHint(hint, value) }
    }

    fn window_hint_string(&self, hint: c_int, value: &CStr) {
        unsafe { ffi::glfwWindowHintString(hint, value.as_ptr()) }
    }

    fn set_callback(&self, callback: RawCallback) -> RawCallback {
        let kind = callback.kind();
        // SAFETY: the session-level setters take plain function pointers whose
        // signatures match the ones declared in `super`.
        match callback {
            RawCallback::Error(f) => {
                RawCallback::Error(unsafe { mem::transmute(ffi::glfwSetErrorCallback(mem::transmute(f))) })
            }
            RawCallback::Monitor(f) => {
                RawCallback::Monitor(unsafe { mem::transmute(ffi::glfwSetMonitorCallback(mem::transmute(f))) })
            }
            RawCallback::Joystick(f) => {
                RawCallback::Joystick(unsafe { mem::transmute(ffi::glfwSetJoystickCallback(mem::transmute(f))) })
            }
            window_level => {
                let expected = self.window_callback(kind);
                for &window in self.windows.borrow().iter() {
                    let previous = swap_window_callback(window, window_level);
                    debug_assert_eq!(
                        previous.address(),
                        expected.address(),
                        "window {window:p} held a {kind:?} callback this backend did not install"
                    );
                }
                self.window_callbacks.borrow_mut().insert(kind, window_level);
                expected
            }
        }
    }

    fn create_window(
        &self,
        width: c_int,
        height: c_int,
        title: &CStr,
        monitor: *mut RawMonitor,
        share: *mut RawWindow,
    ) -> *mut RawWindow {
        let window: *mut RawWindow =
            unsafe { ffi::glfwCreateWindow(width, height, title.as_ptr(), monitor.cast(), share.cast()) }.cast();
        if !window.is_null() {
            for &callback in self.window_callbacks.borrow().values() {
                let previous = swap_window_callback(window, callback);
                debug_assert!(
                    !previous.is_set(),
                    "new window {window:p} already had a {:?} callback",
                    previous.kind()
                );
            }
            self.windows.borrow_mut().push(window);
        }
        window
    }

    fn destroy_window(&self, window: *mut RawWindow) {
        self.windows.borrow_mut().retain(|&live| live != window);
        unsafe { ffi::glfwDestroyWindow(window.cast()) }
    }

    fn set_window_user_pointer(&self, window: *mut RawWindow, pointer: *mut c_void) {
        unsafe { ffi::glfwSetWindowUserPointer(window.cast(), pointer) }
    }

    fn window_user_pointer(&self, window: *mut RawWindow) -> *mut c_void {
        if window.is_null() {
            return ptr::null_mut();
        }
        unsafe { ffi::glfwGetWindowUserPointer(window.cast()) }
    }

    fn window_should_close(&self, window: *mut RawWindow) -> bool {
        unsafe { ffi::glfwWindowShouldClose(window.cast()) != 0 }
    }

    fn set_window_should_close(&self, window: *mut RawWindow, value: bool) {
        unsafe { ffi::glfwSetWindowShouldClose(window.cast(), c_int::from(value)) }
    }

    fn set_window_title(&self, window: *mut RawWindow, title: &CStr) {
        unsafe { ffi::glfwSetWindowTitle(window.cast(), title.as_ptr()) }
    }

    fn window_pos(&self, window: *mut RawWindow) -> (c_int, c_int) {
        let (mut x, mut y) = (0, 0);
        unsafe { ffi::glfwGetWindowPos(window.cast(), &mut x, &mut y) };
        (x, y)
    }

    fn set_window_pos(&self, window: *mut RawWindow, x: c_int, y: c_int) {
        unsafe { ffi::glfwSetWindowPos(window.cast(), x, y) }
    }

    fn window_size(&self, window: *mut RawWindow) -> (c_int, c_int) {
        let (mut width, mut height) = (0, 0);
        unsafe { ffi::glfwGetWindowSize(window.cast(), &mut width, &mut height) };
        (width, height)
    }

    fn set_window_size(&self, window: *mut RawWindow, width: c_int, height: c_int) {
        unsafe { ffi::glfwSetWindowSize(window.cast(), width, height) }
    }

    fn set_window_size_limits(
        &self,
        window: *mut RawWindow,
        min_width: c_int,
        min_height: c_int,
        max_width: c_int,
        max_height: c_int,
    ) {
        unsafe { ffi::glfwSetWindowSizeLimits(window.cast(), min_width, min_height, max_width, max_height) }
    }

    fn set_window_aspect_ratio(&self, window: *mut RawWindow, numer: c_int, denom: c_int) {
        unsafe { ffi::glfwSetWindowAspectRatio(window.cast(), numer, denom) }
    }

    fn framebuffer_size(&self, window: *mut RawWindow) -> (c_int, c_int) {
        let (mut width, mut height) = (0, 0);
        unsafe { ffi::glfwGetFramebufferSize(window.cast(), &mut width, &mut height) };
        (width, height)
    }

    fn window_frame_size(&self, window: *mut RawWindow) -> (c_int, c_int, c_int, c_int) {
        let (mut left, mut top, mut right, mut bottom) = (0, 0, 0, 0);
        unsafe { ffi::glfwGetWindowFrameSize(window.cast(), &mut left, &mut top, &mut right, &mut bottom) };
        (left, top, right, bottom)
    }

    fn window_content_scale(&self, window: *mut RawWindow) -> (f32, f32) {
        let (mut x, mut y) = (1.0, 1.0);
        unsafe { ffi::glfwGetWindowContentScale(window.cast(), &mut x, &mut y) };
        (x, y)
    }

    fn window_opacity(&self, window: *mut RawWindow) -> f32 {
        unsafe { ffi::glfwGetWindowOpacity(window.cast()) }
    }

    fn set_window_opacity(&self, window: *mut RawWindow, opacity: f32) {
        unsafe { ffi::glfwSetWindowOpacity(window.cast(), opacity) }
    }

    fn iconify_window(&self, window: *mut RawWindow) {
        unsafe { ffi::glfwIconifyWindow(window.cast()) }
    }

    fn restore_window(&self, window: *mut RawWindow) {
        unsafe { ffi::glfwRestoreWindow(window.cast()) }
    }

    fn maximize_window(&self, window: *mut RawWindow) {
        unsafe { ffi::glfwMaximizeWindow(window.cast()) }
    }

    fn show_window(&self, window: *mut RawWindow) {
        unsafe { ffi::glfwShowWindow(window.cast()) }
    }

    fn hide_window(&self, window: *mut RawWindow) {
        unsafe { ffi::glfwHideWindow(window.cast()) }
    }

    fn focus_window(&self, window: *mut RawWindow) {
        unsafe { ffi::glfwFocusWindow(window.cast()) }
    }

    fn request_window_attention(&self, window: *mut RawWindow) {
        unsafe { ffi::glfwRequestWindowAttention(window.cast()) }
    }

    fn window_monitor(&self, window: *mut RawWindow) -> *mut RawMonitor {
        unsafe { ffi::glfwGetWindowMonitor(window.cast()) }.cast()
    }

    fn set_window_monitor(
        &self,
        window: *mut RawWindow,
        monitor: *mut RawMonitor,
        x: c_int,
        y: c_int,
        width: c_int,
        height: c_int,
        refresh_rate: c_int,
    ) {
        unsafe { ffi::glfwSetWindowMonitor(window.cast(), monitor.cast(), x, y, width, height, refresh_rate) }
    }

    fn window_attrib(&self, window: *mut RawWindow, attrib: c_int) -> c_int {
        unsafe { ffi::glfwGetWindowAttrib(window.cast(), attrib) }
    }

    fn set_window_attrib(&self, window: *mut RawWindow, attrib: c_int, value: c_int) {
        unsafe { ffi::glfwSetWindowAttrib(window.cast(), attrib, value) }
    }

    fn input_mode(&self, window: *mut RawWindow, mode: c_int) -> c_int {
        unsafe { ffi::glfwGetInputMode(window.cast(), mode) }
    }

    fn set_input_mode(&self, window: *mut RawWindow, mode: c_int, value: c_int) {
        unsafe { ffi::glfwSetInputMode(window.cast(), mode, value) }
    }

    fn key(&self, window: *mut RawWindow, key: c_int) -> c_int {
        unsafe { ffi::glfwGetKey(window.cast(), key) }
    }

    fn mouse_button(&self, window: *mut RawWindow, button: c_int) -> c_int {
        unsafe { ffi::glfwGetMouseButton(window.cast(), button) }
    }

    fn cursor_pos(&self, window: *mut RawWindow) -> (f64, f64) {
        let (mut x, mut y) = (0.0, 0.0);
        unsafe { ffi::glfwGetCursorPos(window.cast(), &mut x, &mut y) };
        (x, y)
    }

    fn set_cursor_pos(&self, window: *mut RawWindow, x: f64, y: f64) {
        unsafe { ffi::glfwSetCursorPos(window.cast(), x, y) }
    }

    fn set_cursor(&self, window: *mut RawWindow, cursor: *mut RawCursor) {
        unsafe { ffi::glfwSetCursor(window.cast(), cursor.cast()) }
    }

    fn make_context_current(&self, window: *mut RawWindow) {
        unsafe { ffi::glfwMakeContextCurrent(window.cast()) }
    }

    fn swap_buffers(&self, window: *mut RawWindow) {
        unsafe { ffi::glfwSwapBuffers(window.cast()) }
    }

    fn set_window_icon(&self, window: *mut RawWindow, images: &[RawImage]) {
        let count = c_int::try_from(images.len()).unwrap_or(c_int::MAX);
        let images = if images.is_empty() { ptr::null() } else { images.as_ptr() };
        // GLFW copies the pixels before returning.
        unsafe { ffi::glfwSetWindowIcon(window.cast(), count, images.cast()) }
    }

    fn clipboard_string(&self, window: *mut RawWindow) -> Option<String> {
        owned_string(unsafe { ffi::glfwGetClipboardString(window.cast()) })
    }

    fn set_clipboard_string(&self, window: *mut RawWindow, text: &CStr) {
        unsafe { ffi::glfwSetClipboardString(window.cast(), text.as_ptr()) }
    }

    fn create_cursor(&self, image: &RawImage, x_hot: c_int, y_hot: c_int) -> *mut RawCursor {
        // GLFW copies the pixels before returning.
        unsafe { ffi::glfwCreateCursor(ptr::from_ref(image).cast(), x_hot, y_hot) }.cast()
    }

    fn create_standard_cursor(&self, shape: c_int) -> *mut RawCursor {
        unsafe { ffi::glfwCreateStandardCursor(shape) }.cast()
    }

    fn destroy_cursor(&self, cursor: *mut RawCursor) {
        unsafe { ffi::glfwDestroyCursor(cursor.cast()) }
    }

    fn monitors(&self) -> Vec<*mut RawMonitor> {
        let mut count = 0;
        let monitors = unsafe { ffi::glfwGetMonitors(&mut count) };
        owned_array(monitors.cast::<*mut RawMonitor>().cast_const(), count)
    }

    fn primary_monitor(&self) -> *mut RawMonitor {
        unsafe { ffi::glfwGetPrimaryMonitor() }.cast()
    }

    fn monitor_pos(&self, monitor: *mut RawMonitor) -> (c_int, c_int) {
        let (mut x, mut y) = (0, 0);
        unsafe { ffi::glfwGetMonitorPos(monitor.cast(), &mut x, &mut y) };
        (x, y)
    }

    fn monitor_workarea(&self, monitor: *mut RawMonitor) -> (c_int, c_int, c_int, c_int) {
        let (mut x, mut y, mut width, mut height) = (0, 0, 0, 0);
        unsafe { ffi::glfwGetMonitorWorkarea(monitor.cast(), &mut x, &mut y, &mut width, &mut height) };
        (x, y, width, height)
    }

    fn monitor_physical_size(&self, monitor: *mut RawMonitor) -> (c_int, c_int) {
        let (mut width, mut height) = (0, 0);
        unsafe { ffi::glfwGetMonitorPhysicalSize(monitor.cast(), &mut width, &mut height) };
        (width, height)
    }

    fn monitor_content_scale(&self, monitor: *mut RawMonitor) -> (f32, f32) {
        let (mut x, mut y) = (1.0, 1.0);
        unsafe { ffi::glfwGetMonitorContentScale(monitor.cast(), &mut x, &mut y) };
        (x, y)
    }

    fn monitor_name(&self, monitor: *mut RawMonitor) -> Option<String> {
        owned_string(unsafe { ffi::glfwGetMonitorName(monitor.cast()) })
    }

    fn video_mode(&self, monitor: *mut RawMonitor) -> Option<RawVideoMode> {
        let mode = unsafe { ffi::glfwGetVideoMode(monitor.cast()) }.cast::<RawVideoMode>();
        // SAFETY: non-null results point at a mode owned by GLFW with the
        // same layout as `RawVideoMode`.
        (!mode.is_null()).then(|| unsafe { *mode })
    }

    fn video_modes(&self, monitor: *mut RawMonitor) -> Vec<RawVideoMode> {
        let mut count = 0;
        let modes = unsafe { ffi::glfwGetVideoModes(monitor.cast(), &mut count) };
        owned_array(modes.cast::<RawVideoMode>(), count)
    }

    fn set_gamma(&self, monitor: *mut RawMonitor, gamma: f32) {
        unsafe { ffi::glfwSetGamma(monitor.cast(), gamma) }
    }

    fn gamma_ramp(&self, monitor: *mut RawMonitor) -> Option<RawGammaRamp> {
        let ramp = unsafe { ffi::glfwGetGammaRamp(monitor.cast()) }.cast::<GammaRampLayout>();
        if ramp.is_null() {
            return None;
        }
        // SAFETY: GLFW owns the ramp until the next gamma call on this monitor.
        let ramp = unsafe { &*ramp };
        let size = c_int::try_from(ramp.size).unwrap_or(0);
        Some(RawGammaRamp {
            red: owned_array(ramp.red.cast_const(), size),
            green: owned_array(ramp.green.cast_const(), size),
            blue: owned_array(ramp.blue.cast_const(), size),
        })
    }

    fn set_gamma_ramp(&self, monitor: *mut RawMonitor, ramp: &RawGammaRamp) {
        let layout = GammaRampLayout {
            red: ramp.red.as_ptr().cast_mut(),
            green: ramp.green.as_ptr().cast_mut(),
            blue: ramp.blue.as_ptr().cast_mut(),
            size: c_uint::try_from(ramp.red.len()).unwrap_or(0),
        };
        // GLFW only reads the channels and copies them before returning.
        unsafe { ffi::glfwSetGammaRamp(monitor.cast(), ptr::from_ref(&layout).cast()) }
    }

    fn joystick_present(&self, jid: c_int) -> bool {
        unsafe { ffi::glfwJoystickPresent(jid) != 0 }
    }

    fn joystick_name(&self, jid: c_int) -> Option<String> {
        owned_string(unsafe { ffi::glfwGetJoystickName(jid) })
    }

    fn joystick_guid(&self, jid: c_int) -> Option<String> {
        owned_string(unsafe { ffi::glfwGetJoystickGUID(jid) })
    }

    fn joystick_axes(&self, jid: c_int) -> Vec<f32> {
        let mut count = 0;
        let axes = unsafe { ffi::glfwGetJoystickAxes(jid, &mut count) };
        owned_array(axes, count)
    }

    fn joystick_buttons(&self, jid: c_int) -> Vec<u8> {
        let mut count = 0;
        let buttons = unsafe { ffi::glfwGetJoystickButtons(jid, &mut count) };
        owned_array(buttons, count)
    }

    fn joystick_hats(&self, jid: c_int) -> Vec<u8> {
        let mut count = 0;
        let hats = unsafe { ffi::glfwGetJoystickHats(jid, &mut count) };
        owned_array(hats, count)
    }

    fn joystick_is_gamepad(&self, jid: c_int) -> bool {
        unsafe { ffi::glfwJoystickIsGamepad(jid) != 0 }
    }

    fn gamepad_name(&self, jid: c_int) -> Option<String> {
        owned_string(unsafe { ffi::glfwGetGamepadName(jid) })
    }

    fn gamepad_state(&self, jid: c_int) -> Option<RawGamepadState> {
        let mut state = RawGamepadState::default();
        (unsafe { ffi::glfwGetGamepadState(jid, ptr::from_mut(&mut state).cast()) } != 0).then_some(state)
    }

    fn update_gamepad_mappings(&self, mappings: &CStr) -> bool {
        unsafe { ffi::glfwUpdateGamepadMappings(mappings.as_ptr()) != 0 }
    }

    fn poll_events(&self) {
        unsafe { ffi::glfwPollEvents() }
    }

    fn wait_events(&self) {
        unsafe { ffi::glfwWaitEvents() }
    }

    fn wait_events_timeout(&self, timeout: f64) {
        unsafe { ffi::glfwWaitEventsTimeout(timeout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback;
    use crate::hint::WindowHint;
    use crate::session::{self, Library};
    use crate::window::Window;

    fn window_kinds() -> impl Iterator<Item = EventKind> {
        EventKind::ALL.into_iter().filter(|kind| kind.is_per_window())
    }

    #[test]
    fn test_window_callbacks_are_remembered_per_category() {
        let native = GlfwNative::default();

        for kind in window_kinds() {
            let previous = native.set_callback(callback::trampoline(kind));
            assert_eq!(previous.kind(), kind);
            assert!(!previous.is_set());
        }
        for kind in window_kinds() {
            assert_eq!(native.window_callback(kind).address(), callback::trampoline(kind).address());
            let previous = native.set_callback(RawCallback::empty(kind));
            assert_eq!(previous.address(), callback::trampoline(kind).address());
        }
        assert!(window_kinds().all(|kind| !native.window_callback(kind).is_set()));
    }

    #[test]
    fn test_session_level_categories_are_not_swapped_per_window() {
        for kind in [EventKind::Monitor, EventKind::Joystick, EventKind::Error] {
            let previous = swap_window_callback(ptr::null_mut(), callback::trampoline(kind));
            assert_eq!(previous.kind(), kind);
            assert!(!previous.is_set());
        }
    }

    #[test]
    #[ignore = "needs a display and a native GLFW"]
    fn test_callbacks_replayed_on_windows_created_later() {
        let _serial = session::serial();
        let library = Library::init_glfw().unwrap();
        library.set_hint(WindowHint::Visible, false).unwrap();

        let mut early = Window::new(64, 64, "early").unwrap();
        early.set_key_callback(|_, _, _, _| {}).unwrap();
        let current = session::require().unwrap();
        for kind in window_kinds() {
            current.ensure_installed(kind);
        }
        let later = Window::new(64, 64, "later").unwrap();

        // Swapping in an empty slot hands back what each window carries.
        for raw in [early.raw_handle().unwrap(), later.raw_handle().unwrap()] {
            for kind in window_kinds() {
                let previous = swap_window_callback(raw, RawCallback::empty(kind));
                assert_eq!(previous.address(), callback::trampoline(kind).address(), "{kind:?}");
                swap_window_callback(raw, previous);
            }
        }
    }
}
