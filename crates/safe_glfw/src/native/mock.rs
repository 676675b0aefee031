//! In-memory native library for headless tests
//!
//! [`MockNative`] keeps windows, cursors, monitors and joysticks in plain
//! maps, hands out fake but stable addresses, and records every call that
//! creates, destroys or configures something. Events are either emitted
//! immediately through the installed native callbacks ([`MockNative::emit`])
//! or queued for the next event pump ([`MockNative::push_event`]).
//!
//! Clones share state, so a test keeps one clone for inspection and gives the
//! other to [`crate::Library::init`].
//!
//! Waits return at once unless [`MockNative::block_waits`] is on, in which
//! case they block until an event is queued or an empty event is posted from
//! any thread.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::ffi::{c_int, c_uint, c_void, CStr, CString};
use std::ptr;
use std::rc::Rc;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::error::ErrorCode;
use crate::hint::WindowHint;
use crate::input::{Action, CursorMode, InputMode};
use crate::mapping::{encode, NativeEnum};
use crate::monitor::ConnectionEvent;
use crate::window::WindowAttribute;

use super::{
    EventKind, NativeLibrary, NativeWaker, RawCallback, RawCursor, RawGamepadState, RawGammaRamp, RawImage,
    RawMonitor, RawVideoMode, RawWindow,
};

/// A recorded native call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum MockCall {
    Init,
    Terminate,
    DefaultWindowHints,
    WindowHint(c_int, c_int),
    WindowHintString(c_int, String),
    SetCallback(EventKind, bool),
    CreateWindow { width: c_int, height: c_int, title: String },
    DestroyWindow(usize),
    SetWindowAttrib(c_int, c_int),
    SetInputMode(c_int, c_int),
    CreateCursor { width: c_int, height: c_int, x_hot: c_int, y_hot: c_int },
    CreateStandardCursor(c_int),
    DestroyCursor(usize),
    MakeContextCurrent(usize),
    SetWindowIcon(usize),
    SetClipboardString(String),
    SetGamma(f32),
    SetGammaRamp(usize),
    UpdateGamepadMappings(String),
    PollEvents,
    WaitEvents,
    WaitEventsTimeout(f64),
    PostEmptyEvent,
}

/// A synthetic native event
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum MockEvent {
    Key { window: *mut RawWindow, key: c_int, scancode: c_int, action: c_int, mods: c_int },
    Char { window: *mut RawWindow, codepoint: c_uint },
    MouseButton { window: *mut RawWindow, button: c_int, action: c_int, mods: c_int },
    CursorPos { window: *mut RawWindow, x: f64, y: f64 },
    CursorEnter { window: *mut RawWindow, entered: bool },
    Scroll { window: *mut RawWindow, x: f64, y: f64 },
    WindowPos { window: *mut RawWindow, x: c_int, y: c_int },
    WindowSize { window: *mut RawWindow, width: c_int, height: c_int },
    WindowClose { window: *mut RawWindow },
    WindowRefresh { window: *mut RawWindow },
    WindowFocus { window: *mut RawWindow, focused: bool },
    WindowIconify { window: *mut RawWindow, iconified: bool },
    WindowMaximize { window: *mut RawWindow, maximized: bool },
    FramebufferSize { window: *mut RawWindow, width: c_int, height: c_int },
    ContentScale { window: *mut RawWindow, x: f32, y: f32 },
    Drop { window: *mut RawWindow, paths: Vec<String> },
    Monitor { monitor: *mut RawMonitor, event: ConnectionEvent },
    Joystick { jid: c_int, event: ConnectionEvent },
    Error { code: c_int, description: String },
}

struct MockWindow {
    title: String,
    pos: (c_int, c_int),
    size: (c_int, c_int),
    content_scale: (f32, f32),
    opacity: f32,
    should_close: bool,
    user_pointer: *mut c_void,
    monitor: usize,
    cursor: usize,
    cursor_pos: (f64, f64),
    attribs: HashMap<c_int, c_int>,
    input_modes: HashMap<c_int, c_int>,
    keys: HashMap<c_int, c_int>,
    mouse_buttons: HashMap<c_int, c_int>,
    icon: Vec<(c_int, c_int)>,
}

struct MockMonitor {
    name: String,
    mode: RawVideoMode,
    ramp: RawGammaRamp,
}

/// Ramp of `size` steps raised to `1 / gamma`
fn exponential_ramp(size: usize, gamma: f32) -> RawGammaRamp {
    let last = size.saturating_sub(1).max(1) as f32;
    let channel: Vec<u16> = (0..size)
        .map(|step| {
            let value = (step as f32 / last).powf(1.0 / gamma) * 65535.0 + 0.5;
            value.min(65535.0) as u16
        })
        .collect();
    RawGammaRamp {
        red: channel.clone(),
        green: channel.clone(),
        blue: channel,
    }
}

/// Empty events posted from any thread
#[derive(Default)]
struct MockWake {
    posted: Mutex<usize>,
    signal: Condvar,
}

impl MockWake {
    /// Block until an empty event is posted or `timeout` passes
    fn wait(&self, timeout: Option<Duration>) {
        let posted = self.posted.lock().unwrap_or_else(PoisonError::into_inner);
        let mut posted = match timeout {
            Some(timeout) => {
                self.signal
                    .wait_timeout_while(posted, timeout, |posted| *posted == 0)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .signal
                .wait_while(posted, |posted| *posted == 0)
                .unwrap_or_else(PoisonError::into_inner),
        };
        *posted = 0;
    }

    fn consume(&self) {
        *self.posted.lock().unwrap_or_else(PoisonError::into_inner) = 0;
    }
}

impl NativeWaker for MockWake {
    fn post_empty_event(&self) {
        *self.posted.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.signal.notify_all();
    }
}

struct MockJoystick {
    name: String,
    axes: Vec<f32>,
    buttons: Vec<u8>,
    hats: Vec<u8>,
    gamepad: Option<(String, RawGamepadState)>,
}

#[derive(Default)]
struct MockState {
    initialized: bool,
    next_address: usize,
    time: f64,
    windows: BTreeMap<usize, MockWindow>,
    cursors: BTreeSet<usize>,
    monitors: Vec<(usize, MockMonitor)>,
    joysticks: BTreeMap<c_int, MockJoystick>,
    hints: BTreeMap<c_int, c_int>,
    string_hints: BTreeMap<c_int, String>,
    callbacks: HashMap<EventKind, RawCallback>,
    last_error: Option<(c_int, String)>,
    pending: VecDeque<MockEvent>,
    calls: Vec<MockCall>,
    fail_init: Option<(c_int, String)>,
    fail_window: Option<(c_int, String)>,
    fail_cursor: Option<(c_int, String)>,
    reject_mappings: Option<(c_int, String)>,
    current_context: usize,
    clipboard: Option<String>,
    wake: Arc<MockWake>,
    blocking_waits: bool,
}

impl MockState {
    fn allocate(&mut self) -> usize {
        self.next_address += 0x10;
        0x1000 + self.next_address
    }

    fn window(&mut self, window: *mut RawWindow) -> Option<&mut MockWindow> {
        self.windows.get_mut(&(window as usize))
    }

    fn joystick(&self, jid: c_int) -> Option<&MockJoystick> {
        self.joysticks.get(&jid)
    }

    fn monitor(&self, monitor: *mut RawMonitor) -> Option<&MockMonitor> {
        self.monitors
            .iter()
            .find(|(address, _)| *address == monitor as usize)
            .map(|(_, monitor)| monitor)
    }

    fn monitor_mut(&mut self, monitor: *mut RawMonitor) -> Option<&mut MockMonitor> {
        self.monitors
            .iter_mut()
            .find(|(address, _)| *address == monitor as usize)
            .map(|(_, monitor)| monitor)
    }

    fn callback(&self, kind: EventKind) -> RawCallback {
        self.callbacks.get(&kind).copied().unwrap_or(RawCallback::empty(kind))
    }

    /// Attribute values of a new window: platform defaults overlaid with hints
    fn initial_attribs(&self) -> HashMap<c_int, c_int> {
        let mut attribs: HashMap<c_int, c_int> = [
            (WindowAttribute::Focused, 1),
            (WindowAttribute::Resizable, 1),
            (WindowAttribute::Visible, 1),
            (WindowAttribute::Decorated, 1),
            (WindowAttribute::AutoIconify, 1),
            (WindowAttribute::FocusOnShow, 1),
            (WindowAttribute::Doublebuffer, 1),
            (WindowAttribute::ContextVersionMajor, 1),
        ]
        .into_iter()
        .map(|(attribute, value)| (encode(attribute), value))
        .collect();
        attribs.insert(encode(WindowAttribute::ClientApi), encode(crate::hint::ClientApi::OpenGl));
        attribs.insert(
            encode(WindowAttribute::ContextCreationApi),
            encode(crate::hint::ContextCreationApi::Native),
        );

        for (&hint, &value) in &self.hints {
            if WindowAttribute::from_native(hint).is_some() {
                attribs.insert(hint, value);
            }
        }
        attribs
    }
}

/// Instrumented in-memory implementation of [`NativeLibrary`]
#[derive(Clone, Default)]
pub struct MockNative {
    state: Rc<RefCell<MockState>>,
}

impl MockNative {
    /// An uninitialized library with no monitors and no joysticks
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: MockCall) {
        self.state.borrow_mut().calls.push(call);
    }

    /// Every recorded call, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Whether a native callback is installed for `kind`
    pub fn has_callback(&self, kind: EventKind) -> bool {
        self.state.borrow().callback(kind).is_set()
    }

    /// Number of live windows
    pub fn live_windows(&self) -> usize {
        self.state.borrow().windows.len()
    }

    /// Number of live cursors
    pub fn live_cursors(&self) -> usize {
        self.state.borrow().cursors.len()
    }

    /// Title of a live window
    pub fn window_title(&self, window: *mut RawWindow) -> Option<String> {
        self.state.borrow_mut().window(window).map(|window| window.title.clone())
    }

    /// Sizes of the icon images last set on a live window
    pub fn window_icon_sizes(&self, window: *mut RawWindow) -> Option<Vec<(c_int, c_int)>> {
        self.state.borrow_mut().window(window).map(|window| window.icon.clone())
    }

    /// Current clipboard contents
    pub fn clipboard(&self) -> Option<String> {
        self.state.borrow().clipboard.clone()
    }

    /// Make waits block until an event is queued or an empty event is posted
    pub fn block_waits(&self, blocking: bool) {
        self.state.borrow_mut().blocking_waits = blocking;
    }

    /// Make the next `init` fail with the given error
    pub fn fail_init(&self, code: c_int, description: &str) {
        self.state.borrow_mut().fail_init = Some((code, description.to_string()));
    }

    /// Make the next window creation fail with the given error
    pub fn fail_next_window(&self, code: c_int, description: &str) {
        self.state.borrow_mut().fail_window = Some((code, description.to_string()));
    }

    /// Make the next cursor creation fail with the given error
    pub fn fail_next_cursor(&self, code: c_int, description: &str) {
        self.state.borrow_mut().fail_cursor = Some((code, description.to_string()));
    }

    /// Make the next gamepad mapping update fail with the given error
    pub fn reject_gamepad_mappings(&self, code: c_int, description: &str) {
        self.state.borrow_mut().reject_mappings = Some((code, description.to_string()));
    }

    /// Set the value returned by the time query
    pub fn set_time(&self, seconds: f64) {
        self.state.borrow_mut().time = seconds;
    }

    /// Connect a monitor; the first one connected is the primary
    pub fn add_monitor(&self, name: &str, mode: RawVideoMode) -> *mut RawMonitor {
        let mut state = self.state.borrow_mut();
        let address = state.allocate();
        state.monitors.push((
            address,
            MockMonitor {
                name: name.to_string(),
                mode,
                ramp: exponential_ramp(256, 1.0),
            },
        ));
        address as *mut RawMonitor
    }

    /// Disconnect a monitor
    pub fn remove_monitor(&self, monitor: *mut RawMonitor) {
        let mut state = self.state.borrow_mut();
        state.monitors.retain(|(address, _)| *address != monitor as usize);
        for window in state.windows.values_mut() {
            if window.monitor == monitor as usize {
                window.monitor = 0;
            }
        }
    }

    /// Connect a joystick in slot `jid`
    pub fn connect_joystick(&self, jid: c_int, name: &str, axes: Vec<f32>, buttons: Vec<u8>, hats: Vec<u8>) {
        self.state.borrow_mut().joysticks.insert(
            jid,
            MockJoystick {
                name: name.to_string(),
                axes,
                buttons,
                hats,
                gamepad: None,
            },
        );
    }

    /// Give the joystick in slot `jid` a gamepad mapping
    pub fn map_gamepad(&self, jid: c_int, name: &str, state: RawGamepadState) {
        if let Some(joystick) = self.state.borrow_mut().joysticks.get_mut(&jid) {
            joystick.gamepad = Some((name.to_string(), state));
        }
    }

    /// Disconnect the joystick in slot `jid`
    pub fn disconnect_joystick(&self, jid: c_int) {
        self.state.borrow_mut().joysticks.remove(&jid);
    }

    /// Queue an event for the next event pump
    pub fn push_event(&self, event: MockEvent) {
        self.state.borrow_mut().pending.push_back(event);
    }

    /// Report a native error through the error callback
    pub fn raise_error(&self, code: c_int, description: &str) {
        self.emit(MockEvent::Error {
            code,
            description: description.to_string(),
        });
    }

    fn raise(&self, error: (c_int, String)) {
        let (code, description) = error;
        self.emit(MockEvent::Error { code, description });
    }

    fn require_init(&self) -> bool {
        let initialized = self.state.borrow().initialized;
        if !initialized {
            self.raise_error(encode(ErrorCode::NotInitialized), "The GLFW library is not initialized");
        }
        initialized
    }

    /// Deliver an event right away through the installed native callback
    ///
    /// Window state changes the native library applies before invoking the
    /// callback (close flag, size, key state) are applied here as well.
    pub fn emit(&self, event: MockEvent) {
        let kind = self.apply(&event);
        // Copy the function out so no borrow is held while it runs.
        let callback = self.state.borrow().callback(kind);

        match (callback, event) {
            (RawCallback::Key(Some(f)), MockEvent::Key { window, key, scancode, action, mods }) => {
                f(window, key, scancode, action, mods);
            }
            (RawCallback::Char(Some(f)), MockEvent::Char { window, codepoint }) => f(window, codepoint),
            (RawCallback::MouseButton(Some(f)), MockEvent::MouseButton { window, button, action, mods }) => {
                f(window, button, action, mods);
            }
            (RawCallback::CursorPos(Some(f)), MockEvent::CursorPos { window, x, y }) => f(window, x, y),
            (RawCallback::CursorEnter(Some(f)), MockEvent::CursorEnter { window, entered }) => {
                f(window, c_int::from(entered));
            }
            (RawCallback::Scroll(Some(f)), MockEvent::Scroll { window, x, y }) => f(window, x, y),
            (RawCallback::WindowPos(Some(f)), MockEvent::WindowPos { window, x, y }) => f(window, x, y),
            (RawCallback::WindowSize(Some(f)), MockEvent::WindowSize { window, width, height }) => {
                f(window, width, height);
            }
            (RawCallback::WindowClose(Some(f)), MockEvent::WindowClose { window }) => f(window),
            (RawCallback::WindowRefresh(Some(f)), MockEvent::WindowRefresh { window }) => f(window),
            (RawCallback::WindowFocus(Some(f)), MockEvent::WindowFocus { window, focused }) => {
                f(window, c_int::from(focused));
            }
            (RawCallback::WindowIconify(Some(f)), MockEvent::WindowIconify { window, iconified }) => {
                f(window, c_int::from(iconified));
            }
            (RawCallback::WindowMaximize(Some(f)), MockEvent::WindowMaximize { window, maximized }) => {
                f(window, c_int::from(maximized));
            }
            (RawCallback::FramebufferSize(Some(f)), MockEvent::FramebufferSize { window, width, height }) => {
                f(window, width, height);
            }
            (RawCallback::ContentScale(Some(f)), MockEvent::ContentScale { window, x, y }) => f(window, x, y),
            (RawCallback::Drop(Some(f)), MockEvent::Drop { window, paths }) => {
                let owned: Vec<CString> = paths
                    .iter()
                    .filter_map(|path| CString::new(path.as_str()).ok())
                    .collect();
                let mut pointers: Vec<*const std::ffi::c_char> = owned.iter().map(|path| path.as_ptr()).collect();
                let count = c_int::try_from(pointers.len()).unwrap_or(c_int::MAX);
                f(window, count, pointers.as_mut_ptr());
            }
            (RawCallback::Monitor(Some(f)), MockEvent::Monitor { monitor, event }) => f(monitor, encode(event)),
            (RawCallback::Joystick(Some(f)), MockEvent::Joystick { jid, event }) => f(jid, encode(event)),
            (RawCallback::Error(Some(f)), MockEvent::Error { code, description }) => {
                let description = CString::new(description).unwrap_or_default();
                f(code, description.as_ptr());
            }
            (callback, event) => log::trace!("mock event {event:?} has no {:?} callback", callback.kind()),
        }
    }

    /// Apply the state change an event implies; returns its category
    fn apply(&self, event: &MockEvent) -> EventKind {
        let mut state = self.state.borrow_mut();
        match event {
            MockEvent::Key { window, key, action, .. } => {
                if let Some(window) = state.window(*window) {
                    window.keys.insert(*key, *action);
                }
                EventKind::Key
            }
            MockEvent::Char { .. } => EventKind::Char,
            MockEvent::MouseButton { window, button, action, .. } => {
                if let Some(window) = state.window(*window) {
                    window.mouse_buttons.insert(*button, *action);
                }
                EventKind::MouseButton
            }
            MockEvent::CursorPos { window, x, y } => {
                if let Some(window) = state.window(*window) {
                    window.cursor_pos = (*x, *y);
                }
                EventKind::CursorPos
            }
            MockEvent::CursorEnter { .. } => EventKind::CursorEnter,
            MockEvent::Scroll { .. } => EventKind::Scroll,
            MockEvent::WindowPos { window, x, y } => {
                if let Some(window) = state.window(*window) {
                    window.pos = (*x, *y);
                }
                EventKind::WindowPos
            }
            MockEvent::WindowSize { window, width, height } => {
                if let Some(window) = state.window(*window) {
                    window.size = (*width, *height);
                }
                EventKind::WindowSize
            }
            MockEvent::WindowClose { window } => {
                if let Some(window) = state.window(*window) {
                    window.should_close = true;
                }
                EventKind::WindowClose
            }
            MockEvent::WindowRefresh { .. } => EventKind::WindowRefresh,
            MockEvent::WindowFocus { .. } => EventKind::WindowFocus,
            MockEvent::WindowIconify { .. } => EventKind::WindowIconify,
            MockEvent::WindowMaximize { .. } => EventKind::WindowMaximize,
            MockEvent::FramebufferSize { .. } => EventKind::FramebufferSize,
            MockEvent::ContentScale { window, x, y } => {
                if let Some(window) = state.window(*window) {
                    window.content_scale = (*x, *y);
                }
                EventKind::ContentScale
            }
            MockEvent::Drop { .. } => EventKind::Drop,
            MockEvent::Monitor { .. } => EventKind::Monitor,
            MockEvent::Joystick { .. } => EventKind::Joystick,
            MockEvent::Error { code, description } => {
                state.last_error = Some((*code, description.clone()));
                EventKind::Error
            }
        }
    }

    /// Wait for an event unless one is already queued or waits never block
    fn block_for_event(&self, timeout: Option<Duration>) {
        let (blocking, wake) = {
            let state = self.state.borrow();
            (state.blocking_waits && state.pending.is_empty(), Arc::clone(&state.wake))
        };
        if blocking {
            wake.wait(timeout);
        } else {
            wake.consume();
        }
    }

    fn drain(&self) {
        loop {
            let next = self.state.borrow_mut().pending.pop_front();
            match next {
                Some(event) => self.emit(event),
                None => break,
            }
        }
    }
}

impl NativeLibrary for MockNative {
    fn init(&self) -> bool {
        self.record(MockCall::Init);
        let failure = self.state.borrow_mut().fail_init.take();
        if let Some(error) = failure {
            self.raise(error);
            return false;
        }
        self.state.borrow_mut().initialized = true;
        true
    }

    fn terminate(&self) {
        self.record(MockCall::Terminate);
        let mut state = self.state.borrow_mut();
        state.initialized = false;
        state.windows.clear();
        state.cursors.clear();
        state.hints.clear();
        state.string_hints.clear();
        state.pending.clear();
        state.current_context = 0;
        state.clipboard = None;
        // Only the error callback survives termination.
        state.callbacks.retain(|kind, _| *kind == EventKind::Error);
    }

    fn last_error(&self) -> Option<(c_int, String)> {
        self.state.borrow_mut().last_error.take()
    }

    fn time(&self) -> f64 {
        self.state.borrow().time
    }

    fn waker(&self) -> Arc<dyn NativeWaker> {
        self.state.borrow().wake.clone()
    }

    fn proc_address(&self, name: &CStr) -> *const c_void {
        if self.state.borrow().current_context == 0 {
            self.raise_error(
                encode(ErrorCode::NoCurrentContext),
                "Cannot query entry point without a current OpenGL or OpenGL ES context",
            );
            return ptr::null();
        }
        let name = name.to_bytes();
        if name.starts_with(b"gl") {
            (0x7f00_0000 + name.len()) as *const c_void
        } else {
            ptr::null()
        }
    }

    fn default_window_hints(&self) {
        self.record(MockCall::DefaultWindowHints);
        let mut state = self.state.borrow_mut();
        state.hints.clear();
        state.string_hints.clear();
    }

    fn window_hint(&self, hint: c_int, value: c_int) {
        self.record(MockCall::WindowHint(hint, value));
        self.state.borrow_mut().hints.insert(hint, value);
    }

    fn window_hint_string(&self, hint: c_int, value: &CStr) {
        let value = value.to_string_lossy().into_owned();
        self.record(MockCall::WindowHintString(hint, value.clone()));
        self.state.borrow_mut().string_hints.insert(hint, value);
    }

    fn set_callback(&self, callback: RawCallback) -> RawCallback {
        let kind = callback.kind();
        self.record(MockCall::SetCallback(kind, callback.is_set()));
        self.state
            .borrow_mut()
            .callbacks
            .insert(kind, callback)
            .unwrap_or(RawCallback::empty(kind))
    }

    fn create_window(
        &self,
        width: c_int,
        height: c_int,
        title: &CStr,
        monitor: *mut RawMonitor,
        _share: *mut RawWindow,
    ) -> *mut RawWindow {
        let title = title.to_string_lossy().into_owned();
        self.record(MockCall::CreateWindow {
            width,
            height,
            title: title.clone(),
        });
        if !self.require_init() {
            return ptr::null_mut();
        }
        let failure = self.state.borrow_mut().fail_window.take();
        if let Some(error) = failure {
            self.raise(error);
            return ptr::null_mut();
        }

        let mut state = self.state.borrow_mut();
        let address = state.allocate();
        let position = |hint: WindowHint, fallback: c_int| {
            state.hints.get(&encode(hint)).copied().filter(|&v| v != crate::hint::ANY_POSITION).unwrap_or(fallback)
        };
        let pos = (position(WindowHint::PositionX, 0), position(WindowHint::PositionY, 0));
        let window = MockWindow {
            title,
            pos,
            size: (width, height),
            content_scale: (1.0, 1.0),
            opacity: 1.0,
            should_close: false,
            user_pointer: ptr::null_mut(),
            monitor: monitor as usize,
            cursor: 0,
            cursor_pos: (0.0, 0.0),
            attribs: state.initial_attribs(),
            input_modes: HashMap::new(),
            keys: HashMap::new(),
            mouse_buttons: HashMap::new(),
            icon: Vec::new(),
        };
        state.windows.insert(address, window);
        address as *mut RawWindow
    }

    fn destroy_window(&self, window: *mut RawWindow) {
        self.record(MockCall::DestroyWindow(window as usize));
        let mut state = self.state.borrow_mut();
        state.windows.remove(&(window as usize));
        if state.current_context == window as usize {
            state.current_context = 0;
        }
    }

    fn set_window_user_pointer(&self, window: *mut RawWindow, pointer: *mut c_void) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.user_pointer = pointer;
        }
    }

    fn window_user_pointer(&self, window: *mut RawWindow) -> *mut c_void {
        self.state
            .borrow_mut()
            .window(window)
            .map_or(ptr::null_mut(), |window| window.user_pointer)
    }

    fn window_should_close(&self, window: *mut RawWindow) -> bool {
        self.state.borrow_mut().window(window).is_some_and(|window| window.should_close)
    }

    fn set_window_should_close(&self, window: *mut RawWindow, value: bool) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.should_close = value;
        }
    }

    fn set_window_title(&self, window: *mut RawWindow, title: &CStr) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.title = title.to_string_lossy().into_owned();
        }
    }

    fn window_pos(&self, window: *mut RawWindow) -> (c_int, c_int) {
        self.state.borrow_mut().window(window).map_or((0, 0), |window| window.pos)
    }

    fn set_window_pos(&self, window: *mut RawWindow, x: c_int, y: c_int) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.pos = (x, y);
        }
    }

    fn window_size(&self, window: *mut RawWindow) -> (c_int, c_int) {
        self.state.borrow_mut().window(window).map_or((0, 0), |window| window.size)
    }

    fn set_window_size(&self, window: *mut RawWindow, width: c_int, height: c_int) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.size = (width, height);
        }
    }

    fn set_window_size_limits(&self, _window: *mut RawWindow, _: c_int, _: c_int, _: c_int, _: c_int) {}

    fn set_window_aspect_ratio(&self, _window: *mut RawWindow, _numer: c_int, _denom: c_int) {}

    #[allow(clippy::cast_possible_truncation)]
    fn framebuffer_size(&self, window: *mut RawWindow) -> (c_int, c_int) {
        self.state.borrow_mut().window(window).map_or((0, 0), |window| {
            let (width, height) = window.size;
            let (x_scale, y_scale) = window.content_scale;
            (
                (f64::from(width) * f64::from(x_scale)).round() as c_int,
                (f64::from(height) * f64::from(y_scale)).round() as c_int,
            )
        })
    }

    fn window_frame_size(&self, window: *mut RawWindow) -> (c_int, c_int, c_int, c_int) {
        let decorated = encode(WindowAttribute::Decorated);
        self.state.borrow_mut().window(window).map_or((0, 0, 0, 0), |window| {
            if window.attribs.get(&decorated) == Some(&1) {
                (1, 24, 1, 1)
            } else {
                (0, 0, 0, 0)
            }
        })
    }

    fn window_content_scale(&self, window: *mut RawWindow) -> (f32, f32) {
        self.state.borrow_mut().window(window).map_or((1.0, 1.0), |window| window.content_scale)
    }

    fn window_opacity(&self, window: *mut RawWindow) -> f32 {
        self.state.borrow_mut().window(window).map_or(1.0, |window| window.opacity)
    }

    fn set_window_opacity(&self, window: *mut RawWindow, opacity: f32) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.opacity = opacity;
        }
    }

    fn iconify_window(&self, window: *mut RawWindow) {
        self.set_window_attrib_state(window, WindowAttribute::Iconified, true);
    }

    fn restore_window(&self, window: *mut RawWindow) {
        self.set_window_attrib_state(window, WindowAttribute::Iconified, false);
        self.set_window_attrib_state(window, WindowAttribute::Maximized, false);
    }

    fn maximize_window(&self, window: *mut RawWindow) {
        self.set_window_attrib_state(window, WindowAttribute::Maximized, true);
    }

    fn show_window(&self, window: *mut RawWindow) {
        self.set_window_attrib_state(window, WindowAttribute::Visible, true);
    }

    fn hide_window(&self, window: *mut RawWindow) {
        self.set_window_attrib_state(window, WindowAttribute::Visible, false);
    }

    fn focus_window(&self, window: *mut RawWindow) {
        self.set_window_attrib_state(window, WindowAttribute::Focused, true);
    }

    fn request_window_attention(&self, _window: *mut RawWindow) {}

    fn window_monitor(&self, window: *mut RawWindow) -> *mut RawMonitor {
        self.state
            .borrow_mut()
            .window(window)
            .map_or(ptr::null_mut(), |window| window.monitor as *mut RawMonitor)
    }

    fn set_window_monitor(
        &self,
        window: *mut RawWindow,
        monitor: *mut RawMonitor,
        x: c_int,
        y: c_int,
        width: c_int,
        height: c_int,
        _refresh_rate: c_int,
    ) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.monitor = monitor as usize;
            window.size = (width, height);
            if monitor.is_null() {
                window.pos = (x, y);
            }
        }
    }

    fn window_attrib(&self, window: *mut RawWindow, attrib: c_int) -> c_int {
        self.state
            .borrow_mut()
            .window(window)
            .and_then(|window| window.attribs.get(&attrib).copied())
            .unwrap_or(0)
    }

    fn set_window_attrib(&self, window: *mut RawWindow, attrib: c_int, value: c_int) {
        self.record(MockCall::SetWindowAttrib(attrib, value));
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.attribs.insert(attrib, value);
        }
    }

    fn input_mode(&self, window: *mut RawWindow, mode: c_int) -> c_int {
        let default = if mode == encode(InputMode::Cursor) {
            encode(CursorMode::Normal)
        } else {
            0
        };
        self.state
            .borrow_mut()
            .window(window)
            .and_then(|window| window.input_modes.get(&mode).copied())
            .unwrap_or(default)
    }

    fn set_input_mode(&self, window: *mut RawWindow, mode: c_int, value: c_int) {
        self.record(MockCall::SetInputMode(mode, value));
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.input_modes.insert(mode, value);
        }
    }

    fn key(&self, window: *mut RawWindow, key: c_int) -> c_int {
        self.state
            .borrow_mut()
            .window(window)
            .and_then(|window| window.keys.get(&key).copied())
            .unwrap_or_else(|| encode(Action::Release))
    }

    fn mouse_button(&self, window: *mut RawWindow, button: c_int) -> c_int {
        self.state
            .borrow_mut()
            .window(window)
            .and_then(|window| window.mouse_buttons.get(&button).copied())
            .unwrap_or_else(|| encode(Action::Release))
    }

    fn cursor_pos(&self, window: *mut RawWindow) -> (f64, f64) {
        self.state.borrow_mut().window(window).map_or((0.0, 0.0), |window| window.cursor_pos)
    }

    fn set_cursor_pos(&self, window: *mut RawWindow, x: f64, y: f64) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.cursor_pos = (x, y);
        }
    }

    fn set_cursor(&self, window: *mut RawWindow, cursor: *mut RawCursor) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.cursor = cursor as usize;
        }
    }

    fn make_context_current(&self, window: *mut RawWindow) {
        self.record(MockCall::MakeContextCurrent(window as usize));
        self.state.borrow_mut().current_context = window as usize;
    }

    fn swap_buffers(&self, _window: *mut RawWindow) {}

    fn set_window_icon(&self, window: *mut RawWindow, images: &[RawImage]) {
        self.record(MockCall::SetWindowIcon(images.len()));
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.icon = images.iter().map(|image| (image.width, image.height)).collect();
        }
    }

    fn clipboard_string(&self, _window: *mut RawWindow) -> Option<String> {
        let contents = self.state.borrow().clipboard.clone();
        if contents.is_none() {
            self.raise_error(
                encode(ErrorCode::FormatUnavailable),
                "Failed to convert clipboard to string",
            );
        }
        contents
    }

    fn set_clipboard_string(&self, _window: *mut RawWindow, text: &CStr) {
        let text = text.to_string_lossy().into_owned();
        self.record(MockCall::SetClipboardString(text.clone()));
        self.state.borrow_mut().clipboard = Some(text);
    }

    fn create_cursor(&self, image: &RawImage, x_hot: c_int, y_hot: c_int) -> *mut RawCursor {
        self.record(MockCall::CreateCursor {
            width: image.width,
            height: image.height,
            x_hot,
            y_hot,
        });
        self.new_cursor()
    }

    fn create_standard_cursor(&self, shape: c_int) -> *mut RawCursor {
        self.record(MockCall::CreateStandardCursor(shape));
        self.new_cursor()
    }

    fn destroy_cursor(&self, cursor: *mut RawCursor) {
        self.record(MockCall::DestroyCursor(cursor as usize));
        let mut state = self.state.borrow_mut();
        state.cursors.remove(&(cursor as usize));
        for window in state.windows.values_mut() {
            if window.cursor == cursor as usize {
                window.cursor = 0;
            }
        }
    }

    fn monitors(&self) -> Vec<*mut RawMonitor> {
        self.state
            .borrow()
            .monitors
            .iter()
            .map(|(address, _)| *address as *mut RawMonitor)
            .collect()
    }

    fn primary_monitor(&self) -> *mut RawMonitor {
        self.state
            .borrow()
            .monitors
            .first()
            .map_or(ptr::null_mut(), |(address, _)| *address as *mut RawMonitor)
    }

    fn monitor_pos(&self, _monitor: *mut RawMonitor) -> (c_int, c_int) {
        (0, 0)
    }

    fn monitor_workarea(&self, monitor: *mut RawMonitor) -> (c_int, c_int, c_int, c_int) {
        self.state
            .borrow()
            .monitor(monitor)
            .map_or((0, 0, 0, 0), |monitor| (0, 0, monitor.mode.width, monitor.mode.height))
    }

    fn monitor_physical_size(&self, monitor: *mut RawMonitor) -> (c_int, c_int) {
        // Roughly 96 DPI.
        self.state
            .borrow()
            .monitor(monitor)
            .map_or((0, 0), |monitor| (monitor.mode.width * 254 / 960, monitor.mode.height * 254 / 960))
    }

    fn monitor_content_scale(&self, _monitor: *mut RawMonitor) -> (f32, f32) {
        (1.0, 1.0)
    }

    fn monitor_name(&self, monitor: *mut RawMonitor) -> Option<String> {
        self.state.borrow().monitor(monitor).map(|monitor| monitor.name.clone())
    }

    fn video_mode(&self, monitor: *mut RawMonitor) -> Option<RawVideoMode> {
        self.state.borrow().monitor(monitor).map(|monitor| monitor.mode)
    }

    fn video_modes(&self, monitor: *mut RawMonitor) -> Vec<RawVideoMode> {
        self.video_mode(monitor).into_iter().collect()
    }

    fn set_gamma(&self, monitor: *mut RawMonitor, gamma: f32) {
        self.record(MockCall::SetGamma(gamma));
        if let Some(monitor) = self.state.borrow_mut().monitor_mut(monitor) {
            monitor.ramp = exponential_ramp(256, gamma);
        }
    }

    fn gamma_ramp(&self, monitor: *mut RawMonitor) -> Option<RawGammaRamp> {
        self.state.borrow().monitor(monitor).map(|monitor| monitor.ramp.clone())
    }

    fn set_gamma_ramp(&self, monitor: *mut RawMonitor, ramp: &RawGammaRamp) {
        self.record(MockCall::SetGammaRamp(ramp.red.len()));
        if let Some(monitor) = self.state.borrow_mut().monitor_mut(monitor) {
            monitor.ramp = ramp.clone();
        }
    }

    fn joystick_present(&self, jid: c_int) -> bool {
        self.state.borrow().joysticks.contains_key(&jid)
    }

    fn joystick_name(&self, jid: c_int) -> Option<String> {
        self.state.borrow().joystick(jid).map(|joystick| joystick.name.clone())
    }

    fn joystick_guid(&self, jid: c_int) -> Option<String> {
        self.state
            .borrow()
            .joystick(jid)
            .map(|_| format!("03000000{jid:024x}"))
    }

    fn joystick_axes(&self, jid: c_int) -> Vec<f32> {
        self.state.borrow().joystick(jid).map(|joystick| joystick.axes.clone()).unwrap_or_default()
    }

    fn joystick_buttons(&self, jid: c_int) -> Vec<u8> {
        self.state.borrow().joystick(jid).map(|joystick| joystick.buttons.clone()).unwrap_or_default()
    }

    fn joystick_hats(&self, jid: c_int) -> Vec<u8> {
        self.state.borrow().joystick(jid).map(|joystick| joystick.hats.clone()).unwrap_or_default()
    }

    fn joystick_is_gamepad(&self, jid: c_int) -> bool {
        self.state.borrow().joystick(jid).is_some_and(|joystick| joystick.gamepad.is_some())
    }

    fn gamepad_name(&self, jid: c_int) -> Option<String> {
        self.state
            .borrow()
            .joystick(jid)
            .and_then(|joystick| joystick.gamepad.as_ref().map(|(name, _)| name.clone()))
    }

    fn gamepad_state(&self, jid: c_int) -> Option<RawGamepadState> {
        self.state
            .borrow()
            .joystick(jid)
            .and_then(|joystick| joystick.gamepad.as_ref().map(|(_, state)| *state))
    }

    fn update_gamepad_mappings(&self, mappings: &CStr) -> bool {
        self.record(MockCall::UpdateGamepadMappings(mappings.to_string_lossy().into_owned()));
        let rejection = self.state.borrow_mut().reject_mappings.take();
        match rejection {
            Some(error) => {
                self.raise(error);
                false
            }
            None => true,
        }
    }

    fn poll_events(&self) {
        self.record(MockCall::PollEvents);
        self.drain();
    }

    fn wait_events(&self) {
        self.record(MockCall::WaitEvents);
        self.block_for_event(None);
        self.drain();
    }

    fn wait_events_timeout(&self, timeout: f64) {
        self.record(MockCall::WaitEventsTimeout(timeout));
        self.block_for_event(Duration::try_from_secs_f64(timeout).ok());
        self.drain();
    }

    fn post_empty_event(&self) {
        self.record(MockCall::PostEmptyEvent);
        self.waker().post_empty_event();
    }
}

impl MockNative {
    fn new_cursor(&self) -> *mut RawCursor {
        if !self.require_init() {
            return ptr::null_mut();
        }
        let failure = self.state.borrow_mut().fail_cursor.take();
        if let Some(error) = failure {
            self.raise(error);
            return ptr::null_mut();
        }
        let mut state = self.state.borrow_mut();
        let address = state.allocate();
        state.cursors.insert(address);
        address as *mut RawCursor
    }

    fn set_window_attrib_state(&self, window: *mut RawWindow, attribute: WindowAttribute, value: bool) {
        if let Some(window) = self.state.borrow_mut().window(window) {
            window.attribs.insert(encode(attribute), c_int::from(value));
        }
    }
}

impl std::fmt::Debug for MockNative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MockNative")
            .field("initialized", &state.initialized)
            .field("windows", &state.windows.len())
            .field("cursors", &state.cursors.len())
            .field("calls", &state.calls.len())
            .finish_non_exhaustive()
    }
}
