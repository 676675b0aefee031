//! Library session guard
//!
//! [`Library`] is the scoped guard around native initialization: creating it
//! initializes the native library, dropping it terminates it. At most one
//! session is live per process, and every wrapper in the crate refuses to
//! touch the native layer without one. The session is only reachable from the
//! thread that created it; other threads can merely wake its event loop
//! through an [`EventWaker`].
//!
//! Each session gets a fresh epoch. Resources remember the epoch they were
//! created in, so a handle that outlives its session (and was therefore
//! already reclaimed by native termination) is never freed a second time.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::callback::{self, ErrorCallback, JoystickCallback, MonitorCallback, SessionCallbacks};
use crate::error::{ErrorChannel, GlfwError, GlfwResult, NativeError};
use crate::hint::{self, HintValue, NativeHintValue, WindowHint};
use crate::joystick::Joystick;
use crate::monitor::{ConnectionEvent, Monitor};
use crate::native::{EventKind, NativeLibrary, NativeWaker, RawCallback};

/// Shared state of the live session
pub(crate) struct Session {
    native: Rc<dyn NativeLibrary>,
    epoch: u64,
    installed: RefCell<BTreeSet<EventKind>>,
    callbacks: SessionCallbacks,
}

impl Session {
    pub(crate) fn native(&self) -> &dyn NativeLibrary {
        &*self.native
    }

    pub(crate) const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) const fn callbacks(&self) -> &SessionCallbacks {
        &self.callbacks
    }

    /// Install the trampoline for `kind` unless this session already did
    pub(crate) fn ensure_installed(&self, kind: EventKind) {
        if !self.installed.borrow_mut().insert(kind) {
            return;
        }
        let previous = self.native.set_callback(callback::trampoline(kind));
        if previous.is_set() {
            log::warn!("replaced a foreign native {kind:?} callback with the dispatching trampoline");
        }
        log::debug!("installed {kind:?} trampoline");
    }

    /// Whether the trampoline for `kind` has been installed
    pub(crate) fn is_installed(&self, kind: EventKind) -> bool {
        self.installed.borrow().contains(&kind)
    }
}

/// Set from a successful claim until the native library is terminated
static CLAIMED: AtomicBool = AtomicBool::new(false);
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);
/// Epoch whose wakers may post, or 0 once it starts terminating
static WAKEABLE_EPOCH: RwLock<u64> = RwLock::new(0);

thread_local! {
    static CURRENT: RefCell<Option<Rc<Session>>> = const { RefCell::new(None) };
}

/// The live session on this thread, if any
pub(crate) fn current() -> Option<Rc<Session>> {
    CURRENT.with(|current| current.borrow().clone())
}

/// The live session, or [`GlfwError::NotInitialized`]
pub(crate) fn require() -> GlfwResult<Rc<Session>> {
    current().ok_or(GlfwError::NotInitialized)
}

/// The live session, if it is the one a resource was created in
pub(crate) fn with_epoch(epoch: u64) -> Option<Rc<Session>> {
    current().filter(|session| session.epoch == epoch)
}

/// Run a native call, failing with any error it reported
pub(crate) fn checked<T>(call: impl FnOnce() -> T) -> GlfwResult<T> {
    ErrorChannel::clear();
    let value = call();
    match ErrorChannel::take() {
        Some(error) => Err(error.into_platform()),
        None => Ok(value),
    }
}

/// Like [`with_epoch`], failing with invalid use for a stale resource
pub(crate) fn require_epoch(epoch: u64) -> GlfwResult<Rc<Session>> {
    match current() {
        Some(session) if session.epoch == epoch => Ok(session),
        Some(_) => Err(GlfwError::invalid_use(
            "resource belongs to a library session that has been terminated",
        )),
        None => Err(GlfwError::NotInitialized),
    }
}

/// Scoped native library session
///
/// Not `Send`: the native library must only be driven from the thread that
/// initialized it.
pub struct Library {
    session: Rc<Session>,
    _not_send: PhantomData<*const ()>,
}

impl Library {
    /// Initialize the native library behind `native`
    ///
    /// Fails with [`GlfwError::InvalidUse`] when a session is already live on
    /// any thread, and with [`GlfwError::Creation`] when native
    /// initialization fails.
    pub fn init(native: impl NativeLibrary + 'static) -> GlfwResult<Self> {
        if CLAIMED.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(GlfwError::invalid_use("a library session is already live in this process"));
        }

        let native: Rc<dyn NativeLibrary> = Rc::new(native);

        // Errors raised during initialization itself go through the channel.
        ErrorChannel::clear();
        native.set_callback(callback::trampoline(EventKind::Error));

        if !native.init() {
            let error = ErrorChannel::take()
                .or_else(|| native.last_error().map(|(code, description)| NativeError::new(code, description)))
                .unwrap_or_else(|| NativeError::new(-1, "native initialization failed without reporting an error"));
            native.set_callback(RawCallback::empty(EventKind::Error));
            CLAIMED.store(false, Ordering::Release);
            log::error!("library initialization failed: {error}");
            return Err(error.into_creation());
        }

        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
        *WAKEABLE_EPOCH.write().unwrap_or_else(PoisonError::into_inner) = epoch;

        let session = Rc::new(Session {
            native,
            epoch,
            installed: RefCell::new(BTreeSet::from([EventKind::Error])),
            callbacks: SessionCallbacks::default(),
        });
        CURRENT.with(|current| *current.borrow_mut() = Some(Rc::clone(&session)));

        log::info!("library session {epoch} initialized");
        Ok(Self {
            session,
            _not_send: PhantomData,
        })
    }

    /// Initialize the real GLFW library
    #[cfg(feature = "glfw-backend")]
    pub fn init_glfw() -> GlfwResult<Self> {
        Self::init(crate::native::glfw::GlfwNative::default())
    }

    /// Epoch of this session
    pub fn epoch(&self) -> u64 {
        self.session.epoch
    }

    /// Whether the trampoline for an event category has been installed
    pub fn is_installed(&self, kind: EventKind) -> bool {
        self.session.is_installed(kind)
    }

    /// Validate a hint and forward it to the native hint setter
    ///
    /// A rejected value never reaches the native layer.
    pub fn set_hint(&self, hint: WindowHint, value: impl Into<HintValue>) -> GlfwResult<()> {
        let value = value.into();
        let native = hint::validate(hint, &value)?;
        apply_hint(self.session.native(), hint, &native);
        log::trace!("hint {hint:?} = {value}");
        Ok(())
    }

    /// Reset every hint to its default
    pub fn default_hints(&self) {
        self.session.native().default_window_hints();
    }

    /// Process pending events, dispatching them to registered callbacks
    pub fn poll_events(&self) {
        self.session.native().poll_events();
        callback::resume_pending_panic();
    }

    /// Block until at least one event has been processed
    pub fn wait_events(&self) {
        self.session.native().wait_events();
        callback::resume_pending_panic();
    }

    /// Block until an event has been processed or `timeout` elapses
    pub fn wait_events_timeout(&self, timeout: Duration) -> GlfwResult<()> {
        if timeout.is_zero() {
            return Err(GlfwError::configuration(
                "timeout",
                timeout,
                "must be positive; use poll_events for a non-blocking pump",
            ));
        }
        self.session.native().wait_events_timeout(timeout.as_secs_f64());
        callback::resume_pending_panic();
        Ok(())
    }

    /// Wake a thread blocked in one of the wait functions
    pub fn post_empty_event(&self) {
        self.session.native().post_empty_event();
    }

    /// A handle other threads can use to wake this session's event loop
    pub fn waker(&self) -> EventWaker {
        EventWaker {
            epoch: self.session.epoch,
            native: self.session.native().waker(),
        }
    }

    /// Address of an OpenGL or OpenGL ES function
    ///
    /// Needs a current context on this thread. `Ok(None)` means the function
    /// is not supported by that context.
    pub fn proc_address(&self, name: &str) -> GlfwResult<Option<NonNull<c_void>>> {
        let name = CString::new(name)
            .map_err(|err| GlfwError::configuration("procedure name", err.nul_position(), "contains a NUL byte"))?;
        let address = checked(|| self.session.native().proc_address(&name))?;
        Ok(NonNull::new(address.cast_mut()))
    }

    /// Seconds since initialization
    pub fn time(&self) -> f64 {
        self.session.native().time()
    }

    /// Connected monitors, primary first
    pub fn monitors(&self) -> GlfwResult<Vec<Monitor>> {
        Monitor::all()
    }

    /// The primary monitor, if any is connected
    pub fn primary_monitor(&self) -> GlfwResult<Option<Monitor>> {
        Monitor::primary()
    }

    /// Joystick slots with something connected
    pub fn joysticks(&self) -> GlfwResult<Vec<Joystick>> {
        Joystick::connected()
    }

    /// Add SDL gamepad mappings
    pub fn update_gamepad_mappings(&self, mappings: &str) -> GlfwResult<()> {
        let mappings = CString::new(mappings).map_err(|err| {
            GlfwError::configuration("gamepad mappings", err.nul_position(), "contains a NUL byte")
        })?;
        ErrorChannel::clear();
        if self.session.native().update_gamepad_mappings(&mappings) {
            return Ok(());
        }
        Err(ErrorChannel::take()
            .unwrap_or_else(|| NativeError::new(-1, "gamepad mappings were rejected"))
            .into_platform())
    }

    /// Set the monitor connection callback, returning the previous one
    ///
    /// Replacing the callback from inside its own invocation returns `None`;
    /// the running callback is dropped once it returns.
    pub fn set_monitor_callback<F>(&self, callback: F) -> Option<Box<MonitorCallback>>
    where
        F: FnMut(Monitor, ConnectionEvent) + 'static,
    {
        self.session.ensure_installed(EventKind::Monitor);
        self.session.callbacks.monitor.replace(Some(Box::new(callback)))
    }

    /// Clear the monitor connection callback, returning it
    pub fn unset_monitor_callback(&self) -> Option<Box<MonitorCallback>> {
        self.session.callbacks.monitor.replace(None)
    }

    /// Set the joystick connection callback, returning the previous one
    ///
    /// Replacing the callback from inside its own invocation returns `None`;
    /// the running callback is dropped once it returns.
    pub fn set_joystick_callback<F>(&self, callback: F) -> Option<Box<JoystickCallback>>
    where
        F: FnMut(Joystick, ConnectionEvent) + 'static,
    {
        self.session.ensure_installed(EventKind::Joystick);
        self.session.callbacks.joystick.replace(Some(Box::new(callback)))
    }

    /// Clear the joystick connection callback, returning it
    pub fn unset_joystick_callback(&self) -> Option<Box<JoystickCallback>> {
        self.session.callbacks.joystick.replace(None)
    }

    /// Observe native errors as they are reported
    ///
    /// Errors are recorded in the [`ErrorChannel`] whether or not a callback
    /// is set. Returns the previous callback, or `None` when called from
    /// inside the error callback itself.
    pub fn set_error_callback<F>(&self, callback: F) -> Option<Box<ErrorCallback>>
    where
        F: FnMut(&NativeError) + 'static,
    {
        self.session.callbacks.error.replace(Some(Box::new(callback)))
    }

    /// Clear the error callback, returning it
    pub fn unset_error_callback(&self) -> Option<Box<ErrorCallback>> {
        self.session.callbacks.error.replace(None)
    }

    /// Most recent native error, without clearing it
    pub fn last_error(&self) -> Option<NativeError> {
        ErrorChannel::last()
    }

    /// Take the most recent native error as a platform error
    pub fn take_error(&self) -> Option<GlfwError> {
        ErrorChannel::take().map(NativeError::into_platform)
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        CURRENT.with(|current| *current.borrow_mut() = None);
        // Wakers in flight finish posting before termination starts.
        *WAKEABLE_EPOCH.write().unwrap_or_else(PoisonError::into_inner) = 0;
        self.session.native().terminate();
        self.session.callbacks.monitor.close();
        self.session.callbacks.joystick.close();
        self.session.callbacks.error.close();
        CLAIMED.store(false, Ordering::Release);
        log::info!("library session {} terminated", self.session.epoch);
    }
}

/// Wakes a session's event loop from any thread
///
/// Waking after the session ended fails with [`GlfwError::InvalidUse`] and
/// posts nothing, even if a newer session is live.
#[derive(Clone)]
pub struct EventWaker {
    epoch: u64,
    native: Arc<dyn NativeWaker>,
}

impl EventWaker {
    /// Post an empty event, returning any thread blocked in a wait function
    pub fn wake(&self) -> GlfwResult<()> {
        let live = WAKEABLE_EPOCH.read().unwrap_or_else(PoisonError::into_inner);
        if *live != self.epoch {
            return Err(GlfwError::invalid_use(
                "event waker belongs to a library session that has been terminated",
            ));
        }
        self.native.post_empty_event();
        Ok(())
    }

    /// Epoch of the session this waker belongs to
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl std::fmt::Debug for EventWaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventWaker").field("epoch", &self.epoch).finish_non_exhaustive()
    }
}

/// Serializes tests that create a session
#[cfg(test)]
pub(crate) fn serial() -> std::sync::MutexGuard<'static, ()> {
    static SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library").field("epoch", &self.session.epoch).finish_non_exhaustive()
    }
}

pub(crate) fn apply_hint(native: &dyn NativeLibrary, hint: WindowHint, value: &NativeHintValue) {
    let code = crate::mapping::encode(hint);
    match value {
        NativeHintValue::Int(value) => native.window_hint(code, *value),
        NativeHintValue::Str(value) => native.window_hint_string(code, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::native::{MockCall, MockNative};
    use crate::window::Window;
    use std::thread;

    #[test]
    fn test_second_session_is_rejected() {
        let _serial = serial();
        let mock = MockNative::new();
        let _library = Library::init(mock.clone()).unwrap();
        let second = Library::init(MockNative::new());
        assert!(matches!(second, Err(GlfwError::InvalidUse(_))));
        assert_eq!(mock.count(|call| matches!(call, MockCall::Init)), 1);
    }

    #[test]
    fn test_session_on_another_thread_is_rejected() {
        let _serial = serial();
        let _library = Library::init(MockNative::new()).unwrap();
        let second = thread::spawn(|| Library::init(MockNative::new()).map(|library| library.epoch()))
            .join()
            .unwrap();
        assert!(matches!(second, Err(GlfwError::InvalidUse(_))));
    }

    #[test]
    fn test_other_thread_may_init_after_drop() {
        let _serial = serial();
        drop(Library::init(MockNative::new()).unwrap());
        let epoch = thread::spawn(|| Library::init(MockNative::new()).map(|library| library.epoch()))
            .join()
            .unwrap();
        assert!(epoch.is_ok());
    }

    #[test]
    fn test_failed_init_reports_creation_error() {
        let _serial = serial();
        let mock = MockNative::new();
        mock.fail_init(0x0001_000E, "no platform");
        match Library::init(mock.clone()) {
            Err(GlfwError::Creation { code, description }) => {
                assert_eq!(code, ErrorCode::PlatformUnavailable);
                assert_eq!(description, "no platform");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(current().is_none());
        // A later attempt is allowed.
        assert!(Library::init(MockNative::new()).is_ok());
    }

    #[test]
    fn test_drop_terminates_and_clears_session() {
        let _serial = serial();
        let mock = MockNative::new();
        let library = Library::init(mock.clone()).unwrap();
        assert!(current().is_some());
        drop(library);
        assert!(current().is_none());
        assert_eq!(mock.count(|call| matches!(call, MockCall::Terminate)), 1);
    }

    #[test]
    fn test_epochs_are_distinct() {
        let _serial = serial();
        let first = Library::init(MockNative::new()).unwrap().epoch();
        let second = Library::init(MockNative::new()).unwrap().epoch();
        assert_ne!(first, second);
    }

    #[test]
    fn test_rejected_hint_makes_no_native_call() {
        let _serial = serial();
        let mock = MockNative::new();
        let library = Library::init(mock.clone()).unwrap();
        assert!(library.set_hint(WindowHint::Resizable, 5).is_err());
        assert!(library.set_hint(WindowHint::Samples, -7).is_err());
        assert_eq!(mock.count(|call| matches!(call, MockCall::WindowHint(..))), 0);

        library.set_hint(WindowHint::Resizable, false).unwrap();
        library.set_hint(WindowHint::X11ClassName, "demo").unwrap();
        assert_eq!(mock.count(|call| matches!(call, MockCall::WindowHint(..))), 1);
        assert_eq!(mock.count(|call| matches!(call, MockCall::WindowHintString(..))), 1);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let _serial = serial();
        let mock = MockNative::new();
        let library = Library::init(mock.clone()).unwrap();
        assert!(library.wait_events_timeout(Duration::ZERO).is_err());
        library.wait_events_timeout(Duration::from_millis(5)).unwrap();
        assert_eq!(mock.count(|call| matches!(call, MockCall::WaitEventsTimeout(_))), 1);
    }

    #[test]
    fn test_error_callback_and_channel() {
        let _serial = serial();
        let mock = MockNative::new();
        let library = Library::init(mock.clone()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        library.set_error_callback(move |error| sink.borrow_mut().push(error.code));

        mock.raise_error(0x0001_0008, "platform trouble");
        assert_eq!(*seen.borrow(), [ErrorCode::PlatformError]);
        assert_eq!(library.last_error().unwrap().description, "platform trouble");
        assert!(matches!(library.take_error(), Some(GlfwError::Platform { .. })));
        assert!(library.last_error().is_none());
    }

    #[test]
    fn test_gamepad_mappings() {
        let _serial = serial();
        let mock = MockNative::new();
        let library = Library::init(mock.clone()).unwrap();
        assert!(library.update_gamepad_mappings("bad\0mapping").is_err());
        library.update_gamepad_mappings("030000005e0400008e02000000000000,Xbox,a:b0,").unwrap();

        mock.reject_gamepad_mappings(0x0001_0004, "invalid mapping");
        match library.update_gamepad_mappings("garbage") {
            Err(GlfwError::Platform { code, .. }) => assert_eq!(code, ErrorCode::InvalidValue),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_waker_wakes_blocked_wait() {
        let _serial = serial();
        let mock = MockNative::new();
        mock.block_waits(true);
        let library = Library::init(mock.clone()).unwrap();
        let waker = library.waker();
        let poster = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            waker.wake()
        });
        library.wait_events();
        poster.join().unwrap().unwrap();
        assert_eq!(mock.count(|call| matches!(call, MockCall::WaitEvents)), 1);
    }

    #[test]
    fn test_waker_outliving_session_fails() {
        let _serial = serial();
        let waker = Library::init(MockNative::new()).unwrap().waker();
        assert!(matches!(waker.wake(), Err(GlfwError::InvalidUse(_))));

        let library = Library::init(MockNative::new()).unwrap();
        assert!(matches!(waker.wake(), Err(GlfwError::InvalidUse(_))));
        library.waker().wake().unwrap();
    }

    #[test]
    fn test_waker_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EventWaker>();
    }

    #[test]
    fn test_proc_address() {
        let _serial = serial();
        let mock = MockNative::new();
        let library = Library::init(mock.clone()).unwrap();
        match library.proc_address("glClear") {
            Err(GlfwError::Platform { code, .. }) => assert_eq!(code, ErrorCode::NoCurrentContext),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(library.proc_address("gl\0Clear"), Err(GlfwError::Configuration { .. })));

        let window = Window::new(32, 32, "context").unwrap();
        window.make_context_current().unwrap();
        assert!(library.proc_address("glClear").unwrap().is_some());
        assert!(library.proc_address("notAFunction").unwrap().is_none());
    }
}
