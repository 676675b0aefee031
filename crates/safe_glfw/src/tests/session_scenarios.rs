//! End-to-end scenarios: windows and cursors under a live library session,
//! rejected hints, and construction without a session.

use crate::cursor::{Cursor, CursorShape};
use crate::error::{ErrorCode, GlfwError};
use crate::hint::{ContextCreationApi, WindowHint};
use crate::mapping::encode;
use crate::native::{MockCall, MockNative};
use crate::session::Library;
use crate::window::Window;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (MockNative, Library) {
        crate::logging::init_for_tests();
        let mock = MockNative::new();
        let library = Library::init(mock.clone()).unwrap();
        (mock, library)
    }

    fn factory_calls(mock: &MockNative) -> usize {
        mock.count(|call| {
            matches!(
                call,
                MockCall::CreateWindow { .. } | MockCall::CreateCursor { .. } | MockCall::CreateStandardCursor(_)
            )
        })
    }

    #[test]
    fn test_window_under_live_session() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();

        let window = Window::new(640, 480, "t").unwrap();

        assert!(!window.should_close().unwrap());
        assert_eq!(window.size().unwrap(), (640, 480));
        assert_eq!(mock.live_windows(), 1);
    }

    #[test]
    fn test_boolean_hint_rejects_five_without_native_call() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();

        let result = library.set_hint(WindowHint::Resizable, 5);

        match result {
            Err(GlfwError::Configuration { key, value, .. }) => {
                assert_eq!(key, "Resizable");
                assert!(value.contains('5'));
            }
            other => panic!("expected a configuration error, got {other:?}"),
        }
        assert_eq!(mock.count(|call| matches!(call, MockCall::WindowHint(..))), 0);
    }

    #[test]
    fn test_enumerated_hint_accepts_only_declared_codes() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();

        let undeclared = 0x0003_6004;
        library.set_hint(WindowHint::ContextCreationApi, ContextCreationApi::Egl).unwrap();
        assert!(library.set_hint(WindowHint::ContextCreationApi, undeclared).is_err());

        let calls = mock.count(|call| matches!(call, MockCall::WindowHint(..)));
        assert_eq!(calls, 1);
        assert!(!mock
            .calls()
            .contains(&MockCall::WindowHint(encode(WindowHint::ContextCreationApi), undeclared)));
        assert!(mock.calls().contains(&MockCall::WindowHint(
            encode(WindowHint::ContextCreationApi),
            encode(ContextCreationApi::Egl),
        )));
    }

    #[test]
    fn test_construction_without_session_makes_no_factory_call() {
        let _serial = crate::session::serial();
        let mock = MockNative::new();

        assert!(matches!(Window::new(640, 480, "t"), Err(GlfwError::NotInitialized)));
        assert!(matches!(Cursor::standard(CursorShape::Arrow), Err(GlfwError::NotInitialized)));
        assert_eq!(factory_calls(&mock), 0);

        // The same mock works once a session exists.
        let _library = Library::init(mock.clone()).unwrap();
        let _window = Window::new(640, 480, "t").unwrap();
        assert_eq!(factory_calls(&mock), 1);
    }

    #[test]
    fn test_construction_after_session_ends() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        drop(library);

        assert!(matches!(Window::new(10, 10, "late"), Err(GlfwError::NotInitialized)));
        assert_eq!(factory_calls(&mock), 0);
    }

    #[test]
    fn test_creation_failure_carries_native_description() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        mock.fail_next_window(encode(ErrorCode::VersionUnavailable), "Requested OpenGL version 9.9");

        match Window::new(640, 480, "t") {
            Err(GlfwError::Creation { code, description }) => {
                assert_eq!(code, ErrorCode::VersionUnavailable);
                assert_eq!(description, "Requested OpenGL version 9.9");
            }
            other => panic!("expected a creation error, got {other:?}"),
        }
        assert_eq!(mock.live_windows(), 0);

        // A retry is not affected by the earlier failure.
        let window = Window::new(640, 480, "t").unwrap();
        assert!(!window.is_destroyed());
    }

    #[test]
    fn test_every_resource_deleted_exactly_once() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();

        let first = Window::new(100, 100, "first").unwrap();
        let moved = first;
        let mut second = Window::new(100, 100, "second").unwrap();
        let cursor = Cursor::standard(CursorShape::PointingHand).unwrap();

        second.destroy();
        drop(moved);
        drop(second);
        drop(cursor);

        assert_eq!(mock.count(|call| matches!(call, MockCall::DestroyWindow(_))), 2);
        assert_eq!(mock.count(|call| matches!(call, MockCall::DestroyCursor(_))), 1);
        assert_eq!(mock.live_windows(), 0);
        assert_eq!(mock.live_cursors(), 0);

        drop(library);
        assert_eq!(mock.count(|call| matches!(call, MockCall::Terminate)), 1);
    }

    #[test]
    fn test_window_outliving_session_is_not_destroyed_twice() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        let window = Window::new(100, 100, "orphan").unwrap();

        drop(library);
        assert!(matches!(window.size(), Err(GlfwError::NotInitialized)));

        let _next = Library::init(mock.clone()).unwrap();
        assert!(matches!(window.size(), Err(GlfwError::InvalidUse(_))));
        drop(window);

        assert_eq!(mock.count(|call| matches!(call, MockCall::DestroyWindow(_))), 0);
    }
}
