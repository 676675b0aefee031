//! Event routing from the native trampolines to per-window and per-session
//! callbacks, including events that arrive for destroyed windows.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::rc::Rc;

use crate::input::{Action, Key, Modifiers, MouseButton};
use crate::joystick::JoystickId;
use crate::mapping::encode;
use crate::monitor::ConnectionEvent;
use crate::native::{EventKind, MockCall, MockEvent, MockNative, RawVideoMode, RawWindow};
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

    fn escape_press(window: *mut RawWindow) -> MockEvent {
        MockEvent::Key {
            window,
            key: encode(Key::Escape),
            scancode: 9,
            action: encode(Action::Press),
            mods: 0,
        }
    }

    fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        (Rc::clone(&count), count)
    }

    #[test]
    fn test_key_event_reaches_registered_callback_once() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let mut window = Window::new(640, 480, "t").unwrap();
        let raw = window.raw_handle().unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        window
            .set_key_callback(move |key, scancode, action, mods| sink.borrow_mut().push((key, scancode, action, mods)))
            .unwrap();

        mock.emit(escape_press(raw));

        assert_eq!(*seen.borrow(), [(Key::Escape, 9, Action::Press, Modifiers::empty())]);
    }

    #[test]
    fn test_destroyed_window_receives_nothing() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let mut window = Window::new(640, 480, "t").unwrap();
        let raw = window.raw_handle().unwrap();
        let (count, observed) = counter();
        window.set_key_callback(move |_, _, _, _| count.set(count.get() + 1)).unwrap();

        mock.emit(escape_press(raw));
        window.destroy();
        mock.emit(escape_press(raw));

        assert_eq!(observed.get(), 1);
    }

    #[test]
    fn test_dropped_window_receives_nothing() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        let (count, observed) = counter();
        let raw = {
            let mut window = Window::new(64, 64, "scoped").unwrap();
            window.set_close_callback(move || count.set(count.get() + 1)).unwrap();
            window.raw_handle().unwrap()
        };

        mock.push_event(MockEvent::WindowClose { window: raw });
        library.poll_events();

        assert_eq!(observed.get(), 0);
    }

    #[test]
    fn test_swap_returns_first_and_dispatches_second() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let mut window = Window::new(640, 480, "swap").unwrap();
        let raw = window.raw_handle().unwrap();
        let (first, first_calls) = counter();
        let (second, second_calls) = counter();

        assert!(window.set_key_callback(move |_, _, _, _| first.set(first.get() + 1)).unwrap().is_none());
        let mut previous = window
            .set_key_callback(move |_, _, _, _| second.set(second.get() + 1))
            .unwrap()
            .expect("first callback is returned");

        // The returned callback is the first one.
        previous(Key::A, 0, Action::Press, Modifiers::empty());
        assert_eq!(first_calls.get(), 1);

        mock.emit(escape_press(raw));
        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 1);
    }

    #[test]
    fn test_unset_callback_stops_dispatch() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let mut window = Window::new(640, 480, "unset").unwrap();
        let raw = window.raw_handle().unwrap();
        let (count, observed) = counter();
        window.set_key_callback(move |_, _, _, _| count.set(count.get() + 1)).unwrap();

        assert!(window.unset_key_callback().unwrap().is_some());
        assert!(window.unset_key_callback().unwrap().is_none());
        mock.emit(escape_press(raw));

        assert_eq!(observed.get(), 0);
    }

    #[test]
    fn test_trampoline_installed_once_per_category() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        let mut left = Window::new(100, 100, "left").unwrap();
        let mut right = Window::new(100, 100, "right").unwrap();
        let hits = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&hits);
        left.set_key_callback(move |_, _, _, _| sink.borrow_mut().push("left")).unwrap();
        let sink = Rc::clone(&hits);
        right.set_key_callback(move |_, _, _, _| sink.borrow_mut().push("right")).unwrap();
        left.set_key_callback(|_, _, _, _| {}).unwrap();

        assert_eq!(mock.count(|call| *call == MockCall::SetCallback(EventKind::Key, true)), 1);
        assert!(library.is_installed(EventKind::Key));
        assert!(!library.is_installed(EventKind::Scroll));
        assert!(mock.has_callback(EventKind::Key));

        mock.emit(escape_press(right.raw_handle().unwrap()));
        assert_eq!(*hits.borrow(), ["right"]);
    }

    #[test]
    fn test_events_are_delivered_during_poll() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        let mut window = Window::new(640, 480, "queued").unwrap();
        let raw = window.raw_handle().unwrap();
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&sizes);
        window.set_size_callback(move |width, height| sink.borrow_mut().push((width, height))).unwrap();

        mock.push_event(MockEvent::WindowSize { window: raw, width: 800, height: 600 });
        assert!(sizes.borrow().is_empty());
        library.poll_events();

        assert_eq!(*sizes.borrow(), [(800, 600)]);
        assert_eq!(window.size().unwrap(), (800, 600));
    }

    #[test]
    fn test_close_event_sets_flag_and_notifies() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        let mut window = Window::new(640, 480, "closing").unwrap();
        let raw = window.raw_handle().unwrap();
        let (count, observed) = counter();
        window.set_close_callback(move || count.set(count.get() + 1)).unwrap();

        mock.push_event(MockEvent::WindowClose { window: raw });
        library.wait_events();

        assert_eq!(observed.get(), 1);
        assert!(window.should_close().unwrap());
    }

    #[test]
    fn test_window_destroyed_from_its_own_callback() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        let holder: Rc<RefCell<Option<Window>>> = Rc::new(RefCell::new(Some(Window::new(64, 64, "self").unwrap())));
        let raw = holder.borrow().as_ref().unwrap().raw_handle().unwrap();
        let (count, observed) = counter();

        let inner = Rc::clone(&holder);
        holder
            .borrow_mut()
            .as_mut()
            .unwrap()
            .set_key_callback(move |_, _, _, _| {
                count.set(count.get() + 1);
                drop(inner.borrow_mut().take());
            })
            .unwrap();

        mock.push_event(escape_press(raw));
        mock.push_event(escape_press(raw));
        library.poll_events();

        assert_eq!(observed.get(), 1);
        assert!(holder.borrow().is_none());
        assert_eq!(mock.live_windows(), 0);
        assert_eq!(mock.count(|call| matches!(call, MockCall::DestroyWindow(_))), 1);
    }

    #[test]
    fn test_panic_in_callback_resumes_after_poll() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        let mut window = Window::new(64, 64, "panicky").unwrap();
        let raw = window.raw_handle().unwrap();
        window.set_key_callback(|_, _, _, _| panic!("callback failure")).unwrap();

        mock.push_event(escape_press(raw));
        let result = panic::catch_unwind(AssertUnwindSafe(|| library.poll_events()));
        assert!(result.is_err());

        // The session stays usable.
        library.poll_events();
        assert!(!window.should_close().unwrap());
    }

    #[test]
    fn test_drop_paths_are_translated() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let mut window = Window::new(64, 64, "drop target").unwrap();
        let raw = window.raw_handle().unwrap();
        let dropped = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&dropped);
        window.set_drop_callback(move |paths| sink.borrow_mut().extend(paths)).unwrap();

        mock.emit(MockEvent::Drop {
            window: raw,
            paths: vec!["/tmp/ship.png".to_string(), "notes.txt".to_string()],
        });

        assert_eq!(*dropped.borrow(), [PathBuf::from("/tmp/ship.png"), PathBuf::from("notes.txt")]);
    }

    #[test]
    fn test_cursor_and_focus_events() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let mut window = Window::new(64, 64, "pointer").unwrap();
        let raw = window.raw_handle().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&log);
        window.set_cursor_enter_callback(move |entered| sink.borrow_mut().push(format!("enter {entered}"))).unwrap();
        let sink = Rc::clone(&log);
        window.set_focus_callback(move |focused| sink.borrow_mut().push(format!("focus {focused}"))).unwrap();
        let sink = Rc::clone(&log);
        window.set_char_callback(move |character| sink.borrow_mut().push(format!("char {character}"))).unwrap();

        mock.emit(MockEvent::CursorEnter { window: raw, entered: true });
        mock.emit(MockEvent::WindowFocus { window: raw, focused: false });
        mock.emit(MockEvent::Char { window: raw, codepoint: 0x00E9 });
        // Not a scalar value: dropped before dispatch.
        mock.emit(MockEvent::Char { window: raw, codepoint: 0xD800 });

        assert_eq!(*log.borrow(), ["enter true", "focus false", "char \u{e9}"]);
    }

    #[test]
    fn test_monitor_connection_callback() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        library.set_monitor_callback(move |monitor, event| {
            sink.borrow_mut().push((monitor.name().ok(), event));
        });

        let raw = mock.add_monitor(
            "Studio Display",
            RawVideoMode {
                width: 2560,
                height: 1440,
                red_bits: 8,
                green_bits: 8,
                blue_bits: 8,
                refresh_rate: 60,
            },
        );
        mock.emit(MockEvent::Monitor { monitor: raw, event: ConnectionEvent::Connected });
        mock.remove_monitor(raw);
        mock.emit(MockEvent::Monitor { monitor: raw, event: ConnectionEvent::Disconnected });

        assert_eq!(
            *events.borrow(),
            [
                (Some("Studio Display".to_string()), ConnectionEvent::Connected),
                (None, ConnectionEvent::Disconnected),
            ]
        );
        assert!(library.unset_monitor_callback().is_some());
    }

    #[test]
    fn test_joystick_connection_callback() {
        let _serial = crate::session::serial();
        let (mock, library) = setup();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        library.set_joystick_callback(move |joystick, event| {
            sink.borrow_mut().push((joystick.id(), joystick.name().ok().flatten(), event));
        });

        mock.connect_joystick(2, "Arcade Stick", vec![0.0, 0.0], vec![0; 8], vec![0]);
        mock.emit(MockEvent::Joystick { jid: 2, event: ConnectionEvent::Connected });
        mock.disconnect_joystick(2);
        mock.emit(MockEvent::Joystick { jid: 2, event: ConnectionEvent::Disconnected });
        // Outside the slot range: dropped.
        mock.emit(MockEvent::Joystick { jid: 42, event: ConnectionEvent::Connected });

        assert_eq!(
            *events.borrow(),
            [
                (JoystickId::Joystick3, Some("Arcade Stick".to_string()), ConnectionEvent::Connected),
                (JoystickId::Joystick3, None, ConnectionEvent::Disconnected),
            ]
        );
    }

    #[test]
    fn test_buttons_beyond_eighth_are_delivered() {
        let _serial = crate::session::serial();
        let (mock, _library) = setup();
        let mut window = Window::new(64, 64, "mouse").unwrap();
        let raw = window.raw_handle().unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        window
            .set_mouse_button_callback(move |button, action, _| sink.borrow_mut().push((button, action)))
            .unwrap();

        for button in [0, 7, 11] {
            mock.emit(MockEvent::MouseButton { window: raw, button, action: encode(Action::Press), mods: 0 });
        }
        mock.emit(MockEvent::MouseButton { window: raw, button: -3, action: encode(Action::Press), mods: 0 });

        assert_eq!(
            *seen.borrow(),
            [
                (MouseButton::Left, Action::Press),
                (MouseButton::Button8, Action::Press),
                (MouseButton::Other(11), Action::Press),
            ]
        );
        assert_eq!(window.mouse_button(MouseButton::Left).unwrap(), Action::Press);
        assert!(window.mouse_button(MouseButton::Other(11)).is_err());
    }
}
