//! # safe_glfw
//!
//! Ownership-safe windows, cursors and input over the GLFW C API.
//!
//! ## Features
//!
//! - **Exclusive ownership**: every native handle has one owner and is freed
//!   exactly once, on drop or on explicit destruction
//! - **Per-window callbacks**: closures registered on a [`Window`] receive
//!   only that window's events, dispatched through one trampoline per event
//!   category
//! - **Validated hints**: window hints are checked against a single table
//!   before anything reaches the native layer
//! - **Typed errors**: null handles and native error codes become
//!   [`GlfwError`] values
//! - **Cross-thread wake-up**: an [`EventWaker`] lets any thread interrupt
//!   a blocking wait on the session thread
//! - **Headless testing**: [`native::MockNative`] stands in for the native
//!   library
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use safe_glfw::prelude::*;
//!
//! fn main() -> Result<(), GlfwError> {
//!     let library = Library::init(MockNative::new())?;
//!     library.set_hint(WindowHint::ClientApi, ClientApi::NoApi)?;
//!
//!     let mut window = Window::new(640, 480, "Demo")?;
//!     window.set_key_callback(|key, _scancode, action, _mods| {
//!         log::info!("{key:?} {action:?}");
//!     })?;
//!
//!     while !window.should_close()? {
//!         library.wait_events();
//!     }
//!     Ok(())
//! }
//! ```

pub mod callback;
pub mod config;
pub mod cursor;
pub mod error;
pub mod handle;
pub mod hint;
pub mod input;
pub mod joystick;
pub mod logging;
pub mod mapping;
pub mod monitor;
pub mod native;
pub mod session;
pub mod window;

#[cfg(test)]
mod tests;

pub use cursor::{Cursor, CursorShape, Image};
pub use error::{ErrorChannel, ErrorCode, GlfwError, GlfwResult, NativeError};
pub use joystick::{GamepadAxis, GamepadButton, GamepadState, Joystick, JoystickHat, JoystickId};
pub use monitor::{ConnectionEvent, GammaRamp, Monitor, VideoMode, WorkArea};
pub use session::{EventWaker, Library};
pub use window::{FrameSize, Window, WindowAttribute, WindowBuilder};

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, WindowConfig},
        hint::{
            ClientApi, ContextCreationApi, ContextRobustness, HintValue, OpenGlProfile, ReleaseBehavior,
            WindowHint, ANY_POSITION, DONT_CARE,
        },
        input::{Action, CursorMode, InputMode, InputModeSetting, Key, Modifiers, MouseButton},
        native::MockNative,
        ConnectionEvent, Cursor, CursorShape, EventWaker, GlfwError, GlfwResult, Image, Joystick, JoystickId,
        Library, Monitor, Window, WindowAttribute,
    };
}
