//! Cross-module tests driven through [`crate::native::MockNative`]

mod callback_dispatch;
mod session_scenarios;
