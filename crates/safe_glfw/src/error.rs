//! Error taxonomy and the per-thread native error channel
//!
//! Every fallible public operation returns [`GlfwResult`]. Native errors are
//! reported by GLFW out of band: either through its error callback or through
//! the "last error" query. Both feed the [`ErrorChannel`] declared here, which
//! factory wrappers and [`crate::Library::take_error`] read from.

use std::cell::RefCell;
use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::mapping::{native_enum, NativeEnum};

native_enum! {
    /// Native error codes
    pub enum ErrorCode {
        /// No error has occurred
        NoError = 0,
        /// The library has not been initialized
        NotInitialized = 0x0001_0001,
        /// No context is current for this thread
        NoCurrentContext = 0x0001_0002,
        /// One of the arguments was an invalid enum value
        InvalidEnum = 0x0001_0003,
        /// One of the arguments was an invalid value
        InvalidValue = 0x0001_0004,
        /// A memory allocation failed
        OutOfMemory = 0x0001_0005,
        /// The requested API is unavailable on this system
        ApiUnavailable = 0x0001_0006,
        /// The requested context version is unavailable
        VersionUnavailable = 0x0001_0007,
        /// A platform-specific error occurred
        PlatformError = 0x0001_0008,
        /// The requested pixel format is unavailable
        FormatUnavailable = 0x0001_0009,
        /// The window has no graphics context
        NoWindowContext = 0x0001_000A,
        /// The requested standard cursor shape is unavailable
        CursorUnavailable = 0x0001_000B,
        /// The requested feature is not provided by the platform
        FeatureUnavailable = 0x0001_000C,
        /// The requested feature is not implemented for the platform
        FeatureUnimplemented = 0x0001_000D,
        /// The requested platform is unavailable
        PlatformUnavailable = 0x0001_000E,
        /// A code outside the documented set
        Unknown = -1,
    }
}

impl ErrorCode {
    /// Decode a native code, folding undocumented codes into [`ErrorCode::Unknown`]
    pub fn from_code(code: i32) -> Self {
        Self::from_native(code).unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} (0x{:08X})", self.to_native())
    }
}

/// Structured error surfaced instead of native null/false returns
#[derive(Error, Debug)]
pub enum GlfwError {
    /// A hint or argument outside its declared domain; no native call was made
    #[error("invalid configuration: {key} = {value}: {reason}")]
    Configuration {
        /// Hint or parameter name
        key: String,
        /// Offending value, rendered for display
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A native factory returned a null handle
    #[error("native creation failed: {code}: {description}")]
    Creation {
        /// Native error code paired with the failure
        code: ErrorCode,
        /// Native error description
        description: String,
    },

    /// An error reported by the native layer outside of a factory call
    #[error("platform error: {code}: {description}")]
    Platform {
        /// Native error code
        code: ErrorCode,
        /// Native error description
        description: String,
    },

    /// An operation on a destroyed resource, a stale session or a second session
    #[error("invalid use: {0}")]
    InvalidUse(String),

    /// No library session is live on this thread
    #[error("the library session has not been initialized")]
    NotInitialized,

    /// A native integer that does not belong to the expected enumeration
    #[error("native code {code} is not a valid {enumeration}")]
    Decode {
        /// Enumeration name
        enumeration: &'static str,
        /// Offending native code
        code: i32,
    },

    /// Configuration file loading failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GlfwError {
    pub(crate) fn configuration(
        key: impl Into<String>,
        value: impl fmt::Debug,
        reason: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            key: key.into(),
            value: format!("{value:?}"),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_use(message: impl Into<String>) -> Self {
        Self::InvalidUse(message.into())
    }
}

/// Result alias used across the crate
pub type GlfwResult<T> = Result<T, GlfwError>;

/// A native error as reported by the native layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// Native error code
    pub code: ErrorCode,
    /// Native error description
    pub description: String,
}

impl NativeError {
    /// Create a record from raw native values
    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::from_code(code),
            description: description.into(),
        }
    }

    /// Convert into a platform error
    pub fn into_platform(self) -> GlfwError {
        GlfwError::Platform {
            code: self.code,
            description: self.description,
        }
    }

    /// Convert into a creation error
    pub fn into_creation(self) -> GlfwError {
        GlfwError::Creation {
            code: self.code,
            description: self.description,
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<NativeError>> = const { RefCell::new(None) };
}

/// Most recent native error reported on this thread
///
/// The channel holds a single record, so it can be stale: an error left by an
/// unrelated earlier call stays visible until something clears it. Factory
/// wrappers clear it right before the native call they guard.
pub struct ErrorChannel;

impl ErrorChannel {
    /// Record a native error, replacing any previous one
    pub fn record(error: NativeError) {
        log::error!("GLFW error {error}");
        LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(error));
    }

    /// Peek at the most recent error without clearing it
    pub fn last() -> Option<NativeError> {
        LAST_ERROR.with(|slot| slot.borrow().clone())
    }

    /// Take the most recent error, clearing the channel
    pub fn take() -> Option<NativeError> {
        LAST_ERROR.with(|slot| slot.borrow_mut().take())
    }

    /// Clear the channel
    pub fn clear() {
        LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_codes_fold() {
        assert_eq!(ErrorCode::from_code(0x0001_0004), ErrorCode::InvalidValue);
        assert_eq!(ErrorCode::from_code(0x7777), ErrorCode::Unknown);
    }

    #[test]
    fn test_channel_take_clears() {
        ErrorChannel::clear();
        ErrorChannel::record(NativeError::new(0x0001_0008, "display lost"));

        assert_eq!(ErrorChannel::last().unwrap().code, ErrorCode::PlatformError);
        let taken = ErrorChannel::take().unwrap();
        assert_eq!(taken.description, "display lost");
        assert!(ErrorChannel::last().is_none());
    }

    #[test]
    fn test_channel_keeps_most_recent() {
        ErrorChannel::clear();
        ErrorChannel::record(NativeError::new(0x0001_0003, "first"));
        ErrorChannel::record(NativeError::new(0x0001_0004, "second"));

        let last = ErrorChannel::take().unwrap();
        assert_eq!(last.code, ErrorCode::InvalidValue);
        assert_eq!(last.description, "second");
    }

    #[test]
    fn test_error_messages() {
        let err = NativeError::new(0x0001_0006, "no EGL").into_creation();
        assert!(err.to_string().contains("ApiUnavailable"));
        assert!(err.to_string().contains("no EGL"));
    }
}
