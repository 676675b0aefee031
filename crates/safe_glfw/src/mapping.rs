//! Bidirectional mapping between typed enumerations and native integer codes
//!
//! Every enumeration that crosses the C boundary is declared once through
//! [`native_enum!`], which generates the Rust enum together with both
//! directions of its code table. Nothing else in the crate spells out a
//! native constant for these enumerations.

use crate::error::{GlfwError, GlfwResult};

/// An enumeration with a total mapping onto native integer codes
pub trait NativeEnum: Sized + Copy + PartialEq + 'static {
    /// Name used in decode errors and log output
    const NAME: &'static str;

    /// Every declared value, in declaration order
    const ALL: &'static [Self];

    /// Native codes of [`Self::ALL`], in the same order
    const CODES: &'static [i32];

    /// Native code for this value
    fn to_native(self) -> i32;

    /// Value for a native code, if the code belongs to this enumeration
    fn from_native(code: i32) -> Option<Self>;
}

/// Encode a typed value into its native code
pub fn encode<T: NativeEnum>(value: T) -> i32 {
    value.to_native()
}

/// Decode a native code, failing with [`GlfwError::Decode`] for unknown codes
pub fn decode<T: NativeEnum>(code: i32) -> GlfwResult<T> {
    T::from_native(code).ok_or(GlfwError::Decode {
        enumeration: T::NAME,
        code,
    })
}

/// Declare an enumeration together with its native code table
///
/// ```ignore
/// native_enum! {
///     /// Key actions
///     pub enum Action {
///         Release = 0,
///         Press = 1,
///     }
/// }
/// ```
///
/// Codes are matched with guards, so any constant expression works as a code.
macro_rules! native_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:expr
            ),+ $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::mapping::NativeEnum for $name {
            const NAME: &'static str = stringify!($name);

            const ALL: &'static [Self] = &[$(Self::$variant),+];

            const CODES: &'static [i32] = &[$($code),+];

            fn to_native(self) -> i32 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            #[allow(clippy::redundant_guards)]
            fn from_native(code: i32) -> Option<Self> {
                match code {
                    $(c if c == $code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use native_enum;

/// Native boolean encoding
pub(crate) const fn encode_bool(value: bool) -> i32 {
    if value {
        1
    } else {
        0
    }
}

/// Native boolean decoding; anything other than 0/1 is a decode failure
pub(crate) fn decode_bool(code: i32) -> GlfwResult<bool> {
    match code {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(GlfwError::Decode {
            enumeration: "bool",
            code: other,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    native_enum! {
        /// Enumeration used only by these tests
        enum Sample {
            First = 10,
            Second = 0x2_0001,
            Third = -1,
        }
    }

    #[test]
    fn test_round_trip_every_value() {
        for &value in Sample::ALL {
            assert_eq!(decode::<Sample>(encode(value)).unwrap(), value);
        }
        for &code in Sample::CODES {
            assert_eq!(encode(decode::<Sample>(code).unwrap()), code);
        }
    }

    #[test]
    fn test_decode_unknown_code() {
        match decode::<Sample>(11) {
            Err(GlfwError::Decode { enumeration, code }) => {
                assert_eq!(enumeration, "Sample");
                assert_eq!(code, 11);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_bool_codes() {
        assert_eq!(encode_bool(true), 1);
        assert!(!decode_bool(0).unwrap());
        assert!(decode_bool(2).is_err());
    }
}
