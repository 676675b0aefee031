//! Cursor images
//!
//! A [`Cursor`] owns its native cursor and destroys it on drop, unless the
//! session it was created in has already terminated and reclaimed it.

use std::ffi::c_int;
use std::ptr::NonNull;

use crate::error::{GlfwError, GlfwResult};
use crate::handle::{Deleter, Owned};
use crate::mapping::{encode, native_enum};
use crate::native::{RawCursor, RawImage};
use crate::session;

native_enum! {
    /// Standard system cursor shapes
    pub enum CursorShape {
        /// Regular arrow
        Arrow = 0x0003_6001,
        /// Text input I-beam
        IBeam = 0x0003_6002,
        /// Crosshair
        Crosshair = 0x0003_6003,
        /// Pointing hand
        PointingHand = 0x0003_6004,
        /// Horizontal resize
        ResizeEw = 0x0003_6005,
        /// Vertical resize
        ResizeNs = 0x0003_6006,
        /// Top-left to bottom-right diagonal resize
        ResizeNwse = 0x0003_6007,
        /// Top-right to bottom-left diagonal resize
        ResizeNesw = 0x0003_6008,
        /// Omnidirectional resize
        ResizeAll = 0x0003_6009,
        /// Operation not allowed
        NotAllowed = 0x0003_600A,
    }
}

/// RGBA8 image, row-major, top-left pixel first
///
/// Used for custom cursors and window icons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    /// Wrap pixel data, checking it matches the dimensions
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> GlfwResult<Self> {
        if width == 0 || height == 0 {
            return Err(GlfwError::configuration("image size", (width, height), "must be non-zero"));
        }
        if c_int::try_from(width).is_err() || c_int::try_from(height).is_err() {
            return Err(GlfwError::configuration("image size", (width, height), "exceeds the native range"));
        }
        let expected = u64::from(width) * u64::from(height) * 4;
        if pixels.len() as u64 != expected {
            return Err(GlfwError::configuration(
                "image pixels",
                pixels.len(),
                format!("expected {expected} bytes of RGBA8 for {width}x{height}"),
            ));
        }
        Ok(Self { width, height, pixels })
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn as_raw(&self) -> RawImage {
        RawImage {
            width: c_int::try_from(self.width).unwrap_or(c_int::MAX),
            height: c_int::try_from(self.height).unwrap_or(c_int::MAX),
            pixels: self.pixels.as_ptr(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CursorDeleter {
    epoch: u64,
}

impl Deleter<RawCursor> for CursorDeleter {
    fn delete(&mut self, handle: NonNull<RawCursor>) {
        match session::with_epoch(self.epoch) {
            Some(session) => {
                session.native().destroy_cursor(handle.as_ptr());
                log::debug!("destroyed cursor {handle:p}");
            }
            None => log::debug!("cursor {handle:p} was reclaimed by library termination"),
        }
    }
}

/// An owned native cursor
#[derive(Debug)]
pub struct Cursor {
    handle: Owned<RawCursor, CursorDeleter>,
    epoch: u64,
}

impl Cursor {
    /// Create a cursor with a standard system shape
    pub fn standard(shape: CursorShape) -> GlfwResult<Self> {
        let session = session::require()?;
        let epoch = session.epoch();
        let handle = Owned::create(
            || session.native().create_standard_cursor(encode(shape)),
            CursorDeleter { epoch },
        )?;
        log::debug!("created {shape:?} cursor {:p}", handle.get()?);
        Ok(Self { handle, epoch })
    }

    /// Create a cursor from an image with the hotspot at `hotspot`
    pub fn from_image(image: &Image, hotspot: (u32, u32)) -> GlfwResult<Self> {
        let (x_hot, y_hot) = hotspot;
        if x_hot >= image.width || y_hot >= image.height {
            return Err(GlfwError::configuration("cursor hotspot", hotspot, "must lie inside the image"));
        }
        let session = session::require()?;
        let epoch = session.epoch();
        let raw = image.as_raw();
        // Both coordinates are below the image size, which fits a c_int.
        let x_hot = c_int::try_from(x_hot).unwrap_or_default();
        let y_hot = c_int::try_from(y_hot).unwrap_or_default();
        let handle = Owned::create(
            || session.native().create_cursor(&raw, x_hot, y_hot),
            CursorDeleter { epoch },
        )?;
        log::debug!("created {}x{} image cursor {:p}", image.width, image.height, handle.get()?);
        Ok(Self { handle, epoch })
    }

    /// Destroy the cursor now; further use is invalid
    pub fn destroy(&mut self) {
        self.handle.reset();
    }

    /// Whether the cursor has been destroyed
    pub const fn is_destroyed(&self) -> bool {
        self.handle.is_null()
    }

    /// Raw handle, checked against the live session
    pub(crate) fn raw(&self) -> GlfwResult<*mut RawCursor> {
        let handle = self.handle.get()?;
        session::require_epoch(self.epoch)?;
        Ok(handle.as_ptr())
    }
}
