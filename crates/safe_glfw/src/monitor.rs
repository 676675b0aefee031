//! Monitors
//!
//! Monitors are owned by the native library; a [`Monitor`] is a non-owning
//! reference that checks, on every query, that its session is still live and
//! that the monitor is still connected.
//!
//! Gamma changes made through a monitor are undone by the native library when
//! the session terminates.

use std::ffi::c_uint;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::{GlfwError, GlfwResult};
use crate::mapping::native_enum;
use crate::native::{RawGammaRamp, RawMonitor, RawVideoMode};
use crate::session::{self, Session};

native_enum! {
    /// Device connection events for monitors and joysticks
    pub enum ConnectionEvent {
        /// Device connected
        Connected = 0x0004_0001,
        /// Device disconnected
        Disconnected = 0x0004_0002,
    }
}

/// A video mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoMode {
    /// Width in screen coordinates
    pub width: u32,
    /// Height in screen coordinates
    pub height: u32,
    /// Red channel bit depth
    pub red_bits: u32,
    /// Green channel bit depth
    pub green_bits: u32,
    /// Blue channel bit depth
    pub blue_bits: u32,
    /// Refresh rate in Hz
    pub refresh_rate: u32,
}

impl From<RawVideoMode> for VideoMode {
    fn from(mode: RawVideoMode) -> Self {
        let unsigned = |value: i32| u32::try_from(value).unwrap_or(0);
        Self {
            width: unsigned(mode.width),
            height: unsigned(mode.height),
            red_bits: unsigned(mode.red_bits),
            green_bits: unsigned(mode.green_bits),
            blue_bits: unsigned(mode.blue_bits),
            refresh_rate: unsigned(mode.refresh_rate),
        }
    }
}

/// Area of a monitor not occupied by task bars and menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkArea {
    /// Left edge in virtual screen coordinates
    pub x: i32,
    /// Top edge in virtual screen coordinates
    pub y: i32,
    /// Width in screen coordinates
    pub width: u32,
    /// Height in screen coordinates
    pub height: u32,
}

/// Per-channel gamma lookup table
///
/// All three channels have the same, non-zero number of entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GammaRamp {
    red: Vec<u16>,
    green: Vec<u16>,
    blue: Vec<u16>,
}

impl GammaRamp {
    /// Build a ramp from its channels
    pub fn new(red: Vec<u16>, green: Vec<u16>, blue: Vec<u16>) -> GlfwResult<Self> {
        if red.is_empty() {
            return Err(GlfwError::configuration("gamma ramp size", 0, "must be non-zero"));
        }
        if green.len() != red.len() || blue.len() != red.len() {
            return Err(GlfwError::configuration(
                "gamma ramp size",
                (red.len(), green.len(), blue.len()),
                "channels must have equal lengths",
            ));
        }
        if c_uint::try_from(red.len()).is_err() {
            return Err(GlfwError::configuration("gamma ramp size", red.len(), "exceeds the native range"));
        }
        Ok(Self { red, green, blue })
    }

    /// Number of entries per channel
    pub fn len(&self) -> usize {
        self.red.len()
    }

    /// Whether the ramp has no entries; never true once constructed
    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    /// Red channel
    pub fn red(&self) -> &[u16] {
        &self.red
    }

    /// Green channel
    pub fn green(&self) -> &[u16] {
        &self.green
    }

    /// Blue channel
    pub fn blue(&self) -> &[u16] {
        &self.blue
    }

    fn to_raw(&self) -> RawGammaRamp {
        RawGammaRamp {
            red: self.red.clone(),
            green: self.green.clone(),
            blue: self.blue.clone(),
        }
    }
}

/// A connected monitor
///
/// Equality is identity of the native monitor within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Monitor {
    raw: NonNull<RawMonitor>,
    epoch: u64,
}

impl Monitor {
    pub(crate) fn from_raw(raw: *mut RawMonitor, epoch: u64) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self { raw, epoch })
    }

    /// Every connected monitor, primary first
    pub fn all() -> GlfwResult<Vec<Self>> {
        let session = session::require()?;
        let epoch = session.epoch();
        Ok(session
            .native()
            .monitors()
            .into_iter()
            .filter_map(|raw| Self::from_raw(raw, epoch))
            .collect())
    }

    /// The primary monitor, if any is connected
    pub fn primary() -> GlfwResult<Option<Self>> {
        let session = session::require()?;
        Ok(Self::from_raw(session.native().primary_monitor(), session.epoch()))
    }

    /// Whether the monitor is still connected in the live session
    pub fn is_connected(&self) -> bool {
        session::with_epoch(self.epoch)
            .is_some_and(|session| session.native().monitors().contains(&self.raw.as_ptr()))
    }

    /// Live session and raw handle, checked for staleness and disconnection
    pub(crate) fn checked(&self) -> GlfwResult<(Rc<Session>, *mut RawMonitor)> {
        let session = session::require_epoch(self.epoch)?;
        let raw = self.raw.as_ptr();
        if !session.native().monitors().contains(&raw) {
            return Err(GlfwError::invalid_use(format!("monitor {raw:p} is no longer connected")));
        }
        Ok((session, raw))
    }

    /// Human-readable name
    pub fn name(&self) -> GlfwResult<String> {
        let (session, raw) = self.checked()?;
        Ok(session.native().monitor_name(raw).unwrap_or_default())
    }

    /// Position of the viewport in virtual screen coordinates
    pub fn position(&self) -> GlfwResult<(i32, i32)> {
        let (session, raw) = self.checked()?;
        Ok(session.native().monitor_pos(raw))
    }

    /// Work area
    pub fn work_area(&self) -> GlfwResult<WorkArea> {
        let (session, raw) = self.checked()?;
        let (x, y, width, height) = session.native().monitor_workarea(raw);
        Ok(WorkArea {
            x,
            y,
            width: u32::try_from(width).unwrap_or(0),
            height: u32::try_from(height).unwrap_or(0),
        })
    }

    /// Physical size in millimetres
    pub fn physical_size(&self) -> GlfwResult<(u32, u32)> {
        let (session, raw) = self.checked()?;
        let (width, height) = session.native().monitor_physical_size(raw);
        Ok((u32::try_from(width).unwrap_or(0), u32::try_from(height).unwrap_or(0)))
    }

    /// Content scale
    pub fn content_scale(&self) -> GlfwResult<(f32, f32)> {
        let (session, raw) = self.checked()?;
        Ok(session.native().monitor_content_scale(raw))
    }

    /// Current video mode
    pub fn video_mode(&self) -> GlfwResult<VideoMode> {
        let (session, raw) = self.checked()?;
        session
            .native()
            .video_mode(raw)
            .map(VideoMode::from)
            .ok_or_else(|| GlfwError::invalid_use(format!("monitor {raw:p} reported no video mode")))
    }

    /// Every video mode the monitor supports
    pub fn video_modes(&self) -> GlfwResult<Vec<VideoMode>> {
        let (session, raw) = self.checked()?;
        Ok(session.native().video_modes(raw).into_iter().map(VideoMode::from).collect())
    }

    /// Apply a ramp generated from a gamma exponent
    pub fn set_gamma(&self, gamma: f32) -> GlfwResult<()> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(GlfwError::configuration("gamma", gamma, "must be a finite positive number"));
        }
        let (session, raw) = self.checked()?;
        session::checked(|| session.native().set_gamma(raw, gamma))?;
        log::debug!("set gamma {gamma} on monitor {raw:p}");
        Ok(())
    }

    /// Current gamma ramp
    pub fn gamma_ramp(&self) -> GlfwResult<GammaRamp> {
        let (session, raw) = self.checked()?;
        let ramp = session::checked(|| session.native().gamma_ramp(raw))?
            .ok_or_else(|| GlfwError::invalid_use(format!("monitor {raw:p} reported no gamma ramp")))?;
        GammaRamp::new(ramp.red, ramp.green, ramp.blue)
    }

    /// Replace the gamma ramp
    ///
    /// Most platforms expect 256 entries per channel.
    pub fn set_gamma_ramp(&self, ramp: &GammaRamp) -> GlfwResult<()> {
        let (session, raw) = self.checked()?;
        session::checked(|| session.native().set_gamma_ramp(raw, &ramp.to_raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{MockCall, MockNative};
    use crate::session::Library;
    use approx::assert_relative_eq;

    fn mode(width: i32, height: i32) -> RawVideoMode {
        RawVideoMode {
            width,
            height,
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            refresh_rate: 60,
        }
    }

    #[test]
    fn test_queries_require_session() {
        assert!(matches!(Monitor::all(), Err(GlfwError::NotInitialized)));
        assert!(matches!(Monitor::primary(), Err(GlfwError::NotInitialized)));
    }

    #[test]
    fn test_monitor_queries() {
        let _serial = crate::session::serial();
        let mock = MockNative::new();
        let raw = mock.add_monitor("Built-in", mode(1920, 1080));
        let _library = Library::init(mock.clone()).unwrap();

        let primary = Monitor::primary().unwrap().unwrap();
        assert_eq!(Monitor::all().unwrap(), [primary]);
        assert_eq!(primary.name().unwrap(), "Built-in");
        assert_eq!(primary.video_mode().unwrap().width, 1920);
        assert_eq!(primary.video_modes().unwrap().len(), 1);
        assert_eq!(primary.work_area().unwrap().height, 1080);

        let (x_scale, y_scale) = primary.content_scale().unwrap();
        assert_relative_eq!(x_scale, 1.0);
        assert_relative_eq!(y_scale, 1.0);

        mock.remove_monitor(raw);
        assert!(!primary.is_connected());
        assert!(matches!(primary.name(), Err(GlfwError::InvalidUse(_))));
    }

    #[test]
    fn test_monitor_from_old_session_is_stale() {
        let _serial = crate::session::serial();
        let mock = MockNative::new();
        mock.add_monitor("External", mode(2560, 1440));
        let monitor = {
            let _library = Library::init(mock.clone()).unwrap();
            Monitor::primary().unwrap().unwrap()
        };

        let _library = Library::init(mock.clone()).unwrap();
        assert!(!monitor.is_connected());
        assert!(matches!(monitor.position(), Err(GlfwError::InvalidUse(_))));
    }

    #[test]
    fn test_gamma_ramp_shape_is_validated() {
        assert!(GammaRamp::new(vec![], vec![], vec![]).is_err());
        assert!(matches!(
            GammaRamp::new(vec![0; 256], vec![0; 256], vec![0; 255]),
            Err(GlfwError::Configuration { .. })
        ));
        let ramp = GammaRamp::new(vec![0, 65535], vec![0, 65535], vec![0, 65535]).unwrap();
        assert_eq!(ramp.len(), 2);
        assert_eq!(ramp.blue(), [0, 65535]);
    }

    #[test]
    fn test_gamma() {
        let _serial = crate::session::serial();
        let mock = MockNative::new();
        mock.add_monitor("Panel", mode(1920, 1080));
        let _library = Library::init(mock.clone()).unwrap();
        let monitor = Monitor::primary().unwrap().unwrap();

        for rejected in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(monitor.set_gamma(rejected).is_err());
        }
        assert_eq!(mock.count(|call| matches!(call, MockCall::SetGamma(_))), 0);

        let identity = monitor.gamma_ramp().unwrap();
        assert_eq!(identity.len(), 256);
        monitor.set_gamma(2.2).unwrap();
        let brighter = monitor.gamma_ramp().unwrap();
        assert!(brighter.red()[64] > identity.red()[64]);

        monitor.set_gamma_ramp(&identity).unwrap();
        assert_eq!(monitor.gamma_ramp().unwrap(), identity);
        assert_eq!(mock.calls().last(), Some(&MockCall::SetGammaRamp(256)));
    }
}
