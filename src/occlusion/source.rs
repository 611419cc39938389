use thiserror::Error;

use super::geometry::{Display, ScreenRect};

/// Opaque native window handle (HWND value on Windows).
pub type WindowId = isize;

/// What the detector needs to know about one top-level window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub visible: bool,
    pub class_name: String,
    pub ex_style: u32,
    /// `None` when the OS refused to report the bounds.
    pub rect: Option<ScreenRect>,
}

#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("window introspection is not supported on this platform")]
    Unsupported,
    #[error("window introspection failed: {0}")]
    Failed(String),
}

/// Access to the OS window list. `windows()` yields a fresh, single-pass
/// sequence in top-to-bottom Z-order for each poll.
pub trait WindowSource {
    fn displays(&self) -> Result<Vec<Display>, IntrospectionError>;
    fn windows(&self) -> Result<Box<dyn Iterator<Item = WindowInfo> + '_>, IntrospectionError>;
}

/// Used where no introspection layer exists; makes the detector fail open.
pub struct UnavailableSource;

impl WindowSource for UnavailableSource {
    fn displays(&self) -> Result<Vec<Display>, IntrospectionError> {
        Err(IntrospectionError::Unsupported)
    }

    fn windows(&self) -> Result<Box<dyn Iterator<Item = WindowInfo> + '_>, IntrospectionError> {
        Err(IntrospectionError::Unsupported)
    }
}

/// The window source for the current platform.
pub fn platform_source() -> Box<dyn WindowSource> {
    #[cfg(windows)]
    {
        Box::new(super::win32::Win32WindowSource)
    }
    #[cfg(not(windows))]
    {
        Box::new(UnavailableSource)
    }
}
