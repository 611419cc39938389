//! Decides whether another application window sits on top of the widget.

pub mod detector;
pub mod geometry;
pub mod rules;
pub mod source;
#[cfg(windows)]
pub mod win32;

pub use detector::{OcclusionDetector, SkipReason};
pub use geometry::{display_for_rect, primary_display, Display, ScreenRect};
pub use rules::OcclusionRules;
pub use source::{platform_source, WindowId, WindowInfo, WindowSource};
