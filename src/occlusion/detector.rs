use tracing::{debug, trace};

use super::geometry::{display_for_rect, Display, ScreenRect};
use super::rules::OcclusionRules;
use super::source::{WindowId, WindowInfo, WindowSource};

/// Why a window was not considered as a covering candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OwnWindow,
    NotVisible,
    IgnoredClass,
    WrapperClass,
    ToolWindow,
    NoBounds,
    TooSmall,
    LargeAppPopup,
    OtherDisplay,
}

pub struct OcclusionDetector {
    rules: OcclusionRules,
}

impl OcclusionDetector {
    pub fn new(rules: OcclusionRules) -> Self {
        Self { rules }
    }

    /// Filters are applied cheapest first; the first that matches wins.
    pub fn skip_reason(
        &self,
        window: &WindowInfo,
        own_window: WindowId,
        widget_display: &Display,
        displays: &[Display],
    ) -> Option<SkipReason> {
        if window.id == own_window {
            return Some(SkipReason::OwnWindow);
        }
        if !window.visible {
            return Some(SkipReason::NotVisible);
        }
        if self.rules.is_ignored_class(&window.class_name) {
            return Some(SkipReason::IgnoredClass);
        }
        if self.rules.is_wrapper_class(&window.class_name) {
            return Some(SkipReason::WrapperClass);
        }
        if self.rules.is_tool_window(window.ex_style) {
            return Some(SkipReason::ToolWindow);
        }
        let Some(rect) = window.rect else {
            return Some(SkipReason::NoBounds);
        };
        let (width, height) = (rect.width(), rect.height());
        if self.rules.is_too_small(width, height) {
            return Some(SkipReason::TooSmall);
        }
        if self
            .rules
            .is_small_large_app_popup(&window.class_name, width, height)
        {
            return Some(SkipReason::LargeAppPopup);
        }
        match display_for_rect(&rect, displays) {
            Some(display) if display.id == widget_display.id => None,
            _ => Some(SkipReason::OtherDisplay),
        }
    }

    /// Walk `windows` top to bottom and stop at the first eligible window
    /// that overlaps the widget.
    pub fn is_covered<I>(
        &self,
        widget_rect: &ScreenRect,
        widget_display: &Display,
        own_window: WindowId,
        windows: I,
        displays: &[Display],
    ) -> bool
    where
        I: IntoIterator<Item = WindowInfo>,
    {
        for window in windows {
            if let Some(reason) = self.skip_reason(&window, own_window, widget_display, displays) {
                trace!(class = %window.class_name, ?reason, "skip window");
                continue;
            }
            if window.rect.is_some_and(|r| r.overlaps(widget_rect)) {
                debug!(class = %window.class_name, rect = ?window.rect, "widget covered");
                return true;
            }
        }
        false
    }

    /// One poll against the live window list. Any introspection failure
    /// reports "not covered" so the widget is never hidden by mistake.
    pub fn sample(
        &self,
        source: &dyn WindowSource,
        own_window: WindowId,
        widget_rect: &ScreenRect,
    ) -> bool {
        let displays = match source.displays() {
            Ok(d) if !d.is_empty() => d,
            Ok(_) => return false,
            Err(e) => {
                trace!(error = %e, "display query unavailable");
                return false;
            }
        };
        let Some(widget_display) = display_for_rect(widget_rect, &displays).copied() else {
            return false;
        };
        match source.windows() {
            Ok(windows) => {
                self.is_covered(widget_rect, &widget_display, own_window, windows, &displays)
            }
            Err(e) => {
                trace!(error = %e, "window enumeration unavailable");
                false
            }
        }
    }
}

impl Default for OcclusionDetector {
    fn default() -> Self {
        Self::new(OcclusionRules::default())
    }
}
