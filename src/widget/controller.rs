use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{save_settings_to, WidgetSettings};
use crate::occlusion::{Display, OcclusionDetector, ScreenRect, WindowId, WindowSource};
use crate::visibility::{Transition, VisibilityStabilizer};

use super::mixer_view::MixerView;

pub const WIDGET_WIDTH: i32 = 450;
pub const WIDGET_HEIGHT: i32 = 300;
pub const SYNC_INTERVAL: Duration = Duration::from_millis(500);

/// A saved position this close to the right/bottom edge counts as off-screen.
const OFFSCREEN_MARGIN: i32 = 100;
/// Drag artifacts report the window far off to the left.
const DRAG_ARTIFACT_X: i32 = -5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetPosition {
    pub x: i32,
    pub y: i32,
}

impl WidgetPosition {
    pub fn rect(&self) -> ScreenRect {
        ScreenRect::from_origin(self.x, self.y, WIDGET_WIDTH, WIDGET_HEIGHT)
    }
}

pub fn centered_on(display: &ScreenRect) -> WidgetPosition {
    WidgetPosition {
        x: display.left + ((display.width() - WIDGET_WIDTH) as f64 / 2.0).round() as i32,
        y: display.top + ((display.height() - WIDGET_HEIGHT) as f64 / 2.0).round() as i32,
    }
}

/// `Some(centered)` when `pos` is not comfortably inside `primary`.
pub fn validate_position(pos: WidgetPosition, primary: &ScreenRect) -> Option<WidgetPosition> {
    let off_screen = pos.x < primary.left
        || pos.x > primary.right - OFFSCREEN_MARGIN
        || pos.y < primary.top
        || pos.y > primary.bottom - OFFSCREEN_MARGIN;
    off_screen.then(|| centered_on(primary))
}

/// Owns all widget state. Lives on the UI thread.
pub struct WidgetController {
    settings: WidgetSettings,
    settings_path: PathBuf,
    position: Option<WidgetPosition>,
    stabilizer: VisibilityStabilizer,
    detector: OcclusionDetector,
    view: MixerView,
}

impl WidgetController {
    pub fn new(settings: WidgetSettings, settings_path: PathBuf) -> Self {
        Self {
            settings,
            settings_path,
            position: None,
            // The window is shown as soon as it is created.
            stabilizer: VisibilityStabilizer::new(true),
            detector: OcclusionDetector::default(),
            view: MixerView::new(),
        }
    }

    /// Where to create the window: the saved position, else centered on the
    /// primary display.
    pub fn initial_position(&self, primary: Option<&Display>) -> WidgetPosition {
        match (self.settings.position(), primary) {
            (Some((x, y)), _) => WidgetPosition { x, y },
            (None, Some(display)) => centered_on(&display.bounds),
            (None, None) => WidgetPosition { x: 0, y: 0 },
        }
    }

    /// Check the window's actual start position against the primary display.
    /// Returns the position to move to when it had to be reset.
    pub fn startup(
        &mut self,
        actual: WidgetPosition,
        primary: Option<&Display>,
    ) -> Option<WidgetPosition> {
        let reset = primary.and_then(|d| validate_position(actual, &d.bounds));
        match reset {
            Some(centered) => {
                info!(x = centered.x, y = centered.y, "Reset position to center");
                self.position = Some(centered);
            }
            None => self.position = Some(actual),
        }
        reset
    }

    /// A user move finished. Returns whether it was accepted and persisted.
    pub fn on_moved(&mut self, x: i32, y: i32) -> bool {
        if x <= DRAG_ARTIFACT_X {
            debug!(x, y, "ignoring drag artifact position");
            return false;
        }
        self.position = Some(WidgetPosition { x, y });
        self.settings.set_position(x, y);
        save_settings_to(&self.settings_path, &self.settings);
        true
    }

    pub fn position(&self) -> Option<WidgetPosition> {
        self.position
    }

    /// The rect to test for occlusion. A hidden window's live bounds are not
    /// trusted, so `live` is only used when the widget is displayed.
    pub fn widget_rect(&self, live: Option<ScreenRect>) -> Option<ScreenRect> {
        match (self.stabilizer.is_visible(), live, self.position) {
            (true, Some(rect), _) => Some(rect),
            (_, _, Some(pos)) => Some(pos.rect()),
            (_, live, None) => live,
        }
    }

    /// One occlusion tick.
    pub fn sample_occlusion(
        &mut self,
        source: &dyn WindowSource,
        own_window: WindowId,
        live: Option<ScreenRect>,
    ) -> Option<Transition> {
        let covered = match self.widget_rect(live) {
            Some(rect) => self.detector.sample(source, own_window, &rect),
            None => false,
        };
        let transition = self.stabilizer.observe(!covered);
        if let Some(t) = transition {
            debug!(?t, "visibility transition");
        }
        transition
    }

    /// The window manager showed or restored the widget.
    pub fn on_shown_by_system(&mut self) {
        self.stabilizer.force_visible();
    }

    pub fn is_visible(&self) -> bool {
        self.stabilizer.is_visible()
    }

    pub fn view(&self) -> &MixerView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut MixerView {
        &mut self.view
    }
}
