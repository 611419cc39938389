/// Axis-aligned rectangle in virtual-screen coordinates. `right`/`bottom` are
/// exclusive, matching Win32 `RECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub const fn from_origin(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Zero-area or inverted rects never overlap anything.
    pub fn is_degenerate(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub fn overlaps(&self, other: &ScreenRect) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }
        !(self.right <= other.left
            || self.left >= other.right
            || self.bottom <= other.top
            || self.top >= other.bottom)
    }

    /// Integer center, rounded toward negative infinity.
    pub fn center(&self) -> (i32, i32) {
        (
            (self.left + self.right).div_euclid(2),
            (self.top + self.bottom).div_euclid(2),
        )
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// One monitor. `id` is stable for the lifetime of the monitor (the HMONITOR
/// value on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Display {
    pub id: isize,
    pub bounds: ScreenRect,
    pub is_primary: bool,
}

pub fn primary_display(displays: &[Display]) -> Option<&Display> {
    displays
        .iter()
        .find(|d| d.is_primary)
        .or_else(|| displays.first())
}

/// The display containing the rect's center, falling back to the primary
/// display when the center is off every monitor.
pub fn display_for_rect<'a>(rect: &ScreenRect, displays: &'a [Display]) -> Option<&'a Display> {
    let (cx, cy) = rect.center();
    displays
        .iter()
        .find(|d| d.bounds.contains_point(cx, cy))
        .or_else(|| primary_display(displays))
}
