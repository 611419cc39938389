//! Debounces raw occlusion samples into show/hide decisions.
//!
//! Window enumeration during animations is noisy, so a transition is only
//! committed after `threshold` consecutive identical samples.

use std::time::Duration;

pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);
pub const STARTUP_GRACE: Duration = Duration::from_secs(1);
pub const STABILITY_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Show,
    Hide,
}

/// What the samples currently say, independent of what is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    Unknown,
    Visible,
    Hidden,
}

#[derive(Debug)]
pub struct VisibilityStabilizer {
    threshold: u32,
    last_sample: Option<bool>,
    stable_count: u32,
    /// Whether the widget is currently displayed.
    visible: bool,
}

impl VisibilityStabilizer {
    pub fn new(initially_visible: bool) -> Self {
        Self::with_threshold(initially_visible, STABILITY_THRESHOLD)
    }

    pub fn with_threshold(initially_visible: bool, threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            last_sample: None,
            stable_count: 0,
            visible: initially_visible,
        }
    }

    /// Feed one sample (`true` = nothing covers the widget). Returns the
    /// transition to perform, if any; the displayed flag is updated as part
    /// of committing it.
    pub fn observe(&mut self, should_show: bool) -> Option<Transition> {
        if self.last_sample != Some(should_show) {
            self.last_sample = Some(should_show);
            self.stable_count = 1;
        } else {
            self.stable_count = self.stable_count.saturating_add(1);
        }

        // Any tick of a stable run may commit, but only while it disagrees
        // with what is displayed.
        if self.stable_count < self.threshold || should_show == self.visible {
            return None;
        }

        self.visible = should_show;
        Some(if should_show {
            Transition::Show
        } else {
            Transition::Hide
        })
    }

    /// The window manager showed or restored the widget on the user's behalf.
    pub fn force_visible(&mut self) {
        self.visible = true;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    pub fn state(&self) -> VisibilityState {
        match self.last_sample {
            None => VisibilityState::Unknown,
            Some(true) => VisibilityState::Visible,
            Some(false) => VisibilityState::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(stabilizer: &mut VisibilityStabilizer, samples: &[bool]) -> Vec<Transition> {
        samples
            .iter()
            .filter_map(|&s| stabilizer.observe(s))
            .collect()
    }

    #[test]
    fn starts_unknown() {
        let s = VisibilityStabilizer::new(true);
        assert_eq!(s.state(), VisibilityState::Unknown);
        assert!(s.is_visible());
    }

    #[test]
    fn transient_flip_produces_nothing() {
        let mut s = VisibilityStabilizer::new(true);
        let t = feed(&mut s, &[true, true, false, false, true, true, true, false, true]);
        assert!(t.is_empty());
        assert!(s.is_visible());
    }

    #[test]
    fn exactly_five_samples_commit_once() {
        let mut s = VisibilityStabilizer::new(true);
        assert!(feed(&mut s, &[false; 4]).is_empty());
        assert_eq!(s.observe(false), Some(Transition::Hide));
        assert!(!s.is_visible());
        assert_eq!(s.state(), VisibilityState::Hidden);
        // Staying covered does not re-trigger.
        assert!(feed(&mut s, &[false; 20]).is_empty());
    }

    #[test]
    fn stable_agreeing_state_never_transitions() {
        let mut s = VisibilityStabilizer::new(true);
        assert!(feed(&mut s, &[true; 12]).is_empty());
        assert_eq!(s.stable_count(), 12);
    }

    #[test]
    fn hide_then_show() {
        let mut s = VisibilityStabilizer::new(true);
        let mut samples = vec![false; 5];
        samples.extend([true; 5]);
        assert_eq!(feed(&mut s, &samples), vec![Transition::Hide, Transition::Show]);
    }

    #[test]
    fn forced_visible_is_reconciled_by_a_stable_run() {
        let mut s = VisibilityStabilizer::new(true);
        feed(&mut s, &[false; 5]);
        s.force_visible();
        assert!(s.is_visible());
        // Still covered: the next tick of the ongoing stable run hides again.
        assert_eq!(s.observe(false), Some(Transition::Hide));
    }
}
