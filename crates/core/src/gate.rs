use serde::Serialize;

use crate::{
    player::PlaybackSample,
    windows::{ENDING_LABEL, LabeledWindow, OPENING_LABEL, SkipWindows, WindowKind},
};

/// Which skip affordances the rendering layer should show right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub opening: bool,
    pub ending: bool,
}

impl Visibility {
    pub fn is_shown(&self, kind: WindowKind) -> bool {
        match kind {
            WindowKind::Opening => self.opening,
            WindowKind::Ending => self.ending,
            WindowKind::Trailing => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityGate {
    windows: SkipWindows,
}

impl VisibilityGate {
    pub fn new(windows: SkipWindows) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &SkipWindows {
        &self.windows
    }

    pub fn observe(&self, sample: PlaybackSample) -> Visibility {
        let time = sample.current_time;
        Visibility {
            opening: shown(self.windows.opening.as_ref(), OPENING_LABEL, time),
            // The trailing window never counts here.
            ending: shown(self.windows.ending.as_ref(), ENDING_LABEL, time),
        }
    }

    /// Where a jump over `kind` lands, if the affordance is shown for `visibility`.
    pub fn jump_target(&self, kind: WindowKind, visibility: Visibility) -> Option<f64> {
        if !visibility.is_shown(kind) {
            return None;
        }
        self.windows.get(kind).map(|window| window.end_time)
    }
}

fn shown(window: Option<&LabeledWindow>, label: &str, time: f64) -> bool {
    window.is_some_and(|w| w.label == label && w.contains(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(current_time: f64) -> PlaybackSample {
        PlaybackSample {
            current_time,
            duration: 1400.0,
        }
    }

    fn opening_only() -> VisibilityGate {
        VisibilityGate::new(SkipWindows {
            opening: Some(LabeledWindow::new(0.0, 90.0, OPENING_LABEL)),
            ending: None,
            trailing: Some(LabeledWindow::new(90.0, 1400.0, "")),
        })
    }

    #[test]
    fn opening_shown_inside_window() {
        let visibility = opening_only().observe(sample(45.0));
        assert_eq!(
            visibility,
            Visibility {
                opening: true,
                ending: false
            }
        );
    }

    #[test]
    fn boundaries_are_excluded() {
        let gate = opening_only();
        assert!(!gate.observe(sample(0.0)).opening);
        assert!(!gate.observe(sample(90.0)).opening);
        assert!(gate.observe(sample(89.999)).opening);
    }

    #[test]
    fn trailing_window_never_shows_ending() {
        let gate = opening_only();
        for t in [90.5, 500.0, 1399.0] {
            assert_eq!(gate.observe(sample(t)), Visibility::default());
        }
    }

    #[test]
    fn ending_shown_inside_ending_window() {
        let gate = VisibilityGate::new(SkipWindows {
            opening: None,
            ending: Some(LabeledWindow::new(1300.0, 1390.0, ENDING_LABEL)),
            trailing: None,
        });

        assert!(gate.observe(sample(1350.0)).ending);
        assert!(!gate.observe(sample(1390.0)).ending);
        assert!(!gate.observe(sample(1350.0)).opening);
    }

    #[test]
    fn mislabeled_window_is_ignored() {
        let gate = VisibilityGate::new(SkipWindows {
            opening: Some(LabeledWindow::new(0.0, 90.0, "Intro")),
            ending: None,
            trailing: None,
        });
        assert!(!gate.observe(sample(45.0)).opening);
    }

    #[test]
    fn jump_target_requires_visible_affordance() {
        let gate = opening_only();
        let visible = gate.observe(sample(45.0));

        assert_eq!(gate.jump_target(WindowKind::Opening, visible), Some(90.0));
        assert_eq!(gate.jump_target(WindowKind::Ending, visible), None);
        assert_eq!(
            gate.jump_target(WindowKind::Opening, Visibility::default()),
            None
        );
    }

    #[test]
    fn empty_gate_shows_nothing() {
        let gate = VisibilityGate::default();
        assert_eq!(gate.observe(sample(10.0)), Visibility::default());
    }
}
