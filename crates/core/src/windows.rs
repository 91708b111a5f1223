use serde::Serialize;

use crate::{
    player::ChapterCue,
    types::{SkipTimesResponse, SkipType},
};

pub const OPENING_LABEL: &str = "Opening";
pub const ENDING_LABEL: &str = "Ending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Opening,
    Ending,
    /// Covers the rest of the episode after the opening when no ending is known.
    Trailing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledWindow {
    pub start_time: f64,
    pub end_time: f64,
    pub label: String,
}

impl LabeledWindow {
    pub fn new(start_time: f64, end_time: f64, label: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            label: label.into(),
        }
    }

    /// Strictly inside the window; both boundaries are excluded.
    pub fn contains(&self, time: f64) -> bool {
        time > self.start_time && time < self.end_time
    }
}

/// Derived windows keyed by kind. `ending` and `trailing` are never both set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkipWindows {
    pub opening: Option<LabeledWindow>,
    pub ending: Option<LabeledWindow>,
    pub trailing: Option<LabeledWindow>,
}

impl SkipWindows {
    pub fn get(&self, kind: WindowKind) -> Option<&LabeledWindow> {
        match kind {
            WindowKind::Opening => self.opening.as_ref(),
            WindowKind::Ending => self.ending.as_ref(),
            WindowKind::Trailing => self.trailing.as_ref(),
        }
    }

    /// Opening first, then the ending or trailing window.
    pub fn iter(&self) -> impl Iterator<Item = (WindowKind, &LabeledWindow)> {
        [
            (WindowKind::Opening, self.opening.as_ref()),
            (WindowKind::Ending, self.ending.as_ref()),
            (WindowKind::Trailing, self.trailing.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, window)| window.map(|w| (kind, w)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One chapter cue per window, in iteration order.
    pub fn cues(&self) -> Vec<ChapterCue> {
        self.iter()
            .map(|(_, window)| ChapterCue {
                start_time: window.start_time,
                end_time: window.end_time,
                text: window.label.clone(),
            })
            .collect()
    }
}

/// Turns a skip-times payload into opening/ending windows.
///
/// Only the first `op` and first `ed` entries are considered. Without an
/// ending, an unlabeled trailing window spans from the end of the opening (or
/// 0) to the reported episode length.
pub fn derive_windows(response: &SkipTimesResponse) -> SkipWindows {
    let opening = response.first_of(SkipType::Op);
    let ending = response.first_of(SkipType::Ed);
    let episode_length = response.episode_length();

    let opening_window = opening.map(|entry| {
        LabeledWindow::new(
            entry.interval.start_time,
            entry.interval.end_time,
            OPENING_LABEL,
        )
    });

    match ending {
        Some(entry) => SkipWindows {
            opening: opening_window,
            ending: Some(LabeledWindow::new(
                entry.interval.start_time,
                entry.interval.end_time,
                ENDING_LABEL,
            )),
            trailing: None,
        },
        None => SkipWindows {
            trailing: Some(LabeledWindow::new(
                opening.map_or(0.0, |entry| entry.interval.end_time),
                episode_length,
                "",
            )),
            opening: opening_window,
            ending: None,
        },
    }
}
