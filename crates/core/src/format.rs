use crate::windows::{SkipWindows, WindowKind};

/// Format seconds as MM:SS, or H:MM:SS past the first hour
pub fn format_timestamp(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// WebVTT cue timestamp, HH:MM:SS.mmm
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let millis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let total = millis / 1000;

    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total / 3600,
        (total % 3600) / 60,
        total % 60,
        millis % 1000
    )
}

fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    }
}

fn kind_name(kind: WindowKind) -> &'static str {
    match kind {
        WindowKind::Opening => "opening",
        WindowKind::Ending => "ending",
        WindowKind::Trailing => "trailing",
    }
}

pub fn format_windows_readable(windows: &SkipWindows) -> String {
    if windows.is_empty() {
        return "No skip windows\n".to_string();
    }

    let mut output = String::new();
    for (kind, window) in windows.iter() {
        let label = if window.label.is_empty() {
            "(unlabeled)"
        } else {
            window.label.as_str()
        };
        output.push_str(&format!(
            "[{}–{}] {:<9} {}\n",
            format_timestamp(window.start_time),
            format_timestamp(window.end_time),
            kind_name(kind),
            label
        ));
    }
    output
}

/// Chapters track in WebVTT, one cue per window.
pub fn format_chapters_vtt(windows: &SkipWindows) -> String {
    let mut output = String::from("WEBVTT\n");
    for (index, cue) in windows.cues().iter().enumerate() {
        output.push('\n');
        output.push_str(&format!("{}\n", index + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_timestamp(cue.start_time),
            format_vtt_timestamp(cue.end_time)
        ));
        output.push_str(&format!("{}\n", cue.text));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::windows::LabeledWindow;

    fn opening_only() -> SkipWindows {
        SkipWindows {
            opening: Some(LabeledWindow::new(0.0, 90.0, "Opening")),
            ending: None,
            trailing: Some(LabeledWindow::new(90.0, 1400.0, "")),
        }
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(89.9), "01:29");
        assert_eq!(format_timestamp(1400.0), "23:20");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
        assert_eq!(format_timestamp(-4.0), "00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00");
    }

    #[test]
    fn vtt_timestamps() {
        assert_eq!(format_vtt_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_vtt_timestamp(89.9), "00:01:29.900");
        assert_eq!(format_vtt_timestamp(3725.25), "01:02:05.250");
    }

    #[test]
    fn readable_listing() {
        let listing = format_windows_readable(&opening_only());
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[00:00–01:30] opening"));
        assert!(lines[0].ends_with("Opening"));
        assert!(lines[1].ends_with("(unlabeled)"));
        assert_eq!(
            format_windows_readable(&SkipWindows::default()),
            "No skip windows\n"
        );
    }

    #[test]
    fn chapters_vtt() {
        let vtt = format_chapters_vtt(&opening_only());
        assert_eq!(
            vtt,
            "WEBVTT\n\n1\n00:00:00.000 --> 00:01:30.000\nOpening\n\n2\n00:01:30.000 --> 00:23:20.000\n\n"
        );
    }
}
