//! Text layout of the digest.

use std::fmt::Write as _;

use crate::model::Activity;

/// Text of a digest without any activity.
pub const NO_ACTIVITY: &str = "No activity found";

/// One activity, ready to print.
#[derive(Debug, Clone)]
pub struct RenderedActivity<'a> {
    pub activity: &'a Activity,
    /// Bracketed suffix of the section header (unit or partner name).
    pub header_info: Option<String>,
    /// Empty when details are suppressed or not collected.
    pub annotation: String,
}

/// Lay out activities, already in report order.
///
/// Consecutive activities sharing a label share one section header. Each
/// occurrence gets a line with its status glyph and time range; the
/// annotation follows the first one.
pub fn render(activities: &[RenderedActivity<'_>]) -> String {
    let mut out = String::new();
    let mut previous_label: Option<&str> = None;

    for item in activities {
        let activity = item.activity;
        if previous_label != Some(activity.label.as_str()) {
            let _ = write!(out, "\n{}", activity.label);
            if let Some(info) = item.header_info.as_deref().filter(|s| !s.is_empty()) {
                let _ = write!(out, " [{info}]");
            }
            out.push('\n');
            previous_label = Some(activity.label.as_str());
        }

        if activity.occurrences.is_empty() {
            push_line(&mut out, &format!("\t{}", activity.status.glyph()), &item.annotation);
            continue;
        }
        for (i, occurrence) in activity.occurrences.iter().enumerate() {
            let head = format!(
                "\t{} — {} - {}",
                occurrence.status.glyph(),
                occurrence.start.format("%H:%M"),
                occurrence.end.format("%H:%M"),
            );
            let annotation = if i == 0 { item.annotation.as_str() } else { "" };
            push_line(&mut out, &head, annotation);
        }
    }

    let text = out.trim_start_matches('\n');
    if text.is_empty() {
        NO_ACTIVITY.to_string()
    } else {
        text.to_string()
    }
}

fn push_line(out: &mut String, head: &str, annotation: &str) {
    out.push_str(head);
    if !annotation.is_empty() {
        out.push(' ');
        out.push_str(annotation);
    }
    out.push('\n');
}
