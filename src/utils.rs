use chrono::{DateTime, Utc};
use ratatui::style::Style;
use ratatui::text::Span;
use regex::RegexBuilder;

/// "3 days ago" style age, coarse on purpose.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 0 {
        return "just now".to_string();
    }
    let (value, unit) = match secs {
        0..=59 => return "just now".to_string(),
        60..=3_599 => (secs / 60, "minute"),
        3_600..=86_399 => (secs / 3_600, "hour"),
        86_400..=2_591_999 => (secs / 86_400, "day"),
        2_592_000..=31_535_999 => (secs / 2_592_000, "month"),
        _ => (secs / 31_536_000, "year"),
    };
    format!("{} {}{} ago", value, unit, if value == 1 { "" } else { "s" })
}

/// Splits `text` into spans, styling every case-insensitive occurrence of `term`.
pub fn highlight_matches(
    text: &str,
    term: &str,
    base: Style,
    highlight: Style,
) -> Vec<Span<'static>> {
    if term.is_empty() {
        return vec![Span::styled(text.to_owned(), base)];
    }
    let re = match RegexBuilder::new(&regex::escape(term)).case_insensitive(true).build() {
        Ok(re) => re,
        Err(_) => return vec![Span::styled(text.to_owned(), base)],
    };
    let mut spans = vec![];
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            spans.push(Span::styled(text[last..m.start()].to_owned(), base));
        }
        spans.push(Span::styled(text[m.start()..m.end()].to_owned(), highlight));
        last = m.end();
    }
    if last < text.len() {
        spans.push(Span::styled(text[last..].to_owned(), base));
    }
    spans
}

/// Keeps a cursor inside `len` items; `None` when there is nothing to point at.
pub fn clamp_cursor(cursor: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(cursor.unwrap_or(0).min(len - 1))
    }
}
