//! Display Formatting
//!
//! Pure helpers used by the list templates: timestamps, measures and
//! HTML-safe text.

use chrono::{FixedOffset, Local};

use crate::model::Timestamp;

/// Month abbreviation, day, 24-hour clock: `Jan 1, 10:00`
const TIME_FORMAT: &str = "%b %-d, %H:%M";

/// Time zone used when rendering timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// The runtime's local zone
    #[default]
    Local,
    /// A fixed UTC offset
    Fixed(FixedOffset),
}

impl DisplayZone {
    /// Parse `local`, `utc` or an offset like `+02:00` / `-0530`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "local" => return Some(Self::Local),
            "utc" | "z" => return FixedOffset::east_opt(0).map(Self::Fixed),
            _ => {}
        }

        let (sign, rest) = match raw.as_bytes().first()? {
            b'+' => (1, &raw[1..]),
            b'-' => (-1, &raw[1..]),
            _ => return None,
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let hours: i32 = digits[..2].parse().ok()?;
        let minutes: i32 = digits[2..].parse().ok()?;
        if minutes >= 60 {
            return None;
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(Self::Fixed)
    }
}

/// Timestamp formatter bound to a display zone
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    zone: DisplayZone,
}

impl Formatter {
    pub fn new(zone: DisplayZone) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    /// Render a timestamp as `Jan 1, 10:00` in the display zone
    pub fn format_time(&self, ts: &Timestamp) -> String {
        match self.zone {
            DisplayZone::Local => ts.with_timezone(&Local).format(TIME_FORMAT).to_string(),
            DisplayZone::Fixed(offset) => ts.with_timezone(&offset).format(TIME_FORMAT).to_string(),
        }
    }
}

/// Escape markup-significant characters so `raw` can be injected as HTML
/// content or attribute text.
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whole numbers print without a fraction (`3`, not `3.0`)
pub fn format_measure(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
