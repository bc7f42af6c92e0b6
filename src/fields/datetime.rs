//! Date, date/time and time fields.
//!
//! Typed input is parsed permissively: whatever parts match are used and the
//! rest is filled from the current moment. The calendar widget writes back
//! through [`set_date`] and hands focus back with [`return_focus`].

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{FormError, Result};
use crate::nodes::{slots, FieldContext, FieldNode, FieldView};
use crate::reactive::{create_effect, keys};
use crate::widgets::calendar;

/// `M/D/YYYY[ HH:MM]`. Both date separators are captured; they must match.
static DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(1[0-2]|0?[1-9])([/\-. ])?(3[01]|[12][0-9]|0?[1-9])([/\-. ])?(19[0-9]{2}|2[0-9]{3}|[0-9]{2})(?:,? +(2[0-3]|1[0-9]|0?[0-9]):?([0-5][0-9]))?",
    )
    .expect("datetime pattern is valid")
});

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(2[0-3]|1[0-9]|0?[0-9]):?([0-5][0-9])").expect("time pattern is valid"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DateKind {
    Date,
    DateTime,
    Time,
}

impl DateKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "date" => Some(Self::Date),
            "datetime" => Some(Self::DateTime),
            "time" => Some(Self::Time),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
        }
    }

    pub fn has_date(self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    pub fn has_time(self) -> bool {
        matches!(self, Self::Time | Self::DateTime)
    }

    /// Display pattern, as shown to the user.
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Date => "MM/DD/YYYY",
            Self::DateTime => "MM/DD/YYYY HH:MM",
            Self::Time => "HH:MM",
        }
    }

    fn chrono_format(self) -> &'static str {
        match self {
            Self::Date => "%m/%d/%Y",
            Self::DateTime => "%m/%d/%Y %H:%M",
            Self::Time => "%H:%M",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Date => "Date Input",
            Self::DateTime => "Date/Time Input",
            Self::Time => "Time Input",
        }
    }
}

pub fn format_date(date: NaiveDateTime, kind: DateKind) -> String {
    date.format(kind.chrono_format()).to_string()
}

/// Parse user input for a field of `kind`, filling missing parts from `now`.
///
/// Returns `None` for empty input or when the matched parts do not form a
/// real date (`02/31/2024`).
pub fn parse_date_input(input: &str, kind: DateKind, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let mut date = now.date();
    let mut time = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)?;

    if kind.has_date()
        && let Some(caps) = DATETIME_RE.captures(input)
    {
        let first = caps.get(2).map(|m| m.as_str());
        let second = caps.get(4).map(|m| m.as_str());
        if first == second {
            let number = |index: usize| caps.get(index).and_then(|m| m.as_str().parse::<u32>().ok());
            let year = caps.get(5).map(|m| m.as_str()).and_then(|year| {
                if year.len() == 2 {
                    let century = now.year() / 100;
                    format!("{century}{year}").parse::<i32>().ok()
                } else {
                    year.parse::<i32>().ok()
                }
            });
            date = NaiveDate::from_ymd_opt(
                year.unwrap_or(now.year()),
                number(1).unwrap_or(now.month()),
                number(3).unwrap_or(now.day()),
            )?;
            if let (Some(hour), Some(minute)) = (number(6), number(7)) {
                time = NaiveTime::from_hms_opt(hour, minute, 0)?;
            }
        }
    }

    if kind == DateKind::Time
        && let Some(caps) = TIME_RE.captures(input)
    {
        let number = |index: usize| caps.get(index).and_then(|m| m.as_str().parse::<u32>().ok());
        if let (Some(hour), Some(minute)) = (number(1), number(2)) {
            time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        }
    }

    Some(date.and_time(time))
}

fn kind_of(field: &FieldNode) -> DateKind {
    field
        .data()
        .read_untracked(keys::TYPE)
        .ok()
        .and_then(|tag| DateKind::from_tag(&tag))
        .unwrap_or(DateKind::DateTime)
}

/// Show `date` in `field`'s input, or clear it.
pub fn set_date(field: &FieldNode, date: Option<NaiveDateTime>) {
    let text = date.map(|date| format_date(date, kind_of(field))).unwrap_or_default();
    debug!(field = %field.node_id(), %text, "date set");
    field.view().set_text(slots::INPUT_VALUE, text);
}

/// Open the calendar for `field`, starting at the date in its input.
pub fn show_calendar(field: &FieldNode) -> Result<()> {
    let Some(calendar) = calendar::calendar() else {
        warn!(field = %field.node_id(), "no calendar installed");
        return Err(FormError::MissingHostWidget("calendar"));
    };
    let kind = kind_of(field);
    let now = Local::now().naive_local();
    let current = field.view().text_or_empty(slots::INPUT_VALUE);
    let date = parse_date_input(&current, kind, now).unwrap_or(now);

    field.view().set_flag(slots::INPUT_BUTTON_VISIBLE, false);
    calendar.open(field, date, kind);
    Ok(())
}

/// The calendar closed; restore the field's own button.
pub fn return_focus(field: &FieldNode) {
    field.view().set_flag(slots::INPUT_BUTTON_VISIBLE, true);
}

pub struct DateTimeView {
    kind: DateKind,
}

impl DateTimeView {
    pub fn new(kind: DateKind) -> Self {
        Self { kind }
    }
}

impl FieldView for DateTimeView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "label": self.kind.label(),
            "placeholder": "Date",
            "min": null,
            "max": null,
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        cx.view.set_flag(slots::INPUT_BUTTON_VISIBLE, true);

        // A kind change invalidates whatever the input held.
        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || {
            let kind = d.read(keys::TYPE).ok().and_then(|tag| DateKind::from_tag(&tag));
            v.set_text(slots::INPUT_FORMAT, kind.map(DateKind::pattern).unwrap_or_default());
            v.clear_text(slots::INPUT_VALUE);
        });

        crate::nodes::paint_input(cx);
        Ok(())
    }

    fn commit_input(&mut self, cx: &FieldContext<'_>, input: &str) {
        let kind = cx
            .data
            .read_untracked(keys::TYPE)
            .ok()
            .and_then(|tag| DateKind::from_tag(&tag))
            .unwrap_or(self.kind);
        let parsed = parse_date_input(input, kind, Local::now().naive_local());
        let text = parsed.map(|date| format_date(date, kind)).unwrap_or_default();
        cx.view.set_text(slots::INPUT_VALUE, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(9, 30, 12)
            .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_full_datetime() {
        let parsed = parse_date_input("3/7/2023 14:05", DateKind::DateTime, now());
        assert_eq!(parsed, Some(at(2023, 3, 7, 14, 5)));
    }

    #[test]
    fn test_two_digit_year_uses_current_century() {
        let parsed = parse_date_input("12-25-99", DateKind::Date, now());
        assert_eq!(parsed, Some(at(2099, 12, 25, 9, 30)));
    }

    #[test]
    fn test_mismatched_separators_fall_back_to_now() {
        let parsed = parse_date_input("3/7-2023", DateKind::Date, now());
        assert_eq!(parsed, Some(at(2024, 6, 15, 9, 30)));
    }

    #[test]
    fn test_impossible_date_is_rejected() {
        assert_eq!(parse_date_input("02/31/2024", DateKind::Date, now()), None);
        assert_eq!(parse_date_input("   ", DateKind::Date, now()), None);
    }

    #[test]
    fn test_time_only() {
        let parsed = parse_date_input("7:45", DateKind::Time, now());
        assert_eq!(parsed, Some(at(2024, 6, 15, 7, 45)));
        let compact = parse_date_input("2315", DateKind::Time, now());
        assert_eq!(compact, Some(at(2024, 6, 15, 23, 15)));
    }

    #[test]
    fn test_formats_by_kind() {
        let date = at(2024, 1, 2, 3, 4);
        assert_eq!(format_date(date, DateKind::DateTime), "01/02/2024 03:04");
        assert_eq!(format_date(date, DateKind::Date), "01/02/2024");
        assert_eq!(format_date(date, DateKind::Time), "03:04");
    }
}
