//! Calendar popup shared by every date/time field.
//!
//! There is one calendar per designer, installed by the host. It is bound to
//! one field at a time: [`Calendar::open`] binds it, footer actions and
//! Enter/Tab write the chosen date back into that field, and closing without
//! accepting leaves the field untouched.
//!
//! # State
//!
//! A reactive record `{year, month, day, hour, minute, activeYear,
//! activeMonth}` (months are 1-based). Effects paint the 42-cell month grid,
//! the time inputs and the month/year picker into the calendar's [`View`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, Timelike};
use tracing::{debug, warn};

use crate::config::DesignerConfig;
use crate::events::{on_broadcast, BroadcastEvent};
use crate::fields::datetime::{self, DateKind};
use crate::nodes::{get_field, FieldNode, View};
use crate::reactive::{create_effect, effect_scope, untrack, EffectScope, Key, Reactive, ReactiveObject};
use crate::state::keyboard::{Arrow, KeyboardEvent};
use crate::state::pointer::WheelEvent;
use crate::types::{Cleanup, NodeId};

pub const GRID_CELLS: usize = 42;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const YEAR: Key<i64> = Key::new("year");
pub const MONTH: Key<i64> = Key::new("month");
pub const DAY: Key<i64> = Key::new("day");
pub const HOUR: Key<i64> = Key::new("hour");
pub const MINUTE: Key<i64> = Key::new("minute");
pub const ACTIVE_YEAR: Key<i64> = Key::new("activeYear");
pub const ACTIVE_MONTH: Key<i64> = Key::new("activeMonth");

/// Calendar view slots.
pub mod slots {
    pub const OPEN: &str = "calendar.open";
    pub const TITLE: &str = "calendar.title";
    pub const DAYS: &str = "calendar.days";
    pub const ACTIVE_CELL: &str = "calendar.days.active";
    pub const OUTSIDE_CELLS: &str = "calendar.days.outside";
    pub const HOUR: &str = "calendar.hour";
    pub const MINUTE: &str = "calendar.minute";
    pub const DATE_PANEL: &str = "calendar.date.visible";
    pub const TIME_PANEL: &str = "calendar.time.visible";
    pub const TODAY_LABEL: &str = "calendar.today";
    pub const MONTH_YEAR_PANEL: &str = "calendar.picker.visible";
    pub const ACTIVE_MONTH: &str = "calendar.picker.month";
    pub const YEARS: &str = "calendar.picker.years";
    pub const ACTIVE_YEAR: &str = "calendar.picker.year";
}

/// One day in the month grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub active: bool,
}

fn clamp_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?.day();
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

/// The 42 days shown for `year`/`month`, starting on the Sunday on or
/// before the 1st.
pub fn month_grid(year: i32, month: u32, day: u32) -> Vec<CalendarCell> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let offset = u64::from(first.weekday().num_days_from_sunday());
    let Some(start) = first.checked_sub_days(Days::new(offset)) else {
        return Vec::new();
    };
    start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| CalendarCell {
            date,
            in_month: date.month() == month,
            active: date.month() == month && date.day() == day,
        })
        .collect()
}

struct CalendarInner {
    data: ReactiveObject,
    view: View,
    year_start: Reactive<i32>,
    year_window: usize,
    kind: Cell<DateKind>,
    target: RefCell<Option<(NodeId, String)>>,
    scope: EffectScope,
    listener: RefCell<Option<Cleanup>>,
}

#[derive(Clone)]
pub struct Calendar(Rc<CalendarInner>);

impl Calendar {
    fn new(config: &DesignerConfig) -> Calendar {
        let now = Local::now().naive_local();
        let data = ReactiveObject::new();
        data.set("year", now.year());
        data.set("month", now.month() as i32);
        data.set("day", now.day() as i32);
        data.set("hour", now.hour() as i32);
        data.set("minute", now.minute() as i32);
        data.set("activeYear", now.year());
        data.set("activeMonth", now.month() as i32);

        let calendar = Calendar(Rc::new(CalendarInner {
            data,
            view: View::new(),
            year_start: Reactive::new(now.year() - 3),
            year_window: config.year_window,
            kind: Cell::new(DateKind::DateTime),
            target: RefCell::new(None),
            scope: effect_scope(),
            listener: RefCell::new(None),
        }));
        calendar.initialize();

        let weak = Rc::downgrade(&calendar.0);
        let cleanup = on_broadcast(move |event| {
            if let BroadcastEvent::PointerDown { .. } = event
                && let Some(inner) = weak.upgrade()
            {
                Calendar(inner).close();
            }
        });
        *calendar.0.listener.borrow_mut() = Some(Box::new(cleanup));
        calendar
    }

    fn initialize(&self) {
        let inner = &self.0;
        inner.scope.run(|| {
            let (d, v, years) = (inner.data.clone(), inner.view.clone(), inner.year_start.clone());
            create_effect(move || {
                let year = d.read(YEAR).unwrap_or_default() as i32;
                let month = d.read(MONTH).unwrap_or(1) as u32;
                let day = d.read(DAY).unwrap_or(1) as u32;

                let cells = month_grid(year, month, day);
                v.set_items(slots::DAYS, cells.iter().map(|cell| cell.date.day().to_string()).collect());
                v.set_items(
                    slots::OUTSIDE_CELLS,
                    cells
                        .iter()
                        .enumerate()
                        .filter(|(_, cell)| !cell.in_month)
                        .map(|(index, _)| index.to_string())
                        .collect(),
                );
                match cells.iter().position(|cell| cell.active) {
                    Some(index) => v.set_text(slots::ACTIVE_CELL, index.to_string()),
                    None => v.clear_text(slots::ACTIVE_CELL),
                }
                let name = MONTH_NAMES.get(month.saturating_sub(1) as usize).copied().unwrap_or_default();
                v.set_text(slots::TITLE, format!("{name} {year}"));
                years.set(year - 3);
            });

            let (d, v) = (inner.data.clone(), inner.view.clone());
            create_effect(move || v.set_text(slots::HOUR, format!("{:02}", d.read(HOUR).unwrap_or_default())));

            let (d, v) = (inner.data.clone(), inner.view.clone());
            create_effect(move || v.set_text(slots::MINUTE, format!("{:02}", d.read(MINUTE).unwrap_or_default())));

            let (d, v) = (inner.data.clone(), inner.view.clone());
            create_effect(move || v.set_text(slots::ACTIVE_MONTH, d.read(ACTIVE_MONTH).unwrap_or(1).to_string()));

            let (d, v, years, window) = (
                inner.data.clone(),
                inner.view.clone(),
                inner.year_start.clone(),
                inner.year_window,
            );
            create_effect(move || {
                let start = years.get();
                v.set_items(slots::YEARS, (0..window).map(|offset| (start + offset as i32).to_string()).collect());
                v.set_text(slots::ACTIVE_YEAR, d.read(ACTIVE_YEAR).unwrap_or_default().to_string());
            });
        });
    }

    pub fn data(&self) -> &ReactiveObject {
        &self.0.data
    }

    pub fn view(&self) -> &View {
        &self.0.view
    }

    pub fn kind(&self) -> DateKind {
        self.0.kind.get()
    }

    pub fn is_open(&self) -> bool {
        self.0.view.flag(slots::OPEN)
    }

    /// Years currently offered by the month/year picker.
    pub fn years(&self) -> Vec<i32> {
        let start = self.0.year_start.get_untracked();
        (0..self.0.year_window).map(|offset| start + offset as i32).collect()
    }

    /// The field the calendar is bound to, if it still exists.
    pub fn target(&self) -> Option<FieldNode> {
        let (node, id) = self.0.target.borrow().clone()?;
        get_field(node).filter(|field| field.id() == id)
    }

    /// Selected moment. Untracked.
    pub fn internal_date(&self) -> Option<NaiveDateTime> {
        let d = &self.0.data;
        let read = |key: Key<i64>| d.read_untracked(key).ok();
        let date = clamp_date(read(YEAR)? as i32, read(MONTH)? as u32, read(DAY)? as u32)?;
        date.and_hms_opt(read(HOUR)? as u32, read(MINUTE)? as u32, 0)
    }

    /// The current month grid. Untracked.
    pub fn cells(&self) -> Vec<CalendarCell> {
        let d = &self.0.data;
        month_grid(
            d.read_untracked(YEAR).unwrap_or_default() as i32,
            d.read_untracked(MONTH).unwrap_or(1) as u32,
            d.read_untracked(DAY).unwrap_or(1) as u32,
        )
    }

    // =========================================================================
    // Open / close
    // =========================================================================

    /// Bind to `field` and show `date`.
    pub fn open(&self, field: &FieldNode, date: NaiveDateTime, kind: DateKind) {
        if let Some(previous) = self.target()
            && previous.node_id() != field.node_id()
        {
            datetime::return_focus(&previous);
        }
        *self.0.target.borrow_mut() = Some((field.node_id(), field.id()));
        self.0.kind.set(kind);

        let v = &self.0.view;
        v.set_flag(slots::DATE_PANEL, kind.has_date());
        v.set_flag(slots::TIME_PANEL, kind.has_time());
        v.set_text(slots::TODAY_LABEL, if kind == DateKind::Time { "Now" } else { "Today" });
        v.set_flag(slots::OPEN, true);
        self.set_date(date);
        debug!(field = %field.node_id(), ?kind, "calendar opened");
    }

    /// Hide without committing anything.
    pub fn close(&self) {
        let Some((node, _)) = self.0.target.borrow_mut().take() else {
            return;
        };
        self.0.view.set_flag(slots::OPEN, false);
        self.0.view.set_flag(slots::MONTH_YEAR_PANEL, false);
        if let Some(field) = get_field(node) {
            datetime::return_focus(&field);
        }
        debug!(field = %node, "calendar closed");
    }

    /// Show `date` everywhere in the calendar.
    pub fn set_date(&self, date: NaiveDateTime) {
        let d = &self.0.data;
        d.write(YEAR, i64::from(date.year()));
        d.write(MONTH, i64::from(date.month()));
        d.write(DAY, i64::from(date.day()));
        d.write(HOUR, i64::from(date.hour()));
        d.write(MINUTE, i64::from(date.minute()));
        d.write(ACTIVE_YEAR, i64::from(date.year()));
        d.write(ACTIVE_MONTH, i64::from(date.month()));
        self.0.view.set_flag(slots::MONTH_YEAR_PANEL, false);
    }

    /// Write `date` (or nothing, to clear) into the bound field and close.
    fn commit(&self, date: Option<NaiveDateTime>) {
        self.set_date(date.unwrap_or_else(|| Local::now().naive_local()));
        match self.target() {
            Some(field) => datetime::set_date(&field, date),
            None => warn!("calendar committed with no field bound"),
        }
        self.close();
    }

    // =========================================================================
    // Footer
    // =========================================================================

    pub fn clear(&self) {
        self.commit(None);
    }

    pub fn today(&self) {
        self.commit(Some(Local::now().naive_local()));
    }

    pub fn accept(&self) {
        let date = self.internal_date();
        self.commit(date);
    }

    // =========================================================================
    // Month grid
    // =========================================================================

    fn shift_months(&self, months: i32) {
        let Some(date) = self.internal_date() else { return };
        let shifted = if months < 0 {
            date.checked_sub_months(Months::new(months.unsigned_abs()))
        } else {
            date.checked_add_months(Months::new(months as u32))
        };
        if let Some(shifted) = shifted {
            self.set_date(shifted);
        }
    }

    pub fn next_month(&self) {
        self.shift_months(1);
    }

    pub fn prev_month(&self) {
        self.shift_months(-1);
    }

    /// One month per wheel tick; horizontal scrolling is ignored.
    pub fn wheel(&self, event: &WheelEvent) {
        if event.delta_y < 0.0 {
            self.prev_month();
        } else if event.delta_y > 0.0 {
            self.next_month();
        }
    }

    /// Pick the day in grid cell `index` and commit it.
    pub fn select_cell(&self, index: usize) {
        let Some(cell) = self.cells().get(index).copied() else { return };
        let d = &self.0.data;
        d.write(YEAR, i64::from(cell.date.year()));
        d.write(MONTH, i64::from(cell.date.month()));
        d.write(DAY, i64::from(cell.date.day()));
        let date = self.internal_date();
        self.commit(date);
    }

    /// Grid keyboard: arrows move by a day or a week, Enter/Tab accept,
    /// Escape closes.
    pub fn key_down(&self, event: &KeyboardEvent) {
        if event.is("Enter") || event.is("Tab") {
            self.accept();
            return;
        }
        if event.is("Escape") {
            self.close();
            return;
        }
        let Some(arrow) = event.arrow() else { return };
        let Some(date) = self.internal_date() else { return };
        let moved = match arrow {
            Arrow::Up => date.checked_sub_days(Days::new(7)),
            Arrow::Down => date.checked_add_days(Days::new(7)),
            Arrow::Left => date.checked_sub_days(Days::new(1)),
            Arrow::Right => date.checked_add_days(Days::new(1)),
        };
        if let Some(moved) = moved {
            self.set_date(moved);
        }
    }

    // =========================================================================
    // Time
    // =========================================================================

    fn step(&self, key: Key<i64>, delta: i64, modulus: i64) {
        let current = self.0.data.read_untracked(key).unwrap_or_default();
        self.0.data.write(key, (current + delta).rem_euclid(modulus));
    }

    /// Move the hour by `delta`, wrapping 23 ↔ 0.
    pub fn step_hour(&self, delta: i64) {
        self.step(HOUR, delta, 24);
    }

    /// Move the minute by `delta`, wrapping 59 ↔ 0.
    pub fn step_minute(&self, delta: i64) {
        self.step(MINUTE, delta, 60);
    }

    pub fn hour_key_down(&self, event: &KeyboardEvent) {
        match event.arrow() {
            Some(Arrow::Up) => self.step_hour(1),
            Some(Arrow::Down) => self.step_hour(-1),
            _ => {}
        }
    }

    /// Tab in the minute input accepts the whole date.
    pub fn minute_key_down(&self, event: &KeyboardEvent) {
        if event.is("Tab") {
            self.accept();
            return;
        }
        match event.arrow() {
            Some(Arrow::Up) => self.step_minute(1),
            Some(Arrow::Down) => self.step_minute(-1),
            _ => {}
        }
    }

    /// Text typed into the hour input. Returns whether the hour was taken
    /// (the host then moves focus to the minute input).
    pub fn type_hour(&self, text: &str, committed: bool) -> bool {
        self.type_time_part(HOUR, slots::HOUR, text, committed, 23)
    }

    /// Text typed into the minute input. Returns whether the minute was taken.
    pub fn type_minute(&self, text: &str, committed: bool) -> bool {
        self.type_time_part(MINUTE, slots::MINUTE, text, committed, 59)
    }

    /// A single digit above the tens limit of `max` is already complete.
    fn type_time_part(&self, key: Key<i64>, slot: &str, text: &str, committed: bool, max: i64) -> bool {
        let parsed = text
            .chars()
            .all(|c| c.is_ascii_digit())
            .then(|| text.parse::<i64>().ok())
            .flatten()
            .filter(|value| *value <= max);
        let Some(value) = parsed else {
            let kept: String = text.chars().take(1).filter(char::is_ascii_digit).collect();
            self.0.view.set_text(slot, kept);
            return false;
        };
        if committed || text.len() >= 2 || value > max / 10 {
            self.0.data.write(key, value);
            return true;
        }
        false
    }

    // =========================================================================
    // Month / year picker
    // =========================================================================

    pub fn open_month_year(&self) {
        self.0.view.set_flag(slots::MONTH_YEAR_PANEL, true);
    }

    pub fn close_month_year(&self) {
        self.0.view.set_flag(slots::MONTH_YEAR_PANEL, false);
    }

    /// Highlight `month` (1-12) in the picker.
    pub fn choose_month(&self, month: u32) {
        if (1..=12).contains(&month) {
            self.0.data.write(ACTIVE_MONTH, i64::from(month));
        }
    }

    pub fn choose_year(&self, year: i32) {
        self.0.data.write(ACTIVE_YEAR, i64::from(year));
    }

    /// Shift the offered years by `delta` without touching the selection.
    pub fn page_years(&self, delta: i32) {
        untrack(|| self.0.year_start.update(|start| *start += delta));
    }

    /// Jump the grid to the picked month and year.
    pub fn apply_month_year(&self) {
        let d = &self.0.data;
        let read = |key: Key<i64>| d.read_untracked(key).unwrap_or_default();
        let date = clamp_date(read(ACTIVE_YEAR) as i32, read(ACTIVE_MONTH) as u32, read(DAY) as u32)
            .and_then(|date| date.and_hms_opt(read(HOUR) as u32, read(MINUTE) as u32, 0));
        match date {
            Some(date) => self.set_date(date),
            None => self.close_month_year(),
        }
    }

    fn dispose(&self) {
        if let Some(cleanup) = self.0.listener.borrow_mut().take() {
            cleanup();
        }
        self.0.scope.stop();
    }
}

impl std::fmt::Debug for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calendar")
            .field("kind", &self.kind())
            .field("open", &self.is_open())
            .field("data", &self.0.data.snapshot())
            .finish()
    }
}

// =============================================================================
// Singleton
// =============================================================================

thread_local! {
    static CALENDAR: RefCell<Option<Calendar>> = const { RefCell::new(None) };
}

/// Install the designer's calendar, replacing any previous one.
pub fn install_calendar(config: &DesignerConfig) -> Calendar {
    uninstall_calendar();
    let calendar = Calendar::new(config);
    CALENDAR.with(|slot| *slot.borrow_mut() = Some(calendar.clone()));
    debug!(state = %calendar.data().snapshot(), "calendar installed");
    calendar
}

pub fn calendar() -> Option<Calendar> {
    CALENDAR.with(|slot| slot.borrow().clone())
}

pub fn uninstall_calendar() {
    if let Some(calendar) = CALENDAR.with(|slot| slot.borrow_mut().take()) {
        calendar.dispose();
    }
}
