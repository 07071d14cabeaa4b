// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::{Date, Month};

use crate::MaintenanceWindow;

/// A displayed month. The month index is zero-based: 0 is January, 11 is
/// December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonthRef")]
pub struct MonthRef {
    year: i32,
    month: u8,
}

#[derive(Deserialize)]
struct RawMonthRef {
    year: i32,
    month: u8,
}

impl TryFrom<RawMonthRef> for MonthRef {
    type Error = String;

    fn try_from(raw: RawMonthRef) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
            .ok_or_else(|| format!("month index {} is out of range 0-11", raw.month))
    }
}

impl MonthRef {
    pub const fn new(year: i32, month: u8) -> Option<Self> {
        if month > 11 {
            return None;
        }
        Some(Self { year, month })
    }

    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()) - 1,
        }
    }

    pub const fn year(self) -> i32 {
        self.year
    }

    pub const fn month_index(self) -> u8 {
        self.month
    }

    pub fn month(self) -> Month {
        Month::January.nth_next(self.month)
    }

    pub fn days_in_month(self) -> u8 {
        match self.month {
            1 if time::util::is_leap_year(self.year) => 29,
            1 => 28,
            3 | 5 | 8 | 10 => 30,
            _ => 31,
        }
    }

    /// Columns of padding before the 1st when the week begins on `week_start`.
    pub fn first_weekday_offset(self, week_start: WeekStart) -> u8 {
        let from_sunday = weekday_from_sunday(self.year, u8::from(self.month()), 1);
        match week_start {
            WeekStart::Sunday => from_sunday,
            WeekStart::Monday => (from_sunday + 6) % 7,
        }
    }

    /// `None` only for years outside the range `time::Date` can represent.
    pub fn first_day(self) -> Option<Date> {
        self.date(1)
    }

    pub fn date(self, day: u8) -> Option<Date> {
        Date::from_calendar_date(self.year, self.month(), day).ok()
    }

    pub fn label(self) -> String {
        format!("{} {}", self.month(), self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Some(Self::Sunday),
            "monday" | "mon" => Some(Self::Monday),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "sunday",
            Self::Monday => "monday",
        }
    }

    pub const fn header(self) -> [&'static str; 7] {
        match self {
            Self::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
            Self::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
        }
    }
}

/// Day-of-week for any proleptic Gregorian date, 0 = Sunday.
fn weekday_from_sunday(year: i32, month: u8, day: u8) -> u8 {
    const OFFSETS: [i64; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let month = usize::from(month.clamp(1, 12));
    let year = i64::from(year) - i64::from(month < 3);
    let raw = year + year.div_euclid(4) - year.div_euclid(100)
        + year.div_euclid(400)
        + OFFSETS[month - 1]
        + i64::from(day);
    raw.rem_euclid(7) as u8
}

/// Shifts `current` by `direction` whole months. Saturates at January of
/// `i32::MIN` and December of `i32::MAX`.
pub fn navigate_month(current: MonthRef, direction: i32) -> MonthRef {
    let total = i64::from(current.month) + i64::from(direction);
    let year = i64::from(current.year) + total.div_euclid(12);
    match i32::try_from(year) {
        Ok(year) => MonthRef {
            year,
            month: total.rem_euclid(12) as u8,
        },
        Err(_) if year > 0 => MonthRef {
            year: i32::MAX,
            month: 11,
        },
        Err(_) => MonthRef {
            year: i32::MIN,
            month: 0,
        },
    }
}

/// A draft date interval. Only a range with both bounds set covers any day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl SelectionRange {
    pub const fn new(start: Option<Date>, end: Option<Date>) -> Self {
        Self { start, end }
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn contains(&self, date: Date) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Annotation {
    None,
    SelectionSingle,
    SelectionStart,
    SelectionMiddle,
    SelectionEnd,
    MaintenanceSingle,
    MaintenanceStart,
    MaintenanceMiddle,
    MaintenanceEnd,
}

impl Annotation {
    pub const fn class(self) -> &'static str {
        match self {
            Self::None => "",
            Self::SelectionSingle => "selection-single",
            Self::SelectionStart => "selection-start",
            Self::SelectionMiddle => "selection-middle",
            Self::SelectionEnd => "selection-end",
            Self::MaintenanceSingle => "maintenance-single",
            Self::MaintenanceStart => "maintenance-start",
            Self::MaintenanceMiddle => "maintenance-middle",
            Self::MaintenanceEnd => "maintenance-end",
        }
    }

    pub const fn is_selection(self) -> bool {
        matches!(
            self,
            Self::SelectionSingle | Self::SelectionStart | Self::SelectionMiddle | Self::SelectionEnd
        )
    }

    pub const fn is_maintenance(self) -> bool {
        matches!(
            self,
            Self::MaintenanceSingle
                | Self::MaintenanceStart
                | Self::MaintenanceMiddle
                | Self::MaintenanceEnd
        )
    }

    fn selection(edge: Edge) -> Self {
        match edge {
            Edge::Single => Self::SelectionSingle,
            Edge::Start => Self::SelectionStart,
            Edge::Middle => Self::SelectionMiddle,
            Edge::End => Self::SelectionEnd,
        }
    }

    fn maintenance(edge: Edge) -> Self {
        match edge {
            Edge::Single => Self::MaintenanceSingle,
            Edge::Start => Self::MaintenanceStart,
            Edge::Middle => Self::MaintenanceMiddle,
            Edge::End => Self::MaintenanceEnd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Single,
    Start,
    Middle,
    End,
}

fn edge_of(date: Date, start: Date, end: Date) -> Edge {
    match (date == start, date == end) {
        (true, true) => Edge::Single,
        (true, false) => Edge::Start,
        (false, true) => Edge::End,
        (false, false) => Edge::Middle,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub day: Option<u8>,
    pub date: Option<Date>,
    pub annotation: Annotation,
}

impl DayCell {
    pub const fn padding() -> Self {
        Self {
            day: None,
            date: None,
            annotation: Annotation::None,
        }
    }

    pub const fn is_padding(&self) -> bool {
        self.day.is_none()
    }
}

/// Overlapping windows resolve to the earliest start, then the earliest end,
/// then the smallest id.
fn tie_break(left: &MaintenanceWindow, right: &MaintenanceWindow) -> Ordering {
    left.start
        .cmp(&right.start)
        .then(left.end.cmp(&right.end))
        .then_with(|| left.id.cmp(&right.id))
}

pub fn build_month(
    month: MonthRef,
    selection: Option<&SelectionRange>,
    windows: &[MaintenanceWindow],
) -> Vec<DayCell> {
    build_month_starting(month, selection, windows, WeekStart::Sunday)
}

pub fn build_month_starting(
    month: MonthRef,
    selection: Option<&SelectionRange>,
    windows: &[MaintenanceWindow],
    week_start: WeekStart,
) -> Vec<DayCell> {
    let offset = usize::from(month.first_weekday_offset(week_start));
    let days = month.days_in_month();

    let mut ordered = windows.iter().collect::<Vec<_>>();
    ordered.sort_by(|left, right| tie_break(left, right));

    let mut cells = Vec::with_capacity(offset + usize::from(days));
    cells.extend(std::iter::repeat_n(DayCell::padding(), offset));
    for day in 1..=days {
        let date = month.date(day);
        let annotation = date.map_or(Annotation::None, |date| {
            annotate(date, selection, &ordered)
        });
        cells.push(DayCell {
            day: Some(day),
            date,
            annotation,
        });
    }
    cells
}

fn annotate(
    date: Date,
    selection: Option<&SelectionRange>,
    ordered: &[&MaintenanceWindow],
) -> Annotation {
    if let Some(range) = selection
        && let (Some(start), Some(end)) = (range.start, range.end)
        && range.contains(date)
    {
        return Annotation::selection(edge_of(date, start, end));
    }

    ordered
        .iter()
        .find(|window| window.contains(date))
        .map_or(Annotation::None, |window| {
            Annotation::maintenance(edge_of(date, window.start, window.end))
        })
}
