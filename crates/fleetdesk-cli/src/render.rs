// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fleetdesk_app::{Annotation, DayCell, FleetScreen, MaintenanceWindow, MonthRef, WeekStart};

const CELL_WIDTH: usize = 4;
const GRID_WIDTH: usize = CELL_WIDTH * 7;

pub const LEGEND: &str = "[ = ] selection   * single-day selection   < ~ > maintenance   # single-day maintenance";

fn marker(annotation: Annotation) -> char {
    match annotation {
        Annotation::None => ' ',
        Annotation::SelectionSingle => '*',
        Annotation::SelectionStart => '[',
        Annotation::SelectionMiddle => '=',
        Annotation::SelectionEnd => ']',
        Annotation::MaintenanceSingle => '#',
        Annotation::MaintenanceStart => '<',
        Annotation::MaintenanceMiddle => '~',
        Annotation::MaintenanceEnd => '>',
    }
}

fn cell_text(cell: &DayCell) -> String {
    match cell.day {
        Some(day) => format!("{day:>2}{} ", marker(cell.annotation)),
        None => " ".repeat(CELL_WIDTH),
    }
}

/// Seven columns per row; each day carries a one-character annotation marker.
pub fn render_month(month: MonthRef, week_start: WeekStart, cells: &[DayCell]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:^width$}", month.label(), width = GRID_WIDTH).trim_end());
    out.push('\n');

    let header = week_start
        .header()
        .iter()
        .map(|name| format!("{name:>2}  "))
        .collect::<String>();
    out.push_str(header.trim_end());
    out.push('\n');

    for week in cells.chunks(7) {
        let row = week.iter().map(cell_text).collect::<String>();
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

pub fn render_windows(windows: &[MaintenanceWindow]) -> String {
    if windows.is_empty() {
        return "(no maintenance scheduled)\n".to_owned();
    }

    let mut ordered = windows.iter().collect::<Vec<_>>();
    ordered.sort_by(|left, right| left.start.cmp(&right.start).then(left.id.cmp(&right.id)));

    let rows = ordered
        .iter()
        .map(|window| {
            vec![
                window.id.to_string(),
                format!("{} .. {}", window.start, window.end),
                window.status.as_str().to_owned(),
                window.description.clone(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&["ID", "DATES", "STATUS", "NOTE"], &rows)
}

/// The filtered roster with brand ids resolved to names where known.
pub fn render_vehicles(screen: &FleetScreen) -> String {
    let visible = screen.visible_vehicles();
    if visible.is_empty() {
        return "(no vehicles match)\n".to_owned();
    }

    let rows = visible
        .iter()
        .map(|vehicle| {
            vec![
                vehicle.id.to_string(),
                vehicle.name.clone(),
                screen
                    .brand_name(&vehicle.brand_id)
                    .map_or_else(|| vehicle.brand_id.to_string(), str::to_owned),
                vehicle.status.label().to_owned(),
                optional(vehicle.year),
                optional(vehicle.capacity),
                vehicle.class.clone().unwrap_or_else(|| "-".to_owned()),
                vehicle
                    .daily_price_cents
                    .map_or_else(|| "-".to_owned(), format_cents),
            ]
        })
        .collect::<Vec<_>>();
    render_table(
        &["ID", "NAME", "BRAND", "STATUS", "YEAR", "SEATS", "CLASS", "DAILY"],
        &rows,
    )
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |value| value.to_string())
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

fn render_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = columns
        .iter()
        .map(|column| column.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = table_line(columns.iter().copied(), &widths);
    for row in rows {
        out.push_str(&table_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    format!("{}\n", padded.trim_end())
}
