// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Validation of loosely-typed API records into the strict model types.
//!
//! Every record is checked on its own: one malformed entry is dropped and
//! reported without discarding the rest of the response. Date-time strings are
//! truncated to the calendar date they were written with; no timezone
//! conversion happens here or anywhere downstream.

use fleetdesk_app::{
    Brand, BrandId, FleetError, MaintenanceStatus, MaintenanceWindow, MaintenanceWindowId,
    NewMaintenanceWindow, Vehicle, VehicleId, VehicleStatus,
};
use serde_json::{Map, Value, json};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

const ID_KEYS: [&str; 2] = ["id", "_id"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested<T> {
    pub records: Vec<T>,
    pub rejected: Vec<FleetError>,
}

impl<T> Default for Ingested<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Ingested<T> {
    fn collect<F>(resource: &'static str, values: Vec<Value>, convert: F) -> Self
    where
        F: Fn(&Value) -> Result<T, String>,
    {
        let mut out = Self::default();
        for (index, value) in values.iter().enumerate() {
            match convert(value) {
                Ok(record) => out.records.push(record),
                Err(reason) => {
                    tracing::warn!(resource, index, %reason, "dropping malformed record");
                    out.rejected.push(FleetError::MalformedRecord {
                        resource,
                        index,
                        reason,
                    });
                }
            }
        }
        out
    }
}

/// Accepts a bare JSON array or an object wrapping one under `data` or the
/// resource name.
pub fn record_list(body: Value, resource: &str) -> Result<Vec<Value>, String> {
    match body {
        Value::Array(values) => Ok(values),
        Value::Object(mut map) => {
            for key in ["data", resource] {
                if let Some(Value::Array(values)) = map.remove(key) {
                    return Ok(values);
                }
            }
            Err(format!("expected a JSON array of {resource}"))
        }
        _ => Err(format!("expected a JSON array of {resource}")),
    }
}

/// Unwraps `{"data": {...}}` envelopes around a single record.
pub fn single_record(body: Value) -> Value {
    match body {
        Value::Object(mut map) if matches!(map.get("data"), Some(Value::Object(_))) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

pub fn vehicles(values: Vec<Value>) -> Ingested<Vehicle> {
    Ingested::collect("vehicle", values, vehicle)
}

pub fn brands(values: Vec<Value>) -> Ingested<Brand> {
    Ingested::collect("brand", values, brand)
}

pub fn maintenance_windows(values: Vec<Value>) -> Ingested<MaintenanceWindow> {
    Ingested::collect("maintenance window", values, maintenance_window)
}

pub fn vehicle(value: &Value) -> Result<Vehicle, String> {
    let record = Record::new(value)?;
    let status_raw = record.required_text(&["status"])?;
    let status = VehicleStatus::parse(&status_raw)
        .ok_or_else(|| format!("unknown vehicle status {status_raw:?}"))?;

    Ok(Vehicle {
        id: VehicleId::new(record.required_id(&ID_KEYS)?),
        name: record.required_text(&["name"])?,
        brand_id: BrandId::new(record.required_id(&["brandId", "brand_id", "brand"])?),
        status,
        year: record.optional_int(&["year"]).and_then(|year| i32::try_from(year).ok()),
        capacity: record
            .optional_int(&["capacity", "seats"])
            .and_then(|capacity| u32::try_from(capacity).ok()),
        class: record.optional_text(&["class", "category"]),
        daily_price_cents: record.optional_cents(&["dailyPrice", "daily_price", "price"]),
    })
}

pub fn brand(value: &Value) -> Result<Brand, String> {
    let record = Record::new(value)?;
    Ok(Brand {
        id: BrandId::new(record.required_id(&ID_KEYS)?),
        name: record.required_text(&["name"])?,
        logo: record.optional_text(&["logo", "logoUrl", "image"]),
    })
}

pub fn maintenance_window(value: &Value) -> Result<MaintenanceWindow, String> {
    let record = Record::new(value)?;
    let start = record.required_date(&["startDate", "start_date", "start"])?;
    let end = record.required_date(&["returnDate", "endDate", "return_date", "end_date", "end"])?;
    if start > end {
        return Err(format!("start date {start} is after end date {end}"));
    }
    let status_raw = record.required_text(&["status"])?;
    let status = MaintenanceStatus::parse(&status_raw)
        .ok_or_else(|| format!("unknown maintenance status {status_raw:?}"))?;

    Ok(MaintenanceWindow {
        id: MaintenanceWindowId::new(record.required_id(&ID_KEYS)?),
        vehicle_id: VehicleId::new(record.required_id(&["vehicleId", "vehicle_id", "vehicle"])?),
        start,
        end,
        status,
        description: record
            .optional_text(&["description", "notes"])
            .unwrap_or_default(),
    })
}

/// Body for `POST /maintenances`.
pub fn new_window_payload(window: &NewMaintenanceWindow) -> Value {
    json!({
        "vehicleId": window.vehicle_id.as_str(),
        "startDate": format_api_date(window.start),
        "returnDate": format_api_date(window.end),
        "status": window.status.as_str(),
        "description": window.description,
    })
}

pub fn format_api_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}T00:00:00.000Z",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parses an ISO-8601 date or date-time and keeps only the date as written.
pub fn parse_api_date(input: &str) -> Option<Date> {
    let trimmed = input.trim();
    if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(value.date());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        trimmed,
        &format_description!(
            "[year]-[month]-[day]T[hour]:[minute][optional [:[second]]][optional [.[subsecond]]]"
        ),
    ) {
        return Some(value.date());
    }
    Date::parse(trimmed, &format_description!("[year]-[month]-[day]")).ok()
}

struct Record<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    fn new(value: &'a Value) -> Result<Self, String> {
        value
            .as_object()
            .map(|fields| Self { fields })
            .ok_or_else(|| "record is not a JSON object".to_owned())
    }

    /// The first alias whose value converts; unusable values fall through to
    /// the next alias.
    fn first<T>(&self, keys: &[&str], convert: impl Fn(&'a Value) -> Option<T>) -> Option<T> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .find_map(convert)
    }

    fn required_id(&self, keys: &[&str]) -> Result<String, String> {
        self.first(keys, id_text)
            .ok_or_else(|| format!("missing {}", keys[0]))
    }

    fn required_text(&self, keys: &[&str]) -> Result<String, String> {
        self.optional_text(keys)
            .ok_or_else(|| format!("missing {}", keys[0]))
    }

    fn optional_text(&self, keys: &[&str]) -> Option<String> {
        self.first(keys, |value| {
            let text = value.as_str()?.trim();
            (!text.is_empty()).then(|| text.to_owned())
        })
    }

    fn required_date(&self, keys: &[&str]) -> Result<Date, String> {
        if let Some(date) = self.first(keys, |value| value.as_str().and_then(parse_api_date)) {
            return Ok(date);
        }
        match self.first(keys, Value::as_str) {
            Some(raw) => Err(format!("invalid {} {raw:?}", keys[0])),
            None => Err(format!("missing {}", keys[0])),
        }
    }

    fn optional_int(&self, keys: &[&str]) -> Option<i64> {
        self.first(keys, |value| match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
    }

    fn optional_cents(&self, keys: &[&str]) -> Option<i64> {
        self.first(keys, |value| {
            let amount = match value {
                Value::Number(number) => number.as_f64()?,
                Value::String(text) => text.trim().trim_start_matches('$').parse::<f64>().ok()?,
                _ => return None,
            };
            if !amount.is_finite() || amount < 0.0 {
                return None;
            }
            Some((amount * 100.0).round() as i64)
        })
    }
}

/// Ids arrive as strings, integers, or nested objects carrying `id`/`_id`.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(number) if number.is_i64() || number.is_u64() => Some(number.to_string()),
        Value::Object(fields) => ID_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find_map(id_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        brands, format_api_date, maintenance_window, new_window_payload, parse_api_date,
        record_list, single_record, vehicle, vehicles,
    };
    use fleetdesk_app::{
        BrandId, FleetError, MaintenanceStatus, NewMaintenanceWindow, VehicleId, VehicleStatus,
    };
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn parse_api_date_truncates_date_times_as_written() {
        let cases = [
            ("2024-06-10T23:30:00.000Z", date!(2024 - 06 - 10)),
            ("2024-06-10T00:30:00+05:00", date!(2024 - 06 - 10)),
            ("2024-06-10T22:00:00-07:00", date!(2024 - 06 - 10)),
            ("2024-06-10T08:15:00", date!(2024 - 06 - 10)),
            ("2024-06-10T08:15", date!(2024 - 06 - 10)),
            ("2024-06-10T08:15:00.123", date!(2024 - 06 - 10)),
            (" 2024-06-10 ", date!(2024 - 06 - 10)),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_api_date(input), Some(expected), "input {input}");
        }
    }

    #[test]
    fn parse_api_date_rejects_garbage() {
        for input in ["", "06/10/2024", "2024-13-01", "2024-02-30", "yesterday"] {
            assert_eq!(parse_api_date(input), None, "input {input}");
        }
    }

    #[test]
    fn vehicle_accepts_lenient_shapes() {
        let parsed = vehicle(&json!({
            "_id": 42,
            "name": " Civic ",
            "brand": {"_id": "b-1", "name": "Honda"},
            "status": "InMaintenance",
            "year": "2021",
            "capacity": 5,
            "class": "compact",
            "dailyPrice": 49.99
        }))
        .expect("vehicle should ingest");
        assert_eq!(parsed.id, VehicleId::new("42"));
        assert_eq!(parsed.name, "Civic");
        assert_eq!(parsed.brand_id.as_str(), "b-1");
        assert_eq!(parsed.status, VehicleStatus::InMaintenance);
        assert_eq!(parsed.year, Some(2021));
        assert_eq!(parsed.capacity, Some(5));
        assert_eq!(parsed.class.as_deref(), Some("compact"));
        assert_eq!(parsed.daily_price_cents, Some(4_999));
    }

    #[test]
    fn vehicle_requires_identity_brand_and_status() {
        let missing_id = vehicle(&json!({"name": "Civic", "brandId": "b", "status": "available"}));
        assert!(missing_id.is_err_and(|reason| reason.contains("missing id")));

        let bad_status = vehicle(&json!({"id": "v", "name": "Civic", "brandId": "b", "status": "sold"}));
        assert!(bad_status.is_err_and(|reason| reason.contains("unknown vehicle status")));

        let no_brand = vehicle(&json!({"id": "v", "name": "Civic", "status": "available"}));
        assert!(no_brand.is_err_and(|reason| reason.contains("missing brandId")));
    }

    #[test]
    fn unusable_alias_falls_through_to_the_next_one() {
        let parsed = vehicle(&json!({
            "id": "v-1",
            "name": "Civic",
            "brandId": "",
            "brand": {"_id": "b-7"},
            "status": "available"
        }))
        .expect("nested brand should be used");
        assert_eq!(parsed.brand_id, BrandId::new("b-7"));

        let window = maintenance_window(&json!({
            "id": "w-1",
            "vehicleId": "v-1",
            "startDate": "soon",
            "start": "2024-06-10",
            "returnDate": "2024-06-11",
            "status": "active"
        }))
        .expect("second start alias should be used");
        assert_eq!(window.start, date!(2024 - 06 - 10));

        let invalid = maintenance_window(&json!({
            "id": "w-2",
            "vehicleId": "v-1",
            "startDate": "soon",
            "returnDate": "2024-06-11",
            "status": "active"
        }));
        assert!(invalid.is_err_and(|reason| reason.contains("invalid startDate \"soon\"")));
    }

    #[test]
    fn malformed_records_are_dropped_individually() {
        let ingested = vehicles(vec![
            json!({"id": "v-1", "name": "Civic", "brandId": "b-1", "status": "available"}),
            json!("not an object"),
            json!({"id": "v-3", "name": "", "brandId": "b-1", "status": "available"}),
            json!({"id": "v-4", "name": "Golf", "brandId": "b-2", "status": "reserved"}),
        ]);
        let ids = ingested
            .records
            .iter()
            .map(|vehicle| vehicle.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["v-1", "v-4"]);
        assert_eq!(ingested.rejected.len(), 2);
        assert!(matches!(
            ingested.rejected[0],
            FleetError::MalformedRecord { index: 1, .. }
        ));
        assert!(matches!(
            ingested.rejected[1],
            FleetError::MalformedRecord { index: 2, .. }
        ));
    }

    #[test]
    fn maintenance_window_reads_return_date_and_rejects_reversed_ranges() {
        let parsed = maintenance_window(&json!({
            "_id": "w-1",
            "vehicle": {"id": "v-1"},
            "startDate": "2024-06-10T00:00:00.000Z",
            "returnDate": "2024-06-12T00:00:00.000Z",
            "status": "Pending",
            "description": "tires"
        }))
        .expect("window should ingest");
        assert_eq!(parsed.vehicle_id, VehicleId::new("v-1"));
        assert_eq!(parsed.start, date!(2024 - 06 - 10));
        assert_eq!(parsed.end, date!(2024 - 06 - 12));
        assert_eq!(parsed.status, MaintenanceStatus::Pending);

        let reversed = maintenance_window(&json!({
            "id": "w-2",
            "vehicleId": "v-1",
            "startDate": "2024-06-12",
            "returnDate": "2024-06-10",
            "status": "active"
        }));
        assert!(reversed.is_err_and(|reason| reason.contains("after end date")));

        let single_day = maintenance_window(&json!({
            "id": "w-3",
            "vehicleId": "v-1",
            "startDate": "2024-06-12",
            "endDate": "2024-06-12",
            "status": "completed"
        }))
        .expect("single-day window is valid");
        assert!(single_day.is_single_day());
    }

    #[test]
    fn brands_ingest_optional_logo() {
        let ingested = brands(vec![
            json!({"id": "b-1", "name": "Honda", "logo": "https://cdn/honda.png"}),
            json!({"id": "b-2", "name": "Toyota"}),
            json!({"name": "Nameless"}),
        ]);
        assert_eq!(ingested.records.len(), 2);
        assert_eq!(ingested.records[0].logo.as_deref(), Some("https://cdn/honda.png"));
        assert_eq!(ingested.records[1].logo, None);
        assert_eq!(ingested.rejected.len(), 1);
    }

    #[test]
    fn record_list_unwraps_envelopes() {
        assert_eq!(record_list(json!([1, 2]), "vehicles"), Ok(vec![json!(1), json!(2)]));
        assert_eq!(record_list(json!({"data": [1]}), "vehicles"), Ok(vec![json!(1)]));
        assert_eq!(record_list(json!({"vehicles": [1]}), "vehicles"), Ok(vec![json!(1)]));
        assert!(record_list(json!({"message": "nope"}), "vehicles").is_err());
        assert_eq!(single_record(json!({"data": {"id": 1}})), json!({"id": 1}));
        assert_eq!(single_record(json!({"id": 1})), json!({"id": 1}));
    }

    #[test]
    fn new_window_payload_uses_wire_names() {
        let payload = new_window_payload(&NewMaintenanceWindow {
            vehicle_id: VehicleId::new("v-1"),
            start: date!(2024 - 06 - 10),
            end: date!(2024 - 06 - 11),
            status: MaintenanceStatus::Pending,
            description: "oil".to_owned(),
        });
        assert_eq!(
            payload,
            json!({
                "vehicleId": "v-1",
                "startDate": "2024-06-10T00:00:00.000Z",
                "returnDate": "2024-06-11T00:00:00.000Z",
                "status": "pending",
                "description": "oil"
            })
        );
        assert_eq!(format_api_date(date!(2024 - 01 - 02)), "2024-01-02T00:00:00.000Z");
    }
}
