// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fleetdesk_app::{
    Brand, BrandId, MaintenanceStatus, MaintenanceWindow, MaintenanceWindowId, Vehicle, VehicleId,
    VehicleStatus,
};
use serde_json::{Value, json};
use std::io::Read;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;
use time::{Date, Duration, Month};
use tiny_http::{Header, Response, Server};

const BRAND_NAMES: [&str; 10] = [
    "Toyota",
    "Honda",
    "Ford",
    "Volkswagen",
    "Hyundai",
    "Kia",
    "Subaru",
    "Mazda",
    "Nissan",
    "Volvo",
];

const MODEL_NAMES: [&str; 16] = [
    "Corolla", "Civic", "Focus", "Golf", "Elantra", "Rio", "Outback", "CX-5", "Leaf", "XC40",
    "Camry", "Accord", "Transit", "Tiguan", "Sportage", "Forester",
];

const TRIMS: [&str; 6] = ["", " Sport", " Hybrid", " Touring", " LX", " Limited"];
const CLASSES: [&str; 5] = ["compact", "sedan", "suv", "van", "wagon"];
const CAPACITIES: [u32; 5] = [2, 4, 5, 7, 8];

const WORK_ITEMS: [&str; 12] = [
    "oil change",
    "tire rotation",
    "brake pads",
    "battery swap",
    "windshield repair",
    "inspection",
    "alignment",
    "detailing",
    "recall service",
    "coolant flush",
    "wiper blades",
    "transmission check",
];

const REFERENCE_YEAR: i32 = 2024;
const MOCK_RECV_TIMEOUT: StdDuration = StdDuration::from_secs(5);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for fleet fixtures. Identical seeds yield identical
/// rosters, so tests can assert on exact output.
#[derive(Debug, Clone)]
pub struct FleetFaker {
    rng: DeterministicRng,
    seed: u64,
    next_id: u64,
}

impl FleetFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
            next_id: 1,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn brand(&mut self) -> Brand {
        let name = self.pick(&BRAND_NAMES);
        let id = self.id("b");
        Brand {
            logo: Some(format!("https://cdn.fleet.test/logos/{}.png", name.to_lowercase())),
            id: BrandId::new(id),
            name: name.to_owned(),
        }
    }

    pub fn vehicle(&mut self, brand: &Brand) -> Vehicle {
        let name = format!("{}{}", self.pick(&MODEL_NAMES), self.pick(&TRIMS));
        let status = VehicleStatus::ALL[self.rng.int_n(VehicleStatus::ALL.len())];
        Vehicle {
            id: VehicleId::new(self.id("v")),
            name,
            brand_id: brand.id.clone(),
            status,
            year: Some(self.int_range(2015, 2025) as i32),
            capacity: Some(CAPACITIES[self.rng.int_n(CAPACITIES.len())]),
            class: Some(self.pick(&CLASSES).to_owned()),
            daily_price_cents: Some(self.int_range(3_500, 25_000)),
        }
    }

    /// `brand_count` brands and `vehicle_count` vehicles spread across them.
    pub fn roster(&mut self, brand_count: usize, vehicle_count: usize) -> (Vec<Brand>, Vec<Vehicle>) {
        let brands = (0..brand_count.max(1))
            .map(|_| self.brand())
            .collect::<Vec<_>>();
        let vehicles = (0..vehicle_count)
            .map(|_| {
                let brand = &brands[self.rng.int_n(brands.len())];
                self.vehicle(brand)
            })
            .collect();
        (brands, vehicles)
    }

    /// A window of one to seven days starting somewhere in the reference year.
    pub fn maintenance_window(&mut self, vehicle_id: &VehicleId) -> MaintenanceWindow {
        let start = self.date_in_year(REFERENCE_YEAR);
        let end = start
            .checked_add(Duration::days(self.int_range(0, 6)))
            .unwrap_or(start);
        let status = [
            MaintenanceStatus::Active,
            MaintenanceStatus::Pending,
            MaintenanceStatus::Completed,
        ][self.rng.int_n(3)];
        MaintenanceWindow {
            id: MaintenanceWindowId::new(self.id("w")),
            vehicle_id: vehicle_id.clone(),
            start,
            end,
            status,
            description: self.pick(&WORK_ITEMS).to_owned(),
        }
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let first = Date::from_calendar_date(year, Month::January, 1).unwrap_or(Date::MIN);
        let days = if time::util::is_leap_year(year) { 366 } else { 365 };
        first
            .checked_add(Duration::days(self.int_range(0, days - 1)))
            .unwrap_or(first)
    }

    fn id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn brand_json(brand: &Brand) -> Value {
    json!({
        "_id": brand.id.as_str(),
        "name": brand.name,
        "logo": brand.logo,
    })
}

pub fn vehicle_json(vehicle: &Vehicle) -> Value {
    json!({
        "_id": vehicle.id.as_str(),
        "name": vehicle.name,
        "brandId": vehicle.brand_id.as_str(),
        "status": vehicle.status.as_str(),
        "year": vehicle.year,
        "capacity": vehicle.capacity,
        "class": vehicle.class,
        "dailyPrice": vehicle.daily_price_cents.map(|cents| cents as f64 / 100.0),
    })
}

pub fn window_json(window: &MaintenanceWindow) -> Value {
    json!({
        "_id": window.id.as_str(),
        "vehicleId": window.vehicle_id.as_str(),
        "startDate": format!("{}T00:00:00.000Z", window.start),
        "returnDate": format!("{}T00:00:00.000Z", window.end),
        "status": window.status.as_str(),
        "description": window.description,
    })
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

/// A base URL nothing listens on.
pub fn unreachable_base_url() -> &'static str {
    "http://127.0.0.1:1/api"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn ok(body: &Value) -> Self {
        Self::json(200, body)
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Result<Value> {
        serde_json::from_str(&self.body).context("decode recorded request body")
    }
}

/// A `tiny_http` server that answers requests with the queued responses in
/// order and records what it received. The base URL ends in `/api`.
pub struct MockApi {
    base_url: String,
    handle: JoinHandle<Result<Vec<RecordedRequest>>>,
}

impl MockApi {
    pub fn start(responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}/api", server.server_addr());

        let handle = thread::spawn(move || -> Result<Vec<RecordedRequest>> {
            let expected = responses.len();
            let mut recorded = Vec::with_capacity(expected);
            for queued in responses {
                let Some(mut request) = server
                    .recv_timeout(MOCK_RECV_TIMEOUT)
                    .context("receive mock request")?
                else {
                    bail!(
                        "mock server expected {expected} requests, got {}",
                        recorded.len()
                    );
                };

                let mut body = String::new();
                request
                    .as_reader()
                    .read_to_string(&mut body)
                    .context("read mock request body")?;
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    body,
                });

                let header = Header::from_bytes("Content-Type", "application/json")
                    .map_err(|()| anyhow!("build content type header"))?;
                let response = Response::from_string(queued.body)
                    .with_status_code(queued.status)
                    .with_header(header);
                request.respond(response).context("send mock response")?;
            }
            Ok(recorded)
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for every queued response to be served and returns the requests.
    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))?
    }
}
