// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;

use crate::ids::*;

/// Lower-cases and strips `_`, `-` and spaces so `InMaintenance`,
/// `in_maintenance` and `in maintenance` compare equal.
fn normalize_token(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    Available,
    Reserved,
    InMaintenance,
}

impl VehicleStatus {
    pub const ALL: [Self; 3] = [Self::Available, Self::Reserved, Self::InMaintenance];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::InMaintenance => "in_maintenance",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::InMaintenance => "in maintenance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize_token(value).as_str() {
            "available" => Some(Self::Available),
            "reserved" => Some(Self::Reserved),
            "inmaintenance" | "maintenance" => Some(Self::InMaintenance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    Active,
    Pending,
    Completed,
}

impl MaintenanceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize_token(value).as_str() {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    ViewFleet,
    ManageVehicles,
    ManageBrands,
    ScheduleMaintenance,
    ManageReservations,
    ManagePersonnel,
}

impl Capability {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ViewFleet => "view fleet",
            Self::ManageVehicles => "manage vehicles",
            Self::ManageBrands => "manage brands",
            Self::ScheduleMaintenance => "schedule maintenance",
            Self::ManageReservations => "manage reservations",
            Self::ManagePersonnel => "manage personnel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Staff,
    Customer,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Customer => "customer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize_token(value).as_str() {
            "admin" => Some(Self::Admin),
            "staff" => Some(Self::Staff),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }

    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Admin => &[
                Capability::ViewFleet,
                Capability::ManageVehicles,
                Capability::ManageBrands,
                Capability::ScheduleMaintenance,
                Capability::ManageReservations,
                Capability::ManagePersonnel,
            ],
            Self::Staff => &[
                Capability::ViewFleet,
                Capability::ManageVehicles,
                Capability::ScheduleMaintenance,
                Capability::ManageReservations,
            ],
            Self::Customer => &[Capability::ViewFleet, Capability::ManageReservations],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub brand_id: BrandId,
    pub status: VehicleStatus,
    pub year: Option<i32>,
    pub capacity: Option<u32>,
    pub class: Option<String>,
    pub daily_price_cents: Option<i64>,
}

/// A closed interval of days during which a vehicle is out for servicing.
///
/// Both bounds are inclusive and `start <= end` holds for every value built
/// through ingestion; a window with `start == end` covers a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub id: MaintenanceWindowId,
    pub vehicle_id: VehicleId,
    pub start: Date,
    pub end: Date,
    pub status: MaintenanceStatus,
    pub description: String,
}

impl MaintenanceWindow {
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn day_count(&self) -> i64 {
        (self.end - self.start).whole_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaintenanceWindow {
    pub vehicle_id: VehicleId,
    pub start: Date,
    pub end: Date,
    pub status: MaintenanceStatus,
    pub description: String,
}
