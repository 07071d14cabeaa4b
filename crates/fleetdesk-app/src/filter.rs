// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{BrandId, Vehicle, VehicleStatus};

/// Status criterion for the roster filter. Values that fail to parse are kept
/// as `Unrecognized` and match no vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(VehicleStatus),
    Unrecognized(String),
}

impl StatusFilter {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        VehicleStatus::parse(trimmed).map_or_else(|| Self::Unrecognized(value.to_owned()), Self::Only)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.label(),
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn matches(&self, status: VehicleStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => *expected == status,
            Self::Unrecognized(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FleetFilter {
    pub brand_ids: BTreeSet<BrandId>,
    pub query: String,
    pub status: StatusFilter,
}

impl FleetFilter {
    pub fn is_empty(&self) -> bool {
        self.brand_ids.is_empty() && self.query.trim().is_empty() && self.status == StatusFilter::All
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        brand_matches(&self.brand_ids, vehicle)
            && text_matches(&self.query, vehicle)
            && self.status.matches(vehicle.status)
    }

    pub fn apply<'a>(&self, roster: &'a [Vehicle]) -> Vec<&'a Vehicle> {
        filter_fleet(roster, &self.brand_ids, &self.query, &self.status)
    }
}

fn brand_matches(brand_ids: &BTreeSet<BrandId>, vehicle: &Vehicle) -> bool {
    brand_ids.is_empty() || brand_ids.contains(&vehicle.brand_id)
}

fn text_matches(query: &str, vehicle: &Vehicle) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    vehicle.name.to_lowercase().contains(&query.to_lowercase())
}

/// Keeps the vehicles passing the brand, text and status predicates, in
/// roster order.
pub fn filter_fleet<'a>(
    roster: &'a [Vehicle],
    brand_ids: &BTreeSet<BrandId>,
    query: &str,
    status: &StatusFilter,
) -> Vec<&'a Vehicle> {
    roster
        .iter()
        .filter(|vehicle| {
            brand_matches(brand_ids, vehicle)
                && text_matches(query, vehicle)
                && status.matches(vehicle.status)
        })
        .collect()
}

pub fn toggle_brand(selected: &BTreeSet<BrandId>, brand_id: &BrandId) -> BTreeSet<BrandId> {
    let mut next = selected.clone();
    if !next.remove(brand_id) {
        next.insert(brand_id.clone());
    }
    next
}
