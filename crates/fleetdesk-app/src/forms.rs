// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::{Date, Duration};

use crate::{
    FleetError, FleetResult, MaintenanceStatus, NewMaintenanceWindow, SelectionRange, VehicleId,
};

/// The maintenance window being composed. Dates are only changed through
/// `set_start`/`set_end`, which keep `start < end` once both are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceWindowDraft {
    pub vehicle_id: Option<VehicleId>,
    start: Option<Date>,
    end: Option<Date>,
    pub status: MaintenanceStatus,
    pub description: String,
}

impl Default for MaintenanceWindowDraft {
    fn default() -> Self {
        Self {
            vehicle_id: None,
            start: None,
            end: None,
            status: MaintenanceStatus::Pending,
            description: String::new(),
        }
    }
}

impl MaintenanceWindowDraft {
    pub fn for_vehicle(vehicle_id: VehicleId) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            ..Self::default()
        }
    }

    pub fn start(&self) -> Option<Date> {
        self.start
    }

    pub fn end(&self) -> Option<Date> {
        self.end
    }

    /// Always accepted. Pushes the end to the following day when it is
    /// missing or no longer strictly after the new start.
    pub fn set_start(&mut self, start: Date) {
        self.start = Some(start);
        let end_is_after = self.end.is_some_and(|end| end > start);
        if !end_is_after {
            self.end = start.checked_add(Duration::DAY);
        }
    }

    pub fn set_end(&mut self, end: Date) -> FleetResult<()> {
        match self.start {
            Some(start) if end > start => {
                self.end = Some(end);
                Ok(())
            }
            start => Err(FleetError::InvalidRange { start, end }),
        }
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }

    pub fn selection(&self) -> SelectionRange {
        SelectionRange::new(self.start, self.end)
    }

    pub fn validate(&self) -> FleetResult<NewMaintenanceWindow> {
        let vehicle_id = self
            .vehicle_id
            .clone()
            .ok_or(FleetError::MissingField("vehicle"))?;
        let start = self.start.ok_or(FleetError::MissingField("start date"))?;
        let end = self.end.ok_or(FleetError::MissingField("end date"))?;
        if start >= end {
            return Err(FleetError::InvalidRange {
                start: Some(start),
                end,
            });
        }
        Ok(NewMaintenanceWindow {
            vehicle_id,
            start,
            end,
            status: self.status,
            description: self.description.trim().to_owned(),
        })
    }

    /// Bypasses the interactive guard; used when a draft is rebuilt from an
    /// untrusted source such as command-line flags.
    pub fn with_dates(mut self, start: Option<Date>, end: Option<Date>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}
