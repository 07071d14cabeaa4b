// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use fleetdesk_api::{Client, Ingested};
use fleetdesk_app::{
    Brand, FleetError, FleetSource, MaintenanceWindow, MaintenanceWindowId, NewMaintenanceWindow,
    Vehicle, VehicleId,
};

/// Bridges the screen to the HTTP API and keeps every record ingestion
/// dropped so the binary can report it.
pub struct ApiRuntime<'a> {
    client: &'a Client,
    rejected: Vec<FleetError>,
}

impl<'a> ApiRuntime<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            rejected: Vec::new(),
        }
    }

    pub fn rejected(&self) -> &[FleetError] {
        &self.rejected
    }

    fn keep<T>(&mut self, ingested: Ingested<T>) -> Vec<T> {
        self.rejected.extend(ingested.rejected);
        ingested.records
    }
}

impl FleetSource for ApiRuntime<'_> {
    fn vehicles(&mut self) -> Result<Vec<Vehicle>> {
        let ingested = self.client.list_vehicles()?;
        Ok(self.keep(ingested))
    }

    fn brands(&mut self) -> Result<Vec<Brand>> {
        let ingested = self.client.list_brands()?;
        Ok(self.keep(ingested))
    }

    fn maintenance_windows(&mut self, vehicle_id: &VehicleId) -> Result<Vec<MaintenanceWindow>> {
        let ingested = self.client.list_maintenance_windows(Some(vehicle_id))?;
        Ok(self.keep(ingested))
    }

    fn create_window(&mut self, window: &NewMaintenanceWindow) -> Result<MaintenanceWindow> {
        self.client.create_maintenance_window(window)
    }

    fn delete_window(&mut self, id: &MaintenanceWindowId) -> Result<()> {
        self.client.delete_maintenance_window(id)
    }
}
