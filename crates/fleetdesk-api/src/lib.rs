// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod ingest;

use anyhow::{Context, Result, anyhow, bail};
use fleetdesk_app::{
    Brand, MaintenanceWindow, MaintenanceWindowId, NewMaintenanceWindow, Vehicle, VehicleId,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub use ingest::Ingested;

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let parsed =
            Url::parse(trimmed).with_context(|| format!("api.base_url {trimmed:?} is not a URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            bail!("api.base_url {trimmed:?} must be an http or https URL");
        }
        if timeout.is_zero() {
            bail!("api.timeout must be positive");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url: parsed,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Confirms the API answers a cheap listing.
    pub fn ping(&self) -> Result<()> {
        self.list_brands().map(|_| ())
    }

    pub fn list_vehicles(&self) -> Result<Ingested<Vehicle>> {
        let body = self.fetch_list("vehicles")?;
        Ok(ingest::vehicles(body))
    }

    pub fn list_brands(&self) -> Result<Ingested<Brand>> {
        let body = self.fetch_list("brands")?;
        Ok(ingest::brands(body))
    }

    /// Lists windows, keeping only those of `vehicle` when one is given. The
    /// server may ignore the query parameter, so the filter is applied here.
    pub fn list_maintenance_windows(
        &self,
        vehicle: Option<&VehicleId>,
    ) -> Result<Ingested<MaintenanceWindow>> {
        let mut url = self.endpoint(&["maintenances"])?;
        if let Some(vehicle) = vehicle {
            url.query_pairs_mut()
                .append_pair("vehicleId", vehicle.as_str());
        }
        let values = self.send_list(self.http.get(url), "maintenances")?;
        let mut ingested = ingest::maintenance_windows(values);
        if let Some(vehicle) = vehicle {
            ingested
                .records
                .retain(|window| &window.vehicle_id == vehicle);
        }
        Ok(ingested)
    }

    pub fn create_maintenance_window(
        &self,
        window: &NewMaintenanceWindow,
    ) -> Result<MaintenanceWindow> {
        let url = self.endpoint(&["maintenances"])?;
        tracing::debug!(%url, vehicle = %window.vehicle_id, "creating maintenance window");
        let response = self
            .http
            .post(url)
            .json(&ingest::new_window_payload(window))
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let body: Value = response.json().context("decode created maintenance window")?;
        ingest::maintenance_window(&ingest::single_record(body))
            .map_err(|reason| anyhow!("server returned an unusable maintenance window: {reason}"))
    }

    pub fn delete_maintenance_window(&self, id: &MaintenanceWindowId) -> Result<()> {
        let url = self.endpoint(&["maintenances", id.as_str()])?;
        tracing::debug!(%url, "deleting maintenance window");
        let response = self
            .http
            .delete(url)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            bail!("maintenance window {id} not found -- it may already be deleted");
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("api.base_url {} cannot take a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn fetch_list(&self, resource: &str) -> Result<Vec<Value>> {
        let url = self.endpoint(&[resource])?;
        self.send_list(self.http.get(url), resource)
    }

    fn send_list(&self, request: RequestBuilder, resource: &str) -> Result<Vec<Value>> {
        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let body: Value = response
            .json()
            .with_context(|| format!("decode {resource} response"))?;
        let values = ingest::record_list(body, resource).map_err(|reason| anyhow!(reason))?;
        tracing::debug!(resource, count = values.len(), "fetched records");
        Ok(values)
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check [api].base_url or FLEETDESK_API_URL ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<MessageEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
    {
        let message = match error {
            ErrorBody::Text(text) => text,
            ErrorBody::Detailed { message } => message,
        };
        if !message.is_empty() {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
    }

    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Text(String),
    Detailed { message: String },
}
