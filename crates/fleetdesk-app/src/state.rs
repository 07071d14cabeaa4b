// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use time::Date;

use crate::{
    Brand, BrandId, Capability, DayCell, FleetError, FleetFilter, MaintenanceWindow,
    MaintenanceWindowDraft, MaintenanceWindowId, MonthRef, NewMaintenanceWindow, Role,
    SelectionRange, StatusFilter, Vehicle, VehicleId, WeekStart, build_month_starting,
    navigate_month, toggle_brand,
};

/// The remote data collaborator. Implementations perform the network calls;
/// the screen only keeps whatever each call last returned.
pub trait FleetSource {
    fn vehicles(&mut self) -> Result<Vec<Vehicle>>;
    fn brands(&mut self) -> Result<Vec<Brand>>;
    fn maintenance_windows(&mut self, vehicle_id: &VehicleId) -> Result<Vec<MaintenanceWindow>>;
    fn create_window(&mut self, window: &NewMaintenanceWindow) -> Result<MaintenanceWindow>;
    fn delete_window(&mut self, id: &MaintenanceWindowId) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetScreen {
    pub role: Role,
    pub week_start: WeekStart,
    pub month: MonthRef,
    pub filter: FleetFilter,
    pub selected_vehicle: Option<VehicleId>,
    pub draft: MaintenanceWindowDraft,
    pub roster: Vec<Vehicle>,
    pub brands: Vec<Brand>,
    pub windows: Vec<MaintenanceWindow>,
    pub failures: Vec<FleetError>,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenCommand {
    NextMonth,
    PrevMonth,
    ShiftMonth(i32),
    ToggleBrand(BrandId),
    ClearBrands,
    SetQuery(String),
    SetStatus(StatusFilter),
    SelectVehicle(VehicleId),
    SetSelectionStart(Date),
    SetSelectionEnd(Date),
    ClearSelection,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    MonthChanged(MonthRef),
    FilterChanged,
    VehicleSelected(VehicleId),
    SelectionChanged(SelectionRange),
    SelectionRejected(FleetError),
    DataLoaded {
        vehicles: usize,
        brands: usize,
        windows: usize,
    },
    FetchFailed(FleetError),
    WindowSaved(MaintenanceWindow),
    WindowDeleted(MaintenanceWindowId),
    PermissionDenied(Capability),
    StatusUpdated(String),
    StatusCleared,
}

impl FleetScreen {
    pub fn new(role: Role, month: MonthRef) -> Self {
        Self {
            role,
            week_start: WeekStart::default(),
            month,
            filter: FleetFilter::default(),
            selected_vehicle: None,
            draft: MaintenanceWindowDraft::default(),
            roster: Vec::new(),
            brands: Vec::new(),
            windows: Vec::new(),
            failures: Vec::new(),
            status_line: None,
        }
    }

    pub fn dispatch(&mut self, command: ScreenCommand) -> Vec<ScreenEvent> {
        match command {
            ScreenCommand::NextMonth => self.shift_month(1),
            ScreenCommand::PrevMonth => self.shift_month(-1),
            ScreenCommand::ShiftMonth(direction) => self.shift_month(direction),
            ScreenCommand::ToggleBrand(brand_id) => {
                self.filter.brand_ids = toggle_brand(&self.filter.brand_ids, &brand_id);
                vec![ScreenEvent::FilterChanged]
            }
            ScreenCommand::ClearBrands => {
                self.filter.brand_ids.clear();
                vec![ScreenEvent::FilterChanged]
            }
            ScreenCommand::SetQuery(query) => {
                self.filter.query = query;
                vec![ScreenEvent::FilterChanged]
            }
            ScreenCommand::SetStatus(status) => {
                self.filter.status = status;
                vec![ScreenEvent::FilterChanged]
            }
            ScreenCommand::SelectVehicle(vehicle_id) => {
                self.windows.clear();
                self.draft = MaintenanceWindowDraft::for_vehicle(vehicle_id.clone());
                self.selected_vehicle = Some(vehicle_id.clone());
                vec![ScreenEvent::VehicleSelected(vehicle_id)]
            }
            ScreenCommand::SetSelectionStart(start) => {
                self.draft.set_start(start);
                vec![ScreenEvent::SelectionChanged(self.draft.selection())]
            }
            ScreenCommand::SetSelectionEnd(end) => match self.draft.set_end(end) {
                Ok(()) => vec![ScreenEvent::SelectionChanged(self.draft.selection())],
                Err(error) => {
                    let message = error.to_string();
                    vec![
                        ScreenEvent::SelectionRejected(error),
                        self.set_status(&message),
                    ]
                }
            },
            ScreenCommand::ClearSelection => {
                self.draft.clear();
                vec![ScreenEvent::SelectionChanged(self.draft.selection())]
            }
            ScreenCommand::ClearStatus => {
                self.status_line = None;
                vec![ScreenEvent::StatusCleared]
            }
        }
    }

    /// Fetches roster, brands and (when a vehicle is selected) its windows.
    /// A failed call leaves that collection empty and records the failure.
    pub fn refresh(&mut self, source: &mut dyn FleetSource) -> Vec<ScreenEvent> {
        self.failures.clear();
        let mut events = Vec::new();

        let vehicles = source.vehicles();
        self.roster = self.or_empty(&mut events, "vehicles", vehicles);
        let brands = source.brands();
        self.brands = self.or_empty(&mut events, "brands", brands);
        if self.selected_vehicle.is_some() {
            events.extend(self.load_windows(source));
        } else {
            self.windows.clear();
        }

        tracing::debug!(
            vehicles = self.roster.len(),
            brands = self.brands.len(),
            windows = self.windows.len(),
            failures = self.failures.len(),
            "screen refreshed"
        );
        events.push(ScreenEvent::DataLoaded {
            vehicles: self.roster.len(),
            brands: self.brands.len(),
            windows: self.windows.len(),
        });
        events
    }

    pub fn load_windows(&mut self, source: &mut dyn FleetSource) -> Vec<ScreenEvent> {
        let Some(vehicle_id) = self.selected_vehicle.clone() else {
            self.windows.clear();
            return Vec::new();
        };

        let mut events = Vec::new();
        let fetched = source.maintenance_windows(&vehicle_id);
        let mut windows = self.or_empty(&mut events, "maintenance windows", fetched);
        windows.retain(|window| window.vehicle_id == vehicle_id);
        self.windows = windows;
        events
    }

    pub fn save_draft(&mut self, source: &mut dyn FleetSource) -> Vec<ScreenEvent> {
        if !self.role.can(Capability::ScheduleMaintenance) {
            return self.deny(Capability::ScheduleMaintenance);
        }

        let payload = match self.draft.validate() {
            Ok(payload) => payload,
            Err(error) => {
                let message = error.to_string();
                return vec![
                    ScreenEvent::SelectionRejected(error),
                    self.set_status(&message),
                ];
            }
        };

        match source.create_window(&payload) {
            Ok(window) => {
                tracing::debug!(window = %window.id, vehicle = %window.vehicle_id, "window saved");
                self.windows.push(window.clone());
                self.draft.clear();
                let status = self.set_status("maintenance scheduled");
                vec![ScreenEvent::WindowSaved(window), status]
            }
            Err(error) => self.fetch_failed("maintenance window", &error),
        }
    }

    pub fn delete_window(
        &mut self,
        source: &mut dyn FleetSource,
        id: &MaintenanceWindowId,
    ) -> Vec<ScreenEvent> {
        if !self.role.can(Capability::ScheduleMaintenance) {
            return self.deny(Capability::ScheduleMaintenance);
        }

        match source.delete_window(id) {
            Ok(()) => {
                self.windows.retain(|window| &window.id != id);
                let status = self.set_status("maintenance removed");
                vec![ScreenEvent::WindowDeleted(id.clone()), status]
            }
            Err(error) => self.fetch_failed("maintenance window", &error),
        }
    }

    pub fn visible_vehicles(&self) -> Vec<&Vehicle> {
        self.filter.apply(&self.roster)
    }

    pub fn calendar(&self) -> Vec<DayCell> {
        build_month_starting(
            self.month,
            Some(&self.draft.selection()),
            &self.windows,
            self.week_start,
        )
    }

    pub fn brand_name(&self, brand_id: &BrandId) -> Option<&str> {
        self.brands
            .iter()
            .find(|brand| &brand.id == brand_id)
            .map(|brand| brand.name.as_str())
    }

    fn shift_month(&mut self, direction: i32) -> Vec<ScreenEvent> {
        self.month = navigate_month(self.month, direction);
        vec![ScreenEvent::MonthChanged(self.month)]
    }

    fn or_empty<T>(
        &mut self,
        events: &mut Vec<ScreenEvent>,
        resource: &'static str,
        fetched: Result<Vec<T>>,
    ) -> Vec<T> {
        match fetched {
            Ok(items) => items,
            Err(error) => {
                events.extend(self.fetch_failed(resource, &error));
                Vec::new()
            }
        }
    }

    fn fetch_failed(&mut self, resource: &'static str, error: &anyhow::Error) -> Vec<ScreenEvent> {
        tracing::warn!(resource, error = %format!("{error:#}"), "fetch failed; showing empty data");
        let failure = FleetError::DataFetchFailure {
            resource,
            message: format!("{error:#}"),
        };
        self.failures.push(failure.clone());
        let status = self.set_status(&failure.to_string());
        vec![ScreenEvent::FetchFailed(failure), status]
    }

    fn deny(&mut self, capability: Capability) -> Vec<ScreenEvent> {
        let message = format!("{} role cannot {}", self.role.as_str(), capability.label());
        vec![
            ScreenEvent::PermissionDenied(capability),
            self.set_status(&message),
        ]
    }

    fn set_status(&mut self, message: &str) -> ScreenEvent {
        self.status_line = Some(message.to_owned());
        ScreenEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{FleetScreen, FleetSource, ScreenCommand, ScreenEvent};
    use crate::{
        Annotation, Brand, BrandId, Capability, FleetError, MaintenanceStatus, MaintenanceWindow,
        MaintenanceWindowId, MonthRef, NewMaintenanceWindow, Role, SelectionRange, StatusFilter,
        Vehicle, VehicleId, VehicleStatus,
    };
    use anyhow::{Result, bail};
    use time::macros::date;

    #[derive(Default)]
    struct StubSource {
        fail_vehicles: bool,
        fail_create: bool,
        windows: Vec<MaintenanceWindow>,
        created: Vec<NewMaintenanceWindow>,
        deleted: Vec<MaintenanceWindowId>,
    }

    impl FleetSource for StubSource {
        fn vehicles(&mut self) -> Result<Vec<Vehicle>> {
            if self.fail_vehicles {
                bail!("connection refused");
            }
            Ok(vec![Vehicle {
                id: VehicleId::new("v-1"),
                name: "Civic".to_owned(),
                brand_id: BrandId::new("b-1"),
                status: VehicleStatus::Available,
                year: Some(2022),
                capacity: Some(5),
                class: None,
                daily_price_cents: None,
            }])
        }

        fn brands(&mut self) -> Result<Vec<Brand>> {
            Ok(vec![Brand {
                id: BrandId::new("b-1"),
                name: "Honda".to_owned(),
                logo: None,
            }])
        }

        fn maintenance_windows(&mut self, _vehicle_id: &VehicleId) -> Result<Vec<MaintenanceWindow>> {
            Ok(self.windows.clone())
        }

        fn create_window(&mut self, window: &NewMaintenanceWindow) -> Result<MaintenanceWindow> {
            if self.fail_create {
                bail!("server error (500)");
            }
            self.created.push(window.clone());
            Ok(MaintenanceWindow {
                id: MaintenanceWindowId::new(format!("w-{}", self.created.len())),
                vehicle_id: window.vehicle_id.clone(),
                start: window.start,
                end: window.end,
                status: window.status,
                description: window.description.clone(),
            })
        }

        fn delete_window(&mut self, id: &MaintenanceWindowId) -> Result<()> {
            self.deleted.push(id.clone());
            Ok(())
        }
    }

    fn june_2024() -> MonthRef {
        MonthRef::new(2024, 5).expect("valid month")
    }

    fn window(id: &str, vehicle: &str) -> MaintenanceWindow {
        MaintenanceWindow {
            id: MaintenanceWindowId::new(id),
            vehicle_id: VehicleId::new(vehicle),
            start: date!(2024 - 06 - 03),
            end: date!(2024 - 06 - 04),
            status: MaintenanceStatus::Active,
            description: String::new(),
        }
    }

    #[test]
    fn month_navigation_wraps_years() {
        let mut screen = FleetScreen::new(Role::Staff, MonthRef::new(2024, 11).expect("valid"));
        let events = screen.dispatch(ScreenCommand::NextMonth);
        let january = MonthRef::new(2025, 0).expect("valid");
        assert_eq!(screen.month, january);
        assert_eq!(events, vec![ScreenEvent::MonthChanged(january)]);

        screen.dispatch(ScreenCommand::PrevMonth);
        assert_eq!(screen.month, MonthRef::new(2024, 11).expect("valid"));
    }

    #[test]
    fn filter_commands_update_visible_vehicles() {
        let mut screen = FleetScreen::new(Role::Staff, june_2024());
        let mut source = StubSource::default();
        screen.refresh(&mut source);
        assert_eq!(screen.visible_vehicles().len(), 1);

        screen.dispatch(ScreenCommand::SetStatus(StatusFilter::Only(VehicleStatus::Reserved)));
        assert!(screen.visible_vehicles().is_empty());

        screen.dispatch(ScreenCommand::SetStatus(StatusFilter::All));
        screen.dispatch(ScreenCommand::ToggleBrand(BrandId::new("b-2")));
        assert!(screen.visible_vehicles().is_empty());

        screen.dispatch(ScreenCommand::ToggleBrand(BrandId::new("b-1")));
        assert_eq!(screen.visible_vehicles().len(), 1);

        screen.dispatch(ScreenCommand::SetQuery("CIV".to_owned()));
        assert_eq!(screen.visible_vehicles().len(), 1);
        assert_eq!(screen.brand_name(&BrandId::new("b-1")), Some("Honda"));
    }

    #[test]
    fn fetch_failure_degrades_to_empty_data_with_signal() {
        let mut screen = FleetScreen::new(Role::Staff, june_2024());
        let mut source = StubSource {
            fail_vehicles: true,
            ..StubSource::default()
        };

        let events = screen.refresh(&mut source);
        assert!(screen.roster.is_empty());
        assert_eq!(screen.brands.len(), 1);
        assert_eq!(screen.failures.len(), 1);
        assert!(matches!(
            &screen.failures[0],
            FleetError::DataFetchFailure { resource: "vehicles", .. }
        ));
        assert!(events.iter().any(|event| matches!(event, ScreenEvent::FetchFailed(_))));
        assert!(screen.visible_vehicles().is_empty());

        source.fail_vehicles = false;
        screen.refresh(&mut source);
        assert!(screen.failures.is_empty());
        assert_eq!(screen.roster.len(), 1);
    }

    #[test]
    fn selected_vehicle_windows_are_scoped_and_rendered() {
        let mut screen = FleetScreen::new(Role::Staff, june_2024());
        let mut source = StubSource {
            windows: vec![window("w-1", "v-1"), window("w-2", "v-9")],
            ..StubSource::default()
        };

        let events = screen.dispatch(ScreenCommand::SelectVehicle(VehicleId::new("v-1")));
        assert_eq!(events, vec![ScreenEvent::VehicleSelected(VehicleId::new("v-1"))]);
        screen.load_windows(&mut source);
        assert_eq!(screen.windows.len(), 1);

        let cells = screen.calendar();
        let third = cells
            .iter()
            .find(|cell| cell.day == Some(3))
            .expect("day 3 present");
        assert_eq!(third.annotation, Annotation::MaintenanceStart);
    }

    #[test]
    fn rejected_end_date_keeps_prior_selection_and_sets_status() {
        let mut screen = FleetScreen::new(Role::Staff, june_2024());
        screen.dispatch(ScreenCommand::SelectVehicle(VehicleId::new("v-1")));
        screen.dispatch(ScreenCommand::SetSelectionStart(date!(2024 - 06 - 10)));

        let events = screen.dispatch(ScreenCommand::SetSelectionEnd(date!(2024 - 06 - 09)));
        assert!(matches!(
            events.first(),
            Some(ScreenEvent::SelectionRejected(FleetError::InvalidRange { .. }))
        ));
        assert_eq!(
            screen.draft.selection(),
            SelectionRange::new(Some(date!(2024 - 06 - 10)), Some(date!(2024 - 06 - 11)))
        );
        assert!(screen.status_line.is_some());

        screen.dispatch(ScreenCommand::ClearStatus);
        assert!(screen.status_line.is_none());
    }

    #[test]
    fn save_draft_creates_window_and_clears_selection() {
        let mut screen = FleetScreen::new(Role::Staff, june_2024());
        let mut source = StubSource::default();
        screen.dispatch(ScreenCommand::SelectVehicle(VehicleId::new("v-1")));
        screen.dispatch(ScreenCommand::SetSelectionStart(date!(2024 - 06 - 10)));
        screen.dispatch(ScreenCommand::SetSelectionEnd(date!(2024 - 06 - 12)));

        let events = screen.save_draft(&mut source);
        assert!(matches!(events.first(), Some(ScreenEvent::WindowSaved(_))));
        assert_eq!(source.created.len(), 1);
        assert_eq!(screen.windows.len(), 1);
        assert_eq!(screen.draft.selection(), SelectionRange::default());

        let id = screen.windows[0].id.clone();
        screen.delete_window(&mut source, &id);
        assert!(screen.windows.is_empty());
        assert_eq!(source.deleted, vec![id]);
    }

    #[test]
    fn save_draft_failure_keeps_draft() {
        let mut screen = FleetScreen::new(Role::Admin, june_2024());
        let mut source = StubSource {
            fail_create: true,
            ..StubSource::default()
        };
        screen.dispatch(ScreenCommand::SelectVehicle(VehicleId::new("v-1")));
        screen.dispatch(ScreenCommand::SetSelectionStart(date!(2024 - 06 - 10)));

        let events = screen.save_draft(&mut source);
        assert!(matches!(events.first(), Some(ScreenEvent::FetchFailed(_))));
        assert!(screen.draft.selection().is_complete());
        assert!(screen.windows.is_empty());
    }

    #[test]
    fn customers_cannot_schedule_maintenance() {
        let mut screen = FleetScreen::new(Role::Customer, june_2024());
        let mut source = StubSource::default();
        screen.dispatch(ScreenCommand::SelectVehicle(VehicleId::new("v-1")));
        screen.dispatch(ScreenCommand::SetSelectionStart(date!(2024 - 06 - 10)));

        let events = screen.save_draft(&mut source);
        assert_eq!(
            events.first(),
            Some(&ScreenEvent::PermissionDenied(Capability::ScheduleMaintenance))
        );
        assert!(source.created.is_empty());
    }
}
