// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod render;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use fleetdesk_api::Client;
use fleetdesk_app::{
    BrandId, Capability, FleetScreen, MaintenanceStatus, MaintenanceWindowId, MonthRef,
    ScreenCommand, ScreenEvent, StatusFilter, VehicleId,
};
use logging::Verbosity;
use runtime::ApiRuntime;
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `fleetdesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    logging::init_logging(options.verbosity, &config.log_level());

    let client = Client::new(&config.api_base_url()?, config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        client.ping()?;
        println!("ok: {} answered as {}", client.base_url(), config.role().as_str());
        return Ok(());
    }

    let Some(command) = options.command else {
        print_help();
        return Ok(());
    };

    let today = OffsetDateTime::now_utc().date();
    let mut screen = FleetScreen::new(config.role(), MonthRef::containing(today));
    screen.week_start = config.week_start();
    let mut runtime = ApiRuntime::new(&client);
    tracing::debug!(role = screen.role.as_str(), base_url = client.base_url(), "starting");

    match command {
        Command::Vehicles(args) => {
            require(&screen, Capability::ViewFleet)?;
            if let StatusFilter::Unrecognized(raw) = &args.status {
                eprintln!("warning: unknown status {raw:?} matches no vehicles");
            }
            for brand in args.brands {
                screen.dispatch(ScreenCommand::ToggleBrand(brand));
            }
            screen.dispatch(ScreenCommand::SetQuery(args.query));
            screen.dispatch(ScreenCommand::SetStatus(args.status));

            screen.refresh(&mut runtime);
            report_degraded(&screen, &runtime);
            print!("{}", render::render_vehicles(&screen));
        }
        Command::Calendar(args) => {
            require(&screen, Capability::ViewFleet)?;
            if let Some(month) = args.month {
                screen.month = month;
            }
            if args.shift != 0 {
                screen.dispatch(ScreenCommand::ShiftMonth(args.shift));
            }
            screen.dispatch(ScreenCommand::SelectVehicle(args.vehicle.clone()));
            if let Some(from) = args.from {
                screen.dispatch(ScreenCommand::SetSelectionStart(from));
            }
            if let Some(to) = args.to {
                let events = screen.dispatch(ScreenCommand::SetSelectionEnd(to));
                if let Some(message) = failure_message(&events) {
                    eprintln!("warning: {message}");
                }
            }

            screen.refresh(&mut runtime);
            report_degraded(&screen, &runtime);
            let name = screen
                .roster
                .iter()
                .find(|vehicle| vehicle.id == args.vehicle)
                .map_or("unknown vehicle", |vehicle| vehicle.name.as_str());
            println!("{name} ({})\n", args.vehicle);
            print!(
                "{}",
                render::render_month(screen.month, screen.week_start, &screen.calendar())
            );
            println!("\n{}\n", render::LEGEND);
            print!("{}", render::render_windows(&screen.windows));
        }
        Command::Schedule(args) => {
            screen.dispatch(ScreenCommand::SelectVehicle(args.vehicle));
            screen.draft.status = args.status;
            screen.draft.description = args.note;
            screen.dispatch(ScreenCommand::SetSelectionStart(args.from));
            let events = screen.dispatch(ScreenCommand::SetSelectionEnd(args.to));
            if let Some(message) = failure_message(&events) {
                bail!("{message}");
            }

            let events = screen.save_draft(&mut runtime);
            if let Some(message) = failure_message(&events) {
                bail!("{message}");
            }
            if let Some(ScreenEvent::WindowSaved(window)) = events
                .iter()
                .find(|event| matches!(event, ScreenEvent::WindowSaved(_)))
            {
                println!(
                    "scheduled {} for {}: {} .. {} ({})",
                    window.id,
                    window.vehicle_id,
                    window.start,
                    window.end,
                    window.status.as_str()
                );
            }
        }
        Command::Unschedule(id) => {
            let events = screen.delete_window(&mut runtime, &id);
            if let Some(message) = failure_message(&events) {
                bail!("{message}");
            }
            println!("removed maintenance window {id}");
        }
    }

    Ok(())
}

fn require(screen: &FleetScreen, capability: Capability) -> Result<()> {
    if !screen.role.can(capability) {
        bail!(
            "{} role cannot {} -- change [session].role in the config",
            screen.role.as_str(),
            capability.label()
        );
    }
    Ok(())
}

/// The first user-facing failure carried by `events`, if any.
fn failure_message(events: &[ScreenEvent]) -> Option<String> {
    events.iter().find_map(|event| match event {
        ScreenEvent::SelectionRejected(error) | ScreenEvent::FetchFailed(error) => {
            Some(error.to_string())
        }
        ScreenEvent::PermissionDenied(capability) => Some(format!(
            "current role cannot {} -- change [session].role in the config",
            capability.label()
        )),
        _ => None,
    })
}

fn report_degraded(screen: &FleetScreen, runtime: &ApiRuntime<'_>) {
    for failure in &screen.failures {
        eprintln!("warning: {failure}");
    }
    let dropped = runtime.rejected().len();
    if dropped > 0 {
        eprintln!("warning: dropped {dropped} malformed record(s); run with -v for details");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VehicleArgs {
    brands: Vec<BrandId>,
    query: String,
    status: StatusFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CalendarArgs {
    vehicle: VehicleId,
    month: Option<MonthRef>,
    shift: i32,
    from: Option<Date>,
    to: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduleArgs {
    vehicle: VehicleId,
    from: Date,
    to: Date,
    status: MaintenanceStatus,
    note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Vehicles(VehicleArgs),
    Calendar(CalendarArgs),
    Schedule(ScheduleArgs),
    Unschedule(MaintenanceWindowId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    verbosity: Verbosity,
    command: Option<Command>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
        verbosity: Verbosity::default(),
        command: None,
    };

    let mut iter = args.into_iter().map(|arg| arg.as_ref().to_owned());
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--verbose" | "-v" => {
                options.verbosity = Verbosity::Verbose;
            }
            "--quiet" | "-q" => {
                options.verbosity = Verbosity::Quiet;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            "vehicles" => {
                options.command = Some(Command::Vehicles(parse_vehicle_args(&mut iter)?));
            }
            "calendar" => {
                options.command = Some(Command::Calendar(parse_calendar_args(&mut iter)?));
            }
            "schedule" => {
                options.command = Some(Command::Schedule(parse_schedule_args(&mut iter)?));
            }
            "unschedule" => {
                let id = iter
                    .next()
                    .filter(|id| !id.trim().is_empty() && !id.starts_with('-'))
                    .ok_or_else(|| anyhow!("unschedule requires a maintenance window id"))?;
                if let Some(extra) = iter.next() {
                    bail!("unexpected argument {extra:?} after unschedule <id>");
                }
                options.command = Some(Command::Unschedule(MaintenanceWindowId::new(id)));
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn flag_value(iter: &mut impl Iterator<Item = String>, flag: &str, what: &str) -> Result<String> {
    iter.next()
        .ok_or_else(|| anyhow!("{flag} requires {what}"))
}

fn parse_vehicle_args(iter: &mut impl Iterator<Item = String>) -> Result<VehicleArgs> {
    let mut brands = BTreeSet::new();
    let mut query = String::new();
    let mut status = StatusFilter::All;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--brand" => {
                brands.insert(BrandId::new(flag_value(iter, "--brand", "a brand id")?));
            }
            "--query" => query = flag_value(iter, "--query", "search text")?,
            "--status" => status = StatusFilter::parse(&flag_value(iter, "--status", "a status")?),
            unknown => bail!("unknown vehicles option {unknown:?}; run with --help"),
        }
    }
    Ok(VehicleArgs {
        brands: brands.into_iter().collect(),
        query,
        status,
    })
}

fn parse_calendar_args(iter: &mut impl Iterator<Item = String>) -> Result<CalendarArgs> {
    let mut vehicle = None;
    let mut month = None;
    let mut shift = 0;
    let mut from = None;
    let mut to = None;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--vehicle" => vehicle = Some(flag_value(iter, "--vehicle", "a vehicle id")?),
            "--month" => month = Some(parse_month(&flag_value(iter, "--month", "YYYY-MM")?)?),
            "--shift" => {
                let raw = flag_value(iter, "--shift", "a month count")?;
                shift = raw
                    .parse::<i32>()
                    .with_context(|| format!("--shift expects a signed month count, got {raw:?}"))?;
            }
            "--from" => from = Some(parse_date("--from", &flag_value(iter, "--from", "a date")?)?),
            "--to" => to = Some(parse_date("--to", &flag_value(iter, "--to", "a date")?)?),
            unknown => bail!("unknown calendar option {unknown:?}; run with --help"),
        }
    }
    let vehicle = vehicle.ok_or_else(|| anyhow!("calendar requires --vehicle <id>"))?;
    Ok(CalendarArgs {
        vehicle: VehicleId::new(vehicle),
        month,
        shift,
        from,
        to,
    })
}

fn parse_schedule_args(iter: &mut impl Iterator<Item = String>) -> Result<ScheduleArgs> {
    let mut vehicle = None;
    let mut from = None;
    let mut to = None;
    let mut status = MaintenanceStatus::Pending;
    let mut note = String::new();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--vehicle" => vehicle = Some(flag_value(iter, "--vehicle", "a vehicle id")?),
            "--from" => from = Some(parse_date("--from", &flag_value(iter, "--from", "a date")?)?),
            "--to" => to = Some(parse_date("--to", &flag_value(iter, "--to", "a date")?)?),
            "--status" => {
                let raw = flag_value(iter, "--status", "a status")?;
                status = MaintenanceStatus::parse(&raw).ok_or_else(|| {
                    anyhow!("--status must be one of active, pending, completed; got {raw:?}")
                })?;
            }
            "--note" => note = flag_value(iter, "--note", "text")?,
            unknown => bail!("unknown schedule option {unknown:?}; run with --help"),
        }
    }
    Ok(ScheduleArgs {
        vehicle: VehicleId::new(vehicle.ok_or_else(|| anyhow!("schedule requires --vehicle <id>"))?),
        from: from.ok_or_else(|| anyhow!("schedule requires --from <YYYY-MM-DD>"))?,
        to: to.ok_or_else(|| anyhow!("schedule requires --to <YYYY-MM-DD>"))?,
        status,
        note,
    })
}

fn parse_date(flag: &str, raw: &str) -> Result<Date> {
    Date::parse(raw.trim(), &format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("{flag} expects YYYY-MM-DD, got {raw:?}"))
}

fn parse_month(raw: &str) -> Result<MonthRef> {
    let invalid = || anyhow!("--month expects YYYY-MM, got {raw:?}");
    let (year, month) = raw.trim().rsplit_once('-').ok_or_else(invalid)?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u8>().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    MonthRef::new(year, month - 1).ok_or_else(invalid)
}

fn print_help() {
    println!("fleetdesk -- fleet maintenance scheduling");
    println!();
    println!("Usage: fleetdesk [options] <command> [command options]");
    println!();
    println!("Options:");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and reach the API");
    println!("  -v, --verbose            Debug logging on stderr");
    println!("  -q, --quiet              Errors only on stderr");
    println!("  -h, --help               Show this help");
    println!();
    println!("Commands:");
    println!("  vehicles [--brand <id>]... [--query <text>] [--status <status|all>]");
    println!("  calendar --vehicle <id> [--month YYYY-MM] [--shift <N>] [--from <date>] [--to <date>]");
    println!("  schedule --vehicle <id> --from <date> --to <date> [--status <s>] [--note <text>]");
    println!("  unschedule <window-id>");
}

#[cfg(test)]
mod tests {
    use super::{
        CalendarArgs, CliOptions, Command, ScheduleArgs, VehicleArgs, failure_message,
        parse_cli_args, parse_month,
    };
    use crate::logging::Verbosity;
    use anyhow::Result;
    use fleetdesk_app::{
        BrandId, Capability, FleetError, MaintenanceStatus, MaintenanceWindowId, MonthRef,
        ScreenEvent, StatusFilter, VehicleId, VehicleStatus,
    };
    use std::path::PathBuf;
    use time::macros::date;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/fleetdesk-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
                verbosity: Verbosity::Configured,
                command: None,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_check_and_verbosity_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check", "-v"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        assert_eq!(options.verbosity, Verbosity::Verbose);

        let quiet = parse_cli_args(vec!["--verbose", "--quiet"], default_options_path())?;
        assert_eq!(quiet.verbosity, Verbosity::Quiet);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn vehicles_command_collects_filters() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "-q", "vehicles", "--brand", "b-2", "--brand", "b-1", "--brand", "b-2", "--query",
                "civic", "--status", "in_maintenance",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.verbosity, Verbosity::Quiet);
        assert_eq!(
            options.command,
            Some(Command::Vehicles(VehicleArgs {
                brands: vec![BrandId::new("b-1"), BrandId::new("b-2")],
                query: "civic".to_owned(),
                status: StatusFilter::Only(VehicleStatus::InMaintenance),
            }))
        );
        Ok(())
    }

    #[test]
    fn vehicles_command_keeps_unknown_status_as_unrecognized() -> Result<()> {
        let options = parse_cli_args(vec!["vehicles", "--status", "sold"], default_options_path())?;
        let Some(Command::Vehicles(args)) = options.command else {
            panic!("expected vehicles command");
        };
        assert_eq!(args.status, StatusFilter::Unrecognized("sold".to_owned()));
        Ok(())
    }

    #[test]
    fn calendar_command_parses_month_shift_and_selection() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "calendar", "--vehicle", "v-1", "--month", "2024-06", "--shift", "-7", "--from",
                "2024-06-10", "--to", "2024-06-12",
            ],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Calendar(CalendarArgs {
                vehicle: VehicleId::new("v-1"),
                month: MonthRef::new(2024, 5),
                shift: -7,
                from: Some(date!(2024 - 06 - 10)),
                to: Some(date!(2024 - 06 - 12)),
            }))
        );

        let plus = parse_cli_args(
            vec!["calendar", "--vehicle", "v-1", "--shift", "+2"],
            default_options_path(),
        )?;
        assert!(matches!(plus.command, Some(Command::Calendar(CalendarArgs { shift: 2, .. }))));
        Ok(())
    }

    #[test]
    fn calendar_command_requires_vehicle_and_valid_dates() {
        let missing = parse_cli_args(vec!["calendar"], default_options_path())
            .expect_err("vehicle is required");
        assert!(missing.to_string().contains("--vehicle"));

        let bad_date = parse_cli_args(
            vec!["calendar", "--vehicle", "v-1", "--from", "06/10/2024"],
            default_options_path(),
        )
        .expect_err("bad date should fail");
        assert!(bad_date.to_string().contains("--from expects YYYY-MM-DD"));
    }

    #[test]
    fn schedule_command_requires_vehicle_and_dates() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "schedule", "--vehicle", "v-9", "--from", "2024-06-10", "--to", "2024-06-11",
                "--status", "active", "--note", "brakes",
            ],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Schedule(ScheduleArgs {
                vehicle: VehicleId::new("v-9"),
                from: date!(2024 - 06 - 10),
                to: date!(2024 - 06 - 11),
                status: MaintenanceStatus::Active,
                note: "brakes".to_owned(),
            }))
        );

        let missing = parse_cli_args(
            vec!["schedule", "--vehicle", "v-9", "--from", "2024-06-10"],
            default_options_path(),
        )
        .expect_err("--to is required");
        assert!(missing.to_string().contains("--to"));

        let bad_status = parse_cli_args(
            vec![
                "schedule", "--vehicle", "v-9", "--from", "2024-06-10", "--to", "2024-06-11",
                "--status", "someday",
            ],
            default_options_path(),
        )
        .expect_err("unknown status should fail");
        assert!(bad_status.to_string().contains("active, pending, completed"));
        Ok(())
    }

    #[test]
    fn unschedule_command_takes_exactly_one_id() -> Result<()> {
        let options = parse_cli_args(vec!["unschedule", "w-4"], default_options_path())?;
        assert_eq!(
            options.command,
            Some(Command::Unschedule(MaintenanceWindowId::new("w-4")))
        );

        assert!(parse_cli_args(vec!["unschedule"], default_options_path()).is_err());
        assert!(parse_cli_args(vec!["unschedule", "--help"], default_options_path()).is_err());
        assert!(parse_cli_args(vec!["unschedule", "w-4", "w-5"], default_options_path()).is_err());
        Ok(())
    }

    #[test]
    fn parse_month_accepts_calendar_months_only() {
        assert_eq!(parse_month("2024-01").ok(), MonthRef::new(2024, 0));
        assert_eq!(parse_month("1999-12").ok(), MonthRef::new(1999, 11));
        for raw in ["2024-13", "2024-00", "2024", "June"] {
            assert!(parse_month(raw).is_err(), "{raw} should fail");
        }
    }

    #[test]
    fn failure_message_picks_first_failure_event() {
        let events = vec![
            ScreenEvent::StatusCleared,
            ScreenEvent::PermissionDenied(Capability::ScheduleMaintenance),
            ScreenEvent::FetchFailed(FleetError::MissingField("vehicle")),
        ];
        let message = failure_message(&events).expect("failure expected");
        assert!(message.contains("[session].role"));
        assert_eq!(failure_message(&[ScreenEvent::StatusCleared]), None);
    }
}
