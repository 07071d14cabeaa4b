// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const TARGETS: [&str; 3] = ["fleetdesk", "fleetdesk_app", "fleetdesk_api"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    /// Use `[logging] level` from the config.
    #[default]
    Configured,
    Verbose,
}

impl Verbosity {
    pub fn level<'a>(self, configured: &'a str) -> &'a str {
        match self {
            Self::Quiet => "error",
            Self::Configured => configured,
            Self::Verbose => "debug",
        }
    }
}

pub fn default_directives(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the stderr subscriber once. `RUST_LOG` takes precedence over both
/// the config level and the verbosity flags.
pub fn init_logging(verbosity: Verbosity, configured_level: &str) {
    let directives = default_directives(verbosity.level(configured_level));
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(false)
            .with_line_number(false),
    );

    // A second call keeps the first subscriber.
    let _ = subscriber.try_init();
}
