// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;
use time::Date;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    #[error("end date {end} must be after start date {}", display_start(.start))]
    InvalidRange { start: Option<Date>, end: Date },

    #[error("{0} is required -- fill it in and retry")]
    MissingField(&'static str),

    #[error("could not load {resource}: {message}")]
    DataFetchFailure {
        resource: &'static str,
        message: String,
    },

    #[error("dropped {resource} record #{index}: {reason}")]
    MalformedRecord {
        resource: &'static str,
        index: usize,
        reason: String,
    },
}

impl FleetError {
    pub fn is_invalid_range(&self) -> bool {
        matches!(self, Self::InvalidRange { .. })
    }
}

fn display_start(start: &Option<Date>) -> String {
    start.map_or_else(|| "(unset)".to_owned(), |date| date.to_string())
}

pub type FleetResult<T> = std::result::Result<T, FleetError>;
