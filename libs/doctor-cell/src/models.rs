use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DoctorId = i64;
pub type ClinicId = i64;

// ==============================================================================
// DOCTOR READ MODEL
// ==============================================================================

/// The slice of a doctor's profile the scheduling core reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: DoctorId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub consultation_fee: Decimal,
    pub online_fee: Decimal,
    pub clinic_id: Option<ClinicId>,
    #[serde(default)]
    pub available_for_video: bool,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ==============================================================================
// WEEKLY AVAILABILITY RULE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn weekday(self) -> Weekday {
        match self {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = DoctorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DoctorError::ValidationError(format!("Unknown day of week: '{}'", raw)))
    }
}

impl TryFrom<String> for DayOfWeek {
    type Error = DoctorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayOfWeek> for String {
    fn from(day: DayOfWeek) -> Self {
        day.name().to_string()
    }
}

/// A doctor's single weekly recurrence rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub doctor_id: DoctorId,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Validated to be at least 1 on save; the slot generator still guards
    /// against non-positive values coming from older rows.
    pub max_slots_per_day: i32,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Body of a schedule save. Carries only the rule's own fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAvailabilityRequest {
    pub day_of_week: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_slots_per_day: i32,
}

/// Rule fields that passed validation, ready to be upserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRule {
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_slots_per_day: i32,
}

impl SaveAvailabilityRequest {
    pub fn validate(&self) -> Result<ValidatedRule, DoctorError> {
        let day_of_week: DayOfWeek = self.day_of_week.parse()?;

        if self.start_time >= self.end_time {
            return Err(DoctorError::ValidationError(
                "Start time must be before end time".to_string(),
            ));
        }

        if self.max_slots_per_day < 1 {
            return Err(DoctorError::ValidationError(
                "Max slots per day must be a positive integer".to_string(),
            ));
        }

        Ok(ValidatedRule {
            day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
            max_slots_per_day: self.max_slots_per_day,
        })
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum DoctorError {
    #[error("Doctor not found: {0}")]
    NotFound(DoctorId),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(String),
}
