use avlindex_core::Validator;
use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::citizen::Citizen;

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{9}|[0-9]{12})$").unwrap());
static FORBIDDEN_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!@#$%^&*(),.?"{}|<>]"#).unwrap());

pub const MAX_AGE: i32 = 150;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("id '{0}' must be exactly 9 or 12 digits")]
    InvalidId(String),
    #[error("name {0:?} is blank, too short, or contains forbidden characters")]
    InvalidName(String),
    #[error("birth date {0} is in the future")]
    FutureBirthDate(NaiveDate),
    #[error("implausible age {0}")]
    ImplausibleAge(i32),
}

/// Admission rules for [`Citizen`]s.
///
/// Age is measured against `today`, which defaults to the local calendar date at the
/// time of each check.
#[derive(Clone, Copy, Debug, Default)]
pub struct CitizenValidator {
    today: Option<NaiveDate>,
}

impl CitizenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the reference date used for age and future-date checks.
    pub fn as_of(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    pub fn validate(&self, citizen: &Citizen) -> Result<(), ValidationError> {
        if !ID_PATTERN.is_match(&citizen.id) {
            return Err(ValidationError::InvalidId(citizen.id.clone()));
        }

        let name = citizen.name.trim();
        if name.chars().count() < 2
            || FORBIDDEN_NAME_CHARS.is_match(name)
            || name.chars().any(char::is_control)
        {
            return Err(ValidationError::InvalidName(citizen.name.clone()));
        }

        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        if citizen.birth_date > today {
            return Err(ValidationError::FutureBirthDate(citizen.birth_date));
        }
        let age = age_on(citizen.birth_date, today);
        if !(0..=MAX_AGE).contains(&age) {
            return Err(ValidationError::ImplausibleAge(age));
        }
        Ok(())
    }
}

impl Validator<Citizen> for CitizenValidator {
    fn accepts(&self, element: &Citizen) -> bool {
        match self.validate(element) {
            Ok(()) => true,
            Err(reason) => {
                tracing::warn!(id = %element.id, %reason, "citizen blocked by validation");
                false
            }
        }
    }
}

/// Whole years elapsed between `birth` and `today`.
fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
