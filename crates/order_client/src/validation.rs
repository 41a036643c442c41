//! Client-side order field rules. Server validation still runs; these only
//! gate submission and drive live feedback.

use chrono::{NaiveDate, NaiveDateTime};
use shared::protocol::OrderFields;
use thiserror::Error;

pub const QUANTITY_KG_MAX: f64 = 10_000.0;
pub const AMOUNT_USD_MAX: f64 = 1_000_000.0;
pub const CUSTOMER_NAME_MIN_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("This field is required")]
    Required,
    #[error("Customer name must be at least 2 characters")]
    CustomerNameTooShort,
    #[error("Quantity must be a number")]
    QuantityNotANumber,
    #[error("Quantity must be between 0.01 and 10,000 kg")]
    QuantityOutOfRange,
    #[error("Amount must be a number")]
    AmountNotANumber,
    #[error("Amount must be between $0.01 and $1,000,000")]
    AmountOutOfRange,
    #[error("Startup date must be a valid date")]
    StartupDateInvalid,
    #[error("Startup date cannot be in the past")]
    StartupDateInPast,
}

/// Field-specific rule, keyed by input name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    CustomerName,
    QuantityKg,
    AmountUsd,
    StartupDate,
}

impl FieldRule {
    pub fn for_field(name: &str) -> Option<Self> {
        match name {
            "customer_name" => Some(Self::CustomerName),
            "quantity_kg" => Some(Self::QuantityKg),
            "amount_usd" => Some(Self::AmountUsd),
            "startup_date" => Some(Self::StartupDate),
            _ => None,
        }
    }

    /// `value` is already trimmed and non-empty.
    fn check(self, value: &str, today: NaiveDate) -> Result<(), FieldError> {
        match self {
            Self::CustomerName => {
                if value.chars().count() < CUSTOMER_NAME_MIN_CHARS {
                    return Err(FieldError::CustomerNameTooShort);
                }
            }
            Self::QuantityKg => {
                let quantity = parse_number(value).ok_or(FieldError::QuantityNotANumber)?;
                if quantity <= 0.0 || quantity > QUANTITY_KG_MAX {
                    return Err(FieldError::QuantityOutOfRange);
                }
            }
            Self::AmountUsd => {
                let amount = parse_number(value).ok_or(FieldError::AmountNotANumber)?;
                if amount <= 0.0 || amount > AMOUNT_USD_MAX {
                    return Err(FieldError::AmountOutOfRange);
                }
            }
            Self::StartupDate => {
                let date = parse_date(value).ok_or(FieldError::StartupDateInvalid)?;
                if date < today {
                    return Err(FieldError::StartupDateInPast);
                }
            }
        }
        Ok(())
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Date inputs send `YYYY-MM-DD`; datetime inputs add a time that is ignored.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|datetime| datetime.date())
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    pub fn rule(&self) -> Option<FieldRule> {
        FieldRule::for_field(&self.name)
    }

    /// Required check first, then the field rule. Empty optional fields
    /// always pass.
    pub fn validate(&self, raw: &str, today: NaiveDate) -> Result<(), FieldError> {
        let value = raw.trim();
        if value.is_empty() {
            return if self.required {
                Err(FieldError::Required)
            } else {
                Ok(())
            };
        }
        match self.rule() {
            Some(rule) => rule.check(value, today),
            None => Ok(()),
        }
    }
}

/// Fields of an order form in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// The edit-order form.
    pub fn order_form() -> Self {
        Self::new(vec![
            FieldSpec::optional("order_id"),
            FieldSpec::required("customer_name"),
            FieldSpec::required("yarn_type"),
            FieldSpec::required("quantity_kg"),
            FieldSpec::required("startup_date"),
            FieldSpec::required("order_type"),
            FieldSpec::required("amount_usd"),
            FieldSpec::optional("status"),
            FieldSpec::optional("assigned_agent"),
            FieldSpec::optional("notes"),
        ])
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields outside the schema get no required check but keep their rule.
    pub fn spec_for(&self, name: &str) -> FieldSpec {
        self.field(name)
            .cloned()
            .unwrap_or_else(|| FieldSpec::optional(name))
    }

    pub fn validate_field(&self, name: &str, value: &str, today: NaiveDate) -> Result<(), FieldError> {
        self.spec_for(name).validate(value, today)
    }

    /// Runs every required or rule-bearing field, in schema order.
    pub fn validate(&self, values: &OrderFields, today: NaiveDate) -> FormReport {
        let outcomes = self
            .fields
            .iter()
            .filter(|field| field.required || field.rule().is_some())
            .map(|field| {
                (
                    field.name.clone(),
                    field.validate(values.value(&field.name), today),
                )
            })
            .collect();
        FormReport { outcomes }
    }
}

impl Default for FormSchema {
    fn default() -> Self {
        Self::order_form()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormReport {
    pub outcomes: Vec<(String, Result<(), FieldError>)>,
}

impl FormReport {
    pub fn is_valid(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// The field the host should scroll to and focus.
    pub fn first_invalid(&self) -> Option<(&str, &FieldError)> {
        self.outcomes.iter().find_map(|(name, outcome)| match outcome {
            Err(err) => Some((name.as_str(), err)),
            Ok(()) => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.outcomes.iter().filter_map(|(name, outcome)| match outcome {
            Err(err) => Some((name.as_str(), err)),
            Ok(()) => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesGauge {
    Normal,
    Warning,
    Critical,
}

/// Colour band of the notes character counter.
pub fn notes_gauge(notes: &str) -> NotesGauge {
    match notes.chars().count() {
        n if n > 900 => NotesGauge::Critical,
        n if n > 700 => NotesGauge::Warning,
        _ => NotesGauge::Normal,
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
