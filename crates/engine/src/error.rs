//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidParameter`] thrown when a list request carries an order column
//!   or sort direction that is not accepted.
//! - [`Validation`] thrown before any write when a draft is incomplete.
//! - [`NotFound`] thrown when a record addressed by id is missing from the
//!   caller's account.
//!
//!  [`InvalidParameter`]: EngineError::InvalidParameter
//!  [`Validation`]: EngineError::Validation
//!  [`NotFound`]: EngineError::NotFound
use std::{collections::BTreeMap, fmt};

use sea_orm::DbErr;
use thiserror::Error;

/// Field-keyed validation messages, ordered by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message for a field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), EngineError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid {0} parameter")]
    InvalidParameter(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn invalid_field(field: &str, message: &str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidParameter(a), Self::InvalidParameter(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_is_kept() {
        let mut errors = ValidationErrors::new();
        errors.add("category", "Category name is required.");
        errors.add("category", "Category type is required.");
        errors.add("amount", "The amount field is required.");

        assert_eq!(errors.get("category"), Some("Category name is required."));
        assert_eq!(
            errors.to_string(),
            "amount: The amount field is required.; category: Category name is required."
        );
    }

    #[test]
    fn empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
