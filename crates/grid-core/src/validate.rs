//! Field checks shared by the request types.

use crate::error::{GridError, GridResult};

pub(crate) fn require_id(field: &str, value: &str) -> GridResult<()> {
    if value.trim().is_empty() {
        return Err(GridError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: f64) -> GridResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GridError::validation(format!(
            "{} must be a positive amount, got {}",
            field, value
        )));
    }
    Ok(())
}

pub(crate) fn require_currency(value: &str) -> GridResult<()> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(GridError::validation(format!("invalid currency code: {:?}", value)));
    }
    Ok(())
}
