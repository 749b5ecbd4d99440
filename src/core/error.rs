//! Errors raised while resolving a reference rate.

use chrono::NaiveDate;
use thiserror::Error;

use super::period::DISPLAY_DATE_FORMAT;

#[derive(Debug, Clone, Error)]
pub enum RateError {
    /// Network failure, timeout or non-success HTTP status that outlived every retry.
    #[error("Failed to reach quotation provider after {attempts} attempts: {message}")]
    Transport { attempts: u32, message: String },

    /// Well-formed response carrying an invalid payload. Never retried.
    #[error("Invalid quotation data: {0}")]
    DataValidation(String),

    /// Fall-forward search ran out of candidate days.
    #[error(
        "No quotation found for period {period_key}: tried the first {days_tried} days from {}",
        .start_date.format(DISPLAY_DATE_FORMAT)
    )]
    NoQuotationFound {
        period_key: String,
        start_date: NaiveDate,
        days_tried: u32,
    },
}

impl RateError {
    /// Stable machine-readable code for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RateError::Transport { .. } => "TRANSPORT_ERROR",
            RateError::DataValidation(_) => "DATA_VALIDATION_ERROR",
            RateError::NoQuotationFound { .. } => "NO_QUOTATION_FOUND",
        }
    }
}

pub type RateResult<T> = Result<T, RateError>;
