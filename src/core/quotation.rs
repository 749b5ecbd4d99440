//! Quotation types and the provider abstraction.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::{RateError, RateResult};

/// A single buy/sell pair reported by a provider for one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuotation {
    pub buy_rate: f64,
    pub sell_rate: f64,
    /// Provider's own timestamp for the quotation, when it could be read.
    pub quoted_at: Option<NaiveDateTime>,
}

impl RateQuotation {
    /// Builds a quotation, rejecting rates that are not positive finite numbers.
    pub fn new(buy_rate: f64, sell_rate: f64, quoted_at: Option<NaiveDateTime>) -> RateResult<Self> {
        for (name, rate) in [("buy", buy_rate), ("sell", sell_rate)] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(RateError::DataValidation(format!(
                    "{name} rate must be a positive finite number, got {rate}"
                )));
            }
        }

        Ok(Self {
            buy_rate,
            sell_rate,
            quoted_at,
        })
    }
}

/// The reference rate of a bimonth as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRate {
    pub sell_rate: f64,
    pub buy_rate: f64,
    /// First day of the bimonth, the date the rate is meant for.
    pub reference_date: NaiveDate,
    /// Date a quotation was actually found on; never before `reference_date`.
    pub quotation_date: NaiveDate,
    pub period_key: String,
    pub source_label: String,
    pub from_cache: bool,
}

#[async_trait]
pub trait QuotationProvider: Send + Sync {
    /// Human readable label of the data source.
    fn name(&self) -> &str;

    /// Fetches the quotation for exactly one calendar date.
    ///
    /// Returns `Ok(None)` when the provider confirms there is no quotation for `date`
    /// (weekends, holidays). Transport failures are retried inside the provider and
    /// only surface once retries are exhausted.
    async fn fetch_quotation_for(&self, date: NaiveDate) -> RateResult<Option<RateQuotation>>;
}
