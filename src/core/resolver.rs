//! Fall-forward search for the first quoted day of a bimonth.
//!
//! Providers publish nothing on weekends and holidays, so the first day of a period
//! often has no quotation. The resolver probes the start date and then each following
//! day, strictly in order and one at a time, until a quotation turns up or the
//! lookahead budget runs out.

use chrono::Days;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::error::{RateError, RateResult};
use super::period::BimonthPeriod;
use super::quotation::{QuotationProvider, ResolvedRate};

pub const DEFAULT_MAX_LOOKAHEAD_DAYS: u32 = 5;

pub struct PeriodRateResolver {
    provider: Arc<dyn QuotationProvider>,
    max_lookahead_days: u32,
}

impl PeriodRateResolver {
    pub fn new(provider: Arc<dyn QuotationProvider>, max_lookahead_days: u32) -> Self {
        Self {
            provider,
            max_lookahead_days,
        }
    }

    /// Resolves the reference rate of `period`.
    ///
    /// `quotation_date` is the calendar date that was probed, not the provider's
    /// timestamp. Errors from the provider end the search immediately; only a
    /// confirmed empty day moves it forward.
    #[instrument(name = "ResolvePeriodRate", skip_all, fields(period = %period))]
    pub async fn resolve(&self, period: &BimonthPeriod) -> RateResult<ResolvedRate> {
        let start_date = period.start_date();

        for offset in 0..self.max_lookahead_days {
            let candidate = start_date + Days::new(u64::from(offset));
            debug!("Probing {} (day {} of {})", candidate, offset + 1, self.max_lookahead_days);

            let Some(quotation) = self.provider.fetch_quotation_for(candidate).await? else {
                debug!("No quotation on {}, moving forward", candidate);
                continue;
            };

            info!(
                sell_rate = quotation.sell_rate,
                buy_rate = quotation.buy_rate,
                "Quotation found for {} on {}",
                period,
                candidate
            );
            return Ok(ResolvedRate {
                sell_rate: quotation.sell_rate,
                buy_rate: quotation.buy_rate,
                reference_date: start_date,
                quotation_date: candidate,
                period_key: period.key(),
                source_label: self.provider.name().to_string(),
                from_cache: false,
            });
        }

        Err(RateError::NoQuotationFound {
            period_key: period.key(),
            start_date,
            days_tried: self.max_lookahead_days,
        })
    }
}
