//! Core business logic: periods, quotations, caching and rate resolution

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod log;
pub mod period;
pub mod quotation;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RateError, RateResult};
pub use period::{BimonthPeriod, PeriodInfo};
pub use quotation::{QuotationProvider, RateQuotation, ResolvedRate};
pub use resolver::PeriodRateResolver;
pub use service::BimonthlyRateService;
