//! Test doubles shared by the core unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::error::RateResult;
use super::quotation::{QuotationProvider, RateQuotation};

pub(crate) fn quote(buy_rate: f64, sell_rate: f64) -> RateQuotation {
    RateQuotation::new(buy_rate, sell_rate, None).unwrap()
}

/// Replays a fixed list of outcomes, one per probed date, and records every probe.
/// Once the script runs out every further date has no quotation.
pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<RateResult<Option<RateQuotation>>>>,
    probes: Mutex<Vec<NaiveDate>>,
    latency: Option<Duration>,
}

impl ScriptedProvider {
    pub(crate) fn new(script: Vec<RateResult<Option<RateQuotation>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            probes: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Repeats the same quotation for every date.
    pub(crate) fn always(quotation: RateQuotation, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(Some(quotation.clone()))).collect())
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn probes(&self) -> Vec<NaiveDate> {
        self.probes.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.probes.lock().unwrap().len()
    }
}

#[async_trait]
impl QuotationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn fetch_quotation_for(&self, date: NaiveDate) -> RateResult<Option<RateQuotation>> {
        self.probes.lock().unwrap().push(date);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}
