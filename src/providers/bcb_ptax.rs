use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use super::util::{RetryPolicy, with_retry};
use crate::core::error::{RateError, RateResult};
use crate::core::quotation::{QuotationProvider, RateQuotation};

pub const DEFAULT_BASE_URL: &str = "https://olinda.bcb.gov.br/olinda/servico/PTAX/versao/v1/odata";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const SOURCE_LABEL: &str = "Banco Central do Brasil - PTAX API";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Formats a date the way the PTAX endpoint expects it: `MM-DD-YYYY`.
pub fn format_provider_date(date: NaiveDate) -> String {
    date.format("%m-%d-%Y").to_string()
}

// PtaxProvider implementation for QuotationProvider
pub struct PtaxProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl PtaxProvider {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("ptax/1.0")
            .timeout(timeout)
            .build()?;

        Ok(PtaxProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry,
        })
    }

    fn quotation_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/CotacaoDolarDia(dataCotacao=@dataCotacao)?@dataCotacao='{}'&$format=json",
            self.base_url,
            format_provider_date(date)
        )
    }

    async fn fetch_body(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        response.text().await
    }
}

#[derive(Debug, Deserialize)]
struct PtaxResponse {
    value: Vec<Value>,
}

fn rate_field(record: &Value, field: &str) -> RateResult<f64> {
    match record.get(field) {
        Some(value) => value.as_f64().ok_or_else(|| {
            RateError::DataValidation(format!("{field} is not numeric: {value}"))
        }),
        None => Err(RateError::DataValidation(format!("{field} is missing"))),
    }
}

/// Turns a PTAX response body into a quotation.
///
/// An empty `value` collection means the provider has no quotation for the date.
fn parse_quotation(body: &str, date: NaiveDate) -> RateResult<Option<RateQuotation>> {
    let response: PtaxResponse = serde_json::from_str(body).map_err(|e| {
        RateError::DataValidation(format!("Malformed PTAX response for {date}: {e}"))
    })?;

    let Some(record) = response.value.first() else {
        return Ok(None);
    };

    let sell_rate = rate_field(record, "cotacaoVenda")?;
    let buy_rate = rate_field(record, "cotacaoCompra")?;
    let quoted_at = record
        .get("dataHoraCotacao")
        .and_then(Value::as_str)
        .and_then(|ts| match NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Ignoring unreadable dataHoraCotacao '{}': {}", ts, e);
                None
            }
        });

    RateQuotation::new(buy_rate, sell_rate, quoted_at).map(Some)
}

#[async_trait]
impl QuotationProvider for PtaxProvider {
    fn name(&self) -> &str {
        SOURCE_LABEL
    }

    #[instrument(
        name = "PtaxQuotationFetch",
        skip_all,
        fields(date = %format_provider_date(date))
    )]
    async fn fetch_quotation_for(&self, date: NaiveDate) -> RateResult<Option<RateQuotation>> {
        let url = self.quotation_url(date);
        debug!("Requesting PTAX quotation from {}", url);

        let body = with_retry(|| self.fetch_body(&url), &self.retry).await?;
        debug!(body = %body, "Received PTAX response");

        let quotation = parse_quotation(&body, date)?;
        if quotation.is_none() {
            debug!("No PTAX quotation available for {}", date);
        }
        Ok(quotation)
    }
}
