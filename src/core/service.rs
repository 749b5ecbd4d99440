use chrono::Duration;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::cache::RateCache;
use super::clock::Clock;
use super::error::RateResult;
use super::period::{self, BimonthPeriod, PeriodInfo};
use super::quotation::ResolvedRate;
use super::resolver::PeriodRateResolver;

/// A closed bimonth's quotation never changes; the period key does the real invalidation.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

type Resolution = Shared<BoxFuture<'static, RateResult<ResolvedRate>>>;

/// Serves the reference rate of the current bimonth, resolving it at most once per period.
pub struct BimonthlyRateService {
    resolver: Arc<PeriodRateResolver>,
    cache: Arc<RateCache>,
    clock: Arc<dyn Clock>,
    cache_ttl: Duration,
    // Lookup currently running, keyed by period. Every caller for that period awaits it.
    in_flight: Arc<Mutex<Option<(String, Resolution)>>>,
}

impl BimonthlyRateService {
    pub fn new(
        resolver: PeriodRateResolver,
        cache: Arc<RateCache>,
        clock: Arc<dyn Clock>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            cache,
            clock,
            cache_ttl,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn current_period(&self) -> BimonthPeriod {
        period::current_period(self.clock.today())
    }

    /// Returns the rate of the current bimonth, from cache when possible.
    ///
    /// Callers arriving while a lookup for the same period is running share its
    /// outcome, errors included. Nothing is cached for a failed lookup, so the next
    /// caller after it finishes starts a new one.
    pub async fn get_current_rate(&self) -> RateResult<ResolvedRate> {
        let period = self.current_period();
        let key = period.key();

        if let Some(rate) = self.cached_rate(&key).await {
            return Ok(rate);
        }

        let resolution = {
            let mut in_flight = self.in_flight.lock().await;
            let pending = in_flight
                .as_ref()
                .filter(|(pending_key, _)| *pending_key == key)
                .map(|(_, pending)| pending.clone());
            match pending {
                Some(pending) => {
                    debug!("Joining in-flight resolution for period {}", key);
                    pending
                }
                None => {
                    // A lookup may have landed between the first check and the lock.
                    if let Some(rate) = self.cached_rate(&key).await {
                        return Ok(rate);
                    }
                    let resolution = self.start_resolution(period);
                    *in_flight = Some((key, resolution.clone()));
                    resolution
                }
            }
        };

        resolution.await
    }

    /// Describes the current bimonth. Never touches the network or the cache.
    pub fn get_current_period_info(&self) -> PeriodInfo {
        period::describe(&self.current_period())
    }

    /// Drops the cached rate so the next lookup resolves again.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    async fn cached_rate(&self, period_key: &str) -> Option<ResolvedRate> {
        self.cache.get(period_key).await.map(|entry| ResolvedRate {
            from_cache: true,
            ..entry.payload
        })
    }

    fn start_resolution(&self, period: BimonthPeriod) -> Resolution {
        let resolver = Arc::clone(&self.resolver);
        let cache = Arc::clone(&self.cache);
        let clock = Arc::clone(&self.clock);
        let in_flight = Arc::clone(&self.in_flight);
        let cache_ttl = self.cache_ttl;

        async move {
            let key = period.key();
            info!("Resolving reference rate for period {}", key);
            let result = resolver.resolve(&period).await;

            if let Ok(rate) = &result {
                // The slot belongs to the current period; a lookup that outlived its
                // bimonth must not displace it.
                if period::current_period(clock.today()) == period {
                    cache.put(key.clone(), rate.clone(), cache_ttl).await;
                } else {
                    debug!("Period {} ended during resolution, not caching", key);
                }
            }

            let mut in_flight = in_flight.lock().await;
            if in_flight.as_ref().is_some_and(|(pending_key, _)| *pending_key == key) {
                *in_flight = None;
            }
            result
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::error::RateError;
    use crate::core::resolver::DEFAULT_MAX_LOOKAHEAD_DAYS;
    use crate::core::testing::{ScriptedProvider, quote};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn build(
        provider: Arc<ScriptedProvider>,
        clock: Arc<ManualClock>,
    ) -> BimonthlyRateService {
        let resolver = PeriodRateResolver::new(provider, DEFAULT_MAX_LOOKAHEAD_DAYS);
        let cache = Arc::new(RateCache::new(clock.clone()));
        BimonthlyRateService::new(
            resolver,
            cache,
            clock,
            Duration::seconds(DEFAULT_CACHE_TTL_SECS as i64),
        )
    }

    fn clock_at(year: i32, month: u32, day: u32) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(None), Ok(Some(quote(5.1, 5.2)))]));
        let clock = clock_at(2026, 1, 20);
        let service = build(provider.clone(), clock.clone());

        let first = service.get_current_rate().await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.period_key, "2026-B1");
        assert_eq!(first.quotation_date, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert_eq!(provider.call_count(), 2);

        clock.advance(Duration::days(3));
        let second = service.get_current_rate().await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.sell_rate, first.sell_rate);
        assert_eq!(second.quotation_date, first.quotation_date);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_new_bimonth_invalidates_cache_before_ttl() {
        let provider = Arc::new(ScriptedProvider::always(quote(5.1, 5.2), 2));
        let clock = clock_at(2026, 2, 27);
        let service = build(provider.clone(), clock.clone());

        let february = service.get_current_rate().await.unwrap();
        assert_eq!(february.period_key, "2026-B1");

        // Four days later: well within the 7 day TTL, but a new period.
        clock.advance(Duration::days(4));
        let march = service.get_current_rate().await.unwrap();

        assert!(!march.from_cache);
        assert_eq!(march.period_key, "2026-B2");
        assert_eq!(march.reference_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(provider.call_count(), 2);
        assert_eq!(
            provider.probes().last(),
            Some(&NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
        );
    }

    #[tokio::test]
    async fn test_expired_entry_is_resolved_again() {
        let provider = Arc::new(ScriptedProvider::always(quote(5.1, 5.2), 2));
        let clock = clock_at(2026, 5, 2);
        let service = build(provider.clone(), clock.clone());

        service.get_current_rate().await.unwrap();
        clock.advance(Duration::days(8));
        let rate = service.get_current_rate().await.unwrap();

        assert!(!rate.from_cache);
        assert_eq!(rate.period_key, "2026-B3");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_errors_propagate_and_are_not_cached() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(RateError::DataValidation("cotacaoCompra is missing".into())),
            Ok(Some(quote(5.1, 5.2))),
        ]));
        let service = build(provider.clone(), clock_at(2026, 7, 15));

        let err = service.get_current_rate().await.unwrap_err();
        assert!(matches!(err, RateError::DataValidation(_)));

        let rate = service.get_current_rate().await.unwrap();
        assert!(!rate.from_cache);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_resolve_once() {
        let provider = Arc::new(
            ScriptedProvider::always(quote(5.1, 5.2), 1)
                .with_latency(std::time::Duration::from_millis(50)),
        );
        let service = Arc::new(build(provider.clone(), clock_at(2026, 9, 9)));

        let calls = (0..5).map(|_| {
            let service = Arc::clone(&service);
            async move { service.get_current_rate().await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.as_ref().is_ok_and(|rate| rate.sell_rate == 5.2)));
        assert_eq!(provider.call_count(), 1);

        let cached = service.get_current_rate().await.unwrap();
        assert!(cached.from_cache);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_a_failed_lookup() {
        let provider = Arc::new(
            ScriptedProvider::new(vec![Err(RateError::Transport {
                attempts: 3,
                message: "operation timed out".into(),
            })])
            .with_latency(std::time::Duration::from_secs(10)),
        );
        let service = Arc::new(build(provider.clone(), clock_at(2026, 9, 9)));

        let started = tokio::time::Instant::now();
        let calls = (0..5).map(|_| {
            let service = Arc::clone(&service);
            async move { service.get_current_rate().await }
        });
        let results = futures::future::join_all(calls).await;
        let elapsed = started.elapsed();

        assert!(
            results
                .iter()
                .all(|r| matches!(r, Err(RateError::Transport { attempts: 3, .. })))
        );
        assert_eq!(provider.call_count(), 1);
        assert!(elapsed >= std::time::Duration::from_secs(10));
        assert!(elapsed < std::time::Duration::from_secs(11));

        // The failure is not remembered: the next caller looks the period up again.
        let err = service.get_current_rate().await.unwrap_err();
        assert!(matches!(err, RateError::NoQuotationFound { .. }));
        assert_eq!(provider.call_count(), 1 + DEFAULT_MAX_LOOKAHEAD_DAYS as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_outliving_its_bimonth_is_not_cached() {
        let provider = Arc::new(
            ScriptedProvider::always(quote(5.1, 5.2), 2)
                .with_latency(std::time::Duration::from_secs(5)),
        );
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 2, 28, 23, 59, 0).unwrap(),
        ));
        let resolver = PeriodRateResolver::new(provider.clone(), DEFAULT_MAX_LOOKAHEAD_DAYS);
        let cache = Arc::new(RateCache::new(clock.clone()));
        let service = BimonthlyRateService::new(
            resolver,
            cache.clone(),
            clock.clone(),
            Duration::seconds(DEFAULT_CACHE_TTL_SECS as i64),
        );

        let (february, _) = tokio::join!(service.get_current_rate(), async {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            clock.set(Utc.with_ymd_and_hms(2026, 3, 1, 0, 1, 0).unwrap());
        });

        assert_eq!(february.unwrap().period_key, "2026-B1");
        assert!(cache.get("2026-B1").await.is_none());

        let march = service.get_current_rate().await.unwrap();
        assert_eq!(march.period_key, "2026-B2");
        assert!(!march.from_cache);
        assert!(cache.get("2026-B2").await.is_some());
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_resolution() {
        let provider = Arc::new(ScriptedProvider::always(quote(5.1, 5.2), 2));
        let service = build(provider.clone(), clock_at(2026, 11, 3));

        service.get_current_rate().await.unwrap();
        service.clear_cache().await;
        let rate = service.get_current_rate().await.unwrap();

        assert!(!rate.from_cache);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_period_info_needs_no_provider() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let service = build(provider.clone(), clock_at(2026, 10, 16));

        let info = service.get_current_period_info();

        assert_eq!(info.key, "2026-B5");
        assert_eq!(info.display_name, "September/October");
        assert_eq!(info.start_date_display, "01/09/2026");
        assert_eq!(info.year, 2026);
        assert_eq!(provider.call_count(), 0);
    }
}
