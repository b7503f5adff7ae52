use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::error::SourceError;
use crate::model::{PriceSample, PriceSeries, SeriesQuery, SourceKind, Window};
use crate::source::PriceSource;

const COINGECKO_BASE_URL: &str = "https://api.coingecko.com";

/// Close-only daily/hourly prices from the CoinGecko market chart endpoint.
pub struct CoinGeckoSource {
    client: reqwest::Client,
    currency: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl CoinGeckoSource {
    pub fn new(currency: &str, timeout: Duration) -> Result<Self, Report<SourceError>> {
        // Public tier allows roughly 10-30 calls per minute.
        let quota = Quota::per_minute(nonzero!(10u32));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .change_context(SourceError::Request {
                provider: SourceKind::CoinGecko,
            })?;
        Ok(Self {
            client,
            currency: currency.to_lowercase(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }
}

impl PriceSource for CoinGeckoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::CoinGecko
    }

    fn fetch(&self, query: &SeriesQuery) -> BoxFuture<'_, Result<PriceSeries, Report<SourceError>>> {
        let query = query.clone();
        Box::pin(async move {
            let Window::Days(days) = query.window else {
                return Err(Report::new(SourceError::UnsupportedWindow {
                    provider: SourceKind::CoinGecko,
                })
                .attach(format!("window: {}", query.window)));
            };

            self.rate_limiter.until_ready().await;

            let coin_id = query.identifier.to_lowercase();
            let url = format!("{COINGECKO_BASE_URL}/api/v3/coins/{coin_id}/market_chart");
            let days_str = days.to_string();
            let params = [
                ("vs_currency", self.currency.as_str()),
                ("days", days_str.as_str()),
            ];

            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .change_context(SourceError::Request {
                    provider: SourceKind::CoinGecko,
                })?;

            let status = response.status();
            let body = response.text().await.change_context(SourceError::Request {
                provider: SourceKind::CoinGecko,
            })?;

            let series = decode_market_chart(status, &body, &coin_id)?;

            info!(
                coin = %coin_id,
                days,
                fetched = series.len(),
                "coingecko price fetch complete"
            );

            Ok(series)
        })
    }
}

fn decode_market_chart(
    status: StatusCode,
    body: &str,
    coin_id: &str,
) -> Result<PriceSeries, Report<SourceError>> {
    if status == StatusCode::NOT_FOUND {
        return Err(Report::new(SourceError::UnknownSymbol {
            provider: SourceKind::CoinGecko,
            identifier: coin_id.to_owned(),
        }));
    }
    if !status.is_success() {
        return Err(Report::new(SourceError::Request {
            provider: SourceKind::CoinGecko,
        })
        .attach(format!("HTTP status: {status}")));
    }

    let chart: MarketChart =
        serde_json::from_str(body).change_context(SourceError::ResponseParse {
            provider: SourceKind::CoinGecko,
        })?;

    let samples = chart
        .prices
        .into_iter()
        .map(|(ts, price)| {
            if !price.is_finite() {
                return Err(Report::new(SourceError::ResponseParse {
                    provider: SourceKind::CoinGecko,
                })
                .attach(format!("non-finite price: {price}")));
            }
            let millis = ts as i64;
            DateTime::from_timestamp_millis(millis)
                .map(|t| PriceSample::close_only(t, price))
                .ok_or_else(|| {
                    Report::new(SourceError::ResponseParse {
                        provider: SourceKind::CoinGecko,
                    })
                    .attach(format!("timestamp out of range: {millis}"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    PriceSeries::new(coin_id, samples).change_context(SourceError::InvalidSeries {
        provider: SourceKind::CoinGecko,
    })
}

// ── REST response types ───────────────────────────────────────────────────────

/// `{"prices": [[ts_ms, price], ...], "market_caps": .., "total_volumes": ..}`
#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(f64, f64)>,
}
